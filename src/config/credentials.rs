use serde::{Deserialize, Serialize};
use std::fmt;

/// Версия протокола SNMP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnmpVersion {
    V1,
    #[default]
    V2c,
    V3,
}

/// Набор учетных данных SNMP. Приоритет задается позицией в списке.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSet {
    /// Имя группы, используется только в логах
    pub group: String,
    #[serde(default)]
    pub version: SnmpVersion,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Community string для v1/v2c
    #[serde(default)]
    pub community: Option<String>,
    /// Имя пользователя SNMPv3
    #[serde(default)]
    pub secname: Option<String>,
    #[serde(default)]
    pub authprotocol: Option<String>,
    #[serde(default)]
    pub authpassword: Option<String>,
    #[serde(default)]
    pub privprotocol: Option<String>,
    #[serde(default)]
    pub privpassword: Option<String>,
}

fn default_port() -> u16 {
    161
}

fn default_enabled() -> bool {
    true
}

impl CredentialSet {
    pub fn v2c(group: impl Into<String>, community: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: SnmpVersion::V2c,
            port: default_port(),
            enabled: true,
            community: Some(community.into()),
            secname: None,
            authprotocol: None,
            authpassword: None,
            privprotocol: None,
            privpassword: None,
        }
    }

    pub fn v3(group: impl Into<String>, secname: impl Into<String>) -> Self {
        Self {
            version: SnmpVersion::V3,
            community: None,
            secname: Some(secname.into()),
            ..Self::v2c(group, "")
        }
    }

    pub fn with_auth(mut self, protocol: &str, password: &str) -> Self {
        self.authprotocol = Some(protocol.to_string());
        self.authpassword = Some(password.to_string());
        self
    }

    pub fn with_privacy(mut self, protocol: &str, password: &str) -> Self {
        self.privprotocol = Some(protocol.to_string());
        self.privpassword = Some(password.to_string());
        self
    }

    /// Хост с этими данными административно исключен из опроса
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn community(&self) -> &str {
        self.community.as_deref().unwrap_or_default()
    }
}

// Пароли и community в логи не попадают
impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("group", &self.group)
            .field("version", &self.version)
            .field("port", &self.port)
            .field("enabled", &self.enabled)
            .field("secname", &self.secname)
            .field("authprotocol", &self.authprotocol)
            .field("privprotocol", &self.privprotocol)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_defaults() {
        let creds: CredentialSet = serde_yml::from_str("group: core\ncommunity: public\n").unwrap();
        assert_eq!(creds.version, SnmpVersion::V2c);
        assert_eq!(creds.port, 161);
        assert!(creds.enabled);
        assert_eq!(creds.community(), "public");
    }

    #[test]
    fn debug_hides_secrets() {
        let creds = CredentialSet::v3("dc", "poller")
            .with_auth("sha", "auth-secret")
            .with_privacy("aes", "priv-secret");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("poller"));
        assert!(!rendered.contains("auth-secret"));
        assert!(!rendered.contains("priv-secret"));
    }
}
