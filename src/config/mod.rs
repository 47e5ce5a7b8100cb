use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

pub mod credentials;
pub mod settings;

pub use credentials::{CredentialSet, SnmpVersion};
pub use settings::{ConnectionSettings, PollSettings, Settings};

/// Главная конфигурация приложения
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Базовые настройки
    #[serde(default)]
    pub settings: Settings,
    /// Хосты для опроса
    #[serde(default)]
    pub hosts: Vec<String>,
    /// Учетные данные в порядке приоритета
    pub credentials: Vec<CredentialSet>,
}

impl AppConfig {
    /// Загружает конфигурацию из YAML файла
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .context(format!("Не удалось прочитать файл: {}", path.display()))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: AppConfig =
            serde_yml::from_str(content).context("Не удалось распарсить YAML")?;

        if config.credentials.is_empty() {
            anyhow::bail!("В конфигурации нет ни одного набора учетных данных");
        }

        Ok(config)
    }

    /// Получает список хостов из переменной окружения или из конфигурации
    pub fn get_hosts(&self) -> Vec<String> {
        match env::var("SNMP_HOSTS") {
            Ok(hosts) => hosts
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_string)
                .collect(),
            Err(_) => self.hosts.clone(),
        }
    }

    /// Настройки подключения с учетом SNMP_TIMEOUT
    pub fn connection_settings(&self) -> ConnectionSettings {
        let mut connection = self.settings.connection.clone();
        if let Some(timeout) = env::var("SNMP_TIMEOUT").ok().and_then(|s| s.parse().ok()) {
            connection.timeout = timeout;
        }
        connection
    }

    /// Настройки опроса с учетом SNMP_POLL_DEADLINE
    pub fn poll_settings(&self) -> PollSettings {
        let mut poll = self.settings.poll.clone();
        if let Some(deadline) = env::var("SNMP_POLL_DEADLINE").ok().and_then(|s| s.parse().ok()) {
            poll.deadline = deadline;
        }
        poll
    }

    pub fn debug_config(&self) {
        tracing::debug!(
            hosts = self.hosts.len(),
            credentials = self.credentials.len(),
            timeout = self.settings.connection.timeout,
            deadline = self.settings.poll.deadline,
            "конфигурация загружена"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mib::QueryTag;

    const SAMPLE: &str = r#"
settings:
  connection:
    timeout: 4
  poll:
    deadline: 120
    tags: [system, layer1]
hosts:
  - 10.0.0.1
  - core-sw1.example.net
credentials:
  - group: legacy
    version: v1
    community: old
    enabled: false
  - group: campus
    community: public
  - group: datacenter
    version: v3
    secname: poller
    authprotocol: sha256
    authpassword: authpass
    privprotocol: aes
    privpassword: privpass
"#;

    #[test]
    fn loads_ordered_credentials() {
        let config = AppConfig::from_yaml(SAMPLE).unwrap();
        let groups: Vec<&str> = config.credentials.iter().map(|c| c.group.as_str()).collect();
        assert_eq!(groups, ["legacy", "campus", "datacenter"]);
        assert_eq!(config.credentials[0].version, SnmpVersion::V1);
        assert!(!config.credentials[0].enabled);
        assert_eq!(config.credentials[2].version, SnmpVersion::V3);
        assert_eq!(config.hosts.len(), 2);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config = AppConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.settings.connection.timeout, 4);
        assert_eq!(config.settings.connection.retries, 3);
        assert_eq!(config.settings.poll.deadline, 120);
        assert_eq!(config.settings.poll.probe_timeout, 5);
        assert_eq!(config.settings.poll.tags, [QueryTag::System, QueryTag::Layer1]);
    }

    #[test]
    fn rejects_config_without_credentials() {
        let err = AppConfig::from_yaml("hosts: [10.0.0.1]\ncredentials: []\n").unwrap_err();
        assert!(err.to_string().contains("учетных данных"));
    }
}
