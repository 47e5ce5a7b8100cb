use tokio::time::{Duration, timeout};

use super::engine::{SnmpConnector, SnmpEngine};
use super::transport::SYS_OBJECT_ID;
use crate::config::CredentialSet;
use crate::log;

/// Учетные данные, с которыми хост ответил
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    pub credentials: CredentialSet,
}

impl Authorization {
    /// Хост не исключен из опроса администратором
    pub fn enabled(&self) -> bool {
        self.credentials.enabled
    }
}

/// Подбирает первый рабочий набор учетных данных для хоста.
///
/// Кандидаты проверяются строго по порядку, после первого успеха
/// остальные не трогаются.
pub struct CredentialValidator<'a, C> {
    connector: &'a C,
    hostname: &'a str,
    candidates: &'a [CredentialSet],
    probe_timeout: Duration,
}

impl<'a, C: SnmpConnector> CredentialValidator<'a, C> {
    pub fn new(connector: &'a C, hostname: &'a str, candidates: &'a [CredentialSet]) -> Self {
        Self {
            connector,
            hostname,
            candidates,
            probe_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    pub async fn validate(&self) -> Option<Authorization> {
        for credentials in self.candidates {
            if self.probe(credentials).await {
                tracing::debug!(
                    host = self.hostname,
                    group = %credentials.group,
                    "учетные данные подошли"
                );
                return Some(Authorization {
                    credentials: credentials.clone(),
                });
            }
        }

        tracing::info!(
            code = log::UNCONTACTABLE_HOST,
            host = self.hostname,
            candidates = self.candidates.len(),
            "ни один набор учетных данных не подошел"
        );
        None
    }

    /// Чтение sysObjectID с данными кандидата
    async fn probe(&self, credentials: &CredentialSet) -> bool {
        let connected = timeout(
            self.probe_timeout,
            self.connector.connect(self.hostname, credentials),
        )
        .await;

        let engine = match connected {
            Ok(Ok(engine)) => engine,
            Ok(Err(e)) => {
                tracing::debug!(host = self.hostname, group = %credentials.group, error = %e, "подключение не удалось");
                return false;
            }
            Err(_) => {
                tracing::debug!(host = self.hostname, group = %credentials.group, "таймаут подключения");
                return false;
            }
        };

        let answer = timeout(self.probe_timeout, engine.get(SYS_OBJECT_ID)).await;
        engine.close().await;

        match answer {
            Ok(Ok(value)) => !value.is_empty(),
            Ok(Err(e)) => {
                tracing::debug!(host = self.hostname, group = %credentials.group, error = %e, "проверка не прошла");
                false
            }
            Err(_) => {
                tracing::debug!(host = self.hostname, group = %credentials.group, "таймаут проверки");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snmp::SnmpValue;
    use crate::snmp::mock::{MockAgent, MockConnector, text};

    fn agent() -> MockAgent {
        MockAgent::new().set(SYS_OBJECT_ID, SnmpValue::ObjectId(".1.3.6.1.4.1.9.1.1".into()))
    }

    #[tokio::test]
    async fn empty_answer_is_not_a_success() {
        let connector = MockConnector::new()
            .agent("blank", MockAgent::new().set(SYS_OBJECT_ID, text("")))
            .agent("good", agent());
        let candidates = [
            CredentialSet::v2c("blank", "a"),
            CredentialSet::v2c("good", "b"),
        ];

        let auth = CredentialValidator::new(&connector, "sw1", &candidates)
            .validate()
            .await
            .unwrap();
        assert_eq!(auth.credentials.group, "good");
    }

    #[tokio::test]
    async fn probe_engines_are_closed() {
        let good = agent();
        let connector = MockConnector::new().agent("good", good.clone());
        let candidates = [CredentialSet::v2c("good", "b")];

        CredentialValidator::new(&connector, "sw1", &candidates)
            .validate()
            .await
            .unwrap();
        assert_eq!(good.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_candidate_times_out() {
        let connector = MockConnector::new()
            .agent("slow", agent().delay(Duration::from_secs(30)))
            .agent("good", agent());
        let candidates = [
            CredentialSet::v2c("slow", "a"),
            CredentialSet::v2c("good", "b"),
        ];

        let auth = CredentialValidator::new(&connector, "sw1", &candidates)
            .with_probe_timeout(Duration::from_secs(2))
            .validate()
            .await
            .unwrap();
        assert_eq!(auth.credentials.group, "good");
    }

    #[tokio::test]
    async fn disabled_result_is_reported() {
        let connector = MockConnector::new().agent("parked", agent());
        let candidates = [CredentialSet::v2c("parked", "a").disabled()];

        let auth = CredentialValidator::new(&connector, "sw1", &candidates)
            .validate()
            .await
            .unwrap();
        assert!(!auth.enabled());
    }
}
