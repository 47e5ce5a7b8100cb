//! Жизненный цикл опроса одного хоста.
//!
//! `Uninitialized -> initialize() -> Ready | Rejected`, затем
//! `query() -> Queried` и `close() -> Closed`.

use serde::Serialize;
use tokio::time::{Duration, timeout};

use crate::collector::{FactDocument, Orchestrator};
use crate::config::{CredentialSet, PollSettings};
use crate::log;
use crate::mib::QueryTag;
use crate::snmp::{CredentialValidator, SnmpConnector, TransportSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Uninitialized,
    Rejected,
    Ready,
    Queried,
    Closed,
}

/// Чем закончилась проверка учетных данных
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PollOutcome {
    /// Сессия создана, хост можно опрашивать
    Ready,
    /// Ни один набор учетных данных не подошел
    Unreachable,
    /// Данные подошли, но хост исключен из опроса
    Disabled,
}

/// Опрос одного хоста
pub struct Poll<C: SnmpConnector> {
    hostname: String,
    candidates: Vec<CredentialSet>,
    connector: C,
    probe_timeout: Duration,
    deadline: Duration,
    tags: Vec<QueryTag>,
    state: PollState,
    outcome: Option<PollOutcome>,
    session: Option<TransportSession<C::Engine>>,
}

impl<C: SnmpConnector> Poll<C> {
    pub fn new(hostname: impl Into<String>, candidates: Vec<CredentialSet>, connector: C) -> Self {
        let defaults = PollSettings::default();
        Self {
            hostname: hostname.into(),
            candidates,
            connector,
            probe_timeout: defaults.get_probe_timeout(),
            deadline: defaults.get_deadline(),
            tags: defaults.tags,
            state: PollState::Uninitialized,
            outcome: None,
            session: None,
        }
    }

    pub fn with_settings(mut self, settings: &PollSettings) -> Self {
        self.probe_timeout = settings.get_probe_timeout();
        self.deadline = settings.get_deadline();
        self.tags = settings.tags.clone();
        self
    }

    /// Срок на весь query(); по истечении незавершенные MIB отменяются,
    /// уже собранные остаются в документе
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    pub fn with_tags(mut self, tags: &[QueryTag]) -> Self {
        self.tags = tags.to_vec();
        self
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn session(&self) -> Option<&TransportSession<C::Engine>> {
        self.session.as_ref()
    }

    /// Подбирает учетные данные и создает сессию
    pub async fn initialize(&mut self) -> PollOutcome {
        if self.state != PollState::Uninitialized {
            return match (self.state, self.outcome) {
                (PollState::Closed, _) | (_, None) => PollOutcome::Unreachable,
                (_, Some(outcome)) => outcome,
            };
        }

        let outcome = self.establish().await;
        self.state = match outcome {
            PollOutcome::Ready => PollState::Ready,
            PollOutcome::Unreachable | PollOutcome::Disabled => PollState::Rejected,
        };
        self.outcome = Some(outcome);
        outcome
    }

    /// Проверка учетных данных и рабочая сессия; состояние выставляет вызывающий
    async fn establish(&mut self) -> PollOutcome {
        let authorization =
            CredentialValidator::new(&self.connector, &self.hostname, &self.candidates)
                .with_probe_timeout(self.probe_timeout)
                .validate()
                .await;

        let Some(authorization) = authorization else {
            return PollOutcome::Unreachable;
        };

        if !authorization.enabled() {
            tracing::info!(
                code = log::UNCONTACTABLE_HOST,
                host = %self.hostname,
                group = %authorization.credentials.group,
                "хост отключен в конфигурации"
            );
            return PollOutcome::Disabled;
        }

        let credentials = authorization.credentials;
        let connect = self.connector.connect(&self.hostname, &credentials);
        let connected = timeout(self.probe_timeout, connect).await;
        let failure = match connected {
            Ok(Ok(engine)) => {
                self.session = Some(TransportSession::new(&self.hostname, credentials, engine));
                return PollOutcome::Ready;
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("подключение не завершилось за {:?}", self.probe_timeout),
        };

        tracing::info!(
            code = log::UNCONTACTABLE_HOST,
            host = %self.hostname,
            error = %failure,
            "не удалось создать сессию"
        );
        PollOutcome::Unreachable
    }

    /// Документ фактов хоста; без сессии пустой и без обращения к сети
    pub async fn query(&mut self) -> FactDocument {
        let session = match (&self.session, self.state) {
            (Some(session), PollState::Ready | PollState::Queried) => session.clone(),
            _ => {
                tracing::info!(
                    code = log::NO_SESSION,
                    host = %self.hostname,
                    state = ?self.state,
                    "нет SNMP сессии, хост не опрашивается"
                );
                return FactDocument::new();
            }
        };

        tracing::info!(code = log::QUERYING_HOST, host = %self.hostname, "опрос хоста");

        let document = Orchestrator::new(session)
            .with_tags(&self.tags)
            .with_deadline(self.deadline)
            .collect()
            .await;

        self.state = PollState::Queried;
        document
    }

    /// Освобождает сессию; повторный вызов ничего не делает
    pub async fn close(&mut self) {
        if let Some(session) = self.session.take() {
            session.close().await;
            self.state = PollState::Closed;
        }
    }
}
