//! Программируемый SNMP агент в памяти.
//!
//! Используется тестами вместо [`Snmp2Connector`](super::Snmp2Connector):
//! хранит объекты агента, умеет отвечать таймаутом или ошибкой на
//! конкретный OID, паниковать и записывает все запросы.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::time::Duration;

use super::engine::{SnmpConnector, SnmpEngine, WalkRows};
use super::oid::components;
use super::SnmpValue;
use crate::config::CredentialSet;
use crate::error::TransportError;

/// Запрос, полученный агентом
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Get(String),
    Walk(String),
}

impl Request {
    pub fn oid(&self) -> &str {
        match self {
            Self::Get(oid) | Self::Walk(oid) => oid,
        }
    }
}

/// Как агент отказывает на запрос
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Timeout,
    Error,
}

#[derive(Default)]
struct AgentState {
    objects: BTreeMap<Vec<u64>, SnmpValue>,
    failures: HashMap<String, Failure>,
    fail_all: Option<Failure>,
    panics: HashSet<String>,
    panic_all: bool,
    delay: Option<Duration>,
    stalls: HashMap<String, Duration>,
    requests: Vec<Request>,
    closes: usize,
}

/// SNMP агент в памяти. Клоны разделяют состояние.
#[derive(Clone, Default)]
pub struct MockAgent {
    state: Arc<Mutex<AgentState>>,
}

impl MockAgent {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, AgentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Объект агента; некорректный OID игнорируется
    pub fn set(self, oid: &str, value: SnmpValue) -> Self {
        if let Some(key) = components(oid) {
            self.state().objects.insert(key, value);
        }
        self
    }

    /// Колонка таблицы: `base.index = value`
    pub fn table<I>(self, base: &str, rows: I) -> Self
    where
        I: IntoIterator<Item = (u64, SnmpValue)>,
    {
        rows.into_iter().fold(self, |agent, (index, value)| {
            agent.set(&format!("{}.{}", base, index), value)
        })
    }

    /// Запрос к `oid` (GET или обход) заканчивается отказом
    pub fn fail(self, oid: &str, failure: Failure) -> Self {
        self.state().failures.insert(oid.to_string(), failure);
        self
    }

    /// Любой запрос заканчивается отказом
    pub fn fail_all(self, failure: Failure) -> Self {
        self.state().fail_all = Some(failure);
        self
    }

    /// Запрос к `oid` паникует
    pub fn panic_on(self, oid: &str) -> Self {
        self.state().panics.insert(oid.to_string());
        self
    }

    /// Любой запрос паникует: проверка, что сеть не трогали
    pub fn panic_always(self) -> Self {
        self.state().panic_all = true;
        self
    }

    /// Задержка перед каждым ответом
    pub fn delay(self, delay: Duration) -> Self {
        self.state().delay = Some(delay);
        self
    }

    /// Задержка ответа только на запросы к `oid`
    pub fn stall(self, oid: &str, delay: Duration) -> Self {
        self.state().stalls.insert(oid.to_string(), delay);
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state().requests.len()
    }

    /// Сколько раз закрывали сессии этого агента
    pub fn closes(&self) -> usize {
        self.state().closes
    }

    /// Записывает запрос и решает, как на него ответить
    fn accept(&self, host: &str, request: Request) -> Result<Option<Duration>, TransportError> {
        let mut state = self.state();
        let oid = request.oid().to_string();
        state.requests.push(request);

        if state.panic_all || state.panics.contains(&oid) {
            drop(state);
            panic!("mock agent: запрос {} запрещен", oid);
        }

        match state.fail_all.or_else(|| state.failures.get(&oid).copied()) {
            Some(Failure::Timeout) => Err(TransportError::Timeout {
                host: host.to_string(),
                oid,
            }),
            Some(Failure::Error) => Err(TransportError::Snmp {
                host: host.to_string(),
                message: format!("mock agent отказал на {}", oid),
            }),
            None => Ok(state.stalls.get(&oid).copied().or(state.delay)),
        }
    }

    fn lookup(&self, oid: &str) -> Option<SnmpValue> {
        let key = components(oid)?;
        self.state().objects.get(&key).cloned()
    }

    fn subtree(&self, oid: &str) -> WalkRows {
        let Some(base) = components(oid) else {
            return WalkRows::new();
        };
        self.state()
            .objects
            .range(base.clone()..)
            .take_while(|(key, _)| key.starts_with(&base))
            .filter(|(key, _)| key.len() > base.len())
            .map(|(key, value)| (dotted(key), value.clone()))
            .collect()
    }
}

fn dotted(nodes: &[u64]) -> String {
    nodes.iter().map(|node| format!(".{}", node)).collect()
}

/// Сессия с [`MockAgent`]. Без агента хост ведет себя как недоступный.
pub struct MockEngine {
    host: String,
    agent: Option<MockAgent>,
}

impl MockEngine {
    pub fn new(host: &str, agent: MockAgent) -> Self {
        Self {
            host: host.to_string(),
            agent: Some(agent),
        }
    }

    /// Движок, на все запросы отвечающий таймаутом
    pub fn unreachable(host: &str) -> Self {
        Self {
            host: host.to_string(),
            agent: None,
        }
    }

    async fn begin(&self, request: Request) -> Result<&MockAgent, TransportError> {
        let Some(agent) = &self.agent else {
            return Err(TransportError::Timeout {
                host: self.host.clone(),
                oid: request.oid().to_string(),
            });
        };
        if let Some(delay) = agent.accept(&self.host, request)? {
            tokio::time::sleep(delay).await;
        }
        Ok(agent)
    }
}

impl SnmpEngine for MockEngine {
    async fn get(&self, oid: &str) -> Result<SnmpValue, TransportError> {
        let agent = self.begin(Request::Get(oid.to_string())).await?;
        agent.lookup(oid).ok_or_else(|| TransportError::NoSuchObject {
            host: self.host.clone(),
            oid: oid.to_string(),
        })
    }

    async fn walk(&self, oid: &str) -> Result<WalkRows, TransportError> {
        let agent = self.begin(Request::Walk(oid.to_string())).await?;
        Ok(agent.subtree(oid))
    }

    async fn close(&self) {
        if let Some(agent) = &self.agent {
            agent.state().closes += 1;
        }
    }
}

#[derive(Default)]
struct ConnectorState {
    agents: HashMap<String, MockAgent>,
    refused: HashSet<String>,
    hangs: HashMap<String, usize>,
    attempts: Vec<String>,
}

/// Выдает сессии по имени группы учетных данных.
///
/// Группа без агента получает недоступный движок (таймауты), отклоненная
/// группа падает уже на подключении.
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<ConnectorState>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ConnectorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Учетные данные группы `group` принимает агент `agent`
    pub fn agent(self, group: &str, agent: MockAgent) -> Self {
        self.state().agents.insert(group.to_string(), agent);
        self
    }

    /// Подключение с данными группы не создается
    pub fn refuse(self, group: &str) -> Self {
        self.state().refused.insert(group.to_string());
        self
    }

    /// После `after` попыток подключения с данными группы новые попытки не завершаются
    pub fn hang_after(self, group: &str, after: usize) -> Self {
        self.state().hangs.insert(group.to_string(), after);
        self
    }

    /// Группы в порядке попыток подключения
    pub fn attempts(&self) -> Vec<String> {
        self.state().attempts.clone()
    }
}

impl SnmpConnector for MockConnector {
    type Engine = MockEngine;

    async fn connect(
        &self,
        hostname: &str,
        credentials: &CredentialSet,
    ) -> Result<MockEngine, TransportError> {
        let hangs = {
            let mut state = self.state();
            state.attempts.push(credentials.group.clone());
            let made = state
                .attempts
                .iter()
                .filter(|group| **group == credentials.group)
                .count();
            state
                .hangs
                .get(&credentials.group)
                .is_some_and(|after| made > *after)
        };
        if hangs {
            std::future::pending::<()>().await;
        }

        let state = self.state();
        if state.refused.contains(&credentials.group) {
            return Err(TransportError::Connect {
                host: hostname.to_string(),
                message: format!("mock: группа {} отклонена", credentials.group),
            });
        }

        Ok(match state.agents.get(&credentials.group) {
            Some(agent) => MockEngine::new(hostname, agent.clone()),
            None => MockEngine::unreachable(hostname),
        })
    }
}

/// Строковое значение для фикстур
pub fn text(value: &str) -> SnmpValue {
    SnmpValue::OctetString(value.as_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn walks_only_the_subtree() {
        let agent = MockAgent::new()
            .table(".1.3.6.1.2.1.2.2.1.2", [(1, text("Gi0/1")), (2, text("Gi0/2"))])
            .set(".1.3.6.1.2.1.2.2.1.20.1", SnmpValue::Unsigned(0))
            .set(".1.3.6.1.2.1.2.2.1.2", text("not a row"));
        let engine = MockEngine::new("sw1", agent.clone());

        let rows = engine.walk(".1.3.6.1.2.1.2.2.1.2").await.unwrap();
        let oids: Vec<&str> = rows.iter().map(|(oid, _)| oid.as_str()).collect();
        assert_eq!(oids, [".1.3.6.1.2.1.2.2.1.2.1", ".1.3.6.1.2.1.2.2.1.2.2"]);
        assert_eq!(agent.requests(), [Request::Walk(".1.3.6.1.2.1.2.2.1.2".into())]);
    }

    #[tokio::test]
    async fn injected_failures() {
        let agent = MockAgent::new()
            .set(".1.3.6.1.2.1.1.5.0", text("sw1"))
            .fail(".1.3.6.1.2.1.1.5.0", Failure::Timeout);
        let engine = MockEngine::new("sw1", agent);

        let err = engine.get(".1.3.6.1.2.1.1.5.0").await.unwrap_err();
        assert!(err.is_timeout());
        let err = engine.get(".1.3.6.1.2.1.1.6.0").await.unwrap_err();
        assert!(matches!(err, TransportError::NoSuchObject { .. }));
    }

    #[tokio::test]
    async fn connector_routes_by_group() {
        let connector = MockConnector::new()
            .agent("campus", MockAgent::new())
            .refuse("legacy");

        let legacy = CredentialSet::v2c("legacy", "old");
        let campus = CredentialSet::v2c("campus", "public");
        let other = CredentialSet::v2c("other", "x");

        assert!(connector.connect("sw1", &legacy).await.is_err());
        assert!(connector.connect("sw1", &campus).await.is_ok());
        let unreachable = connector.connect("sw1", &other).await.unwrap();
        assert!(unreachable.get(".1.3.6.1.2.1.1.2.0").await.unwrap_err().is_timeout());
        assert_eq!(connector.attempts(), ["legacy", "campus", "other"]);
    }
}
