//! Граница между поллером и SNMP движком.
//!
//! Поллер работает только через эти трейты: в продакшене их реализует
//! [`Snmp2Connector`](super::Snmp2Connector), в тестах `snmp::mock::MockConnector`
//! (фича `testing`).

use std::future::Future;

use super::SnmpValue;
use crate::config::CredentialSet;
use crate::error::TransportError;

/// Строки обхода: полный OID с ведущей точкой и значение
pub type WalkRows = Vec<(String, SnmpValue)>;

/// Живая сессия с одним агентом.
///
/// Запросы к одной сессии движок сериализует сам, поэтому методы принимают
/// `&self` и сессию можно отдать нескольким задачам одного опроса.
pub trait SnmpEngine: Send + Sync + 'static {
    /// SNMP GET одного скаляра
    fn get(&self, oid: &str) -> impl Future<Output = Result<SnmpValue, TransportError>> + Send;

    /// Все OID под поддеревом `oid`
    fn walk(&self, oid: &str) -> impl Future<Output = Result<WalkRows, TransportError>> + Send;

    /// Освобождает ресурсы сессии. Повторный вызов ничего не делает.
    fn close(&self) -> impl Future<Output = ()> + Send;
}

/// Фабрика сессий для пары хост + учетные данные
pub trait SnmpConnector: Send + Sync {
    type Engine: SnmpEngine;

    fn connect(
        &self,
        hostname: &str,
        credentials: &CredentialSet,
    ) -> impl Future<Output = Result<Self::Engine, TransportError>> + Send;
}
