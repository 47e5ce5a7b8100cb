use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::engine::SnmpEngine;
use super::oid::{OidIndex, OidTable, components, is_valid_oid};
use super::SnmpValue;
use crate::config::CredentialSet;
use crate::error::TransportError;
use crate::log;

/// sysObjectID.0
pub const SYS_OBJECT_ID: &str = ".1.3.6.1.2.1.1.2.0";

struct Inner<E> {
    hostname: String,
    credentials: CredentialSet,
    engine: E,
    closed: AtomicBool,
}

/// Живая SNMP сессия с одним хостом и проверенными учетными данными.
///
/// Клоны разделяют один движок: их получают задачи одного опроса, и
/// ни один клон не переживает [`Poll`](crate::poller::Poll).
pub struct TransportSession<E> {
    inner: Arc<Inner<E>>,
}

impl<E> Clone for TransportSession<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: SnmpEngine> TransportSession<E> {
    pub fn new(hostname: impl Into<String>, credentials: CredentialSet, engine: E) -> Self {
        Self {
            inner: Arc::new(Inner {
                hostname: hostname.into(),
                credentials,
                engine,
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn hostname(&self) -> &str {
        &self.inner.hostname
    }

    pub fn credentials(&self) -> &CredentialSet {
        &self.inner.credentials
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// SNMP GET одного значения
    pub async fn get(&self, oid: &str) -> Result<SnmpValue, TransportError> {
        self.check(oid)?;
        self.inner.engine.get(oid).await
    }

    /// Обход поддерева `oid`.
    ///
    /// При `normalized` ключ строки - последний узел OID, иначе весь суффикс
    /// после `oid`. Строки вне поддерева отбрасываются.
    pub async fn walk(&self, oid: &str, normalized: bool) -> Result<OidTable, TransportError> {
        self.check(oid)?;
        let Some(base) = components(oid) else {
            return Err(self.invalid(oid));
        };

        let rows = self.inner.engine.walk(oid).await?;

        let mut table = OidTable::new();
        for (row_oid, value) in rows {
            let Some(nodes) = components(&row_oid) else {
                continue;
            };
            if nodes.len() <= base.len() || !nodes.starts_with(&base) {
                continue;
            }

            let suffix = &nodes[base.len()..];
            let index = match suffix.last() {
                Some(last) if normalized => OidIndex::single(*last),
                _ => OidIndex::new(suffix.to_vec()),
            };
            table.insert(index, value);
        }

        Ok(table)
    }

    /// sysObjectID хоста с ведущей точкой; пустой ответ - None
    pub async fn sysobjectid(&self) -> Result<Option<String>, TransportError> {
        let value = self.get(SYS_OBJECT_ID).await?;
        if value.is_empty() {
            return Ok(None);
        }

        Ok(value.as_text().map(|text| {
            if text.starts_with('.') {
                text
            } else {
                format!(".{}", text)
            }
        }))
    }

    /// Закрывает сессию; повторный вызов ничего не делает
    pub async fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.engine.close().await;
        tracing::debug!(host = %self.inner.hostname, "транспорт закрыт");
    }

    fn check(&self, oid: &str) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed {
                host: self.inner.hostname.clone(),
            });
        }
        if !is_valid_oid(oid) {
            return Err(self.invalid(oid));
        }
        Ok(())
    }

    fn invalid(&self, oid: &str) -> TransportError {
        tracing::warn!(
            code = log::INVALID_OID,
            host = %self.inner.hostname,
            oid,
            "OID в неверном формате"
        );
        TransportError::InvalidOid {
            oid: oid.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snmp::mock::{MockAgent, MockEngine, text};

    const LLDP_SYS_NAME: &str = ".1.0.8802.1.1.2.1.4.1.1.9";

    fn session(agent: MockAgent) -> TransportSession<MockEngine> {
        TransportSession::new(
            "sw1",
            CredentialSet::v2c("campus", "public"),
            MockEngine::new("sw1", agent),
        )
    }

    fn lldp_agent() -> MockAgent {
        MockAgent::new()
            .set(".1.0.8802.1.1.2.1.4.1.1.9.0.12.1", text("core-1"))
            .set(".1.0.8802.1.1.2.1.4.1.1.9.0.14.3", text("core-2"))
            .set(".1.0.8802.1.1.2.1.4.1.1.10.0.12.1", text("outside"))
    }

    #[tokio::test]
    async fn walk_keeps_full_suffix() {
        let table = session(lldp_agent()).walk(LLDP_SYS_NAME, false).await.unwrap();
        let keys: Vec<String> = table.keys().map(ToString::to_string).collect();
        assert_eq!(keys, ["0.12.1", "0.14.3"]);
    }

    #[tokio::test]
    async fn normalized_walk_keys_by_last_node() {
        let table = session(lldp_agent()).walk(LLDP_SYS_NAME, true).await.unwrap();
        assert_eq!(table.get(&OidIndex::single(1)), Some(&text("core-1")));
        assert_eq!(table.get(&OidIndex::single(3)), Some(&text("core-2")));
        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn rejects_malformed_oid_without_io() {
        let agent = MockAgent::new().panic_always();
        let session = session(agent.clone());

        let err = session.get("1.3.6.1.2.1.1.5.0").await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidOid { .. }));
        assert!(session.walk(".1.3.6.", true).await.is_err());
        assert_eq!(agent.request_count(), 0);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let agent = MockAgent::new().set(SYS_OBJECT_ID, SnmpValue::ObjectId(".1.3.6.1.4.1.9.1.1".into()));
        let session = session(agent.clone());

        assert_eq!(
            session.sysobjectid().await.unwrap().as_deref(),
            Some(".1.3.6.1.4.1.9.1.1")
        );

        session.clone().close().await;
        session.close().await;
        assert_eq!(agent.closes(), 1);
        assert!(matches!(
            session.get(SYS_OBJECT_ID).await,
            Err(TransportError::Closed { .. })
        ));
    }
}
