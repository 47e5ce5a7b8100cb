use thiserror::Error;

/// Ошибки обращения к SNMP агенту
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("невалидный OID: {oid}")]
    InvalidOid { oid: String },

    #[error("таймаут SNMP запроса к {host} ({oid})")]
    Timeout { host: String, oid: String },

    #[error("не удалось создать SNMP сессию с {host}: {message}")]
    Connect { host: String, message: String },

    #[error("SNMP ошибка от {host}: {message}")]
    Snmp { host: String, message: String },

    #[error("объект {oid} отсутствует на {host}")]
    NoSuchObject { host: String, oid: String },

    #[error("SNMP ответ от {host} пустой ({oid})")]
    EmptyResponse { host: String, oid: String },

    #[error("SNMP сессия с {host} закрыта")]
    Closed { host: String },
}

impl TransportError {
    /// Ошибка означает, что агент не ответил вовремя
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
