use snmp2::v3::{Auth, AuthProtocol, Cipher, Security};
use snmp2::{AsyncSession, Oid, Value};
use std::fmt::Display;
use std::net::Ipv4Addr;
use tokio::sync::Mutex;
use tokio::time::timeout;

use super::engine::{SnmpConnector, SnmpEngine, WalkRows};
use super::{SnmpValue, parse_oid};
use crate::config::{ConnectionSettings, CredentialSet, SnmpVersion};
use crate::error::TransportError;
use crate::log;

/// max-repetitions для GETBULK
const MAX_REPETITIONS: u32 = 25;
/// Больше строк за один обход не собираем
const MAX_WALK_ROWS: usize = 10_000;

/// Создает сессии snmp2 для v1, v2c и v3
#[derive(Debug, Clone, Default)]
pub struct Snmp2Connector {
    settings: ConnectionSettings,
}

impl Snmp2Connector {
    pub fn new(settings: ConnectionSettings) -> Self {
        Self { settings }
    }
}

impl SnmpConnector for Snmp2Connector {
    type Engine = Snmp2Engine;

    async fn connect(
        &self,
        hostname: &str,
        credentials: &CredentialSet,
    ) -> Result<Snmp2Engine, TransportError> {
        let target = target_addr(hostname, credentials.port);
        let community = credentials.community().as_bytes();

        let session = match credentials.version {
            SnmpVersion::V1 => AsyncSession::new_v1(target.as_str(), community, 0)
                .await
                .map_err(|e| connect_error(hostname, e))?,
            SnmpVersion::V2c => AsyncSession::new_v2c(target.as_str(), community, 0)
                .await
                .map_err(|e| connect_error(hostname, e))?,
            SnmpVersion::V3 => {
                let mut session = AsyncSession::new_v3(target.as_str(), 0, security(credentials))
                    .await
                    .map_err(|e| connect_error(hostname, e))?;
                // Discovery engine ID и времени агента
                session.init().await.map_err(|e| connect_error(hostname, e))?;
                session
            }
        };

        Ok(Snmp2Engine {
            host: hostname.to_string(),
            version: credentials.version,
            settings: self.settings.clone(),
            session: Mutex::new(Some(session)),
        })
    }
}

/// Сессия snmp2 с одним агентом
pub struct Snmp2Engine {
    host: String,
    version: SnmpVersion,
    settings: ConnectionSettings,
    session: Mutex<Option<AsyncSession>>,
}

/// Варбинд, уже не зависящий от буфера ответа
enum Varbind {
    Row(Oid<'static>, SnmpValue),
    Empty(Oid<'static>),
    EndOfView,
}

impl Varbind {
    fn from_pair((oid, value): (Oid<'_>, Value<'_>)) -> Self {
        match value {
            Value::EndOfMibView => Self::EndOfView,
            other => match convert(&other) {
                Some(value) => Self::Row(oid.to_owned(), value),
                None => Self::Empty(oid.to_owned()),
            },
        }
    }
}

impl SnmpEngine for Snmp2Engine {
    async fn get(&self, oid: &str) -> Result<SnmpValue, TransportError> {
        let request = self.parse(oid)?;
        let mut guard = self.session.lock().await;
        let session = guard.as_mut().ok_or_else(|| self.closed())?;

        let mut attempt = 0;
        loop {
            match timeout(self.settings.get_timeout(), session.get(&request)).await {
                Ok(Ok(pdu)) if pdu.error_status != 0 => {
                    return Err(TransportError::Snmp {
                        host: self.host.clone(),
                        message: format!("error-status {} для {}", pdu.error_status, oid),
                    });
                }
                Ok(Ok(pdu)) => {
                    let (_, value) =
                        pdu.varbinds
                            .into_iter()
                            .next()
                            .ok_or_else(|| TransportError::EmptyResponse {
                                host: self.host.clone(),
                                oid: oid.to_string(),
                            })?;

                    return match value {
                        Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView => {
                            Err(TransportError::NoSuchObject {
                                host: self.host.clone(),
                                oid: oid.to_string(),
                            })
                        }
                        other => convert(&other).ok_or_else(|| TransportError::Snmp {
                            host: self.host.clone(),
                            message: format!("неподдерживаемый тип значения для {}", oid),
                        }),
                    };
                }
                Ok(Err(e)) => return Err(self.snmp_error(e)),
                Err(_) if attempt < self.settings.retries => attempt += 1,
                Err(_) => return Err(self.timeout_error(oid)),
            }
        }
    }

    async fn walk(&self, oid: &str) -> Result<WalkRows, TransportError> {
        let base = self.parse(oid)?;
        let mut guard = self.session.lock().await;
        let session = guard.as_mut().ok_or_else(|| self.closed())?;

        if self.version == SnmpVersion::V1 {
            return self.walk_next(session, &base, oid).await;
        }

        let bulk = timeout(
            self.settings.get_bulk_walk_timeout(),
            self.walk_bulk(session, &base, oid),
        )
        .await;

        match bulk {
            Ok(result) => result,
            Err(_) => {
                tracing::info!(
                    code = log::BULK_WALK_TIMEOUT,
                    host = %self.host,
                    oid,
                    "таймаут GETBULK обхода, повтор через GETNEXT"
                );
                self.walk_next(session, &base, oid).await
            }
        }
    }

    async fn close(&self) {
        let mut guard = self.session.lock().await;
        if guard.take().is_some() {
            tracing::debug!(host = %self.host, "SNMP сессия закрыта");
        }
    }
}

impl Snmp2Engine {
    /// Обход через GETBULK (v2c/v3)
    async fn walk_bulk(
        &self,
        session: &mut AsyncSession,
        base: &Oid<'static>,
        oid: &str,
    ) -> Result<WalkRows, TransportError> {
        let mut rows = WalkRows::new();
        let mut current = base.clone();

        loop {
            let batch = self.request_bulk(session, &current, oid).await?;
            if !self.advance(batch, base, &mut current, &mut rows) {
                return Ok(rows);
            }
            if self.over_limit(&rows, oid) {
                return Ok(rows);
            }
        }
    }

    /// Обход через GETNEXT (v1 и запасной вариант)
    async fn walk_next(
        &self,
        session: &mut AsyncSession,
        base: &Oid<'static>,
        oid: &str,
    ) -> Result<WalkRows, TransportError> {
        let mut rows = WalkRows::new();
        let mut current = base.clone();

        loop {
            let batch = self.request_next(session, &current, oid).await?;
            if !self.advance(batch, base, &mut current, &mut rows) {
                return Ok(rows);
            }
            if self.over_limit(&rows, oid) {
                return Ok(rows);
            }
        }
    }

    /// Добавляет строки пачки; false - обход закончен
    fn advance(
        &self,
        batch: Vec<Varbind>,
        base: &Oid<'static>,
        current: &mut Oid<'static>,
        rows: &mut WalkRows,
    ) -> bool {
        let mut advanced = false;

        for varbind in batch {
            let (oid, value) = match varbind {
                Varbind::EndOfView => return false,
                Varbind::Row(oid, value) => (oid, Some(value)),
                Varbind::Empty(oid) => (oid, None),
            };

            // Вышли за поддерево или агент зациклился
            if !oid.starts_with(base) || oid == *current {
                return false;
            }

            if let Some(value) = value {
                rows.push((dotted(&oid), value));
            }
            *current = oid;
            advanced = true;
        }

        advanced
    }

    fn over_limit(&self, rows: &WalkRows, oid: &str) -> bool {
        if rows.len() < MAX_WALK_ROWS {
            return false;
        }
        tracing::warn!(
            code = log::WALK_LIMIT,
            host = %self.host,
            oid,
            rows = rows.len(),
            "обход остановлен по лимиту строк"
        );
        true
    }

    async fn request_bulk(
        &self,
        session: &mut AsyncSession,
        current: &Oid<'static>,
        oid: &str,
    ) -> Result<Vec<Varbind>, TransportError> {
        let mut attempt = 0;
        loop {
            let walk_timeout = self.settings.get_walk_timeout();
            match timeout(walk_timeout, session.getbulk(&[current], 0, MAX_REPETITIONS)).await {
                Ok(Ok(pdu)) if pdu.error_status != 0 => return Ok(vec![Varbind::EndOfView]),
                Ok(Ok(pdu)) => return Ok(pdu.varbinds.map(Varbind::from_pair).collect()),
                Ok(Err(e)) => return Err(self.snmp_error(e)),
                Err(_) if attempt < self.settings.walk_retries => attempt += 1,
                Err(_) => return Err(self.timeout_error(oid)),
            }
        }
    }

    async fn request_next(
        &self,
        session: &mut AsyncSession,
        current: &Oid<'static>,
        oid: &str,
    ) -> Result<Vec<Varbind>, TransportError> {
        let mut attempt = 0;
        loop {
            match timeout(self.settings.get_walk_timeout(), session.getnext(current)).await {
                // noSuchName в v1 означает конец MIB
                Ok(Ok(pdu)) if pdu.error_status != 0 => return Ok(vec![Varbind::EndOfView]),
                Ok(Ok(pdu)) => return Ok(pdu.varbinds.map(Varbind::from_pair).collect()),
                Ok(Err(e)) => return Err(self.snmp_error(e)),
                Err(_) if attempt < self.settings.walk_retries => attempt += 1,
                Err(_) => return Err(self.timeout_error(oid)),
            }
        }
    }

    fn parse(&self, oid: &str) -> Result<Oid<'static>, TransportError> {
        parse_oid(oid).map_err(|_| TransportError::InvalidOid {
            oid: oid.to_string(),
        })
    }

    fn closed(&self) -> TransportError {
        TransportError::Closed {
            host: self.host.clone(),
        }
    }

    fn snmp_error(&self, e: impl Display) -> TransportError {
        TransportError::Snmp {
            host: self.host.clone(),
            message: e.to_string(),
        }
    }

    fn timeout_error(&self, oid: &str) -> TransportError {
        TransportError::Timeout {
            host: self.host.clone(),
            oid: oid.to_string(),
        }
    }
}

fn connect_error(hostname: &str, e: impl Display) -> TransportError {
    TransportError::Connect {
        host: hostname.to_string(),
        message: e.to_string(),
    }
}

fn target_addr(hostname: &str, port: u16) -> String {
    if hostname.contains(':') && !hostname.starts_with('[') {
        format!("[{}]:{}", hostname, port)
    } else {
        format!("{}:{}", hostname, port)
    }
}

fn dotted(oid: &Oid<'_>) -> String {
    format!(".{}", oid.to_id_string())
}

/// Переводит значение snmp2 в собственный тип
fn convert(value: &Value<'_>) -> Option<SnmpValue> {
    match value {
        Value::Integer(v) => Some(SnmpValue::Integer(*v)),
        Value::Counter32(v) | Value::Unsigned32(v) | Value::Timeticks(v) => {
            Some(SnmpValue::Unsigned(u64::from(*v)))
        }
        Value::Counter64(v) => Some(SnmpValue::Unsigned(*v)),
        Value::OctetString(bytes) | Value::Opaque(bytes) => {
            Some(SnmpValue::OctetString(bytes.to_vec()))
        }
        Value::ObjectIdentifier(oid) => Some(SnmpValue::ObjectId(dotted(oid))),
        Value::IpAddress(octets) => Some(SnmpValue::IpAddress(Ipv4Addr::from(*octets))),
        _ => None,
    }
}

fn security(credentials: &CredentialSet) -> Security {
    let username = credentials.secname.as_deref().unwrap_or_default();
    let auth_password = credentials.authpassword.as_deref().unwrap_or_default();
    let security = Security::new(username.as_bytes(), auth_password.as_bytes());

    let Some(auth_protocol) = auth_protocol(credentials) else {
        return security.with_auth(Auth::NoAuthNoPriv);
    };
    let security = security.with_auth_protocol(auth_protocol);

    // Шифрование без аутентификации невозможно
    match privacy_cipher(credentials) {
        Some(cipher) => security.with_auth(Auth::AuthPriv {
            cipher,
            privacy_password: credentials
                .privpassword
                .clone()
                .unwrap_or_default()
                .into_bytes(),
        }),
        None => security.with_auth(Auth::AuthNoPriv),
    }
}

fn auth_protocol(credentials: &CredentialSet) -> Option<AuthProtocol> {
    let name = credentials.authprotocol.as_deref()?.to_ascii_lowercase();
    match name.as_str() {
        "" => None,
        "md5" => Some(AuthProtocol::Md5),
        "sha" | "sha1" => Some(AuthProtocol::Sha1),
        "sha224" => Some(AuthProtocol::Sha224),
        "sha256" => Some(AuthProtocol::Sha256),
        "sha384" => Some(AuthProtocol::Sha384),
        "sha512" => Some(AuthProtocol::Sha512),
        other => {
            tracing::warn!(
                code = log::UNKNOWN_PROTOCOL,
                group = %credentials.group,
                protocol = other,
                "неизвестный протокол аутентификации, оставлен пустым"
            );
            None
        }
    }
}

fn privacy_cipher(credentials: &CredentialSet) -> Option<Cipher> {
    let name = credentials.privprotocol.as_deref()?.to_ascii_lowercase();
    match name.as_str() {
        "" => None,
        "des" => Some(Cipher::Des),
        "aes" | "aes128" => Some(Cipher::Aes128),
        "aes192" => Some(Cipher::Aes192),
        "aes256" => Some(Cipher::Aes256),
        other => {
            tracing::warn!(
                code = log::UNKNOWN_PROTOCOL,
                group = %credentials.group,
                protocol = other,
                "неизвестный протокол шифрования, оставлен пустым"
            );
            None
        }
    }
}
