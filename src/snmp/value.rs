use serde::{Serialize, Serializer};
use std::fmt;
use std::net::Ipv4Addr;

/// Значение, полученное от агента.
///
/// `noSuchObject`, `noSuchInstance` и `endOfMibView` сюда не попадают:
/// GET на них возвращает ошибку, а обход их пропускает.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnmpValue {
    Integer(i64),
    /// Counter32/64, Gauge32, TimeTicks и Unsigned32
    Unsigned(u64),
    OctetString(Vec<u8>),
    /// OID с ведущей точкой
    ObjectId(String),
    IpAddress(Ipv4Addr),
}

impl SnmpValue {
    /// Целое неотрицательное значение, если оно есть
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Integer(v) => u64::try_from(*v).ok(),
            Self::Unsigned(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Unsigned(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::OctetString(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Текстовое представление строковых значений
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::OctetString(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            Self::ObjectId(oid) => Some(oid.clone()),
            _ => None,
        }
    }

    /// Пустая строка или пустой OID: агент ответил, но данных нет
    pub fn is_empty(&self) -> bool {
        match self {
            Self::OctetString(bytes) => bytes.is_empty(),
            Self::ObjectId(oid) => oid.trim_start_matches('.').is_empty(),
            _ => false,
        }
    }

    /// Строка с обрезанными пробелами по краям
    pub fn trimmed_text(&self) -> Option<SnmpValue> {
        self.as_text()
            .map(|text| Self::OctetString(text.trim().as_bytes().to_vec()))
    }
}

impl fmt::Display for SnmpValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Unsigned(v) => write!(f, "{v}"),
            Self::OctetString(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => f.write_str(text),
                Err(_) => {
                    let hex: Vec<String> = bytes.iter().map(|b| format!("{b:02x}")).collect();
                    f.write_str(&hex.join(":"))
                }
            },
            Self::ObjectId(oid) => f.write_str(oid),
            Self::IpAddress(addr) => write!(f, "{addr}"),
        }
    }
}

impl Serialize for SnmpValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Integer(v) => serializer.serialize_i64(*v),
            Self::Unsigned(v) => serializer.serialize_u64(*v),
            other => serializer.collect_str(other),
        }
    }
}
