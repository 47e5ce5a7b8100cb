use anyhow::{Context, Result};
use serde::{Serialize, Serializer};
use snmp2::Oid;
use std::collections::BTreeMap;
use std::fmt;

use super::SnmpValue;

/// Результат обхода: индекс строки -> значение
pub type OidTable = BTreeMap<OidIndex, SnmpValue>;

/// Парсит строку OID в объект Oid
pub fn parse_oid(s: &str) -> Result<Oid<'static>> {
    let parts = components(s).context(format!("Невалидный OID: {}", s))?;
    Oid::from(&parts).map_err(|e| anyhow::anyhow!("Не удалось создать Oid: {:?}", e))
}

/// Проверяет формат OID: ведущая точка, только числовые узлы
pub fn is_valid_oid(oid: &str) -> bool {
    let Some(rest) = oid.strip_prefix('.') else {
        return false;
    };
    !rest.is_empty()
        && rest
            .split('.')
            .all(|node| !node.is_empty() && node.bytes().all(|b| b.is_ascii_digit()))
}

/// Узлы OID без ведущей точки
pub fn components(oid: &str) -> Option<Vec<u64>> {
    let trimmed = oid.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    trimmed.split('.').map(|node| node.parse::<u64>().ok()).collect()
}

/// Лежит ли `oid` внутри поддерева `base` (по границе узлов)
pub fn is_under(base: &str, oid: &str) -> bool {
    match (components(base), components(oid)) {
        (Some(base), Some(oid)) => oid.starts_with(&base),
        _ => false,
    }
}

/// Индекс строки таблицы: один или несколько узлов после базового OID
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OidIndex(Vec<u64>);

impl OidIndex {
    pub fn new(nodes: Vec<u64>) -> Self {
        Self(nodes)
    }

    pub fn single(node: u64) -> Self {
        Self(vec![node])
    }

    pub fn nodes(&self) -> &[u64] {
        &self.0
    }

    /// Значение индекса, если он состоит из одного узла
    pub fn as_single(&self) -> Option<u64> {
        match self.0.as_slice() {
            [node] => Some(*node),
            _ => None,
        }
    }

    pub fn last(&self) -> Option<u64> {
        self.0.last().copied()
    }

    pub fn penultimate(&self) -> Option<u64> {
        self.0.len().checked_sub(2).map(|i| self.0[i])
    }
}

impl From<u64> for OidIndex {
    fn from(node: u64) -> Self {
        Self::single(node)
    }
}

impl fmt::Display for OidIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes: Vec<String> = self.0.iter().map(u64::to_string).collect();
        f.write_str(&nodes.join("."))
    }
}

// Ключи JSON объектов обязаны быть строками
impl Serialize for OidIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
