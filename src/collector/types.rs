use serde::Serialize;
use std::collections::BTreeMap;

use crate::snmp::{OidIndex, OidTable, SnmpValue};

/// Набор номеров по индексу, например VLAN, разрешенные на транке
pub type MemberTable = BTreeMap<OidIndex, Vec<u64>>;

/// Значение одного факта: скаляр или таблица по индексу
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FactValue {
    Scalar(SnmpValue),
    Table(OidTable),
    Members(MemberTable),
}

impl FactValue {
    pub fn as_scalar(&self) -> Option<&SnmpValue> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&OidTable> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_members(&self) -> Option<&MemberTable> {
        match self {
            Self::Members(members) => Some(members),
            _ => None,
        }
    }
}

/// Факты одной MIB: имя факта -> значение
pub type FactGroup = BTreeMap<String, FactValue>;

/// Документ опроса хоста: MIB -> факт -> значение.
///
/// Ключи есть только у фактов, которые удалось получить.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FactDocument(BTreeMap<String, FactGroup>);

impl FactDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Добавляет группу; пустые группы не попадают в документ
    pub fn insert(&mut self, group: &str, facts: FactGroup) {
        if facts.is_empty() {
            return;
        }
        self.0.entry(group.to_string()).or_default().extend(facts);
    }

    pub fn merge(&mut self, other: FactDocument) {
        for (group, facts) in other.0 {
            self.insert(&group, facts);
        }
    }

    pub fn group(&self, group: &str) -> Option<&FactGroup> {
        self.0.get(group)
    }

    pub fn get(&self, group: &str, fact: &str) -> Option<&FactValue> {
        self.0.get(group)?.get(fact)
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Количество фактов во всех группах
    pub fn fact_count(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_nested_mapping() {
        let mut facts = FactGroup::new();
        facts.insert("ciscoMemoryPoolUsed".into(), FactValue::Scalar(SnmpValue::Unsigned(600)));
        let mut cpu = OidTable::new();
        cpu.insert(OidIndex::single(1), SnmpValue::Unsigned(7));
        facts.insert("cpmCPUTotal5minRev".into(), FactValue::Table(cpu));

        let mut doc = FactDocument::new();
        doc.insert("CISCO-PROCESS-MIB", facts);

        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(
            json,
            r#"{"CISCO-PROCESS-MIB":{"ciscoMemoryPoolUsed":600,"cpmCPUTotal5minRev":{"1":7}}}"#
        );
    }

    #[test]
    fn members_serialize_as_lists() {
        let mut trunks = MemberTable::new();
        trunks.insert(OidIndex::single(10101), vec![1, 10, 20]);
        let json = serde_json::to_string(&FactValue::Members(trunks)).unwrap();
        assert_eq!(json, r#"{"10101":[1,10,20]}"#);
    }

    #[test]
    fn empty_groups_are_skipped() {
        let mut doc = FactDocument::new();
        doc.insert("LLDP-MIB", FactGroup::new());
        assert!(doc.is_empty());
        assert_eq!(doc.fact_count(), 0);
    }
}
