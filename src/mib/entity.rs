use std::collections::BTreeSet;

use crate::collector::{FactGroup, FactValue};
use crate::log;
use crate::snmp::{OidIndex, SnmpEngine, TransportSession};

use super::{FactFanOut, MibQuery, Producer, QueryDescriptor, QueryTag, table_fact, text_fact};

const fn column(name: &'static str, oid: &'static str) -> Producer {
    Producer {
        name,
        oid,
        code: log::FACT_FAILED,
    }
}

pub const DESCR: Producer = column("entPhysicalDescr", ".1.3.6.1.2.1.47.1.1.1.1.2");
pub const CLASS: Producer = column("entPhysicalClass", ".1.3.6.1.2.1.47.1.1.1.1.5");
pub const NAME: Producer = column("entPhysicalName", ".1.3.6.1.2.1.47.1.1.1.1.7");
pub const HARDWARE_REV: Producer = column("entPhysicalHardwareRev", ".1.3.6.1.2.1.47.1.1.1.1.8");
pub const FIRMWARE_REV: Producer = column("entPhysicalFirmwareRev", ".1.3.6.1.2.1.47.1.1.1.1.9");
pub const SOFTWARE_REV: Producer = column("entPhysicalSoftwareRev", ".1.3.6.1.2.1.47.1.1.1.1.10");
pub const SERIAL_NUM: Producer = column("entPhysicalSerialNum", ".1.3.6.1.2.1.47.1.1.1.1.11");
pub const MODEL_NAME: Producer = column("entPhysicalModelName", ".1.3.6.1.2.1.47.1.1.1.1.13");

pub static DESCRIPTOR: QueryDescriptor = QueryDescriptor {
    group: "ENTITY-MIB",
    test_oid: ".1.3.6.1.2.1.47.1.1.1.1.7",
    tags: &[QueryTag::System],
    vendor: None,
    fault_code: log::SYSTEM_FAULT,
    producers: &[
        DESCR,
        CLASS,
        NAME,
        HARDWARE_REV,
        FIRMWARE_REV,
        SOFTWARE_REV,
        SERIAL_NUM,
        MODEL_NAME,
    ],
};

/// Физические компоненты шасси (entPhysicalTable)
pub struct EntityQuery<E> {
    session: TransportSession<E>,
}

impl<E: SnmpEngine> EntityQuery<E> {
    pub fn new(session: TransportSession<E>) -> Self {
        Self { session }
    }

    /// Колонка entPhysicalTable по entPhysicalIndex
    pub async fn column(&self, producer: &Producer) -> Option<FactValue> {
        // entPhysicalClass - перечисление, остальные колонки текстовые
        if producer.name == CLASS.name {
            table_fact(&self.session, producer).await
        } else {
            text_fact(&self.session, producer).await
        }
    }
}

/// Оставляет только компоненты с серийным номером.
///
/// Без колонки серийных номеров фильтровать не по чему, и строки
/// остаются как есть.
pub fn keep_serialized(facts: &mut FactGroup) {
    let Some(serials) = facts.get(SERIAL_NUM.name).and_then(FactValue::as_table) else {
        return;
    };
    let serialized: BTreeSet<OidIndex> = serials
        .iter()
        .filter(|(_, serial)| !serial.is_empty())
        .map(|(index, _)| index.clone())
        .collect();

    facts.retain(|_, fact| match fact {
        FactValue::Table(table) => {
            table.retain(|index, _| serialized.contains(index));
            !table.is_empty()
        }
        FactValue::Scalar(_) | FactValue::Members(_) => true,
    });
}

impl<E: SnmpEngine> MibQuery<E> for EntityQuery<E> {
    fn descriptor(&self) -> &'static QueryDescriptor {
        &DESCRIPTOR
    }

    fn session(&self) -> &TransportSession<E> {
        &self.session
    }

    async fn query(&self) -> FactGroup {
        let mut fan_out = FactFanOut::new(self.session.hostname(), &DESCRIPTOR);
        for producer in DESCRIPTOR.producers {
            let query = Self::new(self.session.clone());
            fan_out.spawn(producer.name, async move { query.column(producer).await });
        }

        let mut facts = fan_out.collect().await;
        keep_serialized(&mut facts);
        facts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CredentialSet;
    use crate::snmp::SnmpValue;
    use crate::snmp::mock::{Failure, MockAgent, MockEngine, text};

    fn chassis() -> MockAgent {
        MockAgent::new()
            .table(NAME.oid, [(1, text("Chassis ")), (2, text("Fan 1")), (3, text("PSU 0"))])
            .table(SERIAL_NUM.oid, [(1, text(" FOC1234X ")), (2, text("")), (3, text("LIT99"))])
            .table(CLASS.oid, [(1, SnmpValue::Integer(3)), (2, SnmpValue::Integer(7)), (3, SnmpValue::Integer(6))])
            .table(MODEL_NAME.oid, [(1, text("WS-C3850-48P")), (2, text("")), (3, text("PWR-C1"))])
    }

    fn session(agent: MockAgent) -> TransportSession<MockEngine> {
        TransportSession::new("sw1", CredentialSet::v2c("campus", "public"), MockEngine::new("sw1", agent))
    }

    #[tokio::test]
    async fn keeps_components_with_serials() {
        let facts = EntityQuery::new(session(chassis())).query().await;

        let serials = facts[SERIAL_NUM.name].as_table().unwrap();
        let indices: Vec<u64> = serials.keys().filter_map(OidIndex::as_single).collect();
        assert_eq!(indices, [1, 3]);
        assert_eq!(serials[&OidIndex::single(1)], text("FOC1234X"));

        let names = facts[NAME.name].as_table().unwrap();
        assert_eq!(names[&OidIndex::single(1)], text("Chassis"));
        assert!(!names.contains_key(&OidIndex::single(2)));
        assert_eq!(facts[CLASS.name].as_table().unwrap()[&OidIndex::single(3)], SnmpValue::Integer(6));
        // Колонок ревизий и описаний у агента нет
        assert!(!facts.contains_key(DESCR.name));
        assert!(!facts.contains_key(SOFTWARE_REV.name));
    }

    #[tokio::test]
    async fn serial_failure_leaves_rows_unfiltered() {
        let agent = chassis().fail(SERIAL_NUM.oid, Failure::Error);
        let facts = EntityQuery::new(session(agent)).query().await;

        assert!(!facts.contains_key(SERIAL_NUM.name));
        assert_eq!(facts[NAME.name].as_table().unwrap().len(), 3);
    }
}
