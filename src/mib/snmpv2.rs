use crate::collector::{FactGroup, FactValue};
use crate::log;
use crate::snmp::{SnmpEngine, TransportSession};

use super::{FactFanOut, MibQuery, Producer, QueryDescriptor, QueryTag, fetch_scalar};

const fn system(name: &'static str, oid: &'static str) -> Producer {
    Producer {
        name,
        oid,
        code: log::FACT_FAILED,
    }
}

pub const SYS_DESCR: Producer = system("sysDescr", ".1.3.6.1.2.1.1.1.0");
pub const SYS_OBJECT_ID: Producer = system("sysObjectID", ".1.3.6.1.2.1.1.2.0");
pub const SYS_UPTIME: Producer = system("sysUpTime", ".1.3.6.1.2.1.1.3.0");
pub const SYS_CONTACT: Producer = system("sysContact", ".1.3.6.1.2.1.1.4.0");
pub const SYS_NAME: Producer = system("sysName", ".1.3.6.1.2.1.1.5.0");
pub const SYS_LOCATION: Producer = system("sysLocation", ".1.3.6.1.2.1.1.6.0");

pub static DESCRIPTOR: QueryDescriptor = QueryDescriptor {
    group: "SNMPv2-MIB",
    test_oid: ".1.3.6.1.2.1.1.2.0",
    tags: &[QueryTag::System],
    vendor: None,
    fault_code: log::SYSTEM_FAULT,
    producers: &[
        SYS_DESCR,
        SYS_OBJECT_ID,
        SYS_UPTIME,
        SYS_CONTACT,
        SYS_NAME,
        SYS_LOCATION,
    ],
};

/// Группа system из SNMPv2-MIB
pub struct SnmpV2Query<E> {
    session: TransportSession<E>,
}

impl<E: SnmpEngine> SnmpV2Query<E> {
    pub fn new(session: TransportSession<E>) -> Self {
        Self { session }
    }

    /// Скаляр группы system; строки обрезаются по краям
    pub async fn scalar(&self, producer: &Producer) -> Option<FactValue> {
        let value = fetch_scalar(&self.session, producer).await?;
        let value = if value.as_bytes().is_some() {
            value.trimmed_text().unwrap_or(value)
        } else {
            value
        };
        Some(FactValue::Scalar(value))
    }
}

impl<E: SnmpEngine> MibQuery<E> for SnmpV2Query<E> {
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
            fan_out.spawn(producer.name, async move { query.scalar(producer).await });
        }
        fan_out.collect().await
    }
}
