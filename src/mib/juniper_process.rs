use crate::collector::{FactGroup, FactValue};
use crate::log;
use crate::snmp::{SnmpEngine, TransportSession, Vendor};

use super::{FactFanOut, MibQuery, Producer, QueryDescriptor, QueryTag, sum_fact, table_fact};

/// Загрузка CPU по элементам jnxOperatingTable
pub const OPERATING_CPU: Producer = Producer {
    name: "jnxOperatingCPU",
    oid: ".1.3.6.1.4.1.2636.3.1.13.1.8",
    code: log::JUNIPER_CPU,
};

pub const OPERATING_MEMORY_USED: Producer = Producer {
    name: "jnxOperatingMemoryUsed",
    oid: ".1.3.6.1.4.1.2636.3.1.13.1.11",
    code: log::JUNIPER_MEMORY_USED,
};

pub const OPERATING_MEMORY_FREE: Producer = Producer {
    name: "jnxOperatingMemoryFree",
    oid: ".1.3.6.1.4.1.2636.3.1.13.1.12",
    code: log::JUNIPER_MEMORY_FREE,
};

pub static DESCRIPTOR: QueryDescriptor = QueryDescriptor {
    group: "JUNIPER-MIB",
    test_oid: ".1.3.6.1.4.1.2636.3.1.13.1.8",
    tags: &[QueryTag::System],
    vendor: Some(Vendor::Juniper),
    fault_code: log::JUNIPER_PROCESS_FAULT,
    producers: &[OPERATING_CPU, OPERATING_MEMORY_USED, OPERATING_MEMORY_FREE],
};

/// CPU и память Juniper (jnxOperatingTable)
pub struct JuniperProcessQuery<E> {
    session: TransportSession<E>,
}

impl<E> Clone for JuniperProcessQuery<E> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
        }
    }
}

impl<E: SnmpEngine> JuniperProcessQuery<E> {
    pub fn new(session: TransportSession<E>) -> Self {
        Self { session }
    }

    pub async fn cpu(&self) -> Option<FactValue> {
        table_fact(&self.session, &OPERATING_CPU).await
    }

    pub async fn memory_used(&self) -> Option<FactValue> {
        sum_fact(&self.session, &OPERATING_MEMORY_USED).await
    }

    pub async fn memory_free(&self) -> Option<FactValue> {
        sum_fact(&self.session, &OPERATING_MEMORY_FREE).await
    }
}

impl<E: SnmpEngine> MibQuery<E> for JuniperProcessQuery<E> {
    fn descriptor(&self) -> &'static QueryDescriptor {
        &DESCRIPTOR
    }

    fn session(&self) -> &TransportSession<E> {
        &self.session
    }

    async fn query(&self) -> FactGroup {
        let mut fan_out = FactFanOut::new(self.session.hostname(), &DESCRIPTOR);

        let query = self.clone();
        fan_out.spawn(OPERATING_CPU.name, async move { query.cpu().await });
        let query = self.clone();
        fan_out.spawn(OPERATING_MEMORY_USED.name, async move { query.memory_used().await });
        let query = self.clone();
        fan_out.spawn(OPERATING_MEMORY_FREE.name, async move { query.memory_free().await });

        fan_out.collect().await
    }
}
