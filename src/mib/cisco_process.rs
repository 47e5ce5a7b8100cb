use crate::collector::{FactGroup, FactValue};
use crate::log;
use crate::snmp::{SnmpEngine, TransportSession, Vendor};

use super::{FactFanOut, MibQuery, Producer, QueryDescriptor, QueryTag, sum_fact, table_fact};

/// Загрузка CPU за 5 минут по модулям
pub const CPU_TOTAL_5MIN: Producer = Producer {
    name: "cpmCPUTotal5minRev",
    oid: ".1.3.6.1.4.1.9.9.109.1.1.1.1.8",
    code: log::CISCO_CPU,
};

pub const MEMORY_POOL_USED: Producer = Producer {
    name: "ciscoMemoryPoolUsed",
    oid: ".1.3.6.1.4.1.9.9.48.1.1.1.5",
    code: log::CISCO_MEMORY_USED,
};

pub const MEMORY_POOL_FREE: Producer = Producer {
    name: "ciscoMemoryPoolFree",
    oid: ".1.3.6.1.4.1.9.9.48.1.1.1.6",
    code: log::CISCO_MEMORY_FREE,
};

pub static DESCRIPTOR: QueryDescriptor = QueryDescriptor {
    group: "CISCO-PROCESS-MIB",
    test_oid: ".1.3.6.1.4.1.9.9.109.1.1.1.1.8.1",
    tags: &[QueryTag::System],
    vendor: Some(Vendor::Cisco),
    fault_code: log::CISCO_PROCESS_FAULT,
    producers: &[CPU_TOTAL_5MIN, MEMORY_POOL_USED, MEMORY_POOL_FREE],
};

/// CPU и память Cisco (CISCO-PROCESS-MIB, CISCO-MEMORY-POOL-MIB)
pub struct CiscoProcessQuery<E> {
    session: TransportSession<E>,
}

impl<E> Clone for CiscoProcessQuery<E> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
        }
    }
}

impl<E: SnmpEngine> CiscoProcessQuery<E> {
    pub fn new(session: TransportSession<E>) -> Self {
        Self { session }
    }

    /// Таблица по индексу модуля
    pub async fn cpu(&self) -> Option<FactValue> {
        table_fact(&self.session, &CPU_TOTAL_5MIN).await
    }

    /// Занято памяти, сумма по всем пулам
    pub async fn memory_used(&self) -> Option<FactValue> {
        sum_fact(&self.session, &MEMORY_POOL_USED).await
    }

    /// Свободно памяти, сумма по всем пулам
    pub async fn memory_free(&self) -> Option<FactValue> {
        sum_fact(&self.session, &MEMORY_POOL_FREE).await
    }
}

impl<E: SnmpEngine> MibQuery<E> for CiscoProcessQuery<E> {
    fn descriptor(&self) -> &'static QueryDescriptor {
        &DESCRIPTOR
    }

    fn session(&self) -> &TransportSession<E> {
        &self.session
    }

    async fn query(&self) -> FactGroup {
        let mut fan_out = FactFanOut::new(self.session.hostname(), &DESCRIPTOR);

        let query = self.clone();
        fan_out.spawn(CPU_TOTAL_5MIN.name, async move { query.cpu().await });
        let query = self.clone();
        fan_out.spawn(MEMORY_POOL_USED.name, async move { query.memory_used().await });
        let query = self.clone();
        fan_out.spawn(MEMORY_POOL_FREE.name, async move { query.memory_free().await });

        fan_out.collect().await
    }
}
