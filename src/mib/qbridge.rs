use std::collections::BTreeMap;

use crate::collector::{FactGroup, FactValue};
use crate::log;
use crate::snmp::{OidIndex, OidTable, SnmpEngine, TransportSession};

use super::{FactFanOut, MibQuery, Producer, QueryDescriptor, QueryTag, fetch_table, text_fact};

/// PVID порта; в MIB индексирован номером порта моста
pub const PVID: Producer = Producer {
    name: "dot1qPvid",
    oid: ".1.3.6.1.2.1.17.7.1.4.5.1.1",
    code: log::FACT_FAILED,
};

pub const VLAN_STATIC_NAME: Producer = Producer {
    name: "dot1qVlanStaticName",
    oid: ".1.3.6.1.2.1.17.7.1.4.3.1.1",
    code: log::FACT_FAILED,
};

/// dot1dBasePortIfIndex из BRIDGE-MIB: порт моста -> ifIndex
pub const BASE_PORT_IFINDEX: Producer = Producer {
    name: "dot1dBasePortIfIndex",
    oid: ".1.3.6.1.2.1.17.1.4.1.2",
    code: log::FACT_FAILED,
};

pub static DESCRIPTOR: QueryDescriptor = QueryDescriptor {
    group: "Q-BRIDGE-MIB",
    test_oid: ".1.3.6.1.2.1.17.7.1.4.5.1.1",
    tags: &[QueryTag::Layer1, QueryTag::Layer2],
    vendor: None,
    fault_code: log::SYSTEM_FAULT,
    producers: &[PVID, VLAN_STATIC_NAME],
};

/// Порт моста -> ifIndex из обхода dot1dBasePortIfIndex
pub fn base_port_map(base_ports: &OidTable) -> BTreeMap<u64, u64> {
    base_ports
        .iter()
        .filter_map(|(port, value)| Some((port.as_single()?, value.as_u64()?)))
        .collect()
}

/// Переводит таблицу по портам моста в таблицу по ifIndex.
///
/// Порты без соответствия в `base_ports` отбрасываются.
pub fn remap_to_ifindex(by_bridge_port: &OidTable, base_ports: &OidTable) -> OidTable {
    let ifindex = base_port_map(base_ports);

    by_bridge_port
        .iter()
        .filter_map(|(port, value)| {
            let index = ifindex.get(&port.as_single()?)?;
            Some((OidIndex::single(*index), value.clone()))
        })
        .collect()
}

/// VLAN портов и имена статических VLAN (IEEE 802.1Q)
pub struct QBridgeQuery<E> {
    session: TransportSession<E>,
}

impl<E> Clone for QBridgeQuery<E> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
        }
    }
}

impl<E: SnmpEngine> QBridgeQuery<E> {
    pub fn new(session: TransportSession<E>) -> Self {
        Self { session }
    }

    /// PVID по ifIndex
    pub async fn pvid(&self) -> Option<FactValue> {
        let (pvid, base_ports) = tokio::join!(
            fetch_table(&self.session, &PVID, true),
            fetch_table(&self.session, &BASE_PORT_IFINDEX, true),
        );

        let table = remap_to_ifindex(&pvid?, &base_ports?);
        (!table.is_empty()).then_some(FactValue::Table(table))
    }

    /// Имена VLAN по номеру VLAN
    pub async fn vlan_static_name(&self) -> Option<FactValue> {
        text_fact(&self.session, &VLAN_STATIC_NAME).await
    }
}

impl<E: SnmpEngine> MibQuery<E> for QBridgeQuery<E> {
    fn descriptor(&self) -> &'static QueryDescriptor {
        &DESCRIPTOR
    }

    fn session(&self) -> &TransportSession<E> {
        &self.session
    }

    async fn query(&self) -> FactGroup {
        let mut fan_out = FactFanOut::new(self.session.hostname(), &DESCRIPTOR);

        let query = self.clone();
        fan_out.spawn(PVID.name, async move { query.pvid().await });
        let query = self.clone();
        fan_out.spawn(VLAN_STATIC_NAME.name, async move { query.vlan_static_name().await });

        fan_out.collect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snmp::SnmpValue;

    fn table(rows: &[(u64, u64)]) -> OidTable {
        rows.iter()
            .map(|(index, value)| (OidIndex::single(*index), SnmpValue::Integer(*value as i64)))
            .collect()
    }

    #[test]
    fn remaps_bridge_ports_and_drops_unknown() {
        let pvid = table(&[(1, 10), (2, 20), (49, 1)]);
        let base_ports = table(&[(1, 10101), (2, 10102)]);

        let remapped = remap_to_ifindex(&pvid, &base_ports);
        assert_eq!(remapped, table(&[(10101, 10), (10102, 20)]));
    }

    #[test]
    fn remapping_leaves_input_untouched() {
        let pvid = table(&[(1, 10)]);
        let base_ports = table(&[(1, 5)]);
        let first = remap_to_ifindex(&pvid, &base_ports);
        let second = remap_to_ifindex(&pvid, &base_ports);
        assert_eq!(first, second);
        assert_eq!(pvid, table(&[(1, 10)]));
    }
}
