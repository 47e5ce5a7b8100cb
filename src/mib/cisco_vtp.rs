use crate::collector::{FactGroup, FactValue, MemberTable};
use crate::log;
use crate::snmp::{OidTable, SnmpEngine, SnmpValue, TransportSession, Vendor};

use super::{FactFanOut, MibQuery, Producer, QueryDescriptor, QueryTag, fetch_table, table_fact, text_fact};

/// Ширина битовой маски vlanTrunkPortVlansEnabled
const VLAN_BITS: usize = 1024;

/// vlanTrunkPortDynamicStatus: порт работает транком
const TRUNKING: u64 = 1;

const fn column(name: &'static str, oid: &'static str) -> Producer {
    Producer {
        name,
        oid,
        code: log::FACT_FAILED,
    }
}

// vtpVlanTable индексируется managementDomainIndex.vtpVlanIndex,
// после нормализации ключ - номер VLAN.
pub const VLAN_STATE: Producer = column("vtpVlanState", ".1.3.6.1.4.1.9.9.46.1.3.1.1.2");
pub const VLAN_TYPE: Producer = column("vtpVlanType", ".1.3.6.1.4.1.9.9.46.1.3.1.1.3");
pub const VLAN_NAME: Producer = column("vtpVlanName", ".1.3.6.1.4.1.9.9.46.1.3.1.1.4");

// vlanTrunkPortTable индексируется ifIndex
pub const TRUNK_ENCAPSULATION_TYPE: Producer =
    column("vlanTrunkPortEncapsulationType", ".1.3.6.1.4.1.9.9.46.1.6.1.1.3");
pub const TRUNK_VLANS_ENABLED: Producer =
    column("vlanTrunkPortVlansEnabled", ".1.3.6.1.4.1.9.9.46.1.6.1.1.4");
pub const TRUNK_NATIVE_VLAN: Producer =
    column("vlanTrunkPortNativeVlan", ".1.3.6.1.4.1.9.9.46.1.6.1.1.5");
pub const TRUNK_DYNAMIC_STATE: Producer =
    column("vlanTrunkPortDynamicState", ".1.3.6.1.4.1.9.9.46.1.6.1.1.13");
pub const TRUNK_DYNAMIC_STATUS: Producer =
    column("vlanTrunkPortDynamicStatus", ".1.3.6.1.4.1.9.9.46.1.6.1.1.14");

pub static DESCRIPTOR: QueryDescriptor = QueryDescriptor {
    group: "CISCO-VTP-MIB",
    test_oid: ".1.3.6.1.4.1.9.9.46.1.3.1.1.2",
    tags: &[QueryTag::Layer1, QueryTag::Layer2],
    vendor: Some(Vendor::Cisco),
    fault_code: log::SYSTEM_FAULT,
    producers: &[
        VLAN_NAME,
        VLAN_STATE,
        VLAN_TYPE,
        TRUNK_DYNAMIC_STATE,
        TRUNK_DYNAMIC_STATUS,
        TRUNK_NATIVE_VLAN,
        TRUNK_ENCAPSULATION_TYPE,
        TRUNK_VLANS_ENABLED,
    ],
};

/// Номера VLAN из битовой маски: старший бит первого байта - VLAN 0.
///
/// Короткая маска выравнивается по правому краю до 1024 бит.
pub fn enabled_vlans(bitmap: &[u8]) -> Vec<u64> {
    let offset = VLAN_BITS.saturating_sub(bitmap.len() * 8);
    bitmap
        .iter()
        .enumerate()
        .flat_map(|(byte_index, byte)| {
            (0..8)
                .filter(move |bit| byte & (0x80 >> bit) != 0)
                .map(move |bit| (offset + byte_index * 8 + bit) as u64)
        })
        .collect()
}

/// VLAN, разрешенные на портах в режиме транка
pub fn trunk_members(status: &OidTable, vlans: &OidTable) -> MemberTable {
    vlans
        .iter()
        .filter(|(ifindex, _)| status.get(ifindex).and_then(SnmpValue::as_u64) == Some(TRUNKING))
        .filter_map(|(ifindex, bitmap)| {
            let members = enabled_vlans(bitmap.as_bytes()?);
            (!members.is_empty()).then(|| (ifindex.clone(), members))
        })
        .collect()
}

/// VLAN из базы VTP и транковые порты коммутатора Cisco
pub struct CiscoVtpQuery<E> {
    session: TransportSession<E>,
}

impl<E> Clone for CiscoVtpQuery<E> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
        }
    }
}

impl<E: SnmpEngine> CiscoVtpQuery<E> {
    pub fn new(session: TransportSession<E>) -> Self {
        Self { session }
    }

    pub async fn vlan_name(&self) -> Option<FactValue> {
        text_fact(&self.session, &VLAN_NAME).await
    }

    pub async fn vlan_state(&self) -> Option<FactValue> {
        table_fact(&self.session, &VLAN_STATE).await
    }

    pub async fn vlan_type(&self) -> Option<FactValue> {
        table_fact(&self.session, &VLAN_TYPE).await
    }

    pub async fn trunk_dynamic_state(&self) -> Option<FactValue> {
        table_fact(&self.session, &TRUNK_DYNAMIC_STATE).await
    }

    pub async fn trunk_dynamic_status(&self) -> Option<FactValue> {
        table_fact(&self.session, &TRUNK_DYNAMIC_STATUS).await
    }

    pub async fn trunk_native_vlan(&self) -> Option<FactValue> {
        table_fact(&self.session, &TRUNK_NATIVE_VLAN).await
    }

    pub async fn trunk_encapsulation_type(&self) -> Option<FactValue> {
        table_fact(&self.session, &TRUNK_ENCAPSULATION_TYPE).await
    }

    /// Списки VLAN по ifIndex, только для портов в режиме транка
    pub async fn trunk_vlans_enabled(&self) -> Option<FactValue> {
        let (status, vlans) = tokio::join!(
            fetch_table(&self.session, &TRUNK_DYNAMIC_STATUS, true),
            fetch_table(&self.session, &TRUNK_VLANS_ENABLED, true),
        );

        let members = trunk_members(&status?, &vlans?);
        (!members.is_empty()).then_some(FactValue::Members(members))
    }
}

impl<E: SnmpEngine> MibQuery<E> for CiscoVtpQuery<E> {
    fn descriptor(&self) -> &'static QueryDescriptor {
        &DESCRIPTOR
    }

    fn session(&self) -> &TransportSession<E> {
        &self.session
    }

    async fn query(&self) -> FactGroup {
        let mut fan_out = FactFanOut::new(self.session.hostname(), &DESCRIPTOR);

        let query = self.clone();
        fan_out.spawn(VLAN_NAME.name, async move { query.vlan_name().await });
        let query = self.clone();
        fan_out.spawn(VLAN_STATE.name, async move { query.vlan_state().await });
        let query = self.clone();
        fan_out.spawn(VLAN_TYPE.name, async move { query.vlan_type().await });
        let query = self.clone();
        fan_out.spawn(TRUNK_DYNAMIC_STATE.name, async move { query.trunk_dynamic_state().await });
        let query = self.clone();
        fan_out.spawn(TRUNK_DYNAMIC_STATUS.name, async move { query.trunk_dynamic_status().await });
        let query = self.clone();
        fan_out.spawn(TRUNK_NATIVE_VLAN.name, async move { query.trunk_native_vlan().await });
        let query = self.clone();
        fan_out.spawn(TRUNK_ENCAPSULATION_TYPE.name, async move {
            query.trunk_encapsulation_type().await
        });
        let query = self.clone();
        fan_out.spawn(TRUNK_VLANS_ENABLED.name, async move { query.trunk_vlans_enabled().await });

        fan_out.collect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CredentialSet;
    use crate::snmp::OidIndex;
    use crate::snmp::mock::{MockAgent, MockEngine, text};

    fn session(agent: MockAgent) -> TransportSession<MockEngine> {
        TransportSession::new("sw1", CredentialSet::v2c("campus", "public"), MockEngine::new("sw1", agent))
    }

    /// Маска 1024 бит с заданными VLAN
    fn bitmap(vlans: &[usize]) -> SnmpValue {
        let mut bytes = vec![0u8; VLAN_BITS / 8];
        for vlan in vlans {
            bytes[vlan / 8] |= 0x80 >> (vlan % 8);
        }
        SnmpValue::OctetString(bytes)
    }

    #[tokio::test]
    async fn vlans_are_keyed_by_vlan_id() {
        let agent = MockAgent::new()
            .table(".1.3.6.1.4.1.9.9.46.1.3.1.1.4.1", [(1, text("default")), (20, text("voice "))])
            .table(".1.3.6.1.4.1.9.9.46.1.3.1.1.2.1", [(1, SnmpValue::Integer(1)), (20, SnmpValue::Integer(1))]);

        let facts = CiscoVtpQuery::new(session(agent)).query().await;

        let names = facts["vtpVlanName"].as_table().unwrap();
        assert_eq!(names[&OidIndex::single(20)], text("voice"));
        assert_eq!(facts["vtpVlanState"].as_table().unwrap().len(), 2);
        // Пустой обход vtpVlanType факта не дает
        assert!(!facts.contains_key("vtpVlanType"));
    }

    #[test]
    fn bitmap_positions_are_vlan_ids() {
        assert_eq!(enabled_vlans(&[0b1000_0000, 0b0000_0101]), vec![1008, 1021, 1023]);
        let SnmpValue::OctetString(full) = bitmap(&[1, 10, 1023]) else {
            unreachable!()
        };
        assert_eq!(enabled_vlans(&full), vec![1, 10, 1023]);
        assert!(enabled_vlans(&[]).is_empty());
    }

    #[tokio::test]
    async fn trunk_ports_are_keyed_by_ifindex() {
        let agent = MockAgent::new()
            .table(
                TRUNK_DYNAMIC_STATUS.oid,
                [(10101, SnmpValue::Integer(1)), (10102, SnmpValue::Integer(2))],
            )
            .table(TRUNK_NATIVE_VLAN.oid, [(10101, SnmpValue::Integer(1)), (10102, SnmpValue::Integer(10))])
            .table(TRUNK_ENCAPSULATION_TYPE.oid, [(10101, SnmpValue::Integer(4))])
            .table(TRUNK_VLANS_ENABLED.oid, [(10101, bitmap(&[1, 10, 20])), (10102, bitmap(&[10]))]);

        let facts = CiscoVtpQuery::new(session(agent)).query().await;

        let native = facts[TRUNK_NATIVE_VLAN.name].as_table().unwrap();
        assert_eq!(native[&OidIndex::single(10102)], SnmpValue::Integer(10));
        assert_eq!(facts[TRUNK_ENCAPSULATION_TYPE.name].as_table().unwrap().len(), 1);

        // 10102 работает в режиме доступа, списка VLAN у него нет
        let members = facts[TRUNK_VLANS_ENABLED.name].as_members().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[&OidIndex::single(10101)], vec![1, 10, 20]);
        assert!(!facts.contains_key(TRUNK_DYNAMIC_STATE.name));
    }
}
