//! Фикстуры для интеграционных тестов поллера.

#![allow(dead_code)]

use snmp_poller::config::CredentialSet;
use snmp_poller::mib::{cisco_process, entity, lldp, qbridge, snmpv2};
use snmp_poller::snmp::mock::{MockAgent, MockEngine, text};
use snmp_poller::snmp::{SYS_OBJECT_ID, SnmpValue, TransportSession};

pub const HOST: &str = "core-sw1";

pub const CISCO_SYSOBJECTID: &str = ".1.3.6.1.4.1.9.1.1208";
pub const JUNIPER_SYSOBJECTID: &str = ".1.3.6.1.4.1.2636.1.1.1.2.29";

pub fn session(agent: MockAgent) -> TransportSession<MockEngine> {
    TransportSession::new(
        HOST,
        CredentialSet::v2c("campus", "public"),
        MockEngine::new(HOST, agent),
    )
}

/// Кандидаты `group-0`, `group-1`, ... в порядке приоритета
pub fn candidates(count: usize) -> Vec<CredentialSet> {
    (0..count)
        .map(|i| CredentialSet::v2c(format!("group-{i}"), format!("community-{i}")))
        .collect()
}

pub fn system(agent: MockAgent, sysobjectid: &str) -> MockAgent {
    agent
        .set(SYS_OBJECT_ID, SnmpValue::ObjectId(sysobjectid.to_string()))
        .set(snmpv2::SYS_DESCR.oid, text("Cisco IOS Software, C3850"))
        .set(snmpv2::SYS_NAME.oid, text(HOST))
        .set(snmpv2::SYS_UPTIME.oid, SnmpValue::Unsigned(8_640_000))
}

/// Коммутатор Cisco с CPU, пулами памяти, шасси, 802.1Q и LLDP соседями
pub fn cisco_switch() -> MockAgent {
    system(MockAgent::new(), CISCO_SYSOBJECTID)
        .table(cisco_process::CPU_TOTAL_5MIN.oid, [(1, SnmpValue::Unsigned(7))])
        .table(
            cisco_process::MEMORY_POOL_USED.oid,
            [(1, SnmpValue::Unsigned(100)), (2, SnmpValue::Unsigned(200)), (3, SnmpValue::Unsigned(300))],
        )
        .table(
            cisco_process::MEMORY_POOL_FREE.oid,
            [(1, SnmpValue::Unsigned(50)), (2, SnmpValue::Unsigned(25))],
        )
        .table(entity::NAME.oid, [(1000, text("Switch 1"))])
        .table(entity::SERIAL_NUM.oid, [(1000, text("FOC2101X0AB"))])
        .table(qbridge::PVID.oid, [(1, SnmpValue::Unsigned(10)), (2, SnmpValue::Unsigned(20))])
        .table(
            qbridge::BASE_PORT_IFINDEX.oid,
            [(1, SnmpValue::Integer(10101)), (2, SnmpValue::Integer(10102))],
        )
        .table(lldp::IF_DESCR, [(10101, text("GigabitEthernet1/0/1")), (10102, text("GigabitEthernet1/0/2"))])
        // LLDP нумерует порты номерами портов моста
        .table(lldp::LOC_PORT_DESC.oid, [(1, text("Gi1/0/1")), (2, text("Gi1/0/2"))])
        .set(&format!("{}.0.2.1", lldp::REM_SYS_NAME.oid), text("dist-1"))
        .set(&format!("{}.0.2.1", lldp::REM_SYS_CAP_ENABLED.oid), SnmpValue::OctetString(vec![0x00, 0x14]))
        // сосед на порту, которого нет в dot1dBasePortIfIndex
        .set(&format!("{}.0.7.1", lldp::REM_SYS_NAME.oid), text("rogue-ap"))
}
