//! Жизненный цикл опроса хоста.

mod common;

use common::{HOST, candidates, cisco_switch};
use snmp_poller::collector::FactValue;
use snmp_poller::mib::lldp;
use snmp_poller::poller::{Poll, PollOutcome, PollState};
use snmp_poller::snmp::SnmpValue;
use snmp_poller::snmp::mock::{MockAgent, MockConnector, Request};
use std::time::Duration;

#[tokio::test]
async fn host_without_working_credentials_is_never_queried() {
    // group-1 отвечает, но без sysObjectID
    let silent = MockAgent::new();
    let connector = MockConnector::new()
        .refuse("group-0")
        .agent("group-1", silent.clone());
    let mut poll = Poll::new(HOST, candidates(2), connector.clone());

    assert_eq!(poll.initialize().await, PollOutcome::Unreachable);
    assert_eq!(poll.state(), PollState::Rejected);
    assert!(poll.session().is_none());

    let attempts = connector.attempts().len();
    let probes = silent.request_count();
    let document = poll.query().await;
    assert!(document.is_empty());
    assert_eq!(connector.attempts().len(), attempts);
    assert_eq!(silent.request_count(), probes);

    poll.close().await;
}

#[tokio::test]
async fn disabled_host_is_reported_separately() {
    let agent = cisco_switch();
    let connector = MockConnector::new().agent("parked", agent.clone());
    let credentials = vec![snmp_poller::CredentialSet::v2c("parked", "public").disabled()];
    let mut poll = Poll::new(HOST, credentials, connector);

    assert_eq!(poll.initialize().await, PollOutcome::Disabled);
    assert_eq!(poll.state(), PollState::Rejected);

    let probes = agent.request_count();
    assert!(poll.query().await.is_empty());
    assert_eq!(agent.request_count(), probes);

    // Повторная инициализация помнит причину отказа
    assert_eq!(poll.initialize().await, PollOutcome::Disabled);
    assert_eq!(agent.request_count(), probes);
}

#[tokio::test(start_paused = true)]
async fn hanging_session_connect_is_rejected() {
    // Проверка учетных данных проходит, рабочее подключение зависает
    let connector = MockConnector::new()
        .agent("group-0", cisco_switch())
        .hang_after("group-0", 1);
    let mut poll = Poll::new(HOST, candidates(1), connector.clone())
        .with_probe_timeout(Duration::from_secs(5));

    assert_eq!(poll.initialize().await, PollOutcome::Unreachable);
    assert_eq!(poll.state(), PollState::Rejected);
    assert!(poll.session().is_none());
    assert_eq!(connector.attempts(), ["group-0", "group-0"]);
    assert!(poll.query().await.is_empty());
}

#[tokio::test]
async fn full_lifecycle() {
    let agent = cisco_switch();
    let connector = MockConnector::new().agent("group-1", agent.clone());
    let mut poll = Poll::new(HOST, candidates(2), connector);

    assert_eq!(poll.state(), PollState::Uninitialized);
    assert_eq!(poll.initialize().await, PollOutcome::Ready);
    assert_eq!(poll.state(), PollState::Ready);
    assert_eq!(poll.session().unwrap().credentials().group, "group-1");

    let document = poll.query().await;
    assert_eq!(poll.state(), PollState::Queried);
    assert_eq!(
        document.get("CISCO-PROCESS-MIB", "ciscoMemoryPoolUsed"),
        Some(&FactValue::Scalar(SnmpValue::Unsigned(600)))
    );
    assert!(document.group("SNMPv2-MIB").is_some());

    poll.close().await;
    poll.close().await;
    assert_eq!(poll.state(), PollState::Closed);
    // одна сессия проверки и одна рабочая
    assert_eq!(agent.closes(), 2);
}

#[tokio::test(start_paused = true)]
async fn deadline_cancels_slow_host() {
    let agent = cisco_switch();
    let connector = MockConnector::new().agent("group-0", agent.clone());
    let mut poll = Poll::new(HOST, candidates(1), connector)
        .with_probe_timeout(Duration::from_secs(60))
        .with_deadline(Duration::from_secs(5));

    assert_eq!(poll.initialize().await, PollOutcome::Ready);

    let slow = agent.delay(Duration::from_secs(3));
    let document = poll.query().await;
    assert!(document.is_empty());

    // Отмененные задачи больше не шлют запросов
    let sent = slow.request_count();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(slow.request_count(), sent);
}

#[tokio::test(start_paused = true)]
async fn deadline_keeps_finished_mibs() {
    // Зависает только обход lldpRemSysDesc
    let agent = cisco_switch().stall(lldp::REM_SYS_DESC.oid, Duration::from_secs(3600));
    let connector = MockConnector::new().agent("group-0", agent.clone());
    let mut poll = Poll::new(HOST, candidates(1), connector).with_deadline(Duration::from_secs(30));

    assert_eq!(poll.initialize().await, PollOutcome::Ready);
    let document = poll.query().await;

    let groups: Vec<&str> = document.groups().collect();
    assert_eq!(groups, ["CISCO-PROCESS-MIB", "ENTITY-MIB", "Q-BRIDGE-MIB", "SNMPv2-MIB"]);
    assert_eq!(
        document.get("CISCO-PROCESS-MIB", "ciscoMemoryPoolUsed"),
        Some(&FactValue::Scalar(SnmpValue::Unsigned(600)))
    );
    assert_eq!(poll.state(), PollState::Queried);

    // Отмененный вариант LLDP больше ничего не запрашивает
    let sent = agent.request_count();
    tokio::time::sleep(Duration::from_secs(7200)).await;
    assert_eq!(agent.request_count(), sent);
    assert!(agent.requests().contains(&Request::Walk(lldp::REM_SYS_DESC.oid.to_string())));
}

#[tokio::test]
async fn close_without_initialize_is_a_noop() {
    let mut poll = Poll::new(HOST, candidates(1), MockConnector::new());
    poll.close().await;
    assert_eq!(poll.state(), PollState::Uninitialized);
    assert!(poll.query().await.is_empty());
}
