//! Контракт MIB запросов и реестр вариантов.
//!
//! Каждый вариант жестко задает свои OID: тестовый OID для проверки
//! поддержки, теги и список производителей фактов. Реестр - неизменяемый
//! статический список в порядке опроса.

use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::task::JoinSet;

pub mod cisco_process;
pub mod cisco_vtp;
pub mod entity;
pub mod juniper_process;
pub mod lldp;
pub mod qbridge;
pub mod snmpv2;

pub use cisco_process::CiscoProcessQuery;
pub use cisco_vtp::CiscoVtpQuery;
pub use entity::EntityQuery;
pub use juniper_process::JuniperProcessQuery;
pub use lldp::LldpQuery;
pub use qbridge::QBridgeQuery;
pub use snmpv2::SnmpV2Query;

use crate::collector::{FactGroup, FactValue};
use crate::error::TransportError;
use crate::log;
use crate::snmp::{OidTable, SnmpEngine, SnmpValue, TransportSession, Vendor, VendorIdentifier};

/// Группа фактов, для фильтрации опроса
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryTag {
    System,
    Layer1,
    Layer2,
}

/// Производитель факта: имя ключа в документе и его OID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Producer {
    pub name: &'static str,
    pub oid: &'static str,
    /// Код предупреждения при ошибке
    pub code: u32,
}

/// Описание варианта MIB
#[derive(Debug)]
pub struct QueryDescriptor {
    /// Имя MIB, ключ первого уровня в документе
    pub group: &'static str,
    pub test_oid: &'static str,
    pub tags: &'static [QueryTag],
    /// Вариант опрашивается только у этого производителя
    pub vendor: Option<Vendor>,
    /// Код предупреждения при сбое сборки всего варианта
    pub fault_code: u32,
    pub producers: &'static [Producer],
}

impl QueryDescriptor {
    pub fn has_tag(&self, tag: QueryTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn producer(&self, fact: &str) -> Option<&'static Producer> {
        self.producers.iter().find(|producer| producer.name == fact)
    }

    /// OID производителя без обращения к сети
    pub fn oid(&self, fact: &str) -> Option<&'static str> {
        self.producer(fact).map(|producer| producer.oid)
    }

    pub fn matches_vendor(&self, identifier: &VendorIdentifier) -> bool {
        self.vendor.is_none_or(|vendor| identifier.is(vendor))
    }
}

/// Общий контракт варианта MIB, привязанного к сессии
pub trait MibQuery<E: SnmpEngine>: Send + Sync {
    fn descriptor(&self) -> &'static QueryDescriptor;

    fn session(&self) -> &TransportSession<E>;

    /// Собирает все факты варианта параллельно; ошибки отдельных
    /// производителей в результат не попадают.
    fn query(&self) -> impl Future<Output = FactGroup> + Send;

    /// OID факта без обращения к сети
    fn oid(&self, fact: &str) -> Option<&'static str> {
        self.descriptor().oid(fact)
    }

    /// Поддерживает ли хост эту MIB
    fn supported(&self) -> impl Future<Output = bool> + Send {
        probe(self.session(), self.descriptor())
    }
}

/// Закрытый набор вариантов
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MibVariant {
    SnmpV2,
    Entity,
    CiscoProcess,
    JuniperProcess,
    CiscoVtp,
    QBridge,
    Lldp,
}

static REGISTRY: [MibVariant; 7] = [
    MibVariant::SnmpV2,
    MibVariant::Entity,
    MibVariant::CiscoProcess,
    MibVariant::JuniperProcess,
    MibVariant::CiscoVtp,
    MibVariant::QBridge,
    MibVariant::Lldp,
];

impl MibVariant {
    /// Все варианты в порядке опроса
    pub fn registry() -> &'static [MibVariant] {
        &REGISTRY
    }

    /// Варианты с любым из тегов; пустой список - все
    pub fn tagged(tags: &[QueryTag]) -> impl Iterator<Item = MibVariant> + '_ {
        REGISTRY.iter().copied().filter(move |variant| {
            tags.is_empty() || tags.iter().any(|tag| variant.descriptor().has_tag(*tag))
        })
    }

    pub fn descriptor(self) -> &'static QueryDescriptor {
        match self {
            Self::SnmpV2 => &snmpv2::DESCRIPTOR,
            Self::Entity => &entity::DESCRIPTOR,
            Self::CiscoProcess => &cisco_process::DESCRIPTOR,
            Self::JuniperProcess => &juniper_process::DESCRIPTOR,
            Self::CiscoVtp => &cisco_vtp::DESCRIPTOR,
            Self::QBridge => &qbridge::DESCRIPTOR,
            Self::Lldp => &lldp::DESCRIPTOR,
        }
    }

    pub fn group(self) -> &'static str {
        self.descriptor().group
    }

    pub fn oid(self, fact: &str) -> Option<&'static str> {
        self.descriptor().oid(fact)
    }

    pub async fn supported<E: SnmpEngine>(self, session: &TransportSession<E>) -> bool {
        probe(session, self.descriptor()).await
    }

    pub async fn query<E: SnmpEngine>(self, session: TransportSession<E>) -> FactGroup {
        match self {
            Self::SnmpV2 => SnmpV2Query::new(session).query().await,
            Self::Entity => EntityQuery::new(session).query().await,
            Self::CiscoProcess => CiscoProcessQuery::new(session).query().await,
            Self::JuniperProcess => JuniperProcessQuery::new(session).query().await,
            Self::CiscoVtp => CiscoVtpQuery::new(session).query().await,
            Self::QBridge => QBridgeQuery::new(session).query().await,
            Self::Lldp => LldpQuery::new(session).query().await,
        }
    }
}

/// GET тестового OID, при отказе обход под ним (тестовый OID может быть
/// колонкой таблицы).
pub async fn probe<E: SnmpEngine>(
    session: &TransportSession<E>,
    descriptor: &'static QueryDescriptor,
) -> bool {
    let failure = match session.get(descriptor.test_oid).await {
        Ok(value) if !value.is_empty() => return true,
        Ok(_) => None,
        Err(e) if e.is_timeout() => return false,
        Err(e) => Some(e),
    };

    match session.walk(descriptor.test_oid, false).await {
        Ok(table) => !table.is_empty(),
        Err(TransportError::Timeout { .. } | TransportError::NoSuchObject { .. }) => false,
        Err(e) => {
            tracing::warn!(
                code = log::SUPPORT_CHECK_FAILED,
                host = session.hostname(),
                group = descriptor.group,
                get_error = ?failure,
                error = %e,
                "проверка поддержки MIB завершилась ошибкой"
            );
            false
        }
    }
}

/// Параллельный запуск производителей одного варианта
pub struct FactFanOut {
    host: String,
    descriptor: &'static QueryDescriptor,
    tasks: JoinSet<(&'static str, Option<FactValue>)>,
}

impl FactFanOut {
    pub fn new(host: &str, descriptor: &'static QueryDescriptor) -> Self {
        Self {
            host: host.to_string(),
            descriptor,
            tasks: JoinSet::new(),
        }
    }

    pub fn spawn<F>(&mut self, fact: &'static str, producer: F)
    where
        F: Future<Output = Option<FactValue>> + Send + 'static,
    {
        self.tasks.spawn(async move { (fact, producer.await) });
    }

    /// Ждет все задачи; упавшая задача теряет только свой ключ
    pub async fn collect(mut self) -> FactGroup {
        let mut facts = FactGroup::new();

        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok((fact, Some(value))) => {
                    facts.insert(fact.to_string(), value);
                }
                Ok((_, None)) => {}
                Err(e) => {
                    tracing::warn!(
                        code = self.descriptor.fault_code,
                        host = %self.host,
                        group = self.descriptor.group,
                        error = %e,
                        "сбой задачи сбора, собранные факты сохранены"
                    );
                }
            }
        }

        facts
    }
}

fn producer_failed(host: &str, producer: &Producer, error: &dyn std::fmt::Display) {
    tracing::warn!(
        code = producer.code,
        host,
        fact = producer.name,
        oid = producer.oid,
        error = %error,
        "не удалось получить факт"
    );
}

/// Обход колонки производителя; ошибка - предупреждение и None
pub async fn fetch_table<E: SnmpEngine>(
    session: &TransportSession<E>,
    producer: &Producer,
    normalized: bool,
) -> Option<OidTable> {
    match session.walk(producer.oid, normalized).await {
        Ok(table) => Some(table),
        Err(e) => {
            producer_failed(session.hostname(), producer, &e);
            None
        }
    }
}

/// GET скаляра производителя; ошибка - предупреждение и None
pub async fn fetch_scalar<E: SnmpEngine>(
    session: &TransportSession<E>,
    producer: &Producer,
) -> Option<SnmpValue> {
    match session.get(producer.oid).await {
        Ok(value) => Some(value),
        Err(e) => {
            producer_failed(session.hostname(), producer, &e);
            None
        }
    }
}

/// Таблица как факт; пустая таблица факта не дает
pub async fn table_fact<E: SnmpEngine>(
    session: &TransportSession<E>,
    producer: &Producer,
) -> Option<FactValue> {
    let table = fetch_table(session, producer, true).await?;
    (!table.is_empty()).then_some(FactValue::Table(table))
}

/// Текстовая колонка: строки декодируются и обрезаются по краям
pub async fn text_fact<E: SnmpEngine>(
    session: &TransportSession<E>,
    producer: &Producer,
) -> Option<FactValue> {
    let table: OidTable = fetch_table(session, producer, true)
        .await?
        .into_iter()
        .map(|(index, value)| {
            let text = value.trimmed_text().unwrap_or(value);
            (index, text)
        })
        .collect();
    (!table.is_empty()).then_some(FactValue::Table(table))
}

/// Сумма по всем строкам; нечисловая строка делает сумму неизвестной
pub fn aggregate(table: &OidTable) -> Option<u64> {
    table
        .values()
        .try_fold(0u64, |sum, value| sum.checked_add(value.as_u64()?))
}

/// Пуловый факт: сумма колонки одним скаляром
pub async fn sum_fact<E: SnmpEngine>(
    session: &TransportSession<E>,
    producer: &Producer,
) -> Option<FactValue> {
    let table = fetch_table(session, producer, true).await?;
    match aggregate(&table) {
        Some(sum) => Some(FactValue::Scalar(SnmpValue::Unsigned(sum))),
        None => {
            producer_failed(session.hostname(), producer, &"нечисловое значение в таблице");
            None
        }
    }
}
