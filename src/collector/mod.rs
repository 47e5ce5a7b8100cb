use std::collections::HashMap;
use std::future::Future;
use tokio::task::{Id, JoinSet};
use tokio::time::{Duration, Instant, timeout_at};

pub mod types;

pub use types::{FactDocument, FactGroup, FactValue, MemberTable};

use crate::log;
use crate::mib::{MibVariant, QueryTag};
use crate::snmp::{SnmpEngine, TransportSession, VendorIdentifier};

/// Выбирает применимые варианты MIB и опрашивает их параллельно
pub struct Orchestrator<E> {
    session: TransportSession<E>,
    tags: Vec<QueryTag>,
    deadline: Option<Duration>,
}

impl<E: SnmpEngine> Orchestrator<E> {
    pub fn new(session: TransportSession<E>) -> Self {
        Self {
            session,
            tags: Vec::new(),
            deadline: None,
        }
    }

    /// Ограничивает опрос вариантами с этими тегами
    pub fn with_tags(mut self, tags: &[QueryTag]) -> Self {
        self.tags = tags.to_vec();
        self
    }

    /// Срок на весь collect(); по истечении незавершенные варианты
    /// отменяются, готовые остаются в документе.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Производитель по sysObjectID; при ошибке чтения вендорные MIB не
    /// проверяются.
    pub async fn identify(&self) -> VendorIdentifier {
        match self.session.sysobjectid().await {
            Ok(Some(sysobjectid)) => VendorIdentifier::new(sysobjectid),
            Ok(None) => VendorIdentifier::new(""),
            Err(e) => {
                tracing::debug!(host = self.session.hostname(), error = %e, "sysObjectID не получен");
                VendorIdentifier::new("")
            }
        }
    }

    /// Варианты, подходящие хосту, в порядке реестра
    pub async fn applicable(&self) -> Vec<MibVariant> {
        let identifier = self.identify().await;

        let mut probes = JoinSet::new();
        for variant in MibVariant::tagged(&self.tags) {
            if !variant.descriptor().matches_vendor(&identifier) {
                continue;
            }
            let session = self.session.clone();
            probes.spawn(async move { (variant, variant.supported(&session).await) });
        }

        let mut supported = Vec::new();
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok((variant, true)) => supported.push(variant),
                Ok((_, false)) => {}
                Err(e) => tracing::warn!(
                    code = log::SUPPORT_CHECK_FAILED,
                    host = self.session.hostname(),
                    error = %e,
                    "проверка поддержки MIB упала"
                ),
            }
        }

        // JoinSet отдает задачи в порядке завершения
        supported.sort_by_key(|variant| {
            MibVariant::registry()
                .iter()
                .position(|registered| registered == variant)
        });
        supported
    }

    /// Опрашивает применимые варианты и сводит результат в один документ
    pub async fn collect(&self) -> FactDocument {
        let deadline = self.deadline.map(|deadline| Instant::now() + deadline);

        let Some(variants) = until(deadline, self.applicable()).await else {
            self.deadline_exceeded(Vec::new());
            return FactDocument::new();
        };
        tracing::debug!(
            host = self.session.hostname(),
            variants = ?variants,
            "применимые MIB"
        );

        let mut tasks = JoinSet::new();
        let mut spawned: HashMap<Id, MibVariant> = HashMap::new();
        for variant in variants {
            let session = self.session.clone();
            let handle = tasks.spawn(async move { (variant, variant.query(session).await) });
            spawned.insert(handle.id(), variant);
        }

        let mut document = FactDocument::new();
        loop {
            let joined = match until(deadline, tasks.join_next()).await {
                Some(Some(joined)) => joined,
                Some(None) => break,
                None => {
                    tasks.abort_all();
                    self.deadline_exceeded(spawned.values().map(|variant| variant.group()).collect());
                    break;
                }
            };

            match joined {
                Ok((variant, facts)) => {
                    spawned.retain(|_, pending| *pending != variant);
                    document.insert(variant.group(), facts);
                }
                Err(e) => {
                    let group = spawned.remove(&e.id()).map(|variant| variant.group());
                    tracing::warn!(
                        code = log::VARIANT_FAILED,
                        host = self.session.hostname(),
                        group = ?group,
                        error = %e,
                        "вариант MIB упал и исключен из документа"
                    );
                }
            }
        }

        document
    }

    fn deadline_exceeded(&self, mut cancelled: Vec<&'static str>) {
        cancelled.sort_unstable();
        tracing::warn!(
            code = log::POLL_DEADLINE,
            host = self.session.hostname(),
            deadline = ?self.deadline,
            cancelled = ?cancelled,
            "истек срок опроса, незавершенные MIB отменены"
        );
    }
}

/// Ожидание `future` не дольше `deadline`; None - срок истек
async fn until<F: Future>(deadline: Option<Instant>, future: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => timeout_at(deadline, future).await.ok(),
        None => Some(future.await),
    }
}
