use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::mib::QueryTag;

/// Базовые настройки приложения
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Настройки подключения
    pub connection: ConnectionSettings,
    /// Настройки опроса хоста
    pub poll: PollSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Таймаут GET запроса (секунды)
    pub timeout: u64,
    /// Количество повторов GET при таймауте
    pub retries: u32,
    /// Таймаут одного запроса при обходе (секунды)
    pub walk_timeout: u64,
    /// Количество повторов запроса при обходе
    pub walk_retries: u32,
    /// Общий лимит на GETBULK обход (секунды), после него обход идет через GETNEXT
    pub bulk_walk_timeout: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            timeout: 10,
            retries: 3,
            walk_timeout: 5,
            walk_retries: 2,
            bulk_walk_timeout: 60,
        }
    }
}

impl ConnectionSettings {
    pub fn get_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn get_walk_timeout(&self) -> Duration {
        Duration::from_secs(self.walk_timeout)
    }

    pub fn get_bulk_walk_timeout(&self) -> Duration {
        Duration::from_secs(self.bulk_walk_timeout)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    /// Таймаут проверки одного набора учетных данных (секунды)
    pub probe_timeout: u64,
    /// Срок на весь опрос хоста (секунды); по истечении запросы отменяются
    pub deadline: u64,
    /// Опрашивать только MIB с этими тегами; пусто - все
    pub tags: Vec<QueryTag>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            probe_timeout: 5,
            deadline: 300,
            tags: Vec::new(),
        }
    }
}

impl PollSettings {
    pub fn get_probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout)
    }

    pub fn get_deadline(&self) -> Duration {
        Duration::from_secs(self.deadline)
    }
}
