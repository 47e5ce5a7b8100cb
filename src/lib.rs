//! Поллер SNMP: подбор учетных данных, определение производителя и
//! параллельный сбор фактов по MIB в один документ на хост.

pub mod collector;
pub mod config;
pub mod error;
pub mod formatter;
pub mod log;
pub mod mib;
pub mod poller;
pub mod snmp;

pub use collector::{FactDocument, FactValue, Orchestrator};
pub use config::{AppConfig, CredentialSet, SnmpVersion};
pub use error::TransportError;
pub use mib::{MibQuery, MibVariant, QueryTag};
pub use poller::{Poll, PollOutcome, PollState};
