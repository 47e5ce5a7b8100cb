use serde::Serialize;

use crate::collector::{FactDocument, FactValue};
use crate::mib::snmpv2;
use crate::poller::PollOutcome;
use crate::snmp::{Vendor, VendorIdentifier};

/// JSON структура для отдачи во внешнее хранилище
#[derive(Debug, Clone, Serialize)]
pub struct PollReport<'a> {
    pub hostname: &'a str,
    pub timestamp: String,
    pub status: PollOutcome,
    /// Номер предприятия IANA из sysObjectID, если он известен
    pub enterprise: Option<u64>,
    pub vendor: Option<Vendor>,
    pub summary: ReportSummary,
    pub facts: &'a FactDocument,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub groups: usize,
    pub facts: usize,
}

/// JSON форматтер для результатов опроса
pub struct JsonFormatter;

impl JsonFormatter {
    /// Собирает отчет по документу хоста
    pub fn format_report<'a>(
        hostname: &'a str,
        status: PollOutcome,
        facts: &'a FactDocument,
    ) -> PollReport<'a> {
        let identifier = Self::identifier(facts);

        PollReport {
            hostname,
            timestamp: chrono::Utc::now().to_rfc3339(),
            status,
            enterprise: identifier.as_ref().and_then(VendorIdentifier::enterprise),
            vendor: identifier.as_ref().and_then(VendorIdentifier::vendor),
            summary: ReportSummary {
                groups: facts.groups().count(),
                facts: facts.fact_count(),
            },
            facts,
        }
    }

    /// sysObjectID из группы SNMPv2-MIB
    fn identifier(facts: &FactDocument) -> Option<VendorIdentifier> {
        let value = facts
            .get(snmpv2::DESCRIPTOR.group, snmpv2::SYS_OBJECT_ID.name)
            .and_then(FactValue::as_scalar)?;
        value.as_text().map(VendorIdentifier::new)
    }

    /// Сериализует отчет в JSON строку
    pub fn to_json_string(report: &PollReport<'_>) -> anyhow::Result<String> {
        serde_json::to_string_pretty(report)
            .map_err(|e| anyhow::anyhow!("Ошибка сериализации в JSON: {}", e))
    }

    /// Сериализует отчет в компактный JSON
    pub fn to_json_compact(report: &PollReport<'_>) -> anyhow::Result<String> {
        serde_json::to_string(report)
            .map_err(|e| anyhow::anyhow!("Ошибка сериализации в JSON: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::FactGroup;
    use crate::snmp::SnmpValue;

    fn document() -> FactDocument {
        let mut system = FactGroup::new();
        system.insert(
            snmpv2::SYS_OBJECT_ID.name.to_string(),
            FactValue::Scalar(SnmpValue::ObjectId(".1.3.6.1.4.1.9.1.1208".into())),
        );
        system.insert(
            snmpv2::SYS_NAME.name.to_string(),
            FactValue::Scalar(SnmpValue::OctetString(b"core-sw1".to_vec())),
        );
        let mut document = FactDocument::new();
        document.insert(snmpv2::DESCRIPTOR.group, system);
        document
    }

    #[test]
    fn report_carries_vendor_and_summary() {
        let facts = document();
        let report = JsonFormatter::format_report("core-sw1", PollOutcome::Ready, &facts);
        assert_eq!(report.enterprise, Some(9));
        assert_eq!(report.vendor, Some(Vendor::Cisco));
        assert_eq!(report.summary.facts, 2);

        let json: serde_json::Value =
            serde_json::from_str(&JsonFormatter::to_json_compact(&report).unwrap()).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["vendor"], "cisco");
        assert_eq!(json["facts"]["SNMPv2-MIB"]["sysName"], "core-sw1");
    }

    #[test]
    fn empty_document_has_no_vendor() {
        let facts = FactDocument::new();
        let report = JsonFormatter::format_report("10.0.0.9", PollOutcome::Unreachable, &facts);
        assert_eq!(report.enterprise, None);
        assert_eq!(report.summary.groups, 0);
    }
}
