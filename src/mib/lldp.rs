use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::collector::{FactGroup, FactValue};
use crate::log;
use crate::snmp::{OidIndex, OidTable, SnmpEngine, SnmpValue, TransportSession};

use super::{FactFanOut, MibQuery, Producer, QueryDescriptor, QueryTag, fetch_table, qbridge};

/// Ширина битовой строки lldpRemSysCapEnabled
const CAPABILITY_BITS: usize = 16;

/// ifDescr из IF-MIB
pub const IF_DESCR: &str = ".1.3.6.1.2.1.2.2.1.2";

const fn lldp(name: &'static str, oid: &'static str) -> Producer {
    Producer {
        name,
        oid,
        code: log::LLDP_FAULT,
    }
}

pub const LOC_PORT_DESC: Producer = lldp("lldpLocPortDesc", ".1.0.8802.1.1.2.1.3.7.1.4");
pub const REM_PORT_DESC: Producer = lldp("lldpRemPortDesc", ".1.0.8802.1.1.2.1.4.1.1.8");
pub const REM_SYS_NAME: Producer = lldp("lldpRemSysName", ".1.0.8802.1.1.2.1.4.1.1.9");
pub const REM_SYS_DESC: Producer = lldp("lldpRemSysDesc", ".1.0.8802.1.1.2.1.4.1.1.10");
pub const REM_SYS_CAP_ENABLED: Producer = lldp("lldpRemSysCapEnabled", ".1.0.8802.1.1.2.1.4.1.1.12");

pub static DESCRIPTOR: QueryDescriptor = QueryDescriptor {
    group: "LLDP-MIB",
    test_oid: ".1.0.8802.1.1.2.1.4.1.1.9",
    tags: &[QueryTag::Layer1],
    vendor: None,
    fault_code: log::LLDP_FAULT,
    producers: &[
        REM_SYS_NAME,
        REM_SYS_DESC,
        REM_PORT_DESC,
        REM_SYS_CAP_ENABLED,
        LOC_PORT_DESC,
    ],
};

/// Как номер локального порта LLDP переводится в ifIndex
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortMap {
    /// Номер порта уже ifIndex
    Direct,
    /// Номер порта - порт моста, ifIndex из dot1dBasePortIfIndex
    Bridge(BTreeMap<u64, u64>),
}

impl PortMap {
    /// ifIndex локального порта; 0 и порты без соответствия отбрасываются
    pub fn ifindex(&self, port: u64) -> Option<u64> {
        let ifindex = match self {
            Self::Direct => port,
            Self::Bridge(ifindex) => *ifindex.get(&port)?,
        };
        (ifindex != 0).then_some(ifindex)
    }

    /// Выбор схемы по таблицам агента.
    ///
    /// Без dot1dBasePortIfIndex номер порта считается ifIndex. Иначе
    /// порт тоже считается ifIndex, если хотя бы одно lldpLocPortDesc
    /// совпадает с ifDescr под тем же номером.
    pub fn resolve(base_ports: &OidTable, if_descr: &OidTable, local_ports: &OidTable) -> Self {
        let bridge = qbridge::base_port_map(base_ports);
        if bridge.is_empty() || keyed_by_ifindex(if_descr, local_ports) {
            Self::Direct
        } else {
            Self::Bridge(bridge)
        }
    }

    async fn load<E: SnmpEngine>(session: &TransportSession<E>) -> Self {
        let (base_ports, if_descr, local_ports) = tokio::join!(
            session.walk(qbridge::BASE_PORT_IFINDEX.oid, true),
            session.walk(IF_DESCR, true),
            session.walk(LOC_PORT_DESC.oid, true),
        );

        let ports = Self::resolve(
            &base_ports.unwrap_or_default(),
            &if_descr.unwrap_or_default(),
            &local_ports.unwrap_or_default(),
        );
        tracing::debug!(host = session.hostname(), ports = ?ports, "схема портов LLDP");
        ports
    }
}

fn keyed_by_ifindex(if_descr: &OidTable, local_ports: &OidTable) -> bool {
    local_ports.iter().any(|(port, local)| {
        let interface = if_descr.get(port).and_then(SnmpValue::as_text);
        match (interface, local.as_text()) {
            (Some(interface), Some(local)) => interface.to_lowercase() == local.to_lowercase(),
            _ => false,
        }
    })
}

/// Перекладывает строки по ifIndex; `port_of` достает номер локального порта
pub fn by_ifindex<P, F>(table: &OidTable, ports: &PortMap, port_of: P, convert: F) -> OidTable
where
    P: Fn(&OidIndex) -> Option<u64>,
    F: Fn(&SnmpValue) -> Option<SnmpValue>,
{
    table
        .iter()
        .filter_map(|(index, value)| {
            let ifindex = ports.ifindex(port_of(index)?)?;
            Some((OidIndex::single(ifindex), convert(value)?))
        })
        .collect()
}

/// Битовая маска возможностей в виде строки из 16 нулей и единиц
pub fn capability_bits(value: &SnmpValue) -> Option<SnmpValue> {
    let bits = match value {
        SnmpValue::OctetString(bytes) if bytes.is_empty() => return None,
        SnmpValue::OctetString(bytes) => bytes
            .iter()
            .map(|byte| format!("{byte:08b}"))
            .collect::<String>()
            .trim_start_matches('0')
            .to_string(),
        other => format!("{:b}", other.as_u64()?),
    };
    Some(SnmpValue::OctetString(
        format!("{bits:0>width$}", width = CAPABILITY_BITS).into_bytes(),
    ))
}

/// Соседи по LLDP.
///
/// Схема портов читается один раз на первом запросе и общая для клонов.
pub struct LldpQuery<E> {
    session: TransportSession<E>,
    ports: Arc<OnceCell<PortMap>>,
}

impl<E> Clone for LldpQuery<E> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            ports: Arc::clone(&self.ports),
        }
    }
}

impl<E: SnmpEngine> LldpQuery<E> {
    pub fn new(session: TransportSession<E>) -> Self {
        Self {
            session,
            ports: Arc::new(OnceCell::new()),
        }
    }

    pub async fn ports(&self) -> &PortMap {
        self.ports.get_or_init(|| PortMap::load(&self.session)).await
    }

    // lldpRemTable: timeMark.localPortNum.remIndex
    async fn remote_column<F>(&self, producer: &Producer, convert: F) -> Option<FactValue>
    where
        F: Fn(&SnmpValue) -> Option<SnmpValue>,
    {
        let raw = fetch_table(&self.session, producer, false).await?;
        let table = by_ifindex(&raw, self.ports().await, OidIndex::penultimate, convert);
        (!table.is_empty()).then_some(FactValue::Table(table))
    }

    pub async fn rem_sys_name(&self) -> Option<FactValue> {
        self.remote_column(&REM_SYS_NAME, SnmpValue::trimmed_text).await
    }

    pub async fn rem_sys_desc(&self) -> Option<FactValue> {
        self.remote_column(&REM_SYS_DESC, SnmpValue::trimmed_text).await
    }

    pub async fn rem_port_desc(&self) -> Option<FactValue> {
        self.remote_column(&REM_PORT_DESC, SnmpValue::trimmed_text).await
    }

    pub async fn rem_sys_cap_enabled(&self) -> Option<FactValue> {
        self.remote_column(&REM_SYS_CAP_ENABLED, capability_bits).await
    }

    /// Описания локальных портов по ifIndex
    pub async fn loc_port_desc(&self) -> Option<FactValue> {
        let raw = fetch_table(&self.session, &LOC_PORT_DESC, false).await?;
        let table = by_ifindex(&raw, self.ports().await, OidIndex::last, SnmpValue::trimmed_text);
        (!table.is_empty()).then_some(FactValue::Table(table))
    }
}

impl<E: SnmpEngine> MibQuery<E> for LldpQuery<E> {
    fn descriptor(&self) -> &'static QueryDescriptor {
        &DESCRIPTOR
    }

    fn session(&self) -> &TransportSession<E> {
        &self.session
    }

    async fn query(&self) -> FactGroup {
        let mut fan_out = FactFanOut::new(self.session.hostname(), &DESCRIPTOR);

        let query = self.clone();
        fan_out.spawn(REM_SYS_NAME.name, async move { query.rem_sys_name().await });
        let query = self.clone();
        fan_out.spawn(REM_SYS_DESC.name, async move { query.rem_sys_desc().await });
        let query = self.clone();
        fan_out.spawn(REM_PORT_DESC.name, async move { query.rem_port_desc().await });
        let query = self.clone();
        fan_out.spawn(REM_SYS_CAP_ENABLED.name, async move {
            query.rem_sys_cap_enabled().await
        });
        let query = self.clone();
        fan_out.spawn(LOC_PORT_DESC.name, async move { query.loc_port_desc().await });

        fan_out.collect().await
    }
}
