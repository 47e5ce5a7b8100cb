use serde::Serialize;
use std::fmt;

/// Позиция номера предприятия IANA в `.1.3.6.1.4.1.<enterprise>`
const ENTERPRISE_POSITION: usize = 6;

/// Производители, которых поллер различает
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    Cisco,
    Hp,
    Huawei,
    Juniper,
    NetSnmp,
    Arista,
}

impl Vendor {
    /// Номер предприятия IANA
    pub const fn enterprise(self) -> u64 {
        match self {
            Self::Cisco => 9,
            Self::Hp => 11,
            Self::Huawei => 2011,
            Self::Juniper => 2636,
            Self::NetSnmp => 8072,
            Self::Arista => 30065,
        }
    }

    pub fn from_enterprise(number: u64) -> Option<Self> {
        [
            Self::Cisco,
            Self::Hp,
            Self::Huawei,
            Self::Juniper,
            Self::NetSnmp,
            Self::Arista,
        ]
        .into_iter()
        .find(|vendor| vendor.enterprise() == number)
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cisco => "cisco",
            Self::Hp => "hp",
            Self::Huawei => "huawei",
            Self::Juniper => "juniper",
            Self::NetSnmp => "net-snmp",
            Self::Arista => "arista",
        };
        f.write_str(name)
    }
}

/// Определяет производителя по sysObjectID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorIdentifier {
    sysobjectid: String,
}

impl VendorIdentifier {
    pub fn new(sysobjectid: impl Into<String>) -> Self {
        Self {
            sysobjectid: sysobjectid.into(),
        }
    }

    pub fn sysobjectid(&self) -> &str {
        &self.sysobjectid
    }

    /// Номер предприятия (7-й узел). None, если sysObjectID короче или
    /// узел не число: такой хост не совпадает ни с одним производителем.
    pub fn enterprise(&self) -> Option<u64> {
        self.sysobjectid
            .trim()
            .trim_start_matches('.')
            .split('.')
            .nth(ENTERPRISE_POSITION)
            .and_then(|node| node.parse().ok())
    }

    pub fn vendor(&self) -> Option<Vendor> {
        self.enterprise().and_then(Vendor::from_enterprise)
    }

    pub fn is(&self, vendor: Vendor) -> bool {
        self.enterprise() == Some(vendor.enterprise())
    }

    pub fn is_cisco(&self) -> bool {
        self.is(Vendor::Cisco)
    }

    pub fn is_hp(&self) -> bool {
        self.is(Vendor::Hp)
    }

    pub fn is_huawei(&self) -> bool {
        self.is(Vendor::Huawei)
    }

    pub fn is_juniper(&self) -> bool {
        self.is(Vendor::Juniper)
    }

    pub fn is_netsnmp(&self) -> bool {
        self.is(Vendor::NetSnmp)
    }

    pub fn is_arista(&self) -> bool {
        self.is(Vendor::Arista)
    }
}
