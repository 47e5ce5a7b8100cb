pub mod credentials;
pub mod engine;
#[cfg(any(test, feature = "testing"))]
pub mod mock;
pub mod oid;
pub mod session;
pub mod transport;
pub mod value;
pub mod vendor;

pub use credentials::{Authorization, CredentialValidator};
pub use engine::{SnmpConnector, SnmpEngine, WalkRows};
pub use oid::{OidIndex, OidTable, is_valid_oid, parse_oid};
pub use session::{Snmp2Connector, Snmp2Engine};
pub use transport::{SYS_OBJECT_ID, TransportSession};
pub use value::SnmpValue;
pub use vendor::{Vendor, VendorIdentifier};
