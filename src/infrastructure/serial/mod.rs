// Serial module - Port enumeration and serial session
pub mod enumerator;
pub mod link;
pub mod session;

pub use enumerator::list_ports;
pub use link::{ConnectionSettings, Connector, SerialLink, SystemConnector};
pub use session::{CommandResponse, SerialSession, DEFAULT_SETTLE};
