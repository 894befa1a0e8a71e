pub mod isbank;
pub mod ziraat;

pub use isbank::IsbankSource;
pub use ziraat::ZiraatSource;

/// User agent sent with every outbound bank request.
pub(crate) const USER_AGENT: &str = "doviz/0.1";
