pub mod maintenance;
pub mod ttl;

pub use ttl::TtlCache;
