/// API path prefix
pub const API_PREFIX: &str = "/v1";

/// Key under which each aggregated document carries its IM's metadata
pub const METADATA_KEY: &str = "_metadata";

/// Location keys sent to every IM and accepted by the query endpoint
pub const LATITUDE_KEY: &str = "latitude";
pub const LONGITUDE_KEY: &str = "longitude";

/// Cache-Control directive an IM uses to advertise how long its answers stay fresh
pub const MAX_AGE_DIRECTIVE: &str = "max-age";

/// Registration keys, checked in this order
pub const ADDRESS_KEY: &str = "address";
pub const NAME_KEY: &str = "name";
pub const CREATOR_KEY: &str = "creator";
pub const TILE_KEY: &str = "tile";
pub const DEPENDENCIES_KEY: &str = "dependencies";

pub const REQUIRED_REGISTRATION_KEYS: [&str; 4] = [ADDRESS_KEY, NAME_KEY, CREATOR_KEY, TILE_KEY];
