use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Descriptive data a top-level IM registers with.
/// Dependency nodes never carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMetadata {
    pub name: String,
    pub creator: String,
    pub tile: String,
}

/// A dependency as declared in a registration payload, and as reported back
/// by the listing API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub address: String,
    #[serde(default)]
    pub dependencies: Vec<DependencyRecord>,
}

/// A registered top-level IM.
/// This is the view of the registry exposed by the daemon's API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// Network address, e.g. "10.0.0.5:8080" or "http://weather.local:5000"
    pub address: String,

    #[serde(flatten)]
    pub metadata: ServiceMetadata,

    /// Dependency tree, in declaration order
    pub dependencies: Vec<DependencyRecord>,

    /// Last time this address was (re-)registered
    pub registered_at: DateTime<Utc>,
}
