use serde_json::{Map, Value};
use shared::protocol::{LATITUDE_KEY, LONGITUDE_KEY, METADATA_KEY};
use shared::types::{Location, ServiceMetadata};

/// A JSON object exchanged with IMs.
pub type Document = Map<String, Value>;

/// Merge `from` into `into`. On key collision the incoming value wins.
pub fn merge(into: &mut Document, from: Document) {
    for (key, value) in from {
        into.insert(key, value);
    }
}

/// The payload every IM receives: just the query location.
pub fn location_payload(location: Location) -> Document {
    let mut doc = Document::new();
    doc.insert(LATITUDE_KEY.to_string(), Value::from(location.latitude));
    doc.insert(LONGITUDE_KEY.to_string(), Value::from(location.longitude));
    doc
}

/// Prefix an IM's answer with its `_metadata` block.
pub fn tag_with_metadata(metadata: Option<&ServiceMetadata>, document: Document) -> Document {
    let mut tagged = Document::new();
    let meta = metadata
        .and_then(|m| serde_json::to_value(m).ok())
        .unwrap_or_else(|| Value::Object(Document::new()));
    tagged.insert(METADATA_KEY.to_string(), meta);
    merge(&mut tagged, document);
    tagged
}
