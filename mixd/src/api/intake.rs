//! Validation of payloads arriving at the HTTP boundary.

use serde_json::Value;
use thiserror::Error;
use shared::protocol::{
    ADDRESS_KEY, CREATOR_KEY, DEPENDENCIES_KEY, LATITUDE_KEY, LONGITUDE_KEY, NAME_KEY,
    REQUIRED_REGISTRATION_KEYS, TILE_KEY,
};
use shared::types::{DependencyRecord, Location, ServiceMetadata};
use crate::service::{Service, ServiceId};

#[derive(Debug, Error, PartialEq)]
pub enum IntakeError {
    #[error("Payload must be a JSON object.")]
    NotAnObject,
    #[error("Required key {0} not present in payload JSON.")]
    MissingKey(&'static str),
    #[error("Key {0} has the wrong type.")]
    WrongType(&'static str),
    #[error("Invalid latitude")]
    InvalidLatitude,
    #[error("Invalid longitude")]
    InvalidLongitude,
}

/// Build a top-level service from a registration payload.
pub fn parse_registration(payload: &Value) -> Result<Service, IntakeError> {
    let object = payload.as_object().ok_or(IntakeError::NotAnObject)?;

    if let Some(missing) = REQUIRED_REGISTRATION_KEYS
        .iter()
        .find(|key| !object.contains_key(**key))
    {
        return Err(IntakeError::MissingKey(*missing));
    }

    let metadata = ServiceMetadata {
        name: string_field(payload, NAME_KEY)?,
        creator: string_field(payload, CREATOR_KEY)?,
        tile: string_field(payload, TILE_KEY)?,
    };
    let address = string_field(payload, ADDRESS_KEY)?;
    let dependencies = parse_dependencies(payload.get(DEPENDENCIES_KEY))?;

    Ok(Service::top_level(address, metadata, &dependencies))
}

/// Extract the address to remove from a deregistration payload.
pub fn parse_deregistration(payload: &Value) -> Result<ServiceId, IntakeError> {
    if !payload.is_object() {
        return Err(IntakeError::NotAnObject);
    }
    string_field(payload, ADDRESS_KEY).map(ServiceId::new)
}

/// Check a query location. Latitude is checked before longitude.
pub fn parse_location(payload: &Value) -> Result<Location, IntakeError> {
    if !payload.is_object() {
        return Err(IntakeError::NotAnObject);
    }
    let latitude = number_field(payload, LATITUDE_KEY)?;
    let longitude = number_field(payload, LONGITUDE_KEY)?;
    validate_location(latitude, longitude)
}

pub fn validate_location(latitude: f64, longitude: f64) -> Result<Location, IntakeError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(IntakeError::InvalidLatitude);
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(IntakeError::InvalidLongitude);
    }
    Ok(Location::new(latitude, longitude))
}

fn parse_dependencies(value: Option<&Value>) -> Result<Vec<DependencyRecord>, IntakeError> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(IntakeError::WrongType(DEPENDENCIES_KEY)),
    };

    items
        .iter()
        .map(|item| {
            if !item.is_object() {
                return Err(IntakeError::WrongType(DEPENDENCIES_KEY));
            }
            Ok(DependencyRecord {
                address: string_field(item, ADDRESS_KEY)?,
                dependencies: parse_dependencies(item.get(DEPENDENCIES_KEY))?,
            })
        })
        .collect()
}

fn string_field(object: &Value, key: &'static str) -> Result<String, IntakeError> {
    match object.get(key) {
        None => Err(IntakeError::MissingKey(key)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(IntakeError::WrongType(key)),
    }
}

fn number_field(object: &Value, key: &'static str) -> Result<f64, IntakeError> {
    match object.get(key) {
        None => Err(IntakeError::MissingKey(key)),
        Some(value) => value.as_f64().ok_or(IntakeError::WrongType(key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registration_reports_first_missing_key() {
        let err = parse_registration(&json!({"address": "a:80", "creator": "x"})).unwrap_err();
        assert_eq!(err, IntakeError::MissingKey("name"));
        assert_eq!(err.to_string(), "Required key name not present in payload JSON.");

        let err = parse_registration(&json!({})).unwrap_err();
        assert_eq!(err, IntakeError::MissingKey("address"));
    }

    #[test]
    fn test_registration_builds_tree() {
        let service = parse_registration(&json!({
            "address": "b:80",
            "name": "B",
            "creator": "tester",
            "tile": "cloud",
            "dependencies": [
                {"address": "c:80", "dependencies": []},
                {"address": "m:80", "dependencies": [{"address": "n:80"}]}
            ]
        }))
        .unwrap();

        assert_eq!(service.id().as_str(), "b:80");
        assert_eq!(service.metadata().unwrap().tile, "cloud");
        assert_eq!(service.dependencies().len(), 2);
        assert_eq!(service.dependencies()[1].dependencies()[0].id().as_str(), "n:80");
    }

    #[test]
    fn test_registration_without_dependencies() {
        let service = parse_registration(&json!({
            "address": "a:80", "name": "A", "creator": "tester", "tile": "sun"
        }))
        .unwrap();
        assert!(service.is_leaf());
    }

    #[test]
    fn test_dependency_requires_address() {
        let err = parse_registration(&json!({
            "address": "b:80", "name": "B", "creator": "tester", "tile": "cloud",
            "dependencies": [{"dependencies": []}]
        }))
        .unwrap_err();
        assert_eq!(err, IntakeError::MissingKey("address"));
    }

    #[test]
    fn test_deregistration() {
        assert_eq!(
            parse_deregistration(&json!({"address": "a:80", "name": "whatever"})).unwrap(),
            ServiceId::new("a:80")
        );
        assert_eq!(
            parse_deregistration(&json!({"name": "A"})).unwrap_err(),
            IntakeError::MissingKey("address")
        );
    }

    #[test]
    fn test_location_bounds() {
        assert!(validate_location(90.0, -180.0).is_ok());
        assert_eq!(validate_location(91.0, 0.0).unwrap_err(), IntakeError::InvalidLatitude);
        assert_eq!(validate_location(0.0, 181.0).unwrap_err(), IntakeError::InvalidLongitude);
        assert_eq!(validate_location(-91.0, 181.0).unwrap_err(), IntakeError::InvalidLatitude);
        assert_eq!(validate_location(f64::NAN, 0.0).unwrap_err(), IntakeError::InvalidLatitude);
    }

    #[test]
    fn test_location_fields() {
        assert_eq!(
            parse_location(&json!({"latitude": 10, "longitude": 20.5})).unwrap(),
            Location::new(10.0, 20.5)
        );
        assert_eq!(
            parse_location(&json!({"latitude": "ten", "longitude": 20})).unwrap_err(),
            IntakeError::WrongType("latitude")
        );
        assert_eq!(
            parse_location(&json!({"latitude": 10})).unwrap_err(),
            IntakeError::MissingKey("longitude")
        );
    }
}
