use super::*;
use std::str::FromStr;
use uuid::Uuid;

#[test]
fn test_typed_id_creation() {
    let id = ClientId::new();
    assert!(!id.to_string().is_empty());
}

#[test]
fn test_typed_id_from_uuid() {
    let uuid = Uuid::new_v4();
    let id = ClientId::from_uuid(uuid);
    assert_eq!(id.into_inner(), uuid);
}

#[test]
fn test_typed_id_default() {
    let id = ClientId::default();
    assert!(!id.to_string().is_empty());
}

#[test]
fn test_typed_id_display() {
    let uuid = Uuid::new_v4();
    let id = ClientId::from_uuid(uuid);
    assert_eq!(format!("{}", id), uuid.to_string());
}

#[test]
fn test_typed_id_from_str() {
    let uuid = Uuid::new_v4();
    let id = ClientId::from_str(&uuid.to_string()).unwrap();
    assert_eq!(id.into_inner(), uuid);
}

#[test]
fn test_typed_id_from_str_error() {
    assert!(ClientId::from_str("invalid").is_err());
}

#[test]
fn test_typed_ids_are_unique() {
    let first = TrustTransactionId::new();
    let second = TrustTransactionId::new();
    assert_ne!(first, second);
    assert_eq!(first.into_inner().get_version_num(), 7);
}

#[test]
fn test_typed_id_serde_transparent() {
    let uuid = Uuid::new_v4();
    let id = MatterId::from_uuid(uuid);
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{uuid}\""));
}
