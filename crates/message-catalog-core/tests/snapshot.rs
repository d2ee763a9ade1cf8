// crates/message-catalog-core/tests/snapshot.rs
// ============================================================================
// Module: Catalog Snapshot Tests
// Description: Lookup, overlay, and removal behavior of catalog snapshots.
// Purpose: Ensure snapshots never lose entries except by explicit removal.
// Dependencies: message-catalog-core, serde_json
// ============================================================================
//! ## Overview
//! Snapshots are immutable values; every derivation returns a new snapshot
//! and leaves the source untouched.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use message_catalog_core::CatalogSnapshot;
use message_catalog_core::MessageName;
use message_catalog_core::MissingMessage;

/// Two-entry snapshot used across tests.
fn sample() -> CatalogSnapshot {
    CatalogSnapshot::from_entries([("greeting", "Hello"), ("farewell", "Bye")])
}

#[test]
fn get_returns_known_texts() {
    let snapshot = sample();
    assert_eq!(snapshot.get("greeting"), Some("Hello"));
    assert_eq!(snapshot.get("unknown"), None);
    assert!(snapshot.contains("farewell"));
    assert_eq!(snapshot.len(), 2);
}

#[test]
fn require_reports_missing_name() {
    let snapshot = sample();
    assert_eq!(snapshot.require("farewell").unwrap(), "Bye");
    let err = snapshot.require("absent").unwrap_err();
    assert_eq!(
        err,
        MissingMessage {
            name: "absent".to_string()
        }
    );
    assert_eq!(err.to_string(), "message not found in catalog: absent");
}

#[test]
fn overlay_overwrites_and_adds_without_removing() {
    let base = sample();
    let overlaid = base.with_overlay([("greeting", "Hi"), ("extra", "More")]);

    assert_eq!(overlaid.get("greeting"), Some("Hi"));
    assert_eq!(overlaid.get("farewell"), Some("Bye"));
    assert_eq!(overlaid.get("extra"), Some("More"));
    assert_eq!(base.get("greeting"), Some("Hello"), "source snapshot is unchanged");
    assert!(!base.contains("extra"));
}

#[test]
fn empty_overlay_is_identity() {
    let base = sample();
    let overlaid = base.with_overlay(Vec::<(String, String)>::new());
    assert_eq!(base, overlaid);
}

#[test]
fn without_removes_only_named_entries() {
    let base = sample();
    let retired = [MessageName::new("farewell"), MessageName::new("never-present")];
    let trimmed = base.without(&retired);

    assert_eq!(trimmed.len(), 1);
    assert!(trimmed.contains("greeting"));
    assert!(!trimmed.contains("farewell"));
    assert_eq!(base.len(), 2);
}

#[test]
fn iteration_is_sorted_by_name() {
    let snapshot = CatalogSnapshot::from_entries([("b", "2"), ("a", "1"), ("c", "3")]);
    let names: Vec<&str> = snapshot.names().map(MessageName::as_str).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn serializes_as_plain_json_object() {
    let snapshot = sample();
    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json, serde_json::json!({"farewell": "Bye", "greeting": "Hello"}));
    let parsed: CatalogSnapshot = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, snapshot);
}
