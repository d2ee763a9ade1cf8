// crates/message-catalog-core/tests/reconcile.rs
// ============================================================================
// Module: Reconciler Tests
// Description: Soft, hard, and retirement planning against persisted catalogs.
// Purpose: Ensure the plan never overwrites store edits unless forced.
// Dependencies: message-catalog-core, proptest
// ============================================================================
//! ## Overview
//! Reconciliation is pure, so these tests exercise every branch directly and
//! then check plan-level invariants over randomized inputs.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeSet;

use message_catalog_core::CatalogSnapshot;
use message_catalog_core::Definitions;
use message_catalog_core::MessageDefinition;
use message_catalog_core::MessageName;
use message_catalog_core::StructuredMessage;
use message_catalog_core::SyncMode;
use message_catalog_core::VariableDefinition;
use message_catalog_core::reconcile;
use proptest::prelude::*;

/// Builds message names from string literals.
fn names(items: &[&str]) -> Vec<MessageName> {
    items.iter().copied().map(MessageName::from).collect()
}

#[test]
fn soft_mode_inserts_only_new_names() {
    let definitions = Definitions::from_entries([("a", "A-local"), ("b", "B-local")]).unwrap();
    let persisted = CatalogSnapshot::from_entries([("a", "A-edited")]);

    let plan = reconcile(&definitions, &persisted, &SyncMode::soft());

    assert!(plan.retire.is_empty());
    assert_eq!(plan.preserved, names(&["a"]));
    assert_eq!(plan.upsert.len(), 1);
    assert_eq!(plan.upsert[0].name.as_str(), "b");
    assert_eq!(plan.upsert[0].text, "B-local");
    assert!(!plan.upsert[0].replace_existing);
}

#[test]
fn soft_mode_ignores_hard_list_for_overwrites() {
    let definitions = Definitions::from_entries([("a", "A-local")]).unwrap();
    let persisted = CatalogSnapshot::from_entries([("a", "A-edited")]);

    let plan = reconcile(&definitions, &persisted, &SyncMode::soft_with_retirements(["a"]));

    assert!(plan.upsert.is_empty());
    assert_eq!(plan.preserved, names(&["a"]));
    assert!(plan.is_noop());
}

#[test]
fn hard_mode_replaces_listed_persisted_names() {
    let definitions = Definitions::from_entries([
        (
            "help",
            MessageDefinition::from(StructuredMessage {
                text: "Use {cmd}".to_string(),
                variables: vec![VariableDefinition::new("cmd", "command")],
            }),
        ),
        ("other", MessageDefinition::from("Other")),
    ])
    .unwrap();
    let persisted = CatalogSnapshot::from_entries([("help", "old"), ("other", "edited")]);

    let plan = reconcile(&definitions, &persisted, &SyncMode::hard(["help"]));

    assert_eq!(plan.upsert.len(), 1);
    let help = &plan.upsert[0];
    assert_eq!(help.name.as_str(), "help");
    assert!(help.replace_existing);
    assert_eq!(help.variables, vec![VariableDefinition::new("cmd", "command")]);
    assert_eq!(plan.preserved, names(&["other"]));
}

#[test]
fn hard_listed_name_new_to_store_is_plain_insert() {
    let definitions = Definitions::from_entries([("fresh", "text")]).unwrap();
    let plan = reconcile(&definitions, &CatalogSnapshot::new(), &SyncMode::hard(["fresh"]));

    assert_eq!(plan.upsert.len(), 1);
    assert!(!plan.upsert[0].replace_existing);
}

#[test]
fn hard_list_names_missing_locally_are_retired_in_any_mode() {
    let definitions = Definitions::from_entries([("kept", "text")]).unwrap();
    let persisted = CatalogSnapshot::from_entries([("kept", "text"), ("old", "gone")]);

    for mode in [SyncMode::soft_with_retirements(["old"]), SyncMode::hard(["old"])] {
        let plan = reconcile(&definitions, &persisted, &mode);
        assert_eq!(plan.retire, BTreeSet::from([MessageName::new("old")]));
        assert_eq!(plan.preserved, names(&["kept"]));
    }
}

#[test]
fn upserts_follow_authored_order() {
    let definitions = Definitions::from_entries([("z", "1"), ("m", "2"), ("a", "3")]).unwrap();
    let plan = reconcile(&definitions, &CatalogSnapshot::new(), &SyncMode::soft());
    let order: Vec<&str> = plan.upsert.iter().map(|planned| planned.name.as_str()).collect();
    assert_eq!(order, vec!["z", "m", "a"]);
}

/// Small sets of names drawn from a shared alphabet so overlaps are common.
fn arb_names() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[a-e]{1,2}", 0..8)
}

proptest! {
    #[test]
    fn plan_partitions_names_and_respects_mode(
        local in arb_names(),
        stored in arb_names(),
        hard_list in arb_names(),
        hard in any::<bool>(),
    ) {
        let definitions = Definitions::from_entries(
            local.iter().map(|name| (name.clone(), MessageDefinition::from("local")))
        ).unwrap();
        let persisted = CatalogSnapshot::from_entries(stored.iter().map(|name| (name.clone(), "stored")));
        let mode = if hard {
            SyncMode::hard(hard_list.iter().cloned())
        } else {
            SyncMode::soft_with_retirements(hard_list.iter().cloned())
        };

        let plan = reconcile(&definitions, &persisted, &mode);

        let upserted: BTreeSet<&str> = plan.upsert.iter().map(|planned| planned.name.as_str()).collect();
        let preserved: BTreeSet<&str> = plan.preserved.iter().map(MessageName::as_str).collect();
        let retired: BTreeSet<&str> = plan.retire.iter().map(MessageName::as_str).collect();

        prop_assert!(upserted.is_disjoint(&preserved));
        prop_assert!(upserted.is_disjoint(&retired));
        prop_assert!(preserved.is_disjoint(&retired));
        prop_assert_eq!(upserted.len() + preserved.len(), local.len());

        for name in &retired {
            prop_assert!(hard_list.contains(*name));
            prop_assert!(!local.contains(*name));
        }
        for planned in &plan.upsert {
            let known = stored.contains(planned.name.as_str());
            prop_assert_eq!(planned.replace_existing, known);
            if known {
                prop_assert!(hard && hard_list.contains(planned.name.as_str()));
            }
        }
        for name in &preserved {
            prop_assert!(stored.contains(*name));
        }
    }
}
