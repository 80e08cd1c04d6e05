// SPDX-License-Identifier: PMPL-1.0-or-later
//! Property-based tests for rule evaluation

use docgate_rules::{
    evaluate, AuthContext, Decision, DenyReason, DocumentSnapshot, Fields, Operation, Path,
    RuleRegistry,
};
use proptest::prelude::*;
use serde_json::json;

/// Generate arbitrary user ids
fn arb_uid() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,15}"
}

/// Two distinct user ids
fn arb_distinct_uids() -> impl Strategy<Value = (String, String)> {
    (arb_uid(), arb_uid()).prop_filter("uids must differ", |(a, b)| a != b)
}

/// Authenticated or anonymous caller
fn arb_auth() -> impl Strategy<Value = AuthContext> {
    prop::option::of(arb_uid()).prop_map(|uid| match uid {
        Some(uid) => AuthContext::user(uid),
        None => AuthContext::anonymous(),
    })
}

fn arb_write() -> impl Strategy<Value = Operation> {
    prop_oneof![Just(Operation::Create), Just(Operation::Update)]
}

fn arb_operation() -> impl Strategy<Value = Operation> {
    prop::sample::select(Operation::ALL.to_vec())
}

/// Small field maps with string values
fn arb_fields() -> impl Strategy<Value = Fields> {
    prop::collection::btree_map("[a-z]{1,8}", "[A-Za-z0-9 ]{0,12}".prop_map(|s| json!(s)), 0..4)
}

fn registry() -> RuleRegistry {
    RuleRegistry::standard().unwrap()
}

fn path(raw: &str) -> Path {
    Path::parse(raw).unwrap()
}

proptest! {
    #[test]
    fn test_profile_read_always_allowed(uid in arb_uid(), auth in arb_auth(), stored in arb_fields()) {
        let decision = evaluate(
            &registry(),
            &path(&format!("/users/{}", uid)),
            Operation::Read,
            &auth,
            &DocumentSnapshot::existing(stored),
            None,
        );
        prop_assert_eq!(decision, Decision::Allow);
    }

    #[test]
    fn test_profile_write_by_other_denied(
        (owner, caller) in arb_distinct_uids(),
        op in arb_write(),
        exists in any::<bool>(),
        proposed in arb_fields()
    ) {
        let before = if exists { DocumentSnapshot::existing(Fields::new()) } else { DocumentSnapshot::missing() };
        let decision = evaluate(
            &registry(),
            &path(&format!("/users/{}", owner)),
            op,
            &AuthContext::user(caller),
            &before,
            Some(&proposed),
        );
        prop_assert_eq!(decision, Decision::Deny(DenyReason::NotOwner));
    }

    #[test]
    fn test_profile_write_by_owner_allowed(uid in arb_uid(), op in arb_write(), proposed in arb_fields()) {
        let decision = evaluate(
            &registry(),
            &path(&format!("/users/{}", uid)),
            op,
            &AuthContext::user(uid.clone()),
            &DocumentSnapshot::missing(),
            Some(&proposed),
        );
        prop_assert_eq!(decision, Decision::Allow);
    }

    #[test]
    fn test_user_documents_never_deletable(
        uid in arb_uid(),
        auth in arb_auth(),
        doc in prop::sample::select(vec!["", "/user_meta/private", "/user_meta/settings"])
    ) {
        let decision = evaluate(
            &registry(),
            &path(&format!("/users/{}{}", uid, doc)),
            Operation::Delete,
            &auth,
            &DocumentSnapshot::existing(Fields::new()),
            None,
        );
        prop_assert_eq!(decision, Decision::Deny(DenyReason::DeleteForbidden));
    }

    #[test]
    fn test_private_metadata_read_owner_only((owner, other) in arb_distinct_uids()) {
        let registry = registry();
        let p = path(&format!("/users/{}/user_meta/private", owner));
        let before = DocumentSnapshot::existing(Fields::new());

        let denied = evaluate(&registry, &p, Operation::Read, &AuthContext::user(other), &before, None);
        prop_assert_eq!(denied, Decision::Deny(DenyReason::NotOwner));

        let allowed = evaluate(&registry, &p, Operation::Read, &AuthContext::user(owner), &before, None);
        prop_assert_eq!(allowed, Decision::Allow);
    }

    #[test]
    fn test_settings_metadata_publicly_readable(uid in arb_uid(), auth in arb_auth()) {
        let decision = evaluate(
            &registry(),
            &path(&format!("/users/{}/user_meta/settings", uid)),
            Operation::Read,
            &auth,
            &DocumentSnapshot::existing(Fields::new()),
            None,
        );
        prop_assert_eq!(decision, Decision::Allow);
    }

    #[test]
    fn test_bootstrap_is_one_shot((first, second) in arb_distinct_uids()) {
        let registry = registry();
        let roster = path("/settings/admins");

        let claim: Fields = serde_json::from_value(json!({ first.clone(): ["root"] })).unwrap();
        let decision = evaluate(
            &registry,
            &roster,
            Operation::Create,
            &AuthContext::user(first),
            &DocumentSnapshot::missing(),
            Some(&claim),
        );
        prop_assert_eq!(decision, Decision::Allow);

        let established = DocumentSnapshot::existing(claim);
        let second_claim: Fields = serde_json::from_value(json!({ second.clone(): ["root"] })).unwrap();
        let decision = evaluate(
            &registry,
            &roster,
            Operation::Create,
            &AuthContext::user(second),
            &established,
            Some(&second_claim),
        );
        prop_assert_eq!(decision, Decision::Deny(DenyReason::RootAlreadyClaimed));
    }

    #[test]
    fn test_evaluation_is_deterministic(
        uid in arb_uid(),
        auth in arb_auth(),
        op in arb_operation(),
        proposed in arb_fields()
    ) {
        let registry = registry();
        let p = path(&format!("/users/{}/user_meta/settings", uid));
        let before = DocumentSnapshot::existing(Fields::new());
        let first = evaluate(&registry, &p, op, &auth, &before, Some(&proposed));
        let second = evaluate(&registry, &p, op, &auth, &before, Some(&proposed));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_unregistered_collections_fail_closed(
        collection in "[a-z]{1,10}".prop_filter("registered collections", |c| c != "users" && c != "settings"),
        doc in arb_uid(),
        auth in arb_auth(),
        op in arb_operation()
    ) {
        let decision = evaluate(
            &registry(),
            &path(&format!("/{}/{}", collection, doc)),
            op,
            &auth,
            &DocumentSnapshot::existing(Fields::new()),
            None,
        );
        prop_assert_eq!(decision, Decision::Deny(DenyReason::NoMatchingRule));
    }
}
