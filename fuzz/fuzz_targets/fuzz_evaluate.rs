// SPDX-License-Identifier: PMPL-1.0-or-later
// Fuzz target for path parsing and rule evaluation

#![no_main]

use docgate_rules::{evaluate, AuthContext, DocumentSnapshot, Fields, Operation, Path, RuleRegistry};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    // Layout: "<path>\n<uid>\n<json payload>"
    let mut parts = s.splitn(3, '\n');
    let raw_path = parts.next().unwrap_or_default();
    let uid = parts.next().filter(|u| !u.is_empty());
    let payload: Option<Fields> = parts.next().and_then(|p| serde_json::from_str(p).ok());

    let Ok(path) = Path::parse(raw_path) else {
        return;
    };
    let Ok(registry) = RuleRegistry::standard() else {
        return;
    };
    let auth = match uid {
        Some(uid) => AuthContext::user(uid),
        None => AuthContext::anonymous(),
    };

    // Evaluation must be total: every input yields a decision, no panics.
    for before in [DocumentSnapshot::missing(), DocumentSnapshot::existing(payload.clone().unwrap_or_default())] {
        for op in Operation::ALL {
            let first = evaluate(&registry, &path, op, &auth, &before, payload.as_ref());
            let second = evaluate(&registry, &path, op, &auth, &before, payload.as_ref());
            assert_eq!(first, second);
        }
    }
});
