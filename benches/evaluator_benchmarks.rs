// SPDX-License-Identifier: PMPL-1.0-or-later
//! Performance benchmarks for DocGate rule evaluation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

use docgate_rules::{
    evaluate, AuthContext, DocumentSnapshot, Fields, Operation, Path, PathMatcher, PathTemplate,
    RuleRegistry,
};

// ============================================================================
// Evaluation Benchmarks
// ============================================================================

fn bench_evaluate(c: &mut Criterion) {
    let registry = RuleRegistry::standard().unwrap();
    let before = DocumentSnapshot::existing(Fields::new());
    let claim: Fields = serde_json::from_value(json!({ "apple": ["root", "customer-chat-support"] })).unwrap();

    let cases = [
        ("profile_read", "/users/apple", Operation::Read, None),
        ("private_read_denied", "/users/apple/user_meta/private", Operation::Read, None),
        ("settings_update", "/users/banana/user_meta/settings", Operation::Update, None),
        ("roster_claim", "/settings/admins", Operation::Create, Some(&claim)),
        ("no_match", "/posts/1/comments/2", Operation::Read, None),
    ];

    let mut group = c.benchmark_group("evaluate");
    let auth = AuthContext::user("banana");
    let missing = DocumentSnapshot::missing();

    for (name, raw, op, proposed) in cases {
        let path = Path::parse(raw).unwrap();
        let snapshot = if op == Operation::Create { &missing } else { &before };
        group.bench_with_input(BenchmarkId::from_parameter(name), &path, |b, path| {
            b.iter(|| black_box(evaluate(&registry, path, op, &auth, snapshot, proposed)))
        });
    }

    group.finish();
}

// ============================================================================
// Matcher Benchmarks
// ============================================================================

fn bench_matcher_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("matcher");

    for count in [4usize, 64, 512] {
        let templates: Vec<PathTemplate> = (0..count)
            .map(|i| PathTemplate::parse(&format!("/col{}/{{id}}/sub/{{child}}", i)).unwrap())
            .collect();
        let matcher = PathMatcher::new(templates).unwrap();
        let path = Path::parse(&format!("/col{}/a/sub/b", count - 1)).unwrap();

        group.bench_with_input(BenchmarkId::new("resolve", count), &path, |b, path| {
            b.iter(|| black_box(matcher.resolve(path)))
        });
    }

    group.finish();
}

fn bench_path_parse(c: &mut Criterion) {
    c.bench_function("path_parse", |b| {
        b.iter(|| black_box(Path::parse("/users/apple/user_meta/private")))
    });
}

criterion_group!(benches, bench_evaluate, bench_matcher_scaling, bench_path_parse);
criterion_main!(benches);
