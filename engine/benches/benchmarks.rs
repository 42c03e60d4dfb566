//! Performance benchmarks for docsync-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use docsync_engine::{
    compare, format, render, Format, LocalEdit, MemoryStore, ReconcileOptions, Reconciler, Value,
};
use serde_json::json;

fn create_document(sections: usize, revision: i64) -> Value {
    let body: Vec<_> = (0..sections)
        .map(|i| {
            json!({
                "heading": format!("Section {}", i),
                "text": "Lorem ipsum dolor sit amet, consectetur adipiscing elit.",
                "tags": ["a", "b", "c"],
                "order": i,
            })
        })
        .collect();

    Value::from(json!({
        "_id": "doc_1",
        "_modified": revision,
        "title": "Benchmark document",
        "published": true,
        "body": body,
    }))
}

fn edited(doc: &Value) -> Value {
    let mut doc = doc.clone();
    if let Some(map) = doc.as_object_mut() {
        map.insert("title", Value::from("Edited title"));
    }
    doc
}

fn bench_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("format");

    for size in [10, 100, 1000] {
        let doc = create_document(size, 1);
        let json = format::serialize(&doc, Format::Json).unwrap();
        let yaml = format::serialize(&doc, Format::Yaml).unwrap();

        group.bench_with_input(BenchmarkId::new("parse_json", size), &json, |b, bytes| {
            b.iter(|| format::parse(black_box(bytes), Format::Json))
        });
        group.bench_with_input(BenchmarkId::new("parse_yaml", size), &yaml, |b, bytes| {
            b.iter(|| format::parse(black_box(bytes), Format::Yaml))
        });
        group.bench_with_input(BenchmarkId::new("serialize_yaml", size), &doc, |b, doc| {
            b.iter(|| format::serialize(black_box(doc), Format::Yaml))
        });
    }

    group.finish();
}

fn bench_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff");

    for size in [10, 100, 1000] {
        let old = create_document(size, 1);
        let new = edited(&old);

        group.bench_with_input(BenchmarkId::new("compare_equal", size), &old, |b, doc| {
            b.iter(|| compare(black_box(doc), black_box(doc)))
        });
        group.bench_with_input(
            BenchmarkId::new("compare_one_change", size),
            &(old.clone(), new.clone()),
            |b, (old, new)| b.iter(|| compare(black_box(old), black_box(new))),
        );

        let diff = compare(&old, &new);
        group.bench_with_input(BenchmarkId::new("render", size), &diff, |b, diff| {
            b.iter(|| render(black_box(diff), black_box(&old)))
        });
    }

    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");

    group.bench_function("dry_run_100_sections", |b| {
        let store = MemoryStore::new();
        let remote = create_document(100, 1);
        store.insert("docs", remote.clone()).unwrap();
        let local = edited(&remote);

        b.iter(|| {
            let edit = LocalEdit::from_content(local.clone()).unwrap();
            Reconciler::new(&store).reconcile(
                "docs",
                black_box(edit),
                None,
                ReconcileOptions::dry_run(),
                |_| {},
            )
        })
    });

    group.finish();
}

criterion_group!(benches, bench_format, bench_diff, bench_reconcile);
criterion_main!(benches);
