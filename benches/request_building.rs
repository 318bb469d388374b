//! Benchmarks for request building
//!
//! This benchmark measures:
//! - Path template rendering and query assembly
//! - Header tier merging
//! - JSON body encoding through the codec registry

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use lib_http::{CallArgs, EndpointDefinition, HttpClient, ParamBinding, ParamKind};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Note {
    title: String,
    tags: Vec<String>,
    body: String,
}

fn client() -> HttpClient {
    HttpClient::builder()
        .base_url("https://api.example.com/v1/")
        .default_header("Accept", "application/json")
        .default_header("User-Agent", "bench")
        .json::<Note>()
        .endpoint(EndpointDefinition::get("ping", "/ping"))
        .endpoint(
            EndpointDefinition::get("note", "/users/{user}/notes/{note}")
                .param(ParamBinding::path("user").kind(ParamKind::Integer))
                .param(ParamBinding::path("note").kind(ParamKind::String))
                .param(ParamBinding::query("fields"))
                .param(ParamBinding::query("verbose").kind(ParamKind::Boolean))
                .header("X-Endpoint", "note"),
        )
        .endpoint(
            EndpointDefinition::post("create", "/users/{user}/notes")
                .path_params_from_template()
                .body::<Note>()
                .returns::<Note>(),
        )
        .build()
        .expect("bench client")
}

fn bench_request_building(c: &mut Criterion) {
    let client = client();
    let note = Note {
        title: "benchmark".into(),
        tags: (0..16).map(|i| format!("tag-{}", i)).collect(),
        body: "x".repeat(2048),
    };

    let mut group = c.benchmark_group("request_building");
    group.throughput(Throughput::Elements(1));

    group.bench_with_input(BenchmarkId::new("build", "no_params"), &client, |b, client| {
        b.iter(|| client.prepare_request(black_box("ping"), CallArgs::new()).unwrap())
    });

    group.bench_with_input(BenchmarkId::new("build", "path_and_query"), &client, |b, client| {
        b.iter(|| {
            let args = CallArgs::new()
                .path("user", 42)
                .path("note", "release notes/2024")
                .query("fields", json!(["title", "tags", "body"]))
                .query("verbose", true)
                .header("X-Trace", "abc");
            client.prepare_request(black_box("note"), args).unwrap()
        })
    });

    group.bench_with_input(BenchmarkId::new("build", "json_body"), &client, |b, client| {
        b.iter(|| {
            let args = CallArgs::new().path("user", 7).body(note.clone());
            client.prepare_request(black_box("create"), args).unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_request_building);
criterion_main!(benches);
