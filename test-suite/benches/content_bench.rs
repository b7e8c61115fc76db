//! Content Stream Benchmarks
//!
//! Performance benchmarks for tokenizing, parsing and batch validation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pdfcop::parser::{tokenize, ContentParser};
use pdfcop::{validate_all, BatchOptions};
use pdfcop_test_suite::generators::ContentBuilder;

/// Generate content streams of various sizes for benchmarking
fn generate_streams() -> Vec<(String, Vec<u8>)> {
    let mut streams = Vec::new();

    streams.push((
        "minimal".to_string(),
        b"0 0 m 100 100 l S".to_vec(),
    ));

    streams.push((
        "text_100_lines".to_string(),
        ContentBuilder::page_with_text(100).build(),
    ));

    streams.push((
        "paths_100".to_string(),
        ContentBuilder::page_with_paths(100).build(),
    ));

    let mut mixed = ContentBuilder::page_with_paths(1_000);
    mixed.raw(ContentBuilder::page_with_text(1_000).as_str());
    streams.push(("mixed_large".to_string(), mixed.build()));

    streams
}

fn benchmark_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");
    for (name, content) in generate_streams() {
        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_with_input(BenchmarkId::new("tokenize", &name), &content, |b, content| {
            b.iter(|| tokenize(black_box(content)))
        });
    }
    group.finish();
}

fn benchmark_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for (name, content) in generate_streams() {
        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_with_input(BenchmarkId::new("content", &name), &content, |b, content| {
            b.iter(|| ContentParser::parse(black_box(content)))
        });
    }
    group.finish();
}

fn benchmark_batch(c: &mut Criterion) {
    let pages: Vec<Vec<u8>> = (0..64)
        .map(|i| ContentBuilder::page_with_paths(50 + i).build())
        .collect();

    let mut group = c.benchmark_group("batch");
    group.sample_size(20);
    for parallelism in [1, 2, 4, 8] {
        let options = BatchOptions::default().with_parallelism(parallelism);
        group.bench_with_input(
            BenchmarkId::new("validate_all", parallelism),
            &options,
            |b, options| b.iter(|| validate_all(black_box(&pages), options)),
        );
    }
    group.finish();
}

criterion_group!(benches, benchmark_tokenize, benchmark_parse, benchmark_batch);
criterion_main!(benches);
