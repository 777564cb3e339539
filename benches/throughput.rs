//! Throughput benchmarks for During pipelines.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use during::PipelineBuilder;
use during::observability::TracingConfig;
use during::pipeline::PipelineConfig;
use serde_json::{Value, json};
use std::hint::black_box;

fn numbers(count: usize) -> Value {
    Value::Array((0..count as i64).map(Value::from).collect())
}

fn quiet(name: &str) -> PipelineConfig {
    PipelineConfig::named(name).with_tracing(TracingConfig::none())
}

fn bench_map(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("map");

    for count in [16, 256, 4096].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.to_async(&runtime).iter(|| async move {
                let mut pipeline = PipelineBuilder::new(numbers(count))
                    .with_config(quiet("bench_map"))
                    .map(|x| async move { Ok(json!(x.as_i64().unwrap_or(0) + 1)) })
                    .build();
                black_box(pipeline.run().await.unwrap())
            });
        });
    }

    group.finish();
}

fn bench_filter_map_reduce(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("filter_map_reduce");

    for limit in [1, 8, 64].iter() {
        group.throughput(Throughput::Elements(1024));
        group.bench_with_input(BenchmarkId::from_parameter(limit), limit, |b, &limit| {
            b.to_async(&runtime).iter(|| async move {
                let mut pipeline = PipelineBuilder::new(numbers(1024))
                    .with_config(quiet("bench_chain").with_concurrency(limit))
                    .filter(|x| async move { Ok(x.as_i64().unwrap_or(0) % 3 == 0) })
                    .map(|x| async move { Ok(json!(x.as_i64().unwrap_or(0) * 2)) })
                    .reduce(0, |x, sum| async move {
                        Ok(json!(sum.as_i64().unwrap_or(0) + x.as_i64().unwrap_or(0)))
                    })
                    .build();
                black_box(pipeline.run().await.unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_map, bench_filter_map_reduce);

criterion_main!(benches);
