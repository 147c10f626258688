//! Chain throughput benchmark suite.
//!
//! Measures how fast command chains settle against an in-memory document
//! and an instant transport:
//! - Sequential steps on one command: 10, 100
//! - Concurrent commands: 50, 200
//!
//! Run with: cargo bench --bench chain_throughput
//! Results saved to: target/criterion/

use std::sync::Arc;

use async_trait::async_trait;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use futures_util::future::join_all;
use tokio::runtime::Runtime;

use sxkit::{
    Document, HttpRequest, HttpResponse, MemoryDocument, Result, SwapMethod, Sx, Transport,
};

// ============================================================================
// Fixtures
// ============================================================================

/// Answers every request with a fixed fragment.
struct InstantTransport;

#[async_trait]
impl Transport for InstantTransport {
    async fn send(&self, _request: HttpRequest) -> Result<HttpResponse> {
        Ok(HttpResponse::new(200, "<li>item</li>"))
    }
}

fn context(targets: usize) -> Sx {
    let document = Arc::new(MemoryDocument::new());
    for i in 0..targets {
        let id = format!("list-{i}");
        document.append(document.body(), "ul", &[("id", id.as_str())]);
    }
    Sx::builder()
        .document(document as Arc<dyn Document>)
        .transport(Arc::new(InstantTransport))
        .build()
        .expect("valid context")
}

// ============================================================================
// Benchmark Parameters
// ============================================================================

const STEP_COUNTS: &[usize] = &[10, 100];
const COMMAND_COUNTS: &[usize] = &[50, 200];

// ============================================================================
// Benchmark: Sequential Steps
// ============================================================================

fn bench_sequential_steps(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("sequential_steps");

    for &steps in STEP_COUNTS {
        group.bench_with_input(BenchmarkId::new("get_swap", steps), &steps, |b, &steps| {
            b.to_async(&rt).iter(|| async move {
                let sx = context(1);
                let mut command = sx.select("#list-0");
                for _ in 0..steps {
                    command = command.get("/items").swap(SwapMethod::BeforeEnd);
                }
                command.settled().await.expect("chain settles");
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Concurrent Commands
// ============================================================================

fn bench_concurrent_commands(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("concurrent_commands");
    group.sample_size(20);

    for &count in COMMAND_COUNTS {
        group.bench_with_input(BenchmarkId::new("settle", count), &count, |b, &count| {
            b.to_async(&rt).iter(|| async move {
                let sx = context(count);
                let commands: Vec<_> = (0..count)
                    .map(|i| {
                        sx.select(&format!("#list-{i}"))
                            .get("/items")
                            .swap(SwapMethod::InnerHtml)
                    })
                    .collect();
                let results = join_all(commands.iter().map(|command| command.settled())).await;
                assert!(results.iter().all(|result| result.is_ok()));
            });
        });
    }

    group.finish();
}

// ============================================================================
// Criterion Setup
// ============================================================================

criterion_group!(benches, bench_sequential_steps, bench_concurrent_commands);
criterion_main!(benches);
