use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ripple::cli::Lexer;
use ripple::eval::{evaluate, solutions, StackContext};
use ripple::model::MemoryStore;
use ripple::Library;

fn context() -> StackContext {
    StackContext::new(
        MemoryStore::new().connection(),
        Arc::new(Library::standard().expect("standard library loads")),
    )
}

fn bench_branching(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let lexer = Lexer::new();
    let mut group = c.benchmark_group("branching");

    for width in [4usize, 16, 64] {
        let items: Vec<String> = (0..width).map(|i| i.to_string()).collect();
        let query = format!("({0}) each ({0}) each add unique", items.join(" "));
        let tokens = lexer.tokens(&query).expect("valid query");
        group.bench_with_input(BenchmarkId::from_parameter(width), &tokens, |b, tokens| {
            b.iter(|| {
                runtime.block_on(async {
                    solutions::collect(evaluate(tokens, context()).expect("resolves"))
                        .await
                        .expect("evaluates")
                })
            })
        });
    }
    group.finish();
}

fn bench_library_load(c: &mut Criterion) {
    c.bench_function("standard library", |b| b.iter(Library::standard));
}

criterion_group!(benches, bench_branching, bench_library_load);
criterion_main!(benches);
