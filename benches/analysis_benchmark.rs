//! Analyzer benchmarks
//!
//! ```bash
//! cargo bench --bench analysis_benchmark
//! ```

use std::fmt::Write;
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use cargo_worstcase::{AnalysisOptions, ComplexityAnalyzer, ComplexityExpr};

/// A file of `functions` functions, each with nested loops and a branch
fn synthetic_source(functions: usize) -> String {
    let mut source = String::new();
    for i in 0..functions {
        let _ = write!(
            source,
            r#"
fn worker_{i}(items: &mut Vec<i32>, flag: bool) -> i32 {{
    let mut total = 0;
    for a in items.iter() {{
        for b in items.iter() {{
            total += a * b;
        }}
    }}
    if flag {{
        items.sort();
    }} else {{
        items.retain(|x| *x > 0);
    }}
    total
}}
"#
        );
    }
    source
}

fn bench_analyze(c: &mut Criterion) {
    let analyzer = ComplexityAnalyzer::new(AnalysisOptions::default());
    let mut group = c.benchmark_group("analyze");

    for functions in [1, 10, 100] {
        let source = synthetic_source(functions);
        group.bench_with_input(BenchmarkId::from_parameter(functions), &source, |b, source| {
            b.iter(|| {
                analyzer
                    .analyze(black_box(source))
                    .expect("synthetic source parses")
            });
        });
    }

    group.finish();
}

fn bench_algebra(c: &mut Criterion) {
    let polynomial: ComplexityExpr = "3*n^2 + 2*n*log(n) + n + 7".parse().expect("valid expression");

    c.bench_function("multiply_polynomials", |b| {
        b.iter(|| black_box(&polynomial).multiply(black_box(&polynomial)))
    });

    c.bench_function("add_polynomials", |b| {
        b.iter(|| black_box(&polynomial).add(black_box(&polynomial)))
    });
}

criterion_group!(benches, bench_analyze, bench_algebra);
criterion_main!(benches);
