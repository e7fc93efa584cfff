use criterion::{Criterion, criterion_group, criterion_main};
use fnsynth_core::{Parameter, Signature, TestCase};
use fnsynth_testgen::{aggregate, assemble, synthesize_generic};
use fnsynth_tools::ExecutionOutput;
use std::hint::black_box;

fn wide_signature() -> Signature {
    Signature::new(
        "merge",
        vec![
            Parameter::new("target", "Record<string, unknown>"),
            Parameter::new("sources", "Array<Record<string, unknown>>"),
            Parameter::new("depth", "number").optional(),
            Parameter::new("label", "string | undefined").optional(),
            Parameter::new("onConflict", "(a: unknown, b: unknown) => unknown").optional(),
        ],
        "Record<string, unknown>",
    )
}

fn harness_output(cases: &[TestCase]) -> ExecutionOutput {
    let mut stdout = String::new();
    for (i, case) in cases.iter().enumerate() {
        if i % 4 == 0 {
            stdout.push_str(&format!("FAIL: {} (1ms) - assertion failed\n", case.name));
        } else {
            stdout.push_str(&format!("PASS: {} (0ms)\n", case.name));
        }
    }
    ExecutionOutput {
        command: "tsx".to_string(),
        stdout,
        stderr: String::new(),
        exit_code: Some(1),
        duration_ms: 500,
    }
}

fn bench_generic_synthesis(c: &mut Criterion) {
    let sig = wide_signature();
    c.bench_function("synthesize_generic_5_params", |b| {
        b.iter(|| synthesize_generic(black_box(&sig)))
    });
}

fn bench_assembly(c: &mut Criterion) {
    let sig = wide_signature();
    let cases = synthesize_generic(&sig);
    let code = "export function merge(target: any, sources: any[]): any { return target; }";
    c.bench_function("assemble_generic_corpus", |b| {
        b.iter(|| assemble(black_box(code), &sig, black_box(&cases)))
    });
}

fn bench_aggregation(c: &mut Criterion) {
    let cases = synthesize_generic(&wide_signature());
    let output = harness_output(&cases);
    c.bench_function("aggregate_harness_output", |b| {
        b.iter(|| aggregate(black_box(&cases), black_box(&output), 0.6, "bench", None))
    });
}

criterion_group!(
    benches,
    bench_generic_synthesis,
    bench_assembly,
    bench_aggregation,
);
criterion_main!(benches);
