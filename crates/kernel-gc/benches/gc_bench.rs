//! Allocation/collection benchmarks, in the same minimal shape as the
//! teacher's `fgc/benches/gc_bench.rs`.
//!
//! Run with: `cargo bench --package kernel-gc`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kernel_gc::{GcConfig, State, Value};

fn dummy_eval(_s: &mut State, _x: &[Value], _o: Value, _e: Value) -> kernel_gc::KResult<()> {
    Ok(())
}

fn bench_alloc_pair(c: &mut Criterion) {
    let mut state = State::new(GcConfig::default(), dummy_eval);
    c.bench_function("alloc_pair", |b| {
        b.iter(|| black_box(state.cons(Value::Fixint(1), Value::Nil).unwrap()))
    });
}

fn bench_collect_with_rooted_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("collect_with_rooted_chain");
    for &chain_len in &[64usize, 1024] {
        group.bench_function(format!("{chain_len}_rooted_pairs"), |b| {
            b.iter_batched(
                || {
                    let mut state = State::new(GcConfig::default(), dummy_eval);
                    let mut head = Value::Nil;
                    let mut roots = Vec::with_capacity(chain_len);
                    for i in 0..chain_len {
                        head = state.cons(Value::Fixint(i as i64), head).unwrap();
                        roots.push(state.roots.push(head));
                    }
                    for _ in 0..chain_len {
                        let _ = state.cons(Value::Fixint(-1), Value::Nil).unwrap();
                    }
                    (state, roots)
                },
                |(mut state, roots)| {
                    state.collect_now();
                    for r in roots {
                        state.roots.pop(r);
                    }
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_alloc_pair, bench_collect_with_rooted_chain);
criterion_main!(benches);
