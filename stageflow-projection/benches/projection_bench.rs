//! Benchmarks for event projection and message filtering.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stageflow_projection::prelude::*;

fn projection_benchmark(c: &mut Criterion) {
    let machine = StageStateMachine::default();
    let events = ProgressSimulator::default().events();
    let now = now_utc();

    c.bench_function("apply_simulated_run", |b| {
        b.iter(|| {
            let mut state = WorkflowData::new();
            for event in &events {
                machine.apply_raw(&mut state, black_box(event), now);
            }
            black_box(state.overall_progress)
        });
    });
}

fn filter_benchmark(c: &mut Criterion) {
    let filter = MessageFilter::default();
    let messages: Vec<Message> = (0..200)
        .map(|i| {
            if i % 2 == 0 {
                Message::human(format!("h{i}"), "next step please")
            } else {
                Message::assistant(format!("a{i}"), &format!("reply {}", i % 20))
            }
        })
        .collect();

    c.bench_function("filter_replayed_history", |b| {
        b.iter(|| black_box(filter.project(black_box(&messages))));
    });
}

criterion_group!(benches, projection_benchmark, filter_benchmark);
criterion_main!(benches);
