use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::fmt::Write as _;

use w3sink_core::dgs::DgsSource;
use w3sink_core::graph::Graph;
use w3sink_core::sink::EventLog;
use w3sink_core::source::shared;

const TIERS: [(&str, usize); 3] = [("small", 100), ("medium", 2_000), ("large", 20_000)];

/// Chain of `nodes` nodes with attributes, one step every 50 nodes.
fn synthetic_stream(nodes: usize) -> String {
    let mut out = format!("DGS004\nbench {nodes} {nodes}\n");
    for i in 0..nodes {
        let _ = writeln!(
            out,
            "an n{i} label:\"node {i}\" xyz:{i}.5,{i},-1e-3 ui.class:c{} color:#a0b0c{}",
            i % 7,
            i % 10
        );
        if i > 0 {
            let _ = writeln!(out, "ae e{i} n{} > n{i} weight:{} tags:{{a,b,[k:v]}}", i - 1, i % 13);
        }
        if i % 50 == 49 {
            let _ = writeln!(out, "st {}", i / 50);
        }
    }
    out
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("dgs.parse");

    for (name, nodes) in TIERS {
        let text = synthetic_stream(nodes);
        group.throughput(Throughput::Bytes(text.len() as u64));

        group.bench_with_input(BenchmarkId::new("no_sink", name), &text, |b, text| {
            b.iter(|| {
                let mut dgs = DgsSource::from_text("bench", text).expect("header");
                black_box(dgs.parse_all().expect("parse"))
            });
        });

        group.bench_with_input(BenchmarkId::new("event_log", name), &text, |b, text| {
            b.iter(|| {
                let mut dgs = DgsSource::from_text("bench", text).expect("header");
                let log = shared(EventLog::new());
                dgs.add_sink(log.clone());
                dgs.parse_all().expect("parse");
                black_box(log.borrow().len())
            });
        });

        group.bench_with_input(BenchmarkId::new("graph", name), &text, |b, text| {
            b.iter(|| {
                let mut dgs = DgsSource::from_text("bench", text).expect("header");
                let graph = shared(Graph::new("graph"));
                dgs.add_sink(graph.clone());
                dgs.parse_all().expect("parse");
                black_box(graph.borrow().edge_count())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
