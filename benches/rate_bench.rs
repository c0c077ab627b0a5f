use cladeclock::clade::{partition, CladeConstraint, MonophylyPolicy};
use cladeclock::clock::{CategoryMode, RateSource, RelaxedClockParams};
use cladeclock::parameter::RealParameter;
use cladeclock::taxa::TaxonSet;
use cladeclock::{BranchRateModel, Tree};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

/// Balanced tree over `2^depth` taxa.
fn balanced_newick(depth: u32) -> String {
    fn build(depth: u32, next: &mut usize) -> String {
        if depth == 0 {
            *next += 1;
            return format!("T{}", *next - 1);
        }
        let left = build(depth - 1, next);
        let right = build(depth - 1, next);
        format!("({}:{},{}:{})", left, 0.5 + depth as f64 * 0.1, right, 1.0)
    }
    let mut next = 0;
    format!("{};", build(depth, &mut next))
}

fn setup_clades(leaves: usize) -> Vec<CladeConstraint> {
    // nested blocks of consecutive taxa: halves, quarters, eighths
    let mut clades = Vec::new();
    for level in 1..=3 {
        let parts = 1 << level;
        let size = leaves / parts;
        for p in 0..parts {
            let names: Vec<String> = (p * size..(p + 1) * size).map(|i| format!("T{}", i)).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            clades.push(CladeConstraint::new(&format!("c{}_{}", level, p), &refs));
        }
    }
    clades
}

fn criterion_benchmark(c: &mut Criterion) {
    let tree = Tree::from_newick(&balanced_newick(9)).expect("Failed to parse tree");
    let clades = setup_clades(tree.leaf_count());
    let taxa = TaxonSet::from_tree(&tree);

    c.bench_function("partition (512 taxa, 14 clades)", |b| {
        b.iter(|| partition(black_box(&tree), &taxa, black_box(&clades), MonophylyPolicy::Warn))
    });

    let mut clock = RelaxedClockParams::builder()
        .tree(&tree)
        .clades(clades.clone())
        .source(RateSource::LogNormalStdDev(
            RealParameter::positive("rateStdDev", vec![0.3]).expect("Failed to build stddev"),
        ))
        .mean_rate(RealParameter::positive("meanRate", vec![1.0]).expect("Failed to build mean"))
        .mode(CategoryMode::PerClade)
        .normalize(true)
        .build()
        .build_clock()
        .expect("Failed to build clock");

    c.bench_function("rate_for_branch sweep (cached)", |b| {
        b.iter(|| {
            let mut sum = 0.0;
            for node in 0..tree.node_count() {
                sum += clock.rate_for_branch(&tree, black_box(node)).unwrap_or(0.0);
            }
            sum
        })
    });

    c.bench_function("poll + sweep (scale recomputed)", |b| {
        b.iter(|| {
            clock.requires_recalculation();
            let mut sum = 0.0;
            for node in 0..tree.node_count() {
                sum += clock.rate_for_branch(&tree, black_box(node)).unwrap_or(0.0);
            }
            sum
        })
    });

    c.bench_function("store + stddev move + restore", |b| {
        let mut step = 0usize;
        b.iter(|| {
            clock.store();
            step += 1;
            if let Some(sd) = clock.stddev_mut() {
                let _ = sd.set_value(0, 0.2 + (step % 10) as f64 * 0.02);
            }
            clock.requires_recalculation();
            let rate = clock.rate_for_branch(&tree, black_box(0));
            clock.restore();
            rate
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
