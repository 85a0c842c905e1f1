//! Legasi risk engine benchmarks
//!
//! Hot paths hit on every borrow, withdraw and keeper sweep:
//! - GAD rate curve
//! - Unwind planning
//! - Full position report over many collateral assets

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use legasi_common::{AccountId, AssetId, CollateralConfig, Position, PriceEntry, USD_SCALE};
use legasi_risk::{gad_rate_bps, plan_unwind, MarketSnapshot, RiskReport};

const NOW: i64 = 1_700_000_000;

fn bench_gad(c: &mut Criterion) {
    let mut group = c.benchmark_group("gad");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("rate", |b| {
        b.iter(|| {
            for ltv in (7_900u64..8_600).step_by(7) {
                black_box(gad_rate_bps(black_box(ltv), 8_000));
            }
        });
    });

    group.bench_function("plan_unwind", |b| {
        b.iter(|| plan_unwind(black_box(1_000 * USD_SCALE), black_box(850 * USD_SCALE), 8_000));
    });

    group.finish();
}

fn bench_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("report");
    group.measurement_time(Duration::from_secs(5));

    for assets in [1usize, 4, 16].iter() {
        let mut market = MarketSnapshot::new(NOW, 300);
        let mut position = Position::new(AccountId::new("bench"), NOW);
        for i in 0..*assets {
            let asset = AssetId::new(format!("ASSET{i}"));
            market = market
                .with_collateral(CollateralConfig::new(asset.clone(), 7_000, 8_000, 500, 8))
                .with_price(asset.clone(), PriceEntry::new(1_000 * USD_SCALE, NOW));
            let _ = position.deposit(&asset, 100_000_000, NOW);
        }
        let _ = position.record_borrow(&AssetId::new("USDC"), 500 * USD_SCALE, NOW);

        group.throughput(Throughput::Elements(*assets as u64));
        group.bench_with_input(BenchmarkId::new("evaluate", assets), assets, |b, _| {
            b.iter(|| RiskReport::evaluate(black_box(&position), black_box(&market), 250));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_gad, bench_report);
criterion_main!(benches);
