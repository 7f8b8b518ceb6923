use criterion::{Criterion, criterion_group, criterion_main};
use cycle_arb::{Pair, Quote, Scanner, ScannerBuilder, StaticExchange};

fn scanner() -> eyre::Result<Scanner> {
    let a = StaticExchange::new("A")
        .with_quote(Pair::parse("X-USDC")?, Quote::new(2.0, 100.0, 1.9, 100.0))
        .with_quote(Pair::parse("WETH-USDC")?, Quote::new(2210.0, 1.0, 2190.0, 1.0));
    let b = StaticExchange::new("B")
        .with_quote(Pair::parse("X-WETH")?, Quote::new(0.0011, 100.0, 0.001, 100.0))
        .with_quote(Pair::parse("X-USDC")?, Quote::new(2.05, 100.0, 1.95, 100.0));
    let c = StaticExchange::new("C")
        .with_quote(Pair::parse("WETH-USDC")?, Quote::new(2200.0, 1.0, 2100.0, 1.0))
        .with_quote(Pair::parse("X-WETH")?, Quote::new(0.00105, 100.0, 0.00095, 100.0));

    Ok(ScannerBuilder::new().with_exchange(a).with_exchange(b).with_exchange(c).with_max_cycle_length(5).with_min_profit_percent(-100.0).build()?)
}

fn benchmark_scan(c: &mut Criterion) {
    let Ok(runtime) = tokio::runtime::Runtime::new() else {
        return;
    };
    let Ok(scanner) = scanner() else {
        return;
    };
    let scanner = tokio::sync::Mutex::new(scanner);

    let mut group = c.benchmark_group("scanner");
    group.sample_size(10);
    group.bench_function("full_pass", |b| {
        b.to_async(&runtime).iter(|| async {
            let mut scanner = scanner.lock().await;
            scanner.scan().await
        })
    });
    group.finish();
}

criterion_group!(benches, benchmark_scan);
criterion_main!(benches);
