/// Scenario tests for the logic layer
///
/// Each test drives a full scan over in memory exchanges with hand priced books, so the expected
/// profits can be checked against the arithmetic written next to them.

#[cfg(test)]
mod integration_tests {
    use super::super::*;
    use crate::data_sync::{
        Exchange, PriceTableConverter, Quote, RateConverter, RateError, RateSnapshot, ReservePool, ReservePoolExchange,
        StaticExchange, StaticRateConverter,
    };
    use crate::utils::{CancelToken, Pair};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use tokio::sync::mpsc;

    struct FailingConverter;

    #[async_trait]
    impl RateConverter for FailingConverter {
        async fn convert(&self) -> Result<RateSnapshot, RateError> {
            Err(RateError::MissingPrice("USDC-WETH".to_string()))
        }
    }

    fn exchange_a() -> eyre::Result<StaticExchange> {
        Ok(StaticExchange::new("A").with_quote(Pair::parse("X-USDC")?, Quote::new(2.0, 100.0, 1.9, 100.0)))
    }

    fn exchange_b() -> eyre::Result<StaticExchange> {
        Ok(StaticExchange::new("B").with_quote(Pair::parse("X-WETH")?, Quote::new(0.0011, 100.0, 0.001, 100.0)))
    }

    fn exchange_c() -> eyre::Result<StaticExchange> {
        Ok(StaticExchange::new("C").with_quote(Pair::parse("WETH-USDC")?, Quote::new(2200.0, 1.0, 2100.0, 1.0)))
    }

    /// Buy X with USDC on A, sell X for WETH on B, sell WETH for USDC on C.
    /// 200 USDC -> 100 X -> 0.1 WETH -> 210 USDC, a 5% gain.
    fn triangle() -> eyre::Result<ScannerBuilder> {
        Ok(ScannerBuilder::new().with_exchange(exchange_a()?).with_exchange(exchange_b()?).with_exchange(exchange_c()?))
    }

    fn keys(result: &ArbitrageResult) -> Vec<&str> {
        result.cycle.iter().map(VertexState::key).collect()
    }

    #[tokio::test]
    async fn test_triangle_profit_by_hand() -> eyre::Result<()> {
        let mut scanner = triangle()?.build()?;

        let report = scanner.scan().await?;

        // the reverse triangle A sell -> C buy -> B buy loses money and is filtered
        assert_eq!(report.cycles_found, 2);
        assert_eq!(report.cycles_valued, 2);
        assert_eq!(report.results.len(), 1);
        let best = report.best().ok_or_else(|| eyre::eyre!("no result"))?;
        assert_eq!(keys(best), vec!["A_X-USDC_buy", "B_X-WETH_sell", "C_WETH-USDC_sell"]);
        assert_eq!(best.initial_amount, 200.0);
        assert!((best.final_amount - 210.0).abs() < 1e-9);
        assert!((best.profit_percent - 5.0).abs() < 1e-9);
        assert!(report.spreads.is_empty());
        assert!(!report.is_degraded());
        assert_eq!(scanner.phase(), ScanPhase::Idle);
        Ok(())
    }

    #[tokio::test]
    async fn test_negative_threshold_surfaces_losing_cycles() -> eyre::Result<()> {
        let mut scanner = triangle()?.with_min_profit_percent(-50.0).build()?;

        let report = scanner.scan().await?;

        assert_eq!(report.results.len(), 2);
        assert!(report.results[0].profit_percent > report.results[1].profit_percent);
        assert!(report.results[1].profit_percent < 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_threshold_is_strict() -> eyre::Result<()> {
        let report = triangle()?.with_min_profit_percent(5.5).build()?.scan().await?;
        assert!(report.results.is_empty());
        assert!(report.best().is_none());

        let report = triangle()?.with_min_profit_percent(4.9).build()?.scan().await?;
        assert_eq!(report.results.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_two_exchange_spread() -> eyre::Result<()> {
        let mut scanner = ScannerBuilder::new()
            .with_exchange(StaticExchange::new("A").with_quote(Pair::parse("WETH-USDC")?, Quote::new(1810.0, 1.0, 1800.0, 1.0)))
            .with_exchange(StaticExchange::new("B").with_quote(Pair::parse("WETH-USDC")?, Quote::new(1750.0, 1.0, 1740.0, 1.0)))
            .build()?;

        let report = scanner.scan().await?;

        // only two step round trips exist, which are never cycles
        assert_eq!(report.cycles_found, 0);
        assert_eq!(report.spreads.len(), 1);
        let spread = &report.spreads[0];
        assert_eq!((spread.buy_exchange.as_str(), spread.sell_exchange.as_str()), ("B", "A"));
        assert!((spread.profit_percent - (1800.0 - 1750.0) / 1750.0 * 100.0).abs() < 1e-9);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_exchange_degrades_pass() -> eyre::Result<()> {
        let mut scanner = triangle()?
            .with_exchange(
                StaticExchange::new("D").with_quote(Pair::parse("X-USDC")?, Quote::new(1.0, 100.0, 1.0, 100.0)).with_failure("rpc timeout"),
            )
            .build()?;

        let report = scanner.scan().await?;

        assert_eq!(report.degraded.len(), 1);
        assert_eq!(report.degraded[0].0, "D");
        assert!(report.degraded[0].1.contains("rpc timeout"));
        assert!(report.results.iter().all(|r| r.cycle.iter().all(|v| v.exchange() != "D")));
        assert_eq!(report.results.len(), 1);
        assert_eq!(scanner.stats().last_degraded, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_every_exchange_failing_is_not_fatal() -> eyre::Result<()> {
        let mut scanner = ScannerBuilder::new()
            .with_exchange(exchange_a()?.with_failure("down"))
            .with_exchange(exchange_b()?.with_failure("down"))
            .build()?;

        let report = scanner.scan().await?;

        assert_eq!(report.degraded.len(), 2);
        assert_eq!(report.cycles_found, 0);
        assert!(report.results.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_books_are_not_an_error() -> eyre::Result<()> {
        let mut scanner = ScannerBuilder::new().with_exchange(StaticExchange::new("A")).with_exchange(exchange_c()?).build()?;

        let report = scanner.scan().await?;

        assert_eq!(report.cycles_found, 0);
        assert!(!report.is_degraded());
        Ok(())
    }

    #[tokio::test]
    async fn test_zero_depth_skips_only_that_cycle() -> eyre::Result<()> {
        let a = StaticExchange::new("A").with_quote(Pair::parse("X-USDC")?, Quote::new(2.0, 0.0, 1.9, 100.0));
        let mut scanner = ScannerBuilder::new()
            .with_exchange(a)
            .with_exchange(exchange_b()?)
            .with_exchange(exchange_c()?)
            .with_min_profit_percent(-100.0)
            .build()?;

        let report = scanner.scan().await?;

        assert_eq!(report.cycles_found, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.cycles_valued, 1);
        assert_eq!(report.results[0].cycle[0].key(), "A_X-USDC_sell");
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_buy_side_keeps_sell_cycle() -> eyre::Result<()> {
        let a = StaticExchange::new("A").with_quote(Pair::parse("X-USDC")?, Quote::new(0.0, 100.0, 1.9, 100.0));
        let mut scanner = ScannerBuilder::new()
            .with_exchange(a)
            .with_exchange(exchange_b()?)
            .with_exchange(exchange_c()?)
            .with_min_profit_percent(-100.0)
            .build()?;

        let report = scanner.scan().await?;

        // 100 X sells for 190 USDC, buys 190 / 2200 WETH, buys back about 78.5 X
        assert_eq!(report.cycles_found, 1);
        assert_eq!(report.results.len(), 1);
        assert_eq!(keys(&report.results[0]), vec!["A_X-USDC_sell", "C_WETH-USDC_buy", "B_X-WETH_buy"]);
        let expected = (190.0 / 2200.0 / 0.0011 - 100.0) / 100.0 * 100.0;
        assert!((report.results[0].profit_percent - expected).abs() < 1e-9);
        Ok(())
    }

    #[tokio::test]
    async fn test_cycle_length_bound_is_configurable() -> eyre::Result<()> {
        // one shared pair on three exchanges only closes after six alternating legs
        let quote = Quote::new(1800.0, 1.0, 1790.0, 1.0);
        let builder = || -> eyre::Result<ScannerBuilder> {
            Ok(ScannerBuilder::new()
                .with_exchange(StaticExchange::new("A").with_quote(Pair::parse("WETH-USDC")?, quote))
                .with_exchange(StaticExchange::new("B").with_quote(Pair::parse("WETH-USDC")?, quote))
                .with_exchange(StaticExchange::new("C").with_quote(Pair::parse("WETH-USDC")?, quote))
                .with_min_profit_percent(-100.0))
        };

        let short = builder()?.with_max_cycle_length(4).build()?.scan().await?;
        assert_eq!(short.cycles_found, 0);

        let long = builder()?.with_max_cycle_length(6).build()?.scan().await?;
        assert!(long.cycles_found > 0);
        assert!(long.results.iter().all(|r| r.cycle.len() == 6));
        Ok(())
    }

    #[tokio::test]
    async fn test_scans_are_deterministic() -> eyre::Result<()> {
        let mut scanner = triangle()?.with_min_profit_percent(-100.0).build()?;

        let first = scanner.scan().await?;
        let second = scanner.scan().await?;

        let routes = |report: &ScanReport| report.results.iter().map(ArbitrageResult::route).collect::<Vec<_>>();
        assert_eq!(routes(&first), routes(&second));
        assert_eq!(scanner.stats().passes, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_overwrites_between_passes() -> eyre::Result<()> {
        let mut scanner = triangle()?.build()?;
        assert_eq!(scanner.scan().await?.results.len(), 1);

        // C now pays less for WETH than the route needs: 0.1 WETH * 1900 = 190 < 200
        let exchange = scanner.exchanges_mut().iter_mut().find(|e| e.name() == "C").ok_or_else(|| eyre::eyre!("no C"))?;
        let mut repriced = exchange_c()?;
        repriced.set_quote(Pair::parse("WETH-USDC")?, Quote::new(2000.0, 1.0, 1900.0, 1.0));
        *exchange = Box::new(repriced);

        let report = scanner.scan().await?;

        assert!(report.results.is_empty());
        assert_eq!(scanner.stats().last_best_profit_percent, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_rates_size_reserve_quotes() -> eyre::Result<()> {
        let pools = ReservePoolExchange::new("Pools", 30)?
            .with_pool(ReservePool { pair: Pair::parse("WETH-USDC")?, base_reserve: 1000.0, quote_reserve: 2_000_000.0 });
        let converter = PriceTableConverter::new("USDC", 10.0, BTreeMap::from([("ETH-USDC".to_string(), 2000.0)]))?
            .with_alias("ETH", "WETH");
        let mut scanner = ScannerBuilder::new().with_exchange(pools).with_exchange(exchange_c()?).with_rate_converter(converter).build()?;

        scanner.scan().await?;

        assert_eq!(scanner.rates().amount_for("USDC"), Some(10.0));
        let book = scanner.exchanges()[0].price_book();
        let quote = book.get("WETH-USDC").ok_or_else(|| eyre::eyre!("no quote"))?;
        // buying spends exactly the configured 10 USDC
        assert!((quote.buy_amount * quote.buy_price - 10.0).abs() < 1e-9);
        Ok(())
    }

    #[tokio::test]
    async fn test_rate_failure_reuses_previous_snapshot() -> eyre::Result<()> {
        let pools = ReservePoolExchange::new("Pools", 30)?
            .with_pool(ReservePool { pair: Pair::parse("WETH-USDC")?, base_reserve: 1000.0, quote_reserve: 2_000_000.0 });
        let mut scanner = ScannerBuilder::new()
            .with_exchange(pools)
            .with_exchange(exchange_c()?)
            .with_rate_converter(FailingConverter)
            .with_initial_rates(RateSnapshot::new().with_amount("USDC", 100.0))
            .build()?;

        let report = scanner.scan().await?;

        assert!(!report.is_degraded());
        assert_eq!(scanner.rates().amount_for("USDC"), Some(100.0));
        assert!(scanner.exchanges()[0].price_book().contains("WETH-USDC"));
        Ok(())
    }

    #[tokio::test]
    async fn test_static_rates_are_applied() -> eyre::Result<()> {
        let converter = StaticRateConverter::new(RateSnapshot::new().with_amount("USDC", 42.0));
        let mut scanner = triangle()?.with_rate_converter(converter).build()?;

        scanner.scan().await?;

        assert_eq!(scanner.rates().amount_for("USDC"), Some(42.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_cancelled_scan() -> eyre::Result<()> {
        let mut scanner = triangle()?.build()?;
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = scanner.scan_with_cancel(&cancel).await;

        assert!(matches!(result, Err(ScanError::Cancelled)));
        assert_eq!(scanner.phase(), ScanPhase::Idle);
        assert_eq!(scanner.stats().passes, 0);
        Ok(())
    }

    #[test]
    fn test_builder_rejects_structural_errors() -> eyre::Result<()> {
        assert!(matches!(ScannerBuilder::new().build(), Err(ScanError::NoExchanges)));
        assert!(matches!(
            ScannerBuilder::new().with_exchange(exchange_a()?).with_exchange(StaticExchange::new("A")).build(),
            Err(ScanError::DuplicateExchange(name)) if name == "A"
        ));
        assert!(matches!(triangle()?.with_max_cycle_length(2).build(), Err(ScanError::InvalidConfig(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_run_loop_reports_until_cancelled() -> eyre::Result<()> {
        let config = ScannerConfig { poll_interval_ms: 10, ..ScannerConfig::default() };
        let mut scanner = triangle()?.with_config(config).build()?;
        let (sender, mut receiver) = mpsc::channel(4);
        let cancel = CancelToken::new();
        let loop_cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            let result = scanner.run(sender, loop_cancel).await;
            (scanner, result)
        });

        let report = receiver.recv().await.ok_or_else(|| eyre::eyre!("loop sent nothing"))?;
        assert_eq!(report.results.len(), 1);
        cancel.cancel();
        drop(receiver);

        let (scanner, result) = handle.await?;
        result?;
        assert!(scanner.stats().passes >= 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_run_loop_stops_when_receiver_closes() -> eyre::Result<()> {
        let config = ScannerConfig { poll_interval_ms: 10, ..ScannerConfig::default() };
        let mut scanner = triangle()?.with_config(config).build()?;
        let (sender, receiver) = mpsc::channel(1);
        drop(receiver);

        scanner.run(sender, CancelToken::new()).await?;

        assert_eq!(scanner.stats().passes, 1);
        Ok(())
    }
}
