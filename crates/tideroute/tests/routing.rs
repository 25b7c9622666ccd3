//! Discovery and best-pool selection against in-memory accounts

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use tideroute::layout::clmm::ClmmTickArray;
use tideroute::math::MAX_SWAP_STEPS;
use tideroute::{
    AccountTransport, ComputeError, DecodeError, KeyedAccount, MemoryTransport, Pool, PoolKind,
    Protocol, PumpAmmProtocol, RaydiumCpmmProtocol, Router, RouterError, SearchFilter,
    TransportError,
};

use common::{ClmmShape, TestMarket, CLMM_LIQUIDITY};

const RESERVE: u64 = 1_000_000_000;
const AMOUNT_IN: u64 = 1_000_000;
/// 1e6 in at 25 bps against 1e9/1e9 reserves
const EVEN_POOL_OUT: u64 = 996_506;

fn ids(pools: &[Pool]) -> Vec<Pubkey> {
    pools.iter().map(|pool| pool.id()).collect()
}

#[tokio::test]
async fn discovery_finds_pools_stored_in_either_mint_order() {
    let market = TestMarket::new();
    let (sol, usdc) = (Pubkey::new_unique(), Pubkey::new_unique());
    let forward = market.pump_pool(&sol, &usdc, RESERVE, RESERVE, None);
    let reverse = market.pump_pool(&usdc, &sol, RESERVE, RESERVE, None);
    let unrelated = Pubkey::new_unique();
    market.pump_pool(&sol, &unrelated, RESERVE, RESERVE, None);

    let router = market.router();
    let pools = router.query_all_pools(&sol, &usdc).await.unwrap();
    assert_eq!(ids(&pools), vec![forward, reverse]);

    let pools = router.query_all_pools(&usdc, &sol).await.unwrap();
    assert_eq!(ids(&pools), vec![reverse, forward]);
}

#[tokio::test]
async fn pools_with_identical_mints_are_reported_once() {
    let market = TestMarket::new();
    let mint = Pubkey::new_unique();
    let pool = market.pump_pool(&mint, &mint, RESERVE, RESERVE, None);

    let pools = market.router().query_all_pools(&mint, &mint).await.unwrap();
    assert_eq!(ids(&pools), vec![pool]);
}

#[tokio::test]
async fn discovery_spans_every_protocol_in_registration_order() {
    let market = TestMarket::new();
    let (mint_a, mint_b) = (Pubkey::new_unique(), Pubkey::new_unique());
    let clmm_config = market.clmm_config(2_500);
    let clmm = market.clmm_pool(&clmm_config, &mint_a, &mint_b);
    let cpmm_config = market.cpmm_config(2_500);
    let cpmm = market.cpmm_pool(&cpmm_config, &mint_a, &mint_b, RESERVE, RESERVE);
    let pump = market.pump_pool(&mint_a, &mint_b, RESERVE, RESERVE, None);

    let router = market.router();
    assert_eq!(
        router.protocol_names(),
        vec!["pump-amm", "raydium-cpmm", "raydium-clmm"]
    );
    let pools = router.query_all_pools(&mint_a, &mint_b).await.unwrap();
    let kinds: Vec<PoolKind> = pools.iter().map(|pool| pool.kind()).collect();
    assert_eq!(
        kinds,
        vec![PoolKind::PumpAmm, PoolKind::RaydiumCpmm, PoolKind::RaydiumClmm]
    );
    assert_eq!(ids(&pools), vec![pump, cpmm, clmm]);
}

#[tokio::test]
async fn best_pool_is_the_largest_output() {
    let market = TestMarket::new();
    let (sol, usdc) = (Pubkey::new_unique(), Pubkey::new_unique());
    market.pump_pool(&sol, &usdc, RESERVE, RESERVE, None);
    let deeper = market.pump_pool(&sol, &usdc, RESERVE, 2 * RESERVE, None);

    let best = market
        .router()
        .get_best_pool(&sol, &usdc, AMOUNT_IN)
        .await
        .unwrap();
    assert_eq!(best.pool.id(), deeper);
    assert_eq!(best.amount_out, 1_993_012);
}

#[tokio::test]
async fn routed_quote_matches_the_constant_product_formula() {
    let market = TestMarket::new();
    let (token, sol) = (Pubkey::new_unique(), Pubkey::new_unique());
    market.pump_pool(&token, &sol, 1_000_000_000, 50_000_000_000, None);

    let best = market
        .router()
        .get_best_pool(&token, &sol, 1_000_000)
        .await
        .unwrap();
    // k / (1e9 + 997_500) subtracted from the 5e10 quote reserve
    assert_eq!(best.amount_out, 49_825_300);
}

#[tokio::test]
async fn equal_quotes_go_to_the_first_registered_protocol() {
    let market = TestMarket::new();
    let (sol, usdc) = (Pubkey::new_unique(), Pubkey::new_unique());
    // 2500 / 1_000_000 is the same 25 bps the pump AMM charges
    let config = market.cpmm_config(2_500);
    market.cpmm_pool(&config, &sol, &usdc, RESERVE, RESERVE);
    let pump = market.pump_pool(&sol, &usdc, RESERVE, RESERVE, None);

    let best = market
        .router()
        .get_best_pool(&sol, &usdc, AMOUNT_IN)
        .await
        .unwrap();
    assert_eq!(best.pool.id(), pump);
    assert_eq!(best.pool.kind(), PoolKind::PumpAmm);
    assert_eq!(best.amount_out, EVEN_POOL_OUT);
}

#[tokio::test]
async fn equal_quotes_within_a_protocol_go_to_the_first_found() {
    let market = TestMarket::new();
    let (sol, usdc) = (Pubkey::new_unique(), Pubkey::new_unique());
    let a = market.pump_pool(&sol, &usdc, RESERVE, RESERVE, None);
    let b = market.pump_pool(&sol, &usdc, RESERVE, RESERVE, None);

    let router = market.router();
    let first_found = router.query_all_pools(&sol, &usdc).await.unwrap()[0].id();
    assert!(first_found == a || first_found == b);

    let best = router.get_best_pool(&sol, &usdc, AMOUNT_IN).await.unwrap();
    assert_eq!(best.pool.id(), first_found);
}

#[tokio::test]
async fn no_pools_is_no_route() {
    let market = TestMarket::new();
    let (sol, usdc) = (Pubkey::new_unique(), Pubkey::new_unique());

    let err = market
        .router()
        .get_best_pool(&sol, &usdc, AMOUNT_IN)
        .await
        .unwrap_err();
    assert!(matches!(err, RouterError::NoRoute { base, quote } if base == sol && quote == usdc));
}

#[tokio::test]
async fn pools_that_cannot_quote_are_skipped() {
    let market = TestMarket::new();
    let (sol, usdc) = (Pubkey::new_unique(), Pubkey::new_unique());
    let empty = market.pump_pool(&sol, &usdc, 0, RESERVE, None);
    let healthy = market.pump_pool(&sol, &usdc, RESERVE, RESERVE, None);

    let router = market.router();
    assert_eq!(router.query_all_pools(&sol, &usdc).await.unwrap().len(), 2);
    let best = router.get_best_pool(&sol, &usdc, AMOUNT_IN).await.unwrap();
    assert_ne!(best.pool.id(), empty);
    assert_eq!(best.pool.id(), healthy);
}

#[tokio::test]
async fn only_empty_pools_is_no_route() {
    let market = TestMarket::new();
    let (sol, usdc) = (Pubkey::new_unique(), Pubkey::new_unique());
    market.pump_pool(&sol, &usdc, 0, 0, None);

    let err = market
        .router()
        .get_best_pool(&sol, &usdc, AMOUNT_IN)
        .await
        .unwrap_err();
    assert!(matches!(err, RouterError::NoRoute { .. }));
}

#[tokio::test]
async fn a_failing_protocol_does_not_hide_the_others() {
    let market = TestMarket::new();
    let (sol, usdc) = (Pubkey::new_unique(), Pubkey::new_unique());
    market.pump_pool(&sol, &usdc, RESERVE, 2 * RESERVE, None);
    let config = market.cpmm_config(2_500);
    let cpmm = market.cpmm_pool(&config, &sol, &usdc, RESERVE, RESERVE);
    market
        .transport
        .fail_searches_for(market.programs.pump_amm);

    let router = market.router();
    let pools = router.query_all_pools(&sol, &usdc).await.unwrap();
    assert_eq!(ids(&pools), vec![cpmm]);

    let best = router.get_best_pool(&sol, &usdc, AMOUNT_IN).await.unwrap();
    assert_eq!(best.pool.id(), cpmm);
}

#[tokio::test]
async fn pools_with_swaps_disabled_are_not_routed() {
    let market = TestMarket::new();
    let (sol, usdc) = (Pubkey::new_unique(), Pubkey::new_unique());
    let config = market.cpmm_config(2_500);
    // status bit 2 disables swaps
    market.cpmm_pool_with_status(&config, &sol, &usdc, RESERVE, 4 * RESERVE, 1 << 2);
    let enabled = market.cpmm_pool(&config, &sol, &usdc, RESERVE, RESERVE);

    let best = market
        .router()
        .get_best_pool(&sol, &usdc, AMOUNT_IN)
        .await
        .unwrap();
    assert_eq!(best.pool.id(), enabled);
    assert_eq!(best.amount_out, EVEN_POOL_OUT);
}

#[tokio::test]
async fn cpmm_reserves_exclude_accrued_protocol_fees() {
    let market = TestMarket::new();
    let (sol, usdc) = (Pubkey::new_unique(), Pubkey::new_unique());
    let config = market.cpmm_config(2_500);
    let pool = market.cpmm_pool_with_fees(
        &config,
        &sol,
        &usdc,
        (RESERVE + 5_000, RESERVE + 7_000),
        (5_000, 7_000),
    );

    let router = market.router();
    let pools = router.query_all_pools(&sol, &usdc).await.unwrap();
    match &pools[..] {
        [Pool::ConfigurableConstantProduct(cpmm)] => {
            assert_eq!(cpmm.state.address, pool);
            assert_eq!((cpmm.reserve_0, cpmm.reserve_1), (RESERVE, RESERVE));
            assert_eq!(cpmm.trade_fee_rate, 2_500);
        }
        other => panic!("unexpected pools {:?}", other),
    }

    let best = router.get_best_pool(&sol, &usdc, AMOUNT_IN).await.unwrap();
    assert_eq!(best.amount_out, EVEN_POOL_OUT);
}

#[tokio::test]
async fn concentrated_pool_quotes_from_its_tick_arrays() {
    let market = TestMarket::new();
    let (mint_0, mint_1) = (Pubkey::new_unique(), Pubkey::new_unique());
    let config = market.clmm_config(2_500);
    let clmm = market.clmm_pool(&config, &mint_0, &mint_1);

    let best = market
        .router()
        .get_best_pool(&mint_0, &mint_1, 1_000)
        .await
        .unwrap();
    assert_eq!(best.pool.id(), clmm);
    assert!(best.amount_out > 990 && best.amount_out < 1_000);
}

#[tokio::test]
async fn pool_lookup_by_id_skips_discovery_filters() {
    let market = TestMarket::new();
    let (sol, usdc) = (Pubkey::new_unique(), Pubkey::new_unique());
    let config = market.cpmm_config(2_500);
    let disabled = market.cpmm_pool_with_status(&config, &sol, &usdc, RESERVE, RESERVE, 1 << 2);

    let router = market.router();
    assert!(router.query_all_pools(&sol, &usdc).await.unwrap().is_empty());

    let protocol = RaydiumCpmmProtocol::new(router.transport().clone(), &market.programs);
    let pool = protocol.fetch_pool_by_id(&disabled).await.unwrap();
    assert_eq!(pool.id(), disabled);
    assert_eq!(pool.tokens(), (sol, usdc));

    let missing = Pubkey::new_unique();
    let err = protocol.fetch_pool_by_id(&missing).await.unwrap_err();
    assert!(matches!(
        err,
        RouterError::Transport(TransportError::AccountNotFound(address)) if address == missing
    ));
}

/// Delays every search past any reasonable deadline
struct StalledTransport(Arc<MemoryTransport>);

#[async_trait]
impl AccountTransport for StalledTransport {
    async fn get_account(&self, address: &Pubkey) -> Result<Vec<u8>, TransportError> {
        self.0.get_account(address).await
    }

    async fn get_multiple_accounts(
        &self,
        addresses: &[Pubkey],
    ) -> Result<Vec<Option<Vec<u8>>>, TransportError> {
        self.0.get_multiple_accounts(addresses).await
    }

    async fn search_accounts(
        &self,
        program_id: &Pubkey,
        filter: &SearchFilter,
    ) -> Result<Vec<KeyedAccount>, TransportError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        self.0.search_accounts(program_id, filter).await
    }
}

#[tokio::test]
async fn routing_stops_at_the_deadline() {
    let market = TestMarket::new();
    let (sol, usdc) = (Pubkey::new_unique(), Pubkey::new_unique());
    market.pump_pool(&sol, &usdc, RESERVE, RESERVE, None);

    let transport: Arc<dyn AccountTransport> =
        Arc::new(StalledTransport(market.transport.clone()));
    let router = Router::new(transport.clone(), Duration::from_millis(50))
        .with_protocol(Box::new(PumpAmmProtocol::new(transport, &market.programs)));

    let err = router
        .get_best_pool(&sol, &usdc, AMOUNT_IN)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RouterError::Transport(TransportError::DeadlineExceeded)
    ));
}

/// Answers every batch fetch with its last entry missing
struct ShortBatchTransport(Arc<MemoryTransport>);

#[async_trait]
impl AccountTransport for ShortBatchTransport {
    async fn get_account(&self, address: &Pubkey) -> Result<Vec<u8>, TransportError> {
        self.0.get_account(address).await
    }

    async fn get_multiple_accounts(
        &self,
        addresses: &[Pubkey],
    ) -> Result<Vec<Option<Vec<u8>>>, TransportError> {
        let mut accounts = self.0.get_multiple_accounts(addresses).await?;
        accounts.pop();
        Ok(accounts)
    }

    async fn search_accounts(
        &self,
        program_id: &Pubkey,
        filter: &SearchFilter,
    ) -> Result<Vec<KeyedAccount>, TransportError> {
        self.0.search_accounts(program_id, filter).await
    }
}

#[tokio::test]
async fn short_batch_responses_fail_the_protocol_not_the_query() {
    let market = TestMarket::new();
    let (sol, usdc) = (Pubkey::new_unique(), Pubkey::new_unique());
    market.pump_pool(&sol, &usdc, RESERVE, RESERVE, None);
    let config = market.cpmm_config(2_500);
    market.cpmm_pool(&config, &sol, &usdc, RESERVE, RESERVE);

    let transport: Arc<dyn AccountTransport> =
        Arc::new(ShortBatchTransport(market.transport.clone()));
    let pump = PumpAmmProtocol::new(transport.clone(), &market.programs);
    let err = pump.fetch_pools_by_pair(&sol, &usdc).await.unwrap_err();
    assert_eq!(
        err,
        RouterError::Transport(TransportError::IncompleteBatch {
            requested: 2,
            returned: 1
        })
    );

    let router = Router::from_config(&market.config(), transport);
    assert!(router.query_all_pools(&sol, &usdc).await.unwrap().is_empty());
    let err = router
        .get_best_pool(&sol, &usdc, AMOUNT_IN)
        .await
        .unwrap_err();
    assert!(matches!(err, RouterError::NoRoute { .. }));
}

/// Spacing 1, no liquidity at the current tick, and the only range starting at
/// tick 30720: the first array past the default bitmap
fn liquidity_beyond_the_default_bitmap() -> ClmmShape {
    ClmmShape {
        tick_spacing: 1,
        tick_current: 0,
        liquidity: 0,
        ticks: vec![
            (30_720, CLMM_LIQUIDITY as i128, CLMM_LIQUIDITY),
            (30_779, -(CLMM_LIQUIDITY as i128), CLMM_LIQUIDITY),
        ],
    }
}

#[tokio::test]
async fn concentrated_quotes_follow_the_bitmap_extension() {
    let market = TestMarket::new();
    let (mint_0, mint_1) = (Pubkey::new_unique(), Pubkey::new_unique());
    let config = market.clmm_config(2_500);
    let shape = liquidity_beyond_the_default_bitmap();
    let clmm = market.clmm_pool_with(&config, &mint_0, &mint_1, &shape);

    let router = market.router();
    match &router.query_all_pools(&mint_0, &mint_1).await.unwrap()[..] {
        [Pool::ConcentratedLiquidity(pool)] => {
            let extension = pool.bitmap_extension.as_ref().unwrap();
            assert_eq!(extension.pool_id, clmm);
            assert_eq!(extension.bitmap.positive_tick_array_bitmap[0][0], 1);
        }
        other => panic!("unexpected pools {:?}", other),
    }

    // 997.5 token 1 at a price of 1.0001^30720, about 21.58
    let best = router.get_best_pool(&mint_1, &mint_0, 1_000).await.unwrap();
    assert_eq!(best.pool.id(), clmm);
    assert!((40..=47).contains(&best.amount_out), "{}", best.amount_out);

    let user = Pubkey::new_unique();
    let plan = router
        .build_swap_plan(&best.pool, &market.programs, &user, &mint_1, 1_000, 40)
        .await
        .unwrap();
    assert_eq!(plan.accounts.len(), 15);
    assert_eq!(plan.accounts[13].pubkey, market.bitmap_extension_address(&clmm));
    assert_eq!(plan.accounts[14].pubkey, market.tick_array_address(&clmm, 30_720));
}

#[tokio::test]
async fn concentrated_pool_without_its_extension_has_no_route() {
    let market = TestMarket::new();
    let (mint_0, mint_1) = (Pubkey::new_unique(), Pubkey::new_unique());
    let config = market.clmm_config(2_500);
    let shape = liquidity_beyond_the_default_bitmap();
    let clmm = market.clmm_pool_with(&config, &mint_0, &mint_1, &shape);
    market.transport.remove(&market.bitmap_extension_address(&clmm));

    let router = market.router();
    assert_eq!(ids(&router.query_all_pools(&mint_0, &mint_1).await.unwrap()), vec![clmm]);
    let err = router.get_best_pool(&mint_1, &mint_0, 1_000).await.unwrap_err();
    assert!(matches!(err, RouterError::NoRoute { .. }));
}

#[tokio::test]
async fn tick_arrays_of_another_pool_or_start_are_rejected() {
    let market = TestMarket::new();
    let (mint_0, mint_1) = (Pubkey::new_unique(), Pubkey::new_unique());
    let config = market.clmm_config(2_500);
    let clmm_program = market.programs.raydium_clmm;

    let foreign = market.clmm_pool(&config, &mint_0, &mint_1);
    let stranger = Pubkey::new_unique();
    market
        .patch_account(&market.tick_array_address(&foreign, 0), clmm_program, |data| {
            data.put::<ClmmTickArray>("pool_id", stranger.as_ref())
        })
        .await;

    let shifted = market.clmm_pool(&config, &mint_0, &mint_1);
    market
        .patch_account(
            &market.tick_array_address(&shifted, -600),
            clmm_program,
            |data| data.put::<ClmmTickArray>("start_tick_index", &(-1_200i32).to_le_bytes()),
        )
        .await;

    let router = market.router();
    let pools = router.query_all_pools(&mint_0, &mint_1).await.unwrap();
    assert_eq!(pools.len(), 2);
    for pool in &pools {
        let err = pool
            .quote(market.transport.as_ref(), &mint_0, 1_000)
            .await
            .unwrap_err();
        assert!(
            matches!(err, RouterError::Compute(ComputeError::InvalidTickArray(_))),
            "{:?}",
            err
        );
    }

    let err = router.get_best_pool(&mint_0, &mint_1, 1_000).await.unwrap_err();
    assert!(matches!(err, RouterError::NoRoute { .. }));
}

#[tokio::test]
async fn non_converging_concentrated_pool_is_skipped() {
    let market = TestMarket::new();
    let (mint_0, mint_1) = (Pubkey::new_unique(), Pubkey::new_unique());
    let config = market.clmm_config(2_500);
    // 179 initialized ticks one apart: every tick crossed is one swap step
    let clmm = market.clmm_pool_with(
        &config,
        &mint_0,
        &mint_1,
        &ClmmShape {
            tick_spacing: 1,
            tick_current: 0,
            liquidity: CLMM_LIQUIDITY,
            ticks: (1..180).map(|tick| (tick, 0, 1)).collect(),
        },
    );
    let pump = market.pump_pool(&mint_0, &mint_1, RESERVE, RESERVE, None);

    let router = market.router();
    let pools = router.query_all_pools(&mint_1, &mint_0).await.unwrap();
    assert_eq!(ids(&pools), vec![pump, clmm]);
    let err = pools[1]
        .quote(market.transport.as_ref(), &mint_1, 100_000_000)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RouterError::Compute(ComputeError::NoConvergence {
            iterations: MAX_SWAP_STEPS
        })
    );

    let best = router
        .get_best_pool(&mint_1, &mint_0, 100_000_000)
        .await
        .unwrap();
    assert_eq!(best.pool.id(), pump);
}

#[tokio::test]
async fn pump_accounts_are_read_down_to_the_legacy_length() {
    let market = TestMarket::new();
    let (token, sol) = (Pubkey::new_unique(), Pubkey::new_unique());
    let creator = Pubkey::new_unique();
    let with_creator = market.pump_pool_sized(&token, &sol, RESERVE, RESERVE, Some(creator), 243);
    let cut_creator = market.pump_pool_sized(&token, &sol, RESERVE, RESERVE, Some(creator), 242);
    let too_short = market.pump_pool_sized(&token, &sol, RESERVE, RESERVE, Some(creator), 210);

    let router = market.router();
    // discovery only matches full-size accounts
    assert!(router.query_all_pools(&token, &sol).await.unwrap().is_empty());

    let protocol = PumpAmmProtocol::new(router.transport().clone(), &market.programs);
    match protocol.fetch_pool_by_id(&with_creator).await.unwrap() {
        Pool::ConstantProduct(pool) => {
            assert_eq!(pool.state.coin_creator, creator);
            assert_eq!((pool.base_reserve, pool.quote_reserve), (RESERVE, RESERVE));
        }
        other => panic!("unexpected pool {:?}", other),
    }
    match protocol.fetch_pool_by_id(&cut_creator).await.unwrap() {
        Pool::ConstantProduct(pool) => assert!(!pool.state.has_coin_creator()),
        other => panic!("unexpected pool {:?}", other),
    }
    assert_eq!(
        protocol.fetch_pool_by_id(&too_short).await.unwrap_err(),
        RouterError::Decode(DecodeError::TooShort {
            expected: 211,
            actual: 210
        })
    );
}
