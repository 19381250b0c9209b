//! Publisher Tests - Step Isolation Under Injected Failures
//!
//! Mocks the ledger, the content store and the renderer with mockall
//! and checks that a failure in one publishing step never prevents the
//! others from running.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use alloy::primitives::{Address, B256, I256, U256};
use anyhow::anyhow;
use mockall::mock;
use mockall::predicate::{always, eq};

use bethouse_oracle::adapters::metrics::OracleMetrics;
use bethouse_oracle::adapters::persistence::PublicationLog;
use bethouse_oracle::domain::artifact::{ArtifactKind, ContentId, PublicationSummary};
use bethouse_oracle::domain::report::{ReportContext, RoundReport, SimulatedPrices};
use bethouse_oracle::domain::round::{Bet, Round, Side};
use bethouse_oracle::error::{OracleError, PublishStep};
use bethouse_oracle::ports::ledger::{LedgerGateway, MarketInfo, RoundDurations, TxConfirmation};
use bethouse_oracle::ports::repository::{PublicationRecord, PublicationRepository};
use bethouse_oracle::usecases::publisher::ArtifactPublisher;
use bethouse_oracle::usecases::republish::Republish;

// ---- Mock Definitions ----

mock! {
    pub Ledger {}

    #[async_trait::async_trait]
    impl LedgerGateway for Ledger {
        async fn latest_timestamp(&self) -> anyhow::Result<u64>;
        async fn accounts(&self) -> anyhow::Result<Vec<Address>>;
        async fn market(&self, market_id: B256) -> anyhow::Result<MarketInfo>;
        async fn current_round_id(&self) -> anyhow::Result<u64>;
        async fn round(&self, round_id: u64) -> anyhow::Result<Round>;
        async fn fee_bps(&self) -> anyhow::Result<u64>;
        async fn round_durations(&self) -> anyhow::Result<RoundDurations>;
        async fn feed_decimals(&self, feed: Address) -> anyhow::Result<u8>;
        async fn house_allowance(&self, owner: Address) -> anyhow::Result<U256>;
        async fn start_round(&self, market_id: B256) -> anyhow::Result<TxConfirmation>;
        async fn place_bet(
            &self,
            from: Address,
            round_id: u64,
            side: Side,
            amount: U256,
        ) -> anyhow::Result<TxConfirmation>;
        async fn resolve_round(&self, round_id: u64) -> anyhow::Result<TxConfirmation>;
        async fn update_feed_price(
            &self,
            feed: Address,
            answer: I256,
        ) -> anyhow::Result<TxConfirmation>;
        async fn transfer(
            &self,
            from: Address,
            to: Address,
            amount: U256,
        ) -> anyhow::Result<TxConfirmation>;
        async fn approve_house(&self, from: Address, amount: U256) -> anyhow::Result<TxConfirmation>;
        async fn mint(&self, to: Address, amount: U256) -> anyhow::Result<TxConfirmation>;
        async fn anchor(
            &self,
            round_id: u64,
            kind: ArtifactKind,
            cid: &ContentId,
        ) -> anyhow::Result<TxConfirmation>;
    }
}

mock! {
    pub Store {}

    #[async_trait::async_trait]
    impl bethouse_oracle::ports::content_store::ContentStore for Store {
        async fn add(&self, name: &str, bytes: Vec<u8>) -> anyhow::Result<ContentId>;
        async fn make_dir(&self, path: &str) -> anyhow::Result<()>;
        async fn remove(&self, path: &str) -> anyhow::Result<bool>;
        async fn link(&self, cid: &ContentId, path: &str) -> anyhow::Result<()>;
        async fn is_healthy(&self) -> bool;
    }
}

mock! {
    pub Renderer {}

    impl bethouse_oracle::ports::renderer::ArtifactRenderer for Renderer {
        fn render_receipt(&self, report: &RoundReport) -> anyhow::Result<Vec<u8>>;
        fn render_chart(&self, report: &RoundReport) -> anyhow::Result<Vec<u8>>;
    }
}

// ---- Fixtures ----

const ETHER: u128 = 1_000_000_000_000_000_000;

fn report(round_id: u64) -> RoundReport {
    let round = Round {
        id: round_id,
        market_id: B256::repeat_byte(1),
        start_time: 1_700_000_000,
        end_time: 1_700_000_300,
        price_start: I256::try_from(5_000_000_000_000i64).unwrap(),
        price_end: I256::try_from(5_050_000_000_000i64).unwrap(),
        total_yes_net: U256::from(99 * ETHER / 10),
        total_no_net: U256::ZERO,
        fee_accrued: U256::from(ETHER / 10),
        active: false,
        resolved: true,
        outcome_yes: true,
        refund_mode: false,
    };
    let context = ReportContext {
        market_id: round.market_id,
        feed_address: Address::repeat_byte(2),
        feed_decimals: 8,
        oracle_address: Address::repeat_byte(3),
        bet_house_address: Address::repeat_byte(4),
        collateral_address: Address::repeat_byte(5),
        storage_address: Address::repeat_byte(6),
        round_seconds: 300,
        bet_window_seconds: 90,
    };
    let bets = [Bet::confirmed(
        Address::repeat_byte(7),
        Side::Yes,
        U256::from(10 * ETHER),
        100,
        B256::repeat_byte(8),
    )];
    RoundReport::assemble(
        &round,
        &context,
        SimulatedPrices { start_usd: 50_000, end_usd: 50_500 },
        &bets,
        1_700_000_305,
    )
}

fn confirmation() -> TxConfirmation {
    TxConfirmation {
        tx_hash: B256::repeat_byte(0xaa),
        block_number: Some(1),
    }
}

fn cid_for(name: &str) -> ContentId {
    ContentId::new(format!("bafy-{name}"))
}

fn working_renderer() -> MockRenderer {
    let mut renderer = MockRenderer::new();
    renderer
        .expect_render_receipt()
        .returning(|_| Ok(b"receipt".to_vec()));
    renderer
        .expect_render_chart()
        .returning(|_| Ok(b"<svg/>".to_vec()));
    renderer
}

fn working_mirror(store: &mut MockStore) {
    store.expect_make_dir().returning(|_| Ok(()));
    store.expect_remove().returning(|_| Ok(false));
    store.expect_link().returning(|_, _| Ok(()));
}

fn publisher(
    ledger: MockLedger,
    store: MockStore,
    renderer: MockRenderer,
) -> ArtifactPublisher<MockLedger, MockStore, MockRenderer> {
    ArtifactPublisher::new(
        Arc::new(ledger),
        Arc::new(store),
        Arc::new(renderer),
        "/round-reports",
        Arc::new(OracleMetrics::new().unwrap()),
    )
}

fn failed_steps(summary: &PublicationSummary) -> Vec<PublishStep> {
    summary.failures.iter().map(|f| f.step).collect()
}

// ---- Tests ----

#[tokio::test]
async fn test_all_steps_succeed() {
    let mut ledger = MockLedger::new();
    ledger
        .expect_anchor()
        .with(eq(4), always(), always())
        .times(3)
        .returning(|_, _, _| Ok(confirmation()));

    let mut store = MockStore::new();
    store.expect_add().times(3).returning(|name, _| Ok(cid_for(name)));
    store
        .expect_make_dir()
        .with(eq("/round-reports"))
        .times(1)
        .returning(|_| Ok(()));
    store
        .expect_remove()
        .with(eq("/round-reports/round-4.json"))
        .times(1)
        .returning(|_| Ok(true));
    store
        .expect_link()
        .withf(|cid, path| cid.as_str() == "bafy-round-4.json" && path == "/round-reports/round-4.json")
        .times(1)
        .returning(|_, _| Ok(()));

    let summary = publisher(ledger, store, working_renderer()).publish(&report(4)).await;

    assert!(summary.is_complete());
    assert!(summary.mirrored);
    assert_eq!(summary.anchored, ArtifactKind::ALL.to_vec());
    assert_eq!(
        summary.cid(ArtifactKind::Chart),
        Some(&cid_for("round-4-chart.svg"))
    );
}

#[tokio::test]
async fn test_receipt_render_failure_does_not_block_other_steps() {
    let mut ledger = MockLedger::new();
    ledger
        .expect_anchor()
        .withf(|_, kind, _| *kind != ArtifactKind::Receipt)
        .times(2)
        .returning(|_, _, _| Ok(confirmation()));

    let mut store = MockStore::new();
    store.expect_add().times(2).returning(|name, _| Ok(cid_for(name)));
    working_mirror(&mut store);

    let mut renderer = MockRenderer::new();
    renderer
        .expect_render_receipt()
        .returning(|_| Err(anyhow!("font table missing")));
    renderer
        .expect_render_chart()
        .returning(|_| Ok(b"<svg/>".to_vec()));

    let summary = publisher(ledger, store, renderer).publish(&report(4)).await;

    assert_eq!(failed_steps(&summary), vec![PublishStep::Receipt]);
    assert!(summary.failures[0].reason.contains("font table missing"));
    assert_eq!(summary.anchored, vec![ArtifactKind::Report, ArtifactKind::Chart]);
    assert!(summary.cid(ArtifactKind::Receipt).is_none());
    assert!(!summary.is_complete());
}

#[tokio::test]
async fn test_chart_upload_failure_is_isolated() {
    let mut ledger = MockLedger::new();
    ledger
        .expect_anchor()
        .times(2)
        .returning(|_, _, _| Ok(confirmation()));

    let mut store = MockStore::new();
    store.expect_add().returning(|name, _| {
        if name.ends_with(".svg") {
            Err(anyhow!("connection refused"))
        } else {
            Ok(cid_for(name))
        }
    });
    working_mirror(&mut store);

    let summary = publisher(ledger, store, working_renderer()).publish(&report(4)).await;

    assert_eq!(failed_steps(&summary), vec![PublishStep::Chart]);
    assert_eq!(summary.anchored, vec![ArtifactKind::Report, ArtifactKind::Receipt]);
}

#[tokio::test]
async fn test_mirror_failure_keeps_report_step() {
    let mut ledger = MockLedger::new();
    ledger
        .expect_anchor()
        .times(3)
        .returning(|_, _, _| Ok(confirmation()));

    let mut store = MockStore::new();
    store.expect_add().times(3).returning(|name, _| Ok(cid_for(name)));
    store
        .expect_make_dir()
        .returning(|_| Err(anyhow!("mfs: permission denied")));
    store.expect_remove().never();
    store.expect_link().never();

    let summary = publisher(ledger, store, working_renderer()).publish(&report(4)).await;

    assert!(!summary.mirrored);
    assert!(summary.failures.is_empty());
    assert!(summary.cid(ArtifactKind::Report).is_some());
    assert!(summary.is_complete());
}

#[tokio::test]
async fn test_anchor_failure_is_recorded_per_kind() {
    let mut ledger = MockLedger::new();
    ledger.expect_anchor().returning(|_, kind, _| {
        if kind == ArtifactKind::Report {
            Err(anyhow!("execution reverted: not owner"))
        } else {
            Ok(confirmation())
        }
    });

    let mut store = MockStore::new();
    store.expect_add().returning(|name, _| Ok(cid_for(name)));
    working_mirror(&mut store);

    let summary = publisher(ledger, store, working_renderer()).publish(&report(4)).await;

    assert_eq!(summary.artifacts.len(), 3);
    assert_eq!(summary.anchored, vec![ArtifactKind::Receipt, ArtifactKind::Chart]);
    assert_eq!(failed_steps(&summary), vec![PublishStep::Anchor]);
    assert!(summary.failures[0].reason.contains("not owner"));
}

#[tokio::test]
async fn test_everything_down_still_returns_summary() {
    let mut ledger = MockLedger::new();
    ledger.expect_anchor().never();

    let mut store = MockStore::new();
    store
        .expect_add()
        .times(3)
        .returning(|_, _| Err(anyhow!("store unreachable")));
    store.expect_make_dir().never();

    let summary = publisher(ledger, store, working_renderer()).publish(&report(4)).await;

    assert!(summary.artifacts.is_empty());
    assert!(summary.anchored.is_empty());
    assert_eq!(
        failed_steps(&summary),
        vec![PublishStep::Report, PublishStep::Receipt, PublishStep::Chart]
    );
}

#[tokio::test]
async fn test_upload_results_drive_store_readiness() {
    let ready = Arc::new(AtomicBool::new(false));

    let mut ledger = MockLedger::new();
    ledger.expect_anchor().returning(|_, _, _| Ok(confirmation()));
    let mut store = MockStore::new();
    store.expect_add().returning(|name, _| Ok(cid_for(name)));
    working_mirror(&mut store);

    publisher(ledger, store, working_renderer())
        .with_store_health(Arc::clone(&ready))
        .publish(&report(4))
        .await;
    assert!(ready.load(Ordering::Relaxed));

    let mut ledger = MockLedger::new();
    ledger.expect_anchor().never();
    let mut store = MockStore::new();
    store
        .expect_add()
        .returning(|_, _| Err(anyhow!("connection refused")));

    publisher(ledger, store, working_renderer())
        .with_store_health(Arc::clone(&ready))
        .publish(&report(5))
        .await;
    assert!(!ready.load(Ordering::Relaxed));
}

#[tokio::test]
async fn test_render_failures_do_not_mark_store_unready() {
    let ready = Arc::new(AtomicBool::new(true));

    let mut ledger = MockLedger::new();
    ledger
        .expect_anchor()
        .with(eq(4), eq(ArtifactKind::Report), always())
        .times(1)
        .returning(|_, _, _| Ok(confirmation()));

    let mut store = MockStore::new();
    store.expect_add().times(1).returning(|name, _| Ok(cid_for(name)));
    working_mirror(&mut store);

    let mut renderer = MockRenderer::new();
    renderer.expect_render_receipt().returning(|_| Err(anyhow!("bad layout")));
    renderer.expect_render_chart().returning(|_| Err(anyhow!("bad layout")));

    let summary = publisher(ledger, store, renderer)
        .with_store_health(Arc::clone(&ready))
        .publish(&report(4))
        .await;

    assert_eq!(failed_steps(&summary), vec![PublishStep::Receipt, PublishStep::Chart]);
    assert!(ready.load(Ordering::Relaxed));
}

#[tokio::test]
async fn test_report_bytes_are_canonical_json() {
    let mut ledger = MockLedger::new();
    ledger.expect_anchor().returning(|_, _, _| Ok(confirmation()));

    let expected = report(4).to_canonical_bytes().unwrap();
    let mut store = MockStore::new();
    store
        .expect_add()
        .withf(move |name, bytes| name != "round-4.json" || *bytes == expected)
        .times(3)
        .returning(|name, _| Ok(cid_for(name)));
    working_mirror(&mut store);

    let summary = publisher(ledger, store, working_renderer()).publish(&report(4)).await;
    assert!(summary.is_complete());
}

// ---- Republish ----

#[tokio::test]
async fn test_republish_unknown_round_is_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(PublicationLog::new(dir.path()).await.unwrap());

    let mut store = MockStore::new();
    store.expect_add().never();
    let republish = Republish::new(
        publisher(MockLedger::new(), store, MockRenderer::new()),
        log,
        "rerun",
    );

    let err = republish.run(9).await.unwrap_err();
    assert!(matches!(err, OracleError::Configuration(_)));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_republish_uses_logged_report_and_appends() {
    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(PublicationLog::new(dir.path()).await.unwrap());
    log.append(&PublicationRecord {
        run_id: "original".into(),
        logged_at: chrono::Utc::now(),
        report: report(4),
        summary: PublicationSummary::new(4),
    })
    .await
    .unwrap();

    let mut ledger = MockLedger::new();
    ledger
        .expect_anchor()
        .with(eq(4), always(), always())
        .times(3)
        .returning(|_, _, _| Ok(confirmation()));
    let mut store = MockStore::new();
    store.expect_add().times(3).returning(|name, _| Ok(cid_for(name)));
    store.expect_make_dir().returning(|_| Ok(()));
    store.expect_remove().returning(|_| Ok(true));
    store.expect_link().returning(|_, _| Ok(()));

    let republish = Republish::new(
        publisher(ledger, store, working_renderer()),
        Arc::clone(&log),
        "rerun",
    );
    let summary = republish.run(4).await.unwrap();
    assert!(summary.is_complete());

    let records = log.load_all().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].run_id, "rerun");
    assert_eq!(records[1].report, report(4));
    assert_eq!(records[1].summary, summary);
}
