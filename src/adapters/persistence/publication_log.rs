//! Publication Log - Append-only JSONL Round Records
//!
//! Persists one line per published round to
//! `publications/rounds.jsonl` under the data directory. Each line is
//! a self-contained JSON record holding the full report, so a round
//! can be re-published from the log alone.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

use crate::domain::report::RoundReport;
use crate::ports::repository::{PublicationRecord, PublicationRepository};

const LOG_FILE: &str = "rounds.jsonl";

/// Append-only JSONL publication log.
pub struct PublicationLog {
    dir: PathBuf,
}

impl PublicationLog {
    /// Open (and create if needed) the log under `data_dir`.
    pub async fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = data_dir.as_ref().join("publications");
        fs::create_dir_all(&dir)
            .await
            .context("Failed to create publications directory")?;
        Ok(Self { dir })
    }

    /// Path of the log file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(LOG_FILE)
    }
}

#[async_trait]
impl PublicationRepository for PublicationLog {
    #[instrument(skip(self, record), fields(round_id = record.report.round_id))]
    async fn append(&self, record: &PublicationRecord) -> Result<()> {
        let mut json =
            serde_json::to_string(record).context("Failed to serialize publication record")?;
        json.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path())
            .await
            .context("Failed to open publication log")?;

        file.write_all(json.as_bytes())
            .await
            .context("Failed to write publication record")?;
        file.flush().await.context("Failed to flush publication log")?;

        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<PublicationRecord>> {
        let path = self.path();
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)
            .await
            .context("Failed to read publication log")?;

        let mut records = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<PublicationRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    line = line_no + 1,
                    error = %e,
                    "Skipping malformed publication record"
                ),
            }
        }

        info!(count = records.len(), "Loaded publication records");
        Ok(records)
    }

    async fn latest_report(&self, round_id: u64) -> Result<Option<RoundReport>> {
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .rev()
            .find(|r| r.report.round_id == round_id)
            .map(|r| r.report))
    }

    async fn is_healthy(&self) -> bool {
        fs::metadata(&self.dir).await.is_ok_and(|m| m.is_dir())
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, B256, I256, U256};
    use chrono::Utc;

    use super::*;
    use crate::domain::artifact::PublicationSummary;
    use crate::domain::report::{ReportContext, SimulatedPrices};
    use crate::domain::round::Round;

    fn record(round_id: u64, run_id: &str, end_usd: u64) -> PublicationRecord {
        let round = Round {
            id: round_id,
            market_id: B256::repeat_byte(1),
            start_time: 1_000,
            end_time: 1_300,
            price_start: I256::try_from(5_000_000_000_000i64).unwrap(),
            price_end: I256::try_from(5_050_000_000_000i64).unwrap(),
            total_yes_net: U256::ZERO,
            total_no_net: U256::ZERO,
            fee_accrued: U256::ZERO,
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
        let prices = SimulatedPrices { start_usd: 50_000, end_usd };
        PublicationRecord {
            run_id: run_id.to_string(),
            logged_at: Utc::now(),
            report: RoundReport::assemble(&round, &context, prices, &[], 1_305),
            summary: PublicationSummary::new(round_id),
        }
    }

    #[tokio::test]
    async fn test_empty_log_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let log = PublicationLog::new(dir.path()).await.unwrap();
        assert!(log.is_healthy().await);
        assert!(log.load_all().await.unwrap().is_empty());
        assert!(log.latest_report(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_report_wins() {
        let dir = tempfile::tempdir().unwrap();
        let log = PublicationLog::new(dir.path()).await.unwrap();

        log.append(&record(1, "first", 50_500)).await.unwrap();
        log.append(&record(2, "first", 50_500)).await.unwrap();
        log.append(&record(1, "second", 50_600)).await.unwrap();

        let records = log.load_all().await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].run_id, "first");

        let latest = log.latest_report(1).await.unwrap().unwrap();
        assert_eq!(latest.price_end_usd_sim, 50_600);
    }

    #[tokio::test]
    async fn test_malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let log = PublicationLog::new(dir.path()).await.unwrap();
        log.append(&record(1, "run", 50_500)).await.unwrap();

        let mut file = OpenOptions::new().append(true).open(log.path()).await.unwrap();
        file.write_all(b"{not json\n\n").await.unwrap();
        drop(file);
        log.append(&record(2, "run", 50_500)).await.unwrap();

        let records = log.load_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].report.round_id, 2);
        assert_eq!(records[0].report, record(1, "run", 50_500).report);
    }
}
