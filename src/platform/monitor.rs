use anyhow::Result;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;

use super::account::AccountSummary;
use super::display::{render, render_account, DisplayState};
use super::positions::{build_positions, Position};
use super::source::PositionSource;

/// Polls a position source, reclassifies every snapshot and keeps the
/// display overlay attached across rebuilds.
pub struct PortfolioMonitor<Source> {
    source: Source,
    display: DisplayState,
    expand_all: bool,
    account: Option<AccountSummary>,
    positions: Vec<Position>,
}

impl<Source> PortfolioMonitor<Source>
where
    Source: PositionSource,
{
    pub fn new(source: Source, expand_all: bool) -> Self {
        Self {
            source,
            display: DisplayState::default(),
            expand_all,
            account: None,
            positions: Vec::new(),
        }
    }

    /// Replaces the account header and positions with a fresh snapshot. On
    /// failure the previous ones are kept untouched.
    pub async fn refresh(&mut self) -> Result<()> {
        let snapshot = self.source.fetch().await?;
        let positions = build_positions(&snapshot.legs)?;
        let account = snapshot
            .balance
            .as_ref()
            .map(AccountSummary::from_response)
            .transpose()?;

        self.display.retain(&positions);
        if self.expand_all {
            self.display.expand_all(&positions);
        }
        self.account = account;
        self.positions = positions;
        Ok(())
    }

    pub fn table(&self) -> Vec<String> {
        let mut lines = match &self.account {
            Some(account) => render_account(account),
            None => Vec::new(),
        };
        lines.extend(render(&self.positions, &self.display));
        lines
    }

    fn print_table(&self) {
        for line in self.table() {
            println!("{}", line);
        }
    }

    pub async fn run_once(&mut self) -> Result<()> {
        self.refresh().await?;
        self.print_table();
        Ok(())
    }

    pub async fn run(mut self, refresh: Duration, cancel_token: CancellationToken) {
        info!("Monitoring portfolio every {}s", refresh.as_secs());
        loop {
            match self.refresh().await {
                Ok(()) => self.print_table(),
                Err(err) => error!("Failed to refresh positions, error: {}", err),
            }
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    break
                }
                _ = sleep(refresh) => {}
            }
        }
        info!("Portfolio monitor stopped");
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::sync::Mutex;

    use super::*;
    use crate::etrade_api::balance::BalanceResponse;
    use crate::etrade_api::positions::{RawLeg, RawValue};
    use crate::platform::display::SpreadKey;
    use crate::platform::source::Snapshot;
    use crate::utils::fixtures::*;

    struct QueuedSource {
        snapshots: Mutex<Vec<Snapshot>>,
    }

    impl QueuedSource {
        fn new(snapshots: Vec<Vec<RawLeg>>) -> Self {
            Self::with_snapshots(
                snapshots
                    .into_iter()
                    .map(|legs| Snapshot { balance: None, legs })
                    .collect(),
            )
        }

        fn with_snapshots(mut snapshots: Vec<Snapshot>) -> Self {
            snapshots.reverse();
            Self {
                snapshots: Mutex::new(snapshots),
            }
        }
    }

    #[async_trait]
    impl PositionSource for QueuedSource {
        async fn fetch(&self) -> Result<Snapshot> {
            match self.snapshots.lock().unwrap().pop() {
                Some(snapshot) => Ok(snapshot),
                None => anyhow::bail!("no more snapshots"),
            }
        }
    }

    #[tokio::test]
    async fn test_refresh_reattaches_flags_by_key() {
        let mut grown = iron_condor_records();
        grown.push(raw_leg(9, "QQQ", (2024, 3, 15), "PUT", "400", -1));
        let source = QueuedSource::new(vec![iron_condor_records(), grown]);
        let mut monitor = PortfolioMonitor::new(source, false);

        monitor.refresh().await.unwrap();
        let spy = monitor.positions[0].clone();
        let spread_key = SpreadKey::of(&spy, &spy.spreads[0]);
        monitor.display.expand_all(std::slice::from_ref(&spy));

        monitor.refresh().await.unwrap();
        assert_eq!(monitor.positions.len(), 2);
        assert!(monitor.display.shows_spreads(&spy.key()));
        assert!(monitor.display.shows_legs(&spread_key));
        assert!(!monitor.display.shows_spreads(&monitor.positions[0].key()));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_last_positions() {
        let mut broken = raw_leg(5, "SPY", (2024, 3, 15), "PUT", "440", 1);
        broken.call_put = None;
        let mut bad_snapshot = iron_condor_records();
        bad_snapshot.push(broken);
        let source = QueuedSource::new(vec![iron_condor_records(), bad_snapshot]);
        let mut monitor = PortfolioMonitor::new(source, false);

        monitor.refresh().await.unwrap();
        assert!(monitor.refresh().await.is_err());
        assert_eq!(monitor.positions.len(), 1);
        assert_eq!(monitor.positions[0].legs.len(), 4);
    }

    #[tokio::test]
    async fn test_refresh_with_unsummable_gains_keeps_last_positions() {
        let mut oversized = vec![
            raw_leg(7, "QQQ", (2024, 3, 15), "PUT", "400", -1),
            raw_leg(8, "QQQ", (2024, 3, 15), "PUT", "405", 1),
        ];
        for record in oversized.iter_mut() {
            record.days_gain = Some(RawValue::from("7e28"));
        }
        let source = QueuedSource::new(vec![iron_condor_records(), oversized]);
        let mut monitor = PortfolioMonitor::new(source, false);

        monitor.refresh().await.unwrap();
        assert!(monitor.refresh().await.is_err());
        assert_eq!(monitor.positions.len(), 1);
        assert_eq!(monitor.positions[0].underlying, "SPY");
    }

    #[tokio::test]
    async fn test_table_starts_with_account_header() {
        let balance: BalanceResponse = serde_json::from_str(
            r#"{
                "accountId": "84512037",
                "accountDescription": "Brokerage",
                "Computed": {
                    "cashBuyingPower": 2500,
                    "marginBuyingPower": 5000,
                    "RealTimeValues": {"totalAccountValue": 10250.5}
                }
            }"#,
        )
        .unwrap();
        let source = QueuedSource::with_snapshots(vec![
            Snapshot {
                balance: Some(balance),
                legs: iron_condor_records(),
            },
            Snapshot {
                balance: None,
                legs: iron_condor_records(),
            },
        ]);
        let mut monitor = PortfolioMonitor::new(source, false);

        monitor.refresh().await.unwrap();
        let table = monitor.table();
        // seven header lines, column header, one position
        assert_eq!(table.len(), 9);
        assert_eq!(table[1], "Account Number: 84512037");
        assert_eq!(table[3], "Net Account Value: $10,250.50");
        assert!(table[7].contains("Strike Prices"));

        monitor.refresh().await.unwrap();
        assert_eq!(monitor.table().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_balance_fails_refresh() {
        let balance: BalanceResponse = serde_json::from_str(
            r#"{"accountId": "1", "Computed": {"marginBuyingPower": "lots"}}"#,
        )
        .unwrap();
        let source = QueuedSource::with_snapshots(vec![Snapshot {
            balance: Some(balance),
            legs: iron_condor_records(),
        }]);
        let mut monitor = PortfolioMonitor::new(source, false);

        assert!(monitor.refresh().await.is_err());
        assert!(monitor.positions.is_empty());
        assert!(monitor.account.is_none());
    }

    #[tokio::test]
    async fn test_expand_all_marks_new_positions() {
        let source = QueuedSource::new(vec![iron_condor_records()]);
        let mut monitor = PortfolioMonitor::new(source, true);

        monitor.refresh().await.unwrap();
        // header, position, two spreads, four legs
        assert_eq!(monitor.table().len(), 8);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let source = QueuedSource::new(vec![iron_condor_records()]);
        let monitor = PortfolioMonitor::new(source, false);
        let cancel_token = CancellationToken::new();
        cancel_token.cancel();

        monitor.run(Duration::from_secs(3600), cancel_token).await;
    }
}
