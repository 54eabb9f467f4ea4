use anyhow::Context;
use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use crate::etrade_api::balance::BalanceResponse;
use crate::etrade_api::positions::{PortfolioEnvelope, RawLeg};

/// One account's option legs and, when available, its balance.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub balance: Option<BalanceResponse>,
    pub legs: Vec<RawLeg>,
}

/// Where a snapshot of the account's option legs comes from.
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn fetch(&self) -> Result<Snapshot>;
}

/// Reads a saved broker portfolio response from disk and keeps the
/// configured account only.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
    account_id: String,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>, account_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            account_id: account_id.into(),
        }
    }
}

#[async_trait]
impl PositionSource for SnapshotFile {
    async fn fetch(&self) -> Result<Snapshot> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read snapshot {}", self.path.display()))?;
        let envelope: PortfolioEnvelope = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse snapshot {}", self.path.display()))?;

        let legs = envelope.option_legs(&self.account_id);
        let balance = envelope.account_balance(&self.account_id).cloned();
        debug!(
            "Loaded {} option legs for account {} from {}",
            legs.len(),
            self.account_id,
            self.path.display()
        );
        Ok(Snapshot { balance, legs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etrade_api::positions::RawValue;
    use std::fs;

    fn write_snapshot(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "options-portfolio-{}-{}.json",
            name,
            std::process::id()
        ));
        fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_fetch_snapshot() {
        let path = write_snapshot(
            "fetch",
            r#"{
                "PortfolioResponse": {"AccountPortfolio": [{"accountId": "A", "Position": [
                    {"positionId": 1, "quantity": 1,
                     "Product": {"symbol": "SPY", "securityType": "OPTN", "callPut": "CALL"}},
                    {"positionId": 2, "quantity": 10,
                     "Product": {"symbol": "SPY", "securityType": "EQ"}}
                ]}]},
                "BalanceResponse": {"accountId": "A", "accountDescription": "Brokerage"}
            }"#,
        );

        let snapshot = SnapshotFile::new(&path, "A").fetch().await.unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(snapshot.legs.len(), 1);
        assert_eq!(snapshot.legs[0].call_put.as_deref(), Some("CALL"));
        let balance = snapshot.balance.unwrap();
        assert_eq!(balance.account_description.as_deref(), Some("Brokerage"));
    }

    #[tokio::test]
    async fn test_fetch_ignores_other_accounts() {
        let path = write_snapshot(
            "accounts",
            r#"{
                "PortfolioResponse": {"AccountPortfolio": [
                    {"accountId": "A", "Position": [{"positionId": 1, "quantity": 1,
                     "Product": {"symbol": "SPY", "securityType": "OPTN", "callPut": "PUT"}}]},
                    {"accountId": "B", "Position": [{"positionId": 2, "quantity": -1,
                     "Product": {"symbol": "SPY", "securityType": "OPTN", "callPut": "PUT"}}]}
                ]},
                "BalanceResponse": {"accountId": "A"}
            }"#,
        );

        let snapshot = SnapshotFile::new(&path, "B").fetch().await.unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(snapshot.legs.len(), 1);
        assert_eq!(snapshot.legs[0].quantity, Some(RawValue::from(-1)));
        assert!(snapshot.balance.is_none());
    }

    #[test]
    fn test_unparseable_snapshot() {
        let path = write_snapshot("garbage", "not json");
        let result = tokio_test::block_on(SnapshotFile::new(&path, "A").fetch());
        fs::remove_file(&path).unwrap();

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_snapshot() {
        let result = SnapshotFile::new("/nonexistent/portfolio.json", "A").fetch().await;
        assert!(result.is_err());
    }
}
