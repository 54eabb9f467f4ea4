use rust_decimal::Decimal;

use super::errors::{PortfolioError, Result};
use super::positions::to_decimal;
use crate::etrade_api::balance::BalanceResponse;
use crate::etrade_api::positions::RawValue;

const MONEY_DECIMAL_PLACES: u32 = 2;

/// Account header shown above the portfolio table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub account_id: String,
    pub description: String,
    pub net_value: Decimal,
    pub margin_buying_power: Decimal,
    pub cash_buying_power: Decimal,
}

fn money(value: Option<&RawValue>, account: &str, field: &'static str) -> Result<Decimal> {
    match value {
        // Absent balances read as zero.
        None => Ok(Decimal::ZERO),
        Some(value) => to_decimal(value)
            .map(|amount| amount.round_dp(MONEY_DECIMAL_PLACES))
            .map_err(|reason| PortfolioError::MalformedBalance {
                account: account.to_string(),
                field,
                reason,
            }),
    }
}

impl AccountSummary {
    pub fn from_response(balance: &BalanceResponse) -> Result<AccountSummary> {
        let account_id = balance.account_id.clone().unwrap_or_default();
        Ok(AccountSummary {
            net_value: money(balance.total_account_value(), &account_id, "totalAccountValue")?,
            margin_buying_power: money(
                balance.margin_buying_power(),
                &account_id,
                "marginBuyingPower",
            )?,
            cash_buying_power: money(balance.cash_buying_power(), &account_id, "cashBuyingPower")?,
            description: balance.account_description.clone().unwrap_or_default(),
            account_id,
        })
    }
}
