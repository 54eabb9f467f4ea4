use serde::Deserialize;
use std::fmt;

use super::balance::BalanceResponse;

const OPTION_SECURITY_TYPE: &str = "OPTN";

/// A loosely typed scalar as it arrives from the broker. JSON numbers go
/// through `serde_json::Number`, so integers are exact but fractional values
/// are held as `f64` and coerced from their shortest round-trip text. Money
/// sent as a JSON string keeps every digit.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(val) => write!(f, "{}", val),
            RawValue::Text(val) => write!(f, "{}", val),
        }
    }
}

impl From<i64> for RawValue {
    fn from(val: i64) -> Self {
        RawValue::Number(val.into())
    }
}

impl From<&str> for RawValue {
    fn from(val: &str) -> Self {
        RawValue::Text(val.to_string())
    }
}

/// A saved broker snapshot: the portfolio response and, optionally, the
/// balance response of the same account.
#[derive(Debug, Deserialize)]
pub struct PortfolioEnvelope {
    #[serde(rename = "PortfolioResponse")]
    pub response: PortfolioResponse,
    #[serde(rename = "BalanceResponse", default)]
    pub balance: Option<BalanceResponse>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PortfolioResponse {
    #[serde(rename = "AccountPortfolio", default)]
    pub accounts: Vec<AccountPortfolio>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AccountPortfolio {
    #[serde(rename = "accountId")]
    pub account_id: Option<String>,
    #[serde(rename = "Position", default)]
    pub positions: Vec<PortfolioPosition>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioPosition {
    pub position_id: Option<RawValue>,
    pub quantity: Option<RawValue>,
    pub price_paid: Option<RawValue>,
    pub days_gain: Option<RawValue>,
    pub days_gain_pct: Option<RawValue>,
    pub total_gain: Option<RawValue>,
    pub total_gain_pct: Option<RawValue>,
    #[serde(rename = "Product")]
    pub product: Option<Product>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub symbol: Option<String>,
    pub security_type: Option<String>,
    pub call_put: Option<String>,
    pub expiry_year: Option<RawValue>,
    pub expiry_month: Option<RawValue>,
    pub expiry_day: Option<RawValue>,
    pub strike_price: Option<RawValue>,
}

/// One option position flattened out of the portfolio payload. Every field
/// stays optional here; `Leg::from_record` decides what is malformed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawLeg {
    pub position_id: Option<RawValue>,
    pub expiry_year: Option<RawValue>,
    pub expiry_month: Option<RawValue>,
    pub expiry_day: Option<RawValue>,
    pub symbol: Option<String>,
    pub quantity: Option<RawValue>,
    pub call_put: Option<String>,
    pub strike_price: Option<RawValue>,
    pub price_paid: Option<RawValue>,
    pub days_gain: Option<RawValue>,
    pub days_gain_pct: Option<RawValue>,
    pub total_gain: Option<RawValue>,
    pub total_gain_pct: Option<RawValue>,
}

impl PortfolioPosition {
    pub fn is_option(&self) -> bool {
        self.product
            .as_ref()
            .and_then(|product| product.security_type.as_deref())
            .map(|security_type| security_type.eq_ignore_ascii_case(OPTION_SECURITY_TYPE))
            .unwrap_or(false)
    }

    pub fn flatten(&self) -> RawLeg {
        let product = self.product.clone();
        let (symbol, call_put, expiry_year, expiry_month, expiry_day, strike_price) = match product
        {
            Some(product) => (
                product.symbol,
                product.call_put,
                product.expiry_year,
                product.expiry_month,
                product.expiry_day,
                product.strike_price,
            ),
            None => (None, None, None, None, None, None),
        };

        RawLeg {
            position_id: self.position_id.clone(),
            expiry_year,
            expiry_month,
            expiry_day,
            symbol,
            quantity: self.quantity.clone(),
            call_put,
            strike_price,
            price_paid: self.price_paid.clone(),
            days_gain: self.days_gain.clone(),
            days_gain_pct: self.days_gain_pct.clone(),
            total_gain: self.total_gain.clone(),
            total_gain_pct: self.total_gain_pct.clone(),
        }
    }
}

impl PortfolioEnvelope {
    /// Option positions held in `account_id`, in payload order. Other
    /// accounts in the payload are ignored.
    pub fn option_legs(&self, account_id: &str) -> Vec<RawLeg> {
        self.response
            .accounts
            .iter()
            .filter(|account| account.account_id.as_deref() == Some(account_id))
            .flat_map(|account| account.positions.iter())
            .filter(|position| position.is_option())
            .map(PortfolioPosition::flatten)
            .collect()
    }

    /// The balance block, if the snapshot carries one for `account_id`.
    pub fn account_balance(&self, account_id: &str) -> Option<&BalanceResponse> {
        self.balance
            .as_ref()
            .filter(|balance| balance.account_id.as_deref() == Some(account_id))
    }
}
