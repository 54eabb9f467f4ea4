use serde::Deserialize;

use super::positions::RawValue;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct BalanceResponse {
    #[serde(rename = "accountId")]
    pub account_id: Option<String>,
    #[serde(rename = "accountDescription")]
    pub account_description: Option<String>,
    #[serde(rename = "Computed")]
    pub computed: Option<ComputedBalance>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedBalance {
    pub margin_buying_power: Option<RawValue>,
    pub cash_buying_power: Option<RawValue>,
    #[serde(rename = "RealTimeValues")]
    pub real_time_values: Option<RealTimeValues>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealTimeValues {
    pub total_account_value: Option<RawValue>,
}

impl BalanceResponse {
    pub fn total_account_value(&self) -> Option<&RawValue> {
        self.computed
            .as_ref()
            .and_then(|computed| computed.real_time_values.as_ref())
            .and_then(|values| values.total_account_value.as_ref())
    }

    pub fn margin_buying_power(&self) -> Option<&RawValue> {
        self.computed
            .as_ref()
            .and_then(|computed| computed.margin_buying_power.as_ref())
    }

    pub fn cash_buying_power(&self) -> Option<&RawValue> {
        self.computed
            .as_ref()
            .and_then(|computed| computed.cash_buying_power.as_ref())
    }
}
