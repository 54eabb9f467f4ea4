use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::etrade_api::positions::{RawLeg, RawValue};
use crate::platform::positions::{Gains, Leg, OptionSide};

pub(crate) fn raw_leg(
    id: i64,
    symbol: &str,
    (year, month, day): (i64, i64, i64),
    call_put: &str,
    strike: &str,
    quantity: i64,
) -> RawLeg {
    RawLeg {
        position_id: Some(RawValue::from(id)),
        expiry_year: Some(RawValue::from(year)),
        expiry_month: Some(RawValue::from(month)),
        expiry_day: Some(RawValue::from(day)),
        symbol: Some(symbol.to_string()),
        quantity: Some(RawValue::from(quantity)),
        call_put: Some(call_put.to_string()),
        strike_price: Some(RawValue::from(strike)),
        price_paid: Some(RawValue::from("1.00")),
        days_gain: Some(RawValue::from("0")),
        days_gain_pct: Some(RawValue::from("0")),
        total_gain: Some(RawValue::from("0")),
        total_gain_pct: Some(RawValue::from("0")),
    }
}

/// Short call spread 510/515 and short put spread 445/450 on SPY.
pub(crate) fn iron_condor_records() -> Vec<RawLeg> {
    vec![
        raw_leg(1, "SPY", (2024, 3, 15), "CALL", "510", -1),
        raw_leg(2, "SPY", (2024, 3, 15), "CALL", "515", 1),
        raw_leg(3, "SPY", (2024, 3, 15), "PUT", "450", -1),
        raw_leg(4, "SPY", (2024, 3, 15), "PUT", "445", 1),
    ]
}

fn option_leg(id: &str, side: OptionSide, strike: Decimal, quantity: i32) -> Leg {
    Leg {
        id: id.to_string(),
        expiration_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        underlying: "SPY".to_string(),
        quantity,
        side,
        strike_price: strike,
        price_paid: Decimal::ONE,
        gains: Gains::default(),
    }
}

pub(crate) fn call_leg(id: &str, strike: Decimal, quantity: i32) -> Leg {
    option_leg(id, OptionSide::Call, strike, quantity)
}

pub(crate) fn put_leg(id: &str, strike: Decimal, quantity: i32) -> Leg {
    option_leg(id, OptionSide::Put, strike, quantity)
}

pub(crate) fn with_gains(
    leg: Leg,
    day: Decimal,
    day_pct: Decimal,
    total: Decimal,
    total_pct: Decimal,
) -> Leg {
    Leg {
        gains: Gains {
            day,
            day_pct,
            total,
            total_pct,
        },
        ..leg
    }
}

pub(crate) fn with_price(leg: Leg, price_paid: Decimal) -> Leg {
    Leg { price_paid, ..leg }
}
