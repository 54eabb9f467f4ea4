use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use tracing::info;

use super::errors::{PortfolioError, Result};
use super::spreads::{pair_legs, Spread};
use super::strategies::StrategyType;
use crate::etrade_api::positions::{RawLeg, RawValue};

const GAIN_DECIMAL_PLACES: u32 = 2;
const UNKNOWN_POSITION: &str = "<unknown>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionSide {
    Call,
    Put,
}

impl OptionSide {
    /// Capitalised form used by the portfolio table, e.g. "Put".
    pub fn title(&self) -> &'static str {
        match self {
            OptionSide::Call => "Call",
            OptionSide::Put => "Put",
        }
    }
}

impl fmt::Display for OptionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match &self {
                OptionSide::Call => "CALL",
                OptionSide::Put => "PUT",
            }
        )
    }
}

impl FromStr for OptionSide {
    type Err = String;

    fn from_str(option_type: &str) -> std::result::Result<Self, Self::Err> {
        match option_type.trim().to_uppercase().as_str() {
            "CALL" => Ok(OptionSide::Call),
            "PUT" => Ok(OptionSide::Put),
            other => Err(format!("unknown option type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn of_quantity(quantity: i32) -> Direction {
        if quantity > 0 {
            Direction::Long
        } else {
            Direction::Short
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self {
            Direction::Long => "Long",
            Direction::Short => "Short",
        };
        write!(f, "{}", direction)
    }
}

/// Day and total gain, as an amount and a percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Gains {
    pub day: Decimal,
    pub day_pct: Decimal,
    pub total: Decimal,
    pub total_pct: Decimal,
}

impl Gains {
    pub fn rounded(self) -> Gains {
        Gains {
            day: self.day.round_dp(GAIN_DECIMAL_PLACES),
            day_pct: self.day_pct.round_dp(GAIN_DECIMAL_PLACES),
            total: self.total.round_dp(GAIN_DECIMAL_PLACES),
            total_pct: self.total_pct.round_dp(GAIN_DECIMAL_PLACES),
        }
    }

    /// Field-wise sum over `legs`, rounded once after summing. A field that
    /// overflows is reported against the leg whose gain pushed it out of range.
    pub fn sum<'a>(legs: impl IntoIterator<Item = &'a Leg>) -> Result<Gains> {
        legs.into_iter()
            .try_fold(Gains::default(), |acc, leg| {
                acc.checked_add(&leg.gains)
                    .map_err(|field| PortfolioError::overflow(&leg.id, field))
            })
            .map(Gains::rounded)
    }

    fn checked_add(self, other: &Gains) -> std::result::Result<Gains, &'static str> {
        Ok(Gains {
            day: self.day.checked_add(other.day).ok_or("daysGain")?,
            day_pct: self.day_pct.checked_add(other.day_pct).ok_or("daysGainPct")?,
            total: self.total.checked_add(other.total).ok_or("totalGain")?,
            total_pct: self
                .total_pct
                .checked_add(other.total_pct)
                .ok_or("totalGainPct")?,
        })
    }
}

fn required<'a, T>(value: &'a Option<T>, position: &str, field: &'static str) -> Result<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| PortfolioError::missing(position, field))
}

/// Coerces a broker scalar, in plain or scientific notation, to a `Decimal`.
pub(super) fn to_decimal(value: &RawValue) -> std::result::Result<Decimal, String> {
    let text = value.to_string();
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|err| format!("'{}' is not a number: {}", text, err))
}

fn parse_decimal(value: &RawValue, position: &str, field: &'static str) -> Result<Decimal> {
    to_decimal(value).map_err(|reason| PortfolioError::invalid(position, field, reason))
}

fn parse_whole(value: &RawValue, position: &str, field: &'static str) -> Result<i32> {
    let number = parse_decimal(value, position, field)?;
    if !number.fract().is_zero() {
        return Err(PortfolioError::invalid(
            position,
            field,
            format!("'{}' is not a whole number", number),
        ));
    }
    number.to_i32().ok_or_else(|| {
        PortfolioError::invalid(position, field, format!("'{}' is out of range", number))
    })
}

fn parse_calendar_part(value: &RawValue, position: &str, field: &'static str) -> Result<u32> {
    let part = parse_whole(value, position, field)?;
    u32::try_from(part)
        .map_err(|_| PortfolioError::invalid(position, field, format!("'{}' is negative", part)))
}

fn parse_money(value: &Option<RawValue>, position: &str, field: &'static str) -> Result<Decimal> {
    let amount = parse_decimal(required(value, position, field)?, position, field)?;
    Ok(amount.round_dp(GAIN_DECIMAL_PLACES))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leg {
    pub id: String,
    pub expiration_date: NaiveDate,
    pub underlying: String,
    pub quantity: i32,
    pub side: OptionSide,
    pub strike_price: Decimal,
    pub price_paid: Decimal,
    pub gains: Gains,
}

impl Leg {
    pub fn from_record(record: &RawLeg) -> Result<Leg> {
        let id = required(&record.position_id, UNKNOWN_POSITION, "positionId")?
            .to_string()
            .trim()
            .to_string();
        if id.is_empty() {
            return Err(PortfolioError::invalid(
                UNKNOWN_POSITION,
                "positionId",
                "is empty",
            ));
        }

        let year = parse_whole(required(&record.expiry_year, &id, "expiryYear")?, &id, "expiryYear")?;
        let month = parse_calendar_part(
            required(&record.expiry_month, &id, "expiryMonth")?,
            &id,
            "expiryMonth",
        )?;
        let day = parse_calendar_part(
            required(&record.expiry_day, &id, "expiryDay")?,
            &id,
            "expiryDay",
        )?;
        let expiration_date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            PortfolioError::invalid(
                &id,
                "expiryDay",
                format!("{}-{}-{} is not a calendar date", year, month, day),
            )
        })?;

        let underlying = required(&record.symbol, &id, "symbol")?.trim().to_string();
        if underlying.is_empty() {
            return Err(PortfolioError::invalid(&id, "symbol", "is empty"));
        }

        let quantity = parse_whole(required(&record.quantity, &id, "quantity")?, &id, "quantity")?;
        if quantity == 0 {
            return Err(PortfolioError::invalid(&id, "quantity", "is zero"));
        }

        let side = OptionSide::from_str(required(&record.call_put, &id, "callPut")?)
            .map_err(|err| PortfolioError::invalid(&id, "callPut", err))?;
        let strike_price = parse_decimal(
            required(&record.strike_price, &id, "strikePrice")?,
            &id,
            "strikePrice",
        )?;

        let gains = Gains {
            day: parse_money(&record.days_gain, &id, "daysGain")?,
            day_pct: parse_money(&record.days_gain_pct, &id, "daysGainPct")?,
            total: parse_money(&record.total_gain, &id, "totalGain")?,
            total_pct: parse_money(&record.total_gain_pct, &id, "totalGainPct")?,
        };
        let price_paid = parse_money(&record.price_paid, &id, "pricePaid")?;

        Ok(Leg {
            id,
            expiration_date,
            underlying,
            quantity,
            side,
            strike_price,
            price_paid,
            gains,
        })
    }

    pub fn direction(&self) -> Direction {
        Direction::of_quantity(self.quantity)
    }

    pub fn position_key(&self) -> PositionKey {
        PositionKey {
            expiration_date: self.expiration_date,
            underlying: self.underlying.clone(),
        }
    }
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt = format!(
            "id: {}, underlying: {}, expiration: {}, type: {}, strike: {}, quantity: {}",
            self.id,
            self.underlying,
            self.expiration_date,
            self.side,
            self.strike_price,
            self.quantity
        );
        write!(f, "\nLeg {}", fmt)
    }
}

/// Orders by expiration first, then by underlying symbol.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PositionKey {
    pub expiration_date: NaiveDate,
    pub underlying: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub expiration_date: NaiveDate,
    pub underlying: String,
    pub spreads: Vec<Spread>,
    /// Every leg of the position in input order, including legs held by spreads.
    pub legs: Vec<Leg>,
    pub strategy_type: StrategyType,
    pub gains: Gains,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let leg_strings: Vec<String> = self.legs.iter().map(|leg| format!("{}", leg)).collect();
        let concatenated_legs = leg_strings.join(", ");
        write!(
            f,
            "{} {} {}: {}",
            self.expiration_date, self.underlying, self.strategy_type, concatenated_legs
        )
    }
}

impl Position {
    pub fn new(key: PositionKey, legs: Vec<Leg>, spreads: Vec<Spread>) -> Result<Position> {
        let strategy_type = StrategyType::classify(&legs, &spreads);
        let gains = Gains::sum(&legs)?;
        Ok(Self {
            expiration_date: key.expiration_date,
            underlying: key.underlying,
            spreads,
            legs,
            strategy_type,
            gains,
        })
    }

    pub fn key(&self) -> PositionKey {
        PositionKey {
            expiration_date: self.expiration_date,
            underlying: self.underlying.clone(),
        }
    }

    pub fn spread_legs(&self, spread: &Spread) -> (&Leg, &Leg) {
        (&self.legs[spread.legs.0], &self.legs[spread.legs.1])
    }

    /// Legs that did not end up in any spread, in input order.
    pub fn loose_legs(&self) -> impl Iterator<Item = &Leg> {
        self.legs.iter().enumerate().filter_map(move |(index, leg)| {
            let paired = self
                .spreads
                .iter()
                .any(|spread| spread.legs.0 == index || spread.legs.1 == index);
            (!paired).then_some(leg)
        })
    }
}

fn assemble_position(key: PositionKey, legs: Vec<Leg>) -> Result<Position> {
    let mut buckets: BTreeMap<OptionSide, Vec<usize>> = BTreeMap::new();
    for (index, leg) in legs.iter().enumerate() {
        buckets.entry(leg.side).or_default().push(index);
    }

    let spreads: Vec<Spread> = buckets
        .values()
        .flat_map(|bucket| pair_legs(&legs, bucket))
        .map(|(leg1, leg2)| Spread::new(&legs, leg1, leg2))
        .collect::<Result<Vec<Spread>>>()?;

    let position = Position::new(key, legs, spreads)?;
    debug!(
        "Position with {} spreads: {}",
        position.spreads.len(),
        position
    );
    Ok(position)
}

/// Classifies a snapshot of option legs into one position per
/// (expiration, underlying), in ascending key order. Any malformed record
/// fails the whole batch.
pub fn build_positions(records: &[RawLeg]) -> Result<Vec<Position>> {
    let legs = records
        .iter()
        .map(Leg::from_record)
        .collect::<Result<Vec<Leg>>>()?;

    let mut groups: BTreeMap<PositionKey, Vec<Leg>> = BTreeMap::new();
    for leg in legs {
        groups.entry(leg.position_key()).or_default().push(leg);
    }

    let positions: Vec<Position> = groups
        .into_iter()
        .map(|(key, legs)| assemble_position(key, legs))
        .collect::<Result<Vec<Position>>>()?;

    info!(
        "Classified {} legs into {} positions",
        records.len(),
        positions.len()
    );
    Ok(positions)
}
