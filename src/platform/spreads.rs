use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fmt;

use super::errors::{PortfolioError, Result};
use super::positions::{Gains, Leg, OptionSide};

const CONTRACT_MULTIPLIER: Decimal = dec!(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceEffect {
    Credit,
    Debit,
}

impl PriceEffect {
    // Only a put pair can be a debit; call pairs always come out as credit.
    fn of_pair(first: &Leg, second: &Leg) -> PriceEffect {
        if first.quantity < second.quantity && first.side == OptionSide::Put {
            PriceEffect::Debit
        } else {
            PriceEffect::Credit
        }
    }
}

impl fmt::Display for PriceEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let price_effect = match self {
            PriceEffect::Credit => String::from("Credit"),
            PriceEffect::Debit => String::from("Debit"),
        };
        write!(f, "{}", price_effect)
    }
}

/// Two legs of one option type, expiration and underlying whose quantities
/// cancel out. The legs are held as indices into the owning position's legs,
/// lower strike first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spread {
    pub legs: (usize, usize),
    pub quantity: u32,
    pub side: OptionSide,
    pub price_effect: PriceEffect,
    pub strikes: (Decimal, Decimal),
    pub gains: Gains,
    pub price_paid: Decimal,
}

impl Spread {
    pub fn new(legs: &[Leg], leg1: usize, leg2: usize) -> Result<Spread> {
        let first = &legs[leg1];
        let second = &legs[leg2];

        let cost = |leg: &Leg| {
            leg.price_paid
                .checked_mul(Decimal::from(leg.quantity))
                .and_then(|cost| cost.checked_mul(CONTRACT_MULTIPLIER))
                .ok_or_else(|| PortfolioError::overflow(&leg.id, "pricePaid"))
        };
        let price_paid = cost(first)?
            .checked_add(cost(second)?)
            .ok_or_else(|| PortfolioError::overflow(&second.id, "pricePaid"))?;

        Ok(Spread {
            legs: (leg1, leg2),
            quantity: first.quantity.unsigned_abs(),
            side: first.side,
            price_effect: PriceEffect::of_pair(first, second),
            strikes: (first.strike_price, second.strike_price),
            gains: Gains::sum([first, second])?,
            price_paid: price_paid.round_dp(2),
        })
    }
}

/// Greedily pairs the legs of one (expiration, underlying, option type)
/// bucket. `bucket` holds indices into `legs`; the returned pairs are in
/// ascending strike order of their first leg.
pub fn pair_legs(legs: &[Leg], bucket: &[usize]) -> Vec<(usize, usize)> {
    let mut worklist = bucket.to_vec();
    // Stable, so equal strikes keep their input order.
    worklist.sort_by(|a, b| legs[*a].strike_price.cmp(&legs[*b].strike_price));

    let mut pairs = Vec::new();
    let mut head = 0;
    while head < worklist.len() {
        let first = worklist[head];
        let quantity = i64::from(legs[first].quantity);
        let matched = worklist[head + 1..]
            .iter()
            .position(|&other| quantity + i64::from(legs[other].quantity) == 0);

        match matched {
            Some(offset) => {
                let second = worklist.remove(head + 1 + offset);
                worklist.remove(head);
                pairs.push((first, second));
            }
            None => head += 1,
        }
    }
    pairs
}
