use rust_decimal::Decimal;
use std::collections::HashSet;

use super::account::AccountSummary;
use super::positions::{Gains, Leg, Position, PositionKey};
use super::spreads::Spread;

const EXPANDED: &str = "▼";
const COLLAPSED: &str = "▶";
const DATE_FORMAT: &str = "%b %d '%y";

/// Identifies a spread across refreshes by the ids of its two legs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpreadKey {
    pub leg1: String,
    pub leg2: String,
}

impl SpreadKey {
    pub fn of(position: &Position, spread: &Spread) -> SpreadKey {
        let (leg1, leg2) = position.spread_legs(spread);
        SpreadKey {
            leg1: leg1.id.clone(),
            leg2: leg2.id.clone(),
        }
    }
}

/// Expand/collapse state layered over the classified positions. Positions are
/// rebuilt on every refresh, so flags are kept by key and re-attached.
#[derive(Debug, Default)]
pub struct DisplayState {
    shown_spreads: HashSet<PositionKey>,
    shown_legs: HashSet<SpreadKey>,
}

impl DisplayState {
    pub fn shows_spreads(&self, key: &PositionKey) -> bool {
        self.shown_spreads.contains(key)
    }

    pub fn shows_legs(&self, key: &SpreadKey) -> bool {
        self.shown_legs.contains(key)
    }

    pub fn expand_all(&mut self, positions: &[Position]) {
        for position in positions {
            self.shown_spreads.insert(position.key());
            for spread in &position.spreads {
                self.shown_legs.insert(SpreadKey::of(position, spread));
            }
        }
    }

    /// Drops flags for positions and spreads absent from the latest snapshot.
    pub fn retain(&mut self, positions: &[Position]) {
        let position_keys: HashSet<PositionKey> = positions.iter().map(Position::key).collect();
        let spread_keys: HashSet<SpreadKey> = positions
            .iter()
            .flat_map(|position| {
                position
                    .spreads
                    .iter()
                    .map(move |spread| SpreadKey::of(position, spread))
            })
            .collect();

        self.shown_spreads.retain(|key| position_keys.contains(key));
        self.shown_legs.retain(|key| spread_keys.contains(key));
    }
}

fn marker(expanded: bool) -> &'static str {
    if expanded {
        EXPANDED
    } else {
        COLLAPSED
    }
}

#[allow(clippy::too_many_arguments)]
fn row(
    marker: &str,
    date: &str,
    symbol: &str,
    quantity: &str,
    kind: &str,
    strikes: &str,
    price_paid: &str,
    gains: &Gains,
) -> String {
    format!(
        "{:1}{:^16}{:^8}{:^5}{:^20}{:^20}{:^16}{:^16}{:^16}{:^16}{:^16}",
        marker,
        date,
        symbol,
        quantity,
        kind,
        strikes,
        price_paid,
        gains.day.to_string(),
        gains.day_pct.to_string(),
        gains.total.to_string(),
        gains.total_pct.to_string()
    )
}

fn leg_row(leg: &Leg) -> String {
    row(
        "",
        "",
        "",
        &leg.quantity.to_string(),
        &leg.side.to_string(),
        &leg.strike_price.to_string(),
        &leg.price_paid.to_string(),
        &leg.gains,
    )
}

fn spread_label(spread: &Spread) -> String {
    let plural = if spread.quantity > 1 { "s" } else { "" };
    format!(
        "{} {} Spread{}",
        spread.side.title(),
        spread.price_effect,
        plural
    )
}

fn strikes_label((low, high): (Decimal, Decimal)) -> String {
    format!("{} / {}", low, high)
}

fn header() -> String {
    format!(
        "{:1}{:^16}{:^8}{:^5}{:^20}{:^20}{:^16}{:^16}{:^16}{:^16}{:^16}",
        " ",
        "Date",
        "Symbol",
        "Q",
        "Type",
        "Strike Prices",
        "Price Paid $",
        "Day Gain $",
        "Day Gain %",
        "Total Gain $",
        "Total Gain %"
    )
}

/// Formats an amount as dollars with thousands separators, e.g. `$-1,234.50`.
fn dollars(amount: Decimal) -> String {
    let text = format!("{:.2}", amount.round_dp(2));
    let (sign, digits) = match text.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", text.as_str()),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("${}{}.{}", sign, grouped, fraction)
}

/// Renders the account header that sits above the portfolio table.
pub fn render_account(account: &AccountSummary) -> Vec<String> {
    vec![
        String::from("  ======|  Account  |======"),
        format!("Account Number: {}", account.account_id),
        format!("Account Name: {}", account.description),
        format!("Net Account Value: {}", dollars(account.net_value)),
        format!("Margin Buying Power: {}", dollars(account.margin_buying_power)),
        format!("Cash Buying Power: {}", dollars(account.cash_buying_power)),
        String::from("  ======| Portfolio |======"),
    ]
}

/// Renders the portfolio table: one row per position, its spreads (and their
/// legs) when expanded, then the position's loose legs.
pub fn render(positions: &[Position], state: &DisplayState) -> Vec<String> {
    let mut rows = vec![header()];

    for position in positions {
        let show_spreads = state.shows_spreads(&position.key());
        rows.push(row(
            marker(show_spreads),
            &position.expiration_date.format(DATE_FORMAT).to_string(),
            &position.underlying,
            "",
            &position.strategy_type.to_string(),
            "",
            "",
            &position.gains,
        ));

        if !show_spreads {
            continue;
        }

        for spread in &position.spreads {
            let show_legs = state.shows_legs(&SpreadKey::of(position, spread));
            rows.push(row(
                "",
                "",
                marker(show_legs),
                &spread.quantity.to_string(),
                &spread_label(spread),
                &strikes_label(spread.strikes),
                &spread.price_paid.to_string(),
                &spread.gains,
            ));

            if show_legs {
                let (leg1, leg2) = position.spread_legs(spread);
                rows.push(leg_row(leg1));
                rows.push(leg_row(leg2));
            }
        }

        rows.extend(position.loose_legs().map(leg_row));
    }
    rows
}
