use std::fmt;

use super::positions::{Direction, Leg, OptionSide};
use super::spreads::{PriceEffect, Spread};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyType {
    Single(Direction, OptionSide),
    Straddle(Direction),
    Strangle(Direction),
    Butterfly(Direction),
    IronCondor(Direction),
    Complex,
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyType::Single(direction, side) => write!(f, "{} {}", direction, side),
            StrategyType::Straddle(direction) => write!(f, "{} Straddle", direction),
            StrategyType::Strangle(direction) => write!(f, "{} Strangle", direction),
            StrategyType::Butterfly(direction) => write!(f, "{} Butterfly", direction),
            StrategyType::IronCondor(direction) => write!(f, "{} Iron Condor", direction),
            StrategyType::Complex => write!(f, "Complex Strategy"),
        }
    }
}

impl StrategyType {
    /// First matching rule wins; anything unrecognised is `Complex`.
    pub fn classify(legs: &[Leg], spreads: &[Spread]) -> StrategyType {
        match (legs.len(), spreads.len()) {
            (1, _) => Self::single_leg_strategies(&legs[0]),
            (2, _) if legs[0].quantity == legs[1].quantity => {
                Self::double_leg_strategies(&legs[0], &legs[1])
            }
            (4, 2) => Self::four_leg_strategies(&spreads[0], &spreads[1]),
            _ => StrategyType::Complex,
        }
    }

    fn single_leg_strategies(leg: &Leg) -> StrategyType {
        StrategyType::Single(leg.direction(), leg.side)
    }

    fn double_leg_strategies(leg1: &Leg, leg2: &Leg) -> StrategyType {
        let direction = leg1.direction();
        if leg1.strike_price == leg2.strike_price {
            StrategyType::Straddle(direction)
        } else {
            StrategyType::Strangle(direction)
        }
    }

    fn four_leg_strategies(spread1: &Spread, spread2: &Spread) -> StrategyType {
        if spread1.side == spread2.side || spread1.price_effect != spread2.price_effect {
            return StrategyType::Complex;
        }

        let direction = match spread1.price_effect {
            PriceEffect::Debit => Direction::Long,
            PriceEffect::Credit => Direction::Short,
        };
        // Only the first spread's lower strike is checked for overlap.
        let (low, _) = spread1.strikes;
        if low == spread2.strikes.0 || low == spread2.strikes.1 {
            StrategyType::Butterfly(direction)
        } else {
            StrategyType::IronCondor(direction)
        }
    }
}
