pub(crate) mod account;
pub(crate) mod display;
pub(crate) mod errors;
pub(crate) mod monitor;
pub(crate) mod positions;
pub(crate) mod settings;
pub(crate) mod source;
pub(crate) mod spreads;
pub(crate) mod strategies;
