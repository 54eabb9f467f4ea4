pub(crate) mod balance;
pub(crate) mod positions;
