#[cfg(test)]
pub(crate) mod fixtures;
