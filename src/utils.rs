pub(crate) mod activity;
pub mod timer;

#[cfg(test)]
pub mod test_helpers;
