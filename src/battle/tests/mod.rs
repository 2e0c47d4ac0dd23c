pub(crate) mod common;

#[cfg(test)]
mod test_snapshot;
#[cfg(test)]
mod test_switching;
#[cfg(test)]
mod test_triggers;
#[cfg(test)]
mod test_turn_flow;
