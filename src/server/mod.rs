//! Accepting connections and handing them to a fixed set of workers.

pub mod listener;
pub mod pool;
