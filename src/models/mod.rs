pub mod account;
pub mod metrics;
pub mod snapshot;
pub mod sync;
