pub mod aggregator;
pub mod calculator;
pub mod export;
pub mod fallback;
pub mod local;
pub mod reconciler;
pub mod remote;
pub mod state;
pub mod store;
