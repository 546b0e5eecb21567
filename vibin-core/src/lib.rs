pub mod activity;
pub mod config;
pub mod engine;
pub mod grouping;
pub mod store;
pub mod tracker;

mod groupings;
pub use groupings::{IndexStatus, MediaGroupings};

pub use vibin_state;
