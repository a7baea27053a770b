pub mod clock;
pub mod clutch;
pub mod config;
pub mod engine;
pub mod error;
pub mod leaders;
pub mod model;
pub mod opponent;
pub mod score;
pub mod situational;
pub mod sqlite_store;
pub mod store;
pub mod synthetic;

pub use engine::Analytics;
pub use error::{AnalyticsError, Result};
