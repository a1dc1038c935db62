pub mod schema;

pub use schema::{Config, HistoryConfig, SessionConfig};
