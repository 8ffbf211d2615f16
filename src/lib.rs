pub mod config;
pub mod fetch;
pub mod ingest;
pub mod normalize;
pub mod output;

pub use config::Config;
pub use ingest::RawTable;
pub use normalize::{normalize, DetailRow, NormalizeError};
