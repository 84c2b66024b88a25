pub mod cache;
pub mod cli;
pub mod config;
pub mod generator;
pub mod i18n;
pub mod ingest;
pub mod llm;
pub mod search;
pub mod server;
pub mod session;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use generator::workflow::{BriefPipeline, BriefRequest, launch};
pub use session::{ResultState, ResultStore};
