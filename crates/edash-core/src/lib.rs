pub mod config;
pub mod error;
pub mod types;

pub use config::EdashConfig;
pub use error::{EdashError, EdashResult};
pub use types::{DataKind, DataSourceMode, DiagramConfig, Locale};
