pub mod core;
pub mod features;
pub mod scraping;
pub mod setup;
pub mod tools;

// --- Primary core exports ---
pub use crate::core::types::*;
pub use crate::core::{WatchConfig, WatchFileConfig};
pub use crate::features::{alert, seen_store, SeenSet};
pub use crate::scraping::{filter_nav, results};
pub use crate::tools::watch;
