//! Utility modules for the favicon resolver
//!
//! Reusable helpers shared across the cache, prober and link sync.

pub mod time;
pub mod url;

// Re-export commonly used types for convenience
pub use time::{Clock, ManualClock, SystemClock};
pub use url::UrlUtils;
