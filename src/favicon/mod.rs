//! Favicon resolution and caching engine
//!
//! - `candidates`: ordered icon source URLs for a page
//! - `prober`: decides whether a candidate serves a loadable image
//! - `cache`: domain-keyed TTL cache with size-bounded eviction
//! - `resolver`: ties the above together and feeds the link sync

pub mod cache;
pub mod candidates;
pub mod prober;
pub mod resolver;

pub use cache::{CacheEntry, CacheLookup, CacheStats, EvictionStats, FaviconCache};
pub use candidates::{Candidate, CandidateSource, generate_candidates};
pub use prober::{HttpImageProber, ImageProber};
pub use resolver::FaviconResolver;
