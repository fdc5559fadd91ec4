//! Crawler module for grid searching
//!
//! This module contains the core crawling logic, including:
//! - Rolling-window rate limiting shared by every provider call
//! - Paginated place searches around a single grid point
//! - Batch coordination, checkpointing and resumption

mod coordinator;
mod fetcher;
mod rate_limiter;

pub use coordinator::{run_crawl, Coordinator, CrawlReport, SkipReason};
pub use fetcher::{build_http_client, PlaceFetcher};
pub use rate_limiter::{RateLimiter, DEFAULT_PERIOD};
