//! TWiT Catalog Core Library
//!
//! This crate harvests the TWiT.tv episodes API into an in-memory catalog
//! and serves it to a media server as a browsable channel.
//!
//! # Features
//! - Show → episode catalog index with atomic per-identity inserts
//! - Cursor-paginated ingestion with a freshness check and request pacing
//! - Retry with fixed backoff on transient server errors
//! - Cancellation of every pause and backoff
//! - Show and episode listings with paging and sorting
//!
//! # Example
//! ```no_run
//! use tokio_util::sync::CancellationToken;
//! use twit_core::{CatalogIndex, TwitConfig, TwitDownloader, TwitError};
//!
//! # async fn example() -> Result<(), TwitError> {
//! let config = TwitConfig::default();
//! let downloader = TwitDownloader::new(&config)?;
//! let index = CatalogIndex::new();
//!
//! downloader
//!     .populate(
//!         &index,
//!         config.limit_collection_in_days,
//!         config.limit_requests_per_minute,
//!         &CancellationToken::new(),
//!     )
//!     .await?;
//! println!("{} shows, {} episodes", index.len(), index.episode_count());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod catalog;
pub mod channel;
pub mod client;
pub mod config;
pub mod downloader;
pub mod error;
pub mod parser;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use cache::{CatalogIndex, ShowCache};
pub use channel::{ChannelFeatures, TwitChannel};
pub use client::{HttpTransport, RateLimiter, RetryPolicy, Transport, TransportResponse, TwitClient};
pub use config::{load_config, load_config_from_str, TwitConfig};
pub use downloader::{Freshness, RefreshOutcome, RefreshStats, TwitDownloader};
pub use error::{Result, TwitError};
pub use types::{
    ChannelContentType, ChannelItem, ChannelItemResult, ChannelItemType, ChannelMediaType,
    ChannelQuery, Episode, ImageType, MediaKind, MediaSource, ParentalRating, Show, SortField,
};
