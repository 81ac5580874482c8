//! Host-facing TWiT channel
//!
//! `TwitChannel` is what the surrounding media server talks to. Every
//! listing first runs the freshness check (refreshing the index when it is
//! stale) and then answers from the index. A refresh that fails is logged
//! and the listing is served from whatever the index already holds.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::CatalogIndex;
use crate::catalog::{list_show_episodes, list_shows, MAX_PAGE_SIZE};
use crate::client::{HttpTransport, Transport};
use crate::config::TwitConfig;
use crate::downloader::{RefreshOutcome, TwitDownloader};
use crate::error::Result;
use crate::types::{
    ChannelContentType, ChannelItemResult, ChannelMediaType, ChannelQuery, ImageType,
    ParentalRating, SortField,
};

/// Display name of the channel
pub const CHANNEL_NAME: &str = "TWiT Network";

/// Channel description shown by the host
pub const CHANNEL_DESCRIPTION: &str = "Watch your favourite netcasts from the TWiT network.";

/// Channel home page
pub const HOME_PAGE_URL: &str = "http://twit.tv";

/// Capabilities advertised to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelFeatures {
    pub content_types: Vec<ChannelContentType>,
    pub media_types: Vec<ChannelMediaType>,
    /// Largest page a query may ask for
    pub max_page_size: usize,
    /// Fields the host may sort by
    pub sort_fields: Vec<SortField>,
    pub supports_sort_order_toggle: bool,
}

impl Default for ChannelFeatures {
    fn default() -> Self {
        Self {
            content_types: vec![ChannelContentType::Podcast],
            media_types: vec![ChannelMediaType::Video],
            max_page_size: MAX_PAGE_SIZE,
            sort_fields: vec![
                SortField::Name,
                SortField::PremiereDate,
                SortField::Runtime,
                SortField::CommunityRating,
            ],
            supports_sort_order_toggle: true,
        }
    }
}

/// TWiT catalog channel
///
/// Owns the catalog index and the downloader that keeps it current. The
/// channel is `Send + Sync`; concurrent listings may each trigger a refresh.
///
/// # Example
/// ```no_run
/// use tokio_util::sync::CancellationToken;
/// use twit_core::{ChannelQuery, TwitChannel, TwitConfig};
///
/// # async fn example() -> Result<(), twit_core::TwitError> {
/// let channel = TwitChannel::new(TwitConfig::default())?;
/// let cancel = CancellationToken::new();
///
/// let shows = channel.list_shows(&ChannelQuery::shows(), &cancel).await;
/// for show in &shows.items {
///     println!("{} ({})", show.name, show.id);
/// }
///
/// if let Some(first) = shows.items.first() {
///     let episodes = channel
///         .list_folder(&first.id, &ChannelQuery::default(), &cancel)
///         .await?;
///     println!("{} episodes", episodes.total_record_count);
/// }
/// # Ok(())
/// # }
/// ```
pub struct TwitChannel<T = HttpTransport> {
    index: Arc<CatalogIndex>,
    downloader: TwitDownloader<T>,
    config: TwitConfig,
}

impl TwitChannel<HttpTransport> {
    /// Create a channel with a reqwest-backed downloader and an empty index.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: TwitConfig) -> Result<Self> {
        let downloader = TwitDownloader::new(&config)?;
        Ok(Self::with_downloader(downloader, config))
    }
}

impl<T: Transport> TwitChannel<T> {
    /// Create a channel over a pre-configured downloader.
    pub fn with_downloader(downloader: TwitDownloader<T>, config: TwitConfig) -> Self {
        Self {
            index: Arc::new(CatalogIndex::new()),
            downloader,
            config,
        }
    }

    /// Share an existing index instead of starting empty.
    pub fn with_index(mut self, index: Arc<CatalogIndex>) -> Self {
        self.index = index;
        self
    }

    pub fn index(&self) -> &Arc<CatalogIndex> {
        &self.index
    }

    pub fn config(&self) -> &TwitConfig {
        &self.config
    }

    pub fn name(&self) -> &'static str {
        CHANNEL_NAME
    }

    pub fn description(&self) -> &'static str {
        CHANNEL_DESCRIPTION
    }

    pub fn home_page_url(&self) -> &'static str {
        HOME_PAGE_URL
    }

    pub fn parental_rating(&self) -> ParentalRating {
        ParentalRating::GeneralAudience
    }

    /// Image slots the host may ask the channel to fill.
    pub fn supported_images(&self) -> Vec<ImageType> {
        vec![ImageType::Thumb, ImageType::Backdrop, ImageType::Primary]
    }

    /// Key the host uses to cache channel data; changes with the app id.
    pub fn cache_key(&self) -> &str {
        &self.config.app_id
    }

    pub fn features(&self) -> ChannelFeatures {
        ChannelFeatures::default()
    }

    /// Run the freshness check and, if needed, a refresh traversal.
    ///
    /// # Errors
    /// Transport faults are returned as-is. The index keeps whatever was
    /// folded before the fault.
    pub async fn refresh(&self, cancel: &CancellationToken) -> Result<RefreshOutcome> {
        self.downloader
            .populate(
                &self.index,
                self.config.limit_collection_in_days,
                self.config.limit_requests_per_minute,
                cancel,
            )
            .await
    }

    /// Answer a host query: the shows when `folder_id` is unset, otherwise
    /// the episodes of that folder.
    ///
    /// # Errors
    /// Returns `TwitError::InvalidFolderId` for a folder id that does not
    /// encode a show. Refresh failures are never returned from here.
    pub async fn get_channel_items(
        &self,
        query: &ChannelQuery,
        cancel: &CancellationToken,
    ) -> Result<ChannelItemResult> {
        match query.folder_id.as_deref() {
            None => Ok(self.list_shows(query, cancel).await),
            Some(folder_id) => self.list_folder(folder_id, query, cancel).await,
        }
    }

    /// List the top-level show folders.
    pub async fn list_shows(
        &self,
        query: &ChannelQuery,
        cancel: &CancellationToken,
    ) -> ChannelItemResult {
        self.refresh_or_serve_stale(cancel).await;
        list_shows(&self.index, query)
    }

    /// List the episodes under a show folder.
    ///
    /// # Errors
    /// Returns `TwitError::InvalidFolderId` if `folder_id` is malformed.
    pub async fn list_folder(
        &self,
        folder_id: &str,
        query: &ChannelQuery,
        cancel: &CancellationToken,
    ) -> Result<ChannelItemResult> {
        self.refresh_or_serve_stale(cancel).await;
        list_show_episodes(&self.index, folder_id, query)
    }

    async fn refresh_or_serve_stale(&self, cancel: &CancellationToken) {
        match self.refresh(cancel).await {
            Ok(RefreshOutcome::StillValid) => {}
            Ok(RefreshOutcome::Completed(stats)) => {
                debug!(
                    "Refresh folded {} pages, {} new episodes",
                    stats.pages, stats.fold.episodes_added
                );
            }
            Ok(RefreshOutcome::Cancelled(stats)) => {
                info!(
                    "Refresh cancelled after {} pages, serving cached catalog",
                    stats.pages
                );
            }
            Ok(RefreshOutcome::Aborted { url, stats }) => {
                warn!(
                    "Refresh aborted at {} after {} pages, serving cached catalog",
                    url, stats.pages
                );
            }
            Err(e) => {
                warn!("Refresh failed, serving cached catalog: {}", e);
            }
        }
    }
}
