//! Ingestion engine for the TWiT episodes feed
//!
//! A refresh walks the cursor-paginated episodes feed from "now minus N
//! days" forward, folds each page into the catalog index and paces itself
//! against a per-minute request budget:
//!
//! ```text
//! CheckFreshness -> Fetching -> (Retrying)* -> Folding -> NextPage | Complete | Aborted
//! ```
//!
//! Pages are fetched strictly one after another. Concurrent refreshes over
//! the same index are tolerated: every insertion is an atomic per-identity
//! check-and-set, so duplicated work is rejected rather than duplicated.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::CatalogIndex;
use crate::client::{HttpTransport, RateLimiter, Transport, TwitClient, PACING_WINDOW};
use crate::config::TwitConfig;
use crate::error::Result;
use crate::parser::{parse_episodes_page, EpisodesPage};

/// How long a completed traversal stays valid
const CACHE_TTL_SECS: i64 = 60 * 60;

/// Outcome of the freshness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The index covers fewer days than requested
    InsufficientDepth,
    /// Covered and younger than the TTL, no refresh needed
    Fresh,
    /// Covered but older than the TTL
    Expired,
}

impl Freshness {
    /// Decide whether a refresh of `requested_days` is needed at `now`.
    pub fn evaluate(index: &CatalogIndex, requested_days: u32, now: DateTime<Utc>) -> Self {
        if index.request_days() < requested_days {
            return Freshness::InsufficientDepth;
        }

        let age = now.signed_duration_since(index.last_updated());
        if age.num_seconds() < CACHE_TTL_SECS {
            Freshness::Fresh
        } else {
            Freshness::Expired
        }
    }

    pub fn needs_refresh(self) -> bool {
        !matches!(self, Freshness::Fresh)
    }
}

/// Result of one refresh invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The index was fresh; no request was made
    StillValid,
    /// The feed was walked to its last page
    Completed(RefreshStats),
    /// The cancellation token fired before the traversal finished
    Cancelled(RefreshStats),
    /// A page could not be fetched or decoded; already folded pages remain
    Aborted {
        /// URL of the page that failed
        url: String,
        stats: RefreshStats,
    },
}

impl RefreshOutcome {
    /// Whether a full traversal completed
    pub fn is_completed(&self) -> bool {
        matches!(self, RefreshOutcome::Completed(_))
    }
}

/// Counters accumulated over a traversal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub pages: u32,
    pub fold: FoldSummary,
}

/// What folding one or more pages changed in the index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FoldSummary {
    pub shows_added: usize,
    pub shows_skipped: usize,
    pub episodes_added: usize,
    pub duplicate_episodes: usize,
}

impl FoldSummary {
    fn merge(&mut self, other: FoldSummary) {
        self.shows_added += other.shows_added;
        self.shows_skipped += other.shows_skipped;
        self.episodes_added += other.episodes_added;
        self.duplicate_episodes += other.duplicate_episodes;
    }
}

/// Fold one decoded page into the index.
///
/// Each episode is added under every show it embeds. A show that loses an
/// insertion race is skipped with a warning; duplicate episodes are ignored.
pub fn fold_page(index: &CatalogIndex, page: EpisodesPage) -> FoldSummary {
    let mut summary = FoldSummary::default();

    for entry in page.entries {
        for show in entry.shows {
            let show_id = show.id;
            let label = show.label.clone();

            let cache = if let Some(cache) = index.get_show(show_id) {
                debug!("Show {} is already in the network cache", label);
                cache
            } else if index.try_add_show(show) {
                debug!("Show {} has been added to the network cache", label);
                summary.shows_added += 1;
                match index.get_show(show_id) {
                    Some(cache) => cache,
                    None => continue,
                }
            } else {
                warn!("Show {} cannot be added to the network cache", label);
                summary.shows_skipped += 1;
                continue;
            };

            let episode = &entry.episode;
            if cache.add_episode(episode.clone()) {
                debug!(
                    "{} episode {} ({}) has been added to the cache",
                    label, episode.episode_number, episode.label
                );
                summary.episodes_added += 1;
            } else {
                debug!(
                    "{} episode {} ({}) is already in the network cache",
                    label, episode.episode_number, episode.label
                );
                summary.duplicate_episodes += 1;
            }
        }
    }

    summary
}

/// Unix timestamp (seconds) of `now` minus `request_days` days.
///
/// Spans reaching past the Unix epoch clamp to zero.
pub fn epoch_cutoff(request_days: u32, now: DateTime<Utc>) -> i64 {
    chrono::Duration::try_days(i64::from(request_days))
        .and_then(|span| now.checked_sub_signed(span))
        .map_or(0, |cutoff| cutoff.timestamp().max(0))
}

/// First page URL: episodes aired at or after `cutoff`.
pub fn episodes_url(base_url: &str, cutoff: i64) -> String {
    format!(
        "{}/episodes?{}={}&{}={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode("filter[airingDate][value]"),
        cutoff,
        urlencoding::encode("filter[airingDate][operator]"),
        urlencoding::encode(">=")
    )
}

/// Walks the episodes feed and keeps a catalog index current.
///
/// # Example
/// ```no_run
/// use tokio_util::sync::CancellationToken;
/// use twit_core::{CatalogIndex, TwitConfig, TwitDownloader};
///
/// # async fn example() -> Result<(), twit_core::TwitError> {
/// let config = TwitConfig::default();
/// let downloader = TwitDownloader::new(&config)?;
/// let index = CatalogIndex::new();
///
/// let outcome = downloader
///     .populate(&index, 30, 5, &CancellationToken::new())
///     .await?;
/// println!("{:?}, {} shows", outcome, index.len());
/// # Ok(())
/// # }
/// ```
pub struct TwitDownloader<T = HttpTransport> {
    client: TwitClient<T>,
    base_url: String,
    pacing_window: Duration,
}

impl TwitDownloader<HttpTransport> {
    /// Create a downloader with a reqwest-backed client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &TwitConfig) -> Result<Self> {
        let client = TwitClient::new(config)?;
        Ok(Self::with_client(client, &config.base_url))
    }
}

impl<T: Transport> TwitDownloader<T> {
    /// Create a downloader over a pre-configured client.
    pub fn with_client(client: TwitClient<T>, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            pacing_window: PACING_WINDOW,
        }
    }

    /// Replace the rate limiting window (default: one minute).
    pub fn with_pacing_window(mut self, window: Duration) -> Self {
        self.pacing_window = window;
        self
    }

    pub fn client(&self) -> &TwitClient<T> {
        &self.client
    }

    /// Bring `index` up to date with `request_days` days of history.
    ///
    /// # Arguments
    /// * `index` - Catalog index to fold pages into
    /// * `request_days` - Days of history the index must cover
    /// * `request_limit` - API calls allowed per minute, zero for no pacing
    /// * `cancel` - Cooperative cancellation signal
    ///
    /// # Errors
    /// Transport faults are returned as errors. Everything folded before the
    /// fault stays in the index.
    pub async fn populate(
        &self,
        index: &CatalogIndex,
        request_days: u32,
        request_limit: u32,
        cancel: &CancellationToken,
    ) -> Result<RefreshOutcome> {
        match Freshness::evaluate(index, request_days, Utc::now()) {
            Freshness::InsufficientDepth => {
                info!("TWiT network cache does not contain enough requested days");
            }
            Freshness::Fresh => {
                info!("TWiT network cache is valid and does not require updating yet");
                return Ok(RefreshOutcome::StillValid);
            }
            Freshness::Expired => {
                info!("TWiT network cache is old and requires an update");
            }
        }

        let mut url = episodes_url(&self.base_url, epoch_cutoff(request_days, Utc::now()));
        let mut limiter = RateLimiter::with_window(request_limit, self.pacing_window);
        let mut stats = RefreshStats::default();

        loop {
            if cancel.is_cancelled() {
                info!("Stopping API requests due to cancellation request");
                return Ok(RefreshOutcome::Cancelled(stats));
            }

            let Some(body) = self.client.fetch_page(&url, cancel).await? else {
                if cancel.is_cancelled() {
                    info!("Stopping API requests due to cancellation request");
                    return Ok(RefreshOutcome::Cancelled(stats));
                }
                warn!("No usable response for {}, abandoning refresh", url);
                return Ok(RefreshOutcome::Aborted { url, stats });
            };
            debug!("Got response [{}]", url);

            let mut page = match parse_episodes_page(&body) {
                Ok(page) => page,
                Err(e) => {
                    warn!("Error when processing the network update: {}", e);
                    return Ok(RefreshOutcome::Aborted { url, stats });
                }
            };

            let next = page.next.take();
            stats.pages += 1;
            stats.fold.merge(fold_page(index, page));

            match next {
                Some(next) => {
                    debug!("Next href is {}", next);
                    url = next;
                }
                None => {
                    info!(
                        "TWiT network cache update is complete: {} pages, {} shows, {} episodes",
                        stats.pages,
                        index.len(),
                        index.episode_count()
                    );
                    index.mark_complete(request_days);
                    return Ok(RefreshOutcome::Completed(stats));
                }
            }

            limiter.acquire(cancel).await;
        }
    }
}
