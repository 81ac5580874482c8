//! Read-only projections over the catalog index
//!
//! Turns indexed shows and episodes into `ChannelItem`s for the host: one
//! folder per show, one media item per episode. Nothing here touches the
//! network; every call works on a snapshot of the index.

use std::cmp::Ordering;

use tracing::debug;

use crate::cache::{CatalogIndex, ShowCache};
use crate::error::{Result, TwitError};
use crate::parser::{
    episode_item_id, parse_running_time, parse_show_folder_id, running_time_from_parts,
    show_folder_id, strip_tags,
};
use crate::types::{
    ChannelContentType, ChannelItem, ChannelItemResult, ChannelItemType, ChannelMediaType,
    ChannelQuery, Episode, MediaKind, MediaSource, MediaVariant, PersonInfo, Related, Show,
    SortField, Term,
};

/// Largest page the host may request
pub const MAX_PAGE_SIZE: usize = 100;

/// Site root used to absolutize `cleanPath` values
const SITE_URL: &str = "https://twit.tv";

/// Studio credited on every item
const STUDIO: &str = "TWiT Productions";

/// List every indexed show as a folder item.
///
/// Without an explicit sort, shows are ordered by name.
pub fn list_shows(index: &CatalogIndex, query: &ChannelQuery) -> ChannelItemResult {
    let items: Vec<ChannelItem> = index.shows().iter().map(|cache| show_item(cache)).collect();
    debug!("Built {} show items", items.len());

    apply_query(items, query, SortField::Name, false)
}

/// List the episodes of the show encoded in `folder_id`.
///
/// Without an explicit sort, episodes are ordered newest first. An unknown
/// show yields an empty result.
///
/// # Errors
/// Returns `TwitError::InvalidFolderId` if `folder_id` does not encode a
/// show identity.
pub fn list_show_episodes(
    index: &CatalogIndex,
    folder_id: &str,
    query: &ChannelQuery,
) -> Result<ChannelItemResult> {
    let show_id = parse_show_folder_id(folder_id)
        .ok_or_else(|| TwitError::InvalidFolderId(folder_id.to_string()))?;

    let Some(cache) = index.get_show(show_id) else {
        debug!("Folder {} is not in the network cache", folder_id);
        return Ok(ChannelItemResult::empty());
    };

    let show = cache.show();
    let items: Vec<ChannelItem> = cache
        .episodes()
        .iter()
        .map(|episode| episode_item(show, episode))
        .collect();
    debug!("Built {} items for {}", items.len(), show.short_code);

    Ok(apply_query(items, query, SortField::PremiereDate, true))
}

/// Folder item for a show, dated by its latest episode.
pub fn show_item(cache: &ShowCache) -> ChannelItem {
    let show = cache.show();
    let latest = cache.latest_episode();
    let label = show.label.trim().to_string();

    ChannelItem {
        id: show_folder_id(show.id, &show.short_code),
        item_type: ChannelItemType::Folder,
        content_type: None,
        media_type: None,
        name: label.clone(),
        original_title: label,
        overview: strip_tags(&show.description),
        image_url: show.cover_art_url.clone(),
        home_page_url: home_page_url(&show.clean_path),
        date_created: show.created,
        date_modified: latest.map(|episode| episode.airing_date),
        premiere_date: Some(show.created),
        production_year: Some(chrono::Datelike::year(&show.created)),
        index_number: None,
        official_rating: Some(show.weight.to_string()),
        community_rating: Some(show.weight as f32),
        media_sources: Vec::new(),
        runtime_secs: None,
        people: people(&show.related),
        tags: labels(&show.related.topics),
        genres: labels(&show.related.categories),
        studios: vec![STUDIO.to_string()],
    }
}

/// Media item for an episode owned by `show`.
pub fn episode_item(show: &Show, episode: &Episode) -> ChannelItem {
    let label = episode.label.trim().to_string();
    let media_sources = media_sources(episode);
    let runtime_secs = media_sources.iter().find_map(|source| source.runtime_secs);

    ChannelItem {
        id: episode_item_id(episode.id),
        item_type: ChannelItemType::Media,
        content_type: Some(ChannelContentType::Podcast),
        media_type: Some(ChannelMediaType::Video),
        name: format!("{} {}: {}", show.short_code, episode.episode_number, label),
        original_title: label,
        overview: strip_tags(&episode.show_notes),
        image_url: episode.hero_image_url.clone(),
        home_page_url: home_page_url(&episode.clean_path),
        date_created: episode.created,
        date_modified: episode.changed,
        premiere_date: Some(episode.airing_date),
        production_year: Some(chrono::Datelike::year(&episode.airing_date)),
        index_number: Some(episode.episode_number),
        official_rating: None,
        community_rating: None,
        media_sources,
        runtime_secs,
        people: people(&episode.related),
        tags: labels(&episode.related.topics),
        genres: labels(&episode.related.categories),
        studios: vec![STUDIO.to_string()],
    }
}

/// Playable sources for every media variant of an episode, in tier order.
pub fn media_sources(episode: &Episode) -> Vec<MediaSource> {
    episode.media.iter().map(media_source).collect()
}

fn media_source(variant: &MediaVariant) -> MediaSource {
    let (width, height) = match variant.kind.dimensions() {
        Some((width, height)) => (Some(width), Some(height)),
        None => (None, None),
    };

    let default_container = match variant.kind {
        MediaKind::VideoHd | MediaKind::VideoLarge | MediaKind::VideoSmall => "mp4",
        MediaKind::Audio => "mp3",
        MediaKind::Youtube => "youtube",
    };
    let container = variant
        .format
        .as_deref()
        .map(str::trim)
        .filter(|format| !format.is_empty())
        .unwrap_or(default_container)
        .to_lowercase();

    let runtime_secs = variant
        .running_time
        .as_deref()
        .and_then(parse_running_time)
        .or_else(|| {
            running_time_from_parts(
                variant.hours.as_deref(),
                variant.minutes.as_deref(),
                variant.seconds.as_deref(),
            )
        });

    MediaSource {
        kind: variant.kind,
        path: variant.url.clone(),
        width,
        height,
        container,
        supports_direct_play: variant.kind != MediaKind::Youtube,
        runtime_secs,
    }
}

fn people(related: &Related) -> Vec<PersonInfo> {
    related
        .credits
        .iter()
        .map(|credit| PersonInfo {
            name: credit.name.clone(),
            role: credit.role.clone(),
            image_url: credit.picture_url.clone(),
        })
        .collect()
}

/// Distinct term labels, in first-seen order.
fn labels(terms: &[Term]) -> Vec<String> {
    let mut labels: Vec<String> = Vec::with_capacity(terms.len());
    for term in terms {
        if !labels.contains(&term.label) {
            labels.push(term.label.clone());
        }
    }
    labels
}

fn home_page_url(clean_path: &str) -> Option<String> {
    let path = clean_path.trim();
    if path.is_empty() {
        None
    } else if path.starts_with("http://") || path.starts_with("https://") {
        Some(path.to_string())
    } else {
        Some(format!("{}{}", SITE_URL, path))
    }
}

/// Sort and page items; `total_record_count` is taken before paging.
fn apply_query(
    mut items: Vec<ChannelItem>,
    query: &ChannelQuery,
    default_sort: SortField,
    default_descending: bool,
) -> ChannelItemResult {
    let (field, descending) = match query.sort_by {
        Some(field) => (field, query.sort_descending),
        None => (default_sort, default_descending),
    };

    items.sort_by(|a, b| {
        let ordering = compare(a, b, field).then_with(|| a.id.cmp(&b.id));
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });

    let total = items.len();
    let start = query.start_index.unwrap_or(0).min(total);
    let limit = query.limit.unwrap_or(MAX_PAGE_SIZE).min(MAX_PAGE_SIZE);
    let page: Vec<ChannelItem> = items.into_iter().skip(start).take(limit).collect();

    ChannelItemResult::new(page, total)
}

fn compare(a: &ChannelItem, b: &ChannelItem, field: SortField) -> Ordering {
    match field {
        SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortField::PremiereDate => a.premiere_date.cmp(&b.premiere_date),
        SortField::Runtime => a.runtime_secs.cmp(&b.runtime_secs),
        SortField::CommunityRating => match (a.community_rating, b.community_rating) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}
