//! Data types for the TWiT catalog
//!
//! Two families live here: the normalized records held by the catalog index
//! (`Show`, `Episode` and their related entities) and the item
//! representation the query layer hands back to the host (`ChannelItem`).
//! All types implement Serialize and Deserialize for JSON compatibility.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A person credited on a show or episode, together with their role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credit {
    /// Display name of the person
    pub name: String,
    /// Role label (e.g. "Host", "Co-Host")
    pub role: String,
    /// Portrait URL, if the person has a picture
    pub picture_url: Option<String>,
}

/// A taxonomy term (topic or category)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// API identifier of the term
    pub id: u32,
    /// Display label
    pub label: String,
}

/// Credits, topics and categories attached to a show or episode
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Related {
    pub credits: Vec<Credit>,
    pub topics: Vec<Term>,
    pub categories: Vec<Term>,
}

/// A top-level series owning episodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Show {
    /// Stable API identifier
    pub id: u32,
    /// Display label
    pub label: String,
    /// Short code (e.g. "TWiT", "SN")
    pub short_code: String,
    /// Path on twit.tv, relative to the site root
    pub clean_path: String,
    /// Description, may contain markup
    pub description: String,
    /// One-line tag line
    pub tag_line: Option<String>,
    /// Cover art URL
    pub cover_art_url: Option<String>,
    /// Creation timestamp
    pub created: DateTime<Utc>,
    /// Ordering weight
    pub weight: i32,
    pub related: Related,
}

/// Tier of a media variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    /// HD video (1280x720)
    VideoHd,
    /// Large SD video (864x480)
    VideoLarge,
    /// Small SD video (640x368)
    VideoSmall,
    /// Audio-only enclosure
    Audio,
    /// External YouTube link
    Youtube,
}

impl MediaKind {
    /// Declared pixel dimensions for the video tiers
    pub fn dimensions(self) -> Option<(u32, u32)> {
        match self {
            MediaKind::VideoHd => Some((1280, 720)),
            MediaKind::VideoLarge => Some((864, 480)),
            MediaKind::VideoSmall => Some((640, 368)),
            MediaKind::Audio | MediaKind::Youtube => None,
        }
    }
}

/// One downloadable or linkable rendition of an episode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaVariant {
    pub kind: MediaKind,
    /// Media URL
    pub url: String,
    /// Declared container format (e.g. "mp4", "mp3")
    pub format: Option<String>,
    /// Human readable running time (e.g. "1:52:04")
    pub running_time: Option<String>,
    pub hours: Option<String>,
    pub minutes: Option<String>,
    pub seconds: Option<String>,
}

/// A single installment of a show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// API identifier, unique within its show
    pub id: u32,
    /// Episode title
    pub label: String,
    /// Episode number within the show
    pub episode_number: u32,
    /// When the episode aired
    pub airing_date: DateTime<Utc>,
    pub created: DateTime<Utc>,
    pub changed: Option<DateTime<Utc>>,
    /// Show notes, may contain markup
    pub show_notes: String,
    /// Absolute or site-relative page URL
    pub clean_path: String,
    /// Hero image URL
    pub hero_image_url: Option<String>,
    /// Available renditions, in tier order
    pub media: Vec<MediaVariant>,
    pub related: Related,
}

/// Kind of catalog item handed to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelItemType {
    /// Navigable folder (a show)
    Folder,
    /// Playable media (an episode)
    Media,
}

/// Kind of content the channel publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelContentType {
    Podcast,
}

/// Kind of media a playable item carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelMediaType {
    Video,
    Audio,
}

/// Audience the channel is rated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParentalRating {
    GeneralAudience,
}

/// Image slots the channel can fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageType {
    Primary,
    Thumb,
    Backdrop,
}

/// Person record attached to a catalog item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonInfo {
    pub name: String,
    pub role: String,
    pub image_url: Option<String>,
}

/// Playable source derived from a media variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSource {
    pub kind: MediaKind,
    /// Media URL
    pub path: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Container format
    pub container: String,
    /// Whether the host can play the URL directly
    pub supports_direct_play: bool,
    /// Parsed running time in seconds
    pub runtime_secs: Option<u64>,
}

/// Normalized item produced by the query layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelItem {
    /// Opaque identifier (`twit-show-...` or `twit-episode-...`)
    pub id: String,
    pub item_type: ChannelItemType,
    /// Content and media markers, set on media items only
    pub content_type: Option<ChannelContentType>,
    pub media_type: Option<ChannelMediaType>,
    pub name: String,
    pub original_title: String,
    /// Plain text overview
    pub overview: String,
    pub image_url: Option<String>,
    pub home_page_url: Option<String>,
    pub date_created: DateTime<Utc>,
    pub date_modified: Option<DateTime<Utc>>,
    pub premiere_date: Option<DateTime<Utc>>,
    pub production_year: Option<i32>,
    /// Episode number, for media items
    pub index_number: Option<u32>,
    pub official_rating: Option<String>,
    pub community_rating: Option<f32>,
    pub media_sources: Vec<MediaSource>,
    pub runtime_secs: Option<u64>,
    pub people: Vec<PersonInfo>,
    pub tags: Vec<String>,
    pub genres: Vec<String>,
    pub studios: Vec<String>,
}

/// Result of a catalog query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelItemResult {
    /// Items on the requested page
    pub items: Vec<ChannelItem>,
    /// Number of items before paging was applied
    pub total_record_count: usize,
}

impl ChannelItemResult {
    /// Create a new result
    pub fn new(items: Vec<ChannelItem>, total_record_count: usize) -> Self {
        Self {
            items,
            total_record_count,
        }
    }

    /// Create an empty result
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_record_count: 0,
        }
    }
}

/// Field a catalog query may be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    Name,
    PremiereDate,
    Runtime,
    CommunityRating,
}

/// Paging and sorting request from the host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelQuery {
    /// Folder to list; `None` lists the shows
    pub folder_id: Option<String>,
    /// Index of the first item to return
    pub start_index: Option<usize>,
    /// Maximum number of items to return
    pub limit: Option<usize>,
    pub sort_by: Option<SortField>,
    #[serde(default)]
    pub sort_descending: bool,
}

impl ChannelQuery {
    /// Query listing the shows
    pub fn shows() -> Self {
        Self::default()
    }

    /// Query listing the episodes of a folder
    pub fn folder(folder_id: impl Into<String>) -> Self {
        Self {
            folder_id: Some(folder_id.into()),
            ..Self::default()
        }
    }
}
