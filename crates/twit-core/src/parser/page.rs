//! Page envelope decoding for the TWiT API
//!
//! The episodes feed is flattened: each episode embeds the shows it belongs
//! to, and shows and episodes embed their credits, topics and categories.
//! This module decodes that wire shape and splits it into normalized
//! `Episode` / `Show` records ready to be folded into the catalog index.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::error::Result;
use crate::types::{Credit, Episode, MediaKind, MediaVariant, Related, Show, Term};

/// Substring the API uses when the request quota has run out.
pub const USAGE_LIMIT_MESSAGE: &str = "usage limits are exceeded";

/// One decoded page of the episodes feed.
#[derive(Debug, Clone)]
pub struct EpisodesPage {
    /// Total count reported by the API
    pub count: u32,
    /// Episodes on this page, each with the shows it was embedded under
    pub entries: Vec<PageEntry>,
    /// Cursor for the next page, absent on the last page
    pub next: Option<String>,
}

/// An episode and the shows it references.
#[derive(Debug, Clone)]
pub struct PageEntry {
    pub episode: Arc<Episode>,
    pub shows: Vec<Show>,
}

/// Body the API returns alongside HTTP 500.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(rename = "_status", default)]
    pub status: Option<u16>,
    #[serde(rename = "_errors", default)]
    pub errors: HashMap<String, String>,
}

impl ErrorEnvelope {
    /// The `message` entry, if the API sent one.
    pub fn message(&self) -> Option<&str> {
        self.errors.get("message").map(String::as_str)
    }

    /// Whether the error reports an exhausted request quota.
    pub fn is_usage_limit(&self) -> bool {
        self.message()
            .is_some_and(|message| message.contains(USAGE_LIMIT_MESSAGE))
    }
}

/// Decode an episodes page envelope.
///
/// # Errors
/// Returns `TwitError::DecodeError` if the body is not a page envelope.
pub fn parse_episodes_page(body: &str) -> Result<EpisodesPage> {
    let wire: WirePage = serde_json::from_str(body)?;

    let next = wire
        .links
        .and_then(|links| links.next)
        .and_then(|link| link.href)
        .filter(|href| !href.is_empty());

    let entries = wire
        .episodes
        .unwrap_or_default()
        .into_iter()
        .map(WireEpisode::into_entry)
        .collect();

    Ok(EpisodesPage {
        count: wire.count.unwrap_or_default(),
        entries,
        next,
    })
}

/// Decode the error envelope sent with HTTP 500.
pub fn parse_error_envelope(body: &str) -> Result<ErrorEnvelope> {
    Ok(serde_json::from_str(body)?)
}

// ============================================================================
// Wire types (private)
// ============================================================================

/// A number the API may send either bare or quoted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrString<T> {
    Number(T),
    Text(String),
}

/// Accept `960`, `"960"`, `null` and `""`; the last two decode as `None`.
fn lenient_number<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match Option::<NumberOrString<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(value)) => Ok(Some(value)),
        Some(NumberOrString::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse()
                .map(Some)
                .map_err(|e| de::Error::custom(format!("invalid number {:?}: {}", text, e)))
        }
    }
}

fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_number(deserializer)?.ok_or_else(|| de::Error::custom("missing identifier"))
}

#[derive(Debug, Deserialize)]
struct WirePage {
    #[serde(default, deserialize_with = "lenient_number")]
    count: Option<u32>,
    #[serde(default)]
    episodes: Option<Vec<WireEpisode>>,
    #[serde(rename = "_links", default)]
    links: Option<WireLinks>,
}

#[derive(Debug, Deserialize)]
struct WireLinks {
    #[serde(default)]
    next: Option<WireLink>,
}

#[derive(Debug, Deserialize)]
struct WireLink {
    #[serde(default)]
    href: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireEmbedded {
    #[serde(default)]
    credits: Option<Vec<WireCredit>>,
    #[serde(default)]
    shows: Option<Vec<WireShow>>,
    #[serde(default)]
    topics: Option<Vec<WireTerm>>,
    #[serde(default)]
    categories: Option<Vec<WireTerm>>,
}

impl WireEmbedded {
    fn related(&mut self) -> Related {
        Related {
            credits: self
                .credits
                .take()
                .unwrap_or_default()
                .into_iter()
                .filter_map(WireCredit::into_credit)
                .collect(),
            topics: terms(self.topics.take()),
            categories: terms(self.categories.take()),
        }
    }
}

fn terms(wire: Option<Vec<WireTerm>>) -> Vec<Term> {
    wire.unwrap_or_default()
        .into_iter()
        .filter_map(|term| {
            let label = term.label?;
            Some(Term {
                id: term.id.unwrap_or_default(),
                label,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct WireTerm {
    #[serde(default, deserialize_with = "lenient_number")]
    id: Option<u32>,
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireCredit {
    #[serde(default)]
    roles: Option<WireTerm>,
    #[serde(default)]
    people: Option<WirePerson>,
}

impl WireCredit {
    fn into_credit(self) -> Option<Credit> {
        let person = self.people?;
        Some(Credit {
            name: person.label?,
            role: self.roles.and_then(|role| role.label).unwrap_or_default(),
            picture_url: person.picture.and_then(WireFile::into_url),
        })
    }
}

#[derive(Debug, Deserialize)]
struct WirePerson {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    picture: Option<WireFile>,
}

#[derive(Debug, Deserialize)]
struct WireFile {
    #[serde(default)]
    url: Option<String>,
}

impl WireFile {
    fn into_url(self) -> Option<String> {
        self.url.filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireShow {
    #[serde(deserialize_with = "lenient_id")]
    id: u32,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    short_code: Option<String>,
    #[serde(default)]
    clean_path: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    tag_line: Option<String>,
    #[serde(default)]
    cover_art: Option<WireFile>,
    #[serde(default)]
    created: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_number")]
    weight: Option<i32>,
    #[serde(rename = "_embedded", default)]
    embedded: Option<WireEmbedded>,
}

impl WireShow {
    fn into_show(self) -> Show {
        let related = self.embedded.unwrap_or_default().related();
        Show {
            id: self.id,
            label: self.label.unwrap_or_default().trim().to_string(),
            short_code: self.short_code.unwrap_or_default(),
            clean_path: self.clean_path.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            tag_line: self.tag_line,
            cover_art_url: self.cover_art.and_then(WireFile::into_url),
            created: self.created.unwrap_or_default(),
            weight: self.weight.unwrap_or_default(),
            related,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMedia {
    #[serde(default)]
    media_url: Option<String>,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    running_time: Option<String>,
    #[serde(default)]
    hours: Option<String>,
    #[serde(default)]
    minutes: Option<String>,
    #[serde(default)]
    seconds: Option<String>,
}

impl WireMedia {
    fn into_variant(self, kind: MediaKind) -> Option<MediaVariant> {
        let url = self.media_url.filter(|url| !url.is_empty())?;
        Some(MediaVariant {
            kind,
            url,
            format: self.format,
            running_time: self.running_time,
            hours: self.hours,
            minutes: self.minutes,
            seconds: self.seconds,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEpisode {
    #[serde(deserialize_with = "lenient_id")]
    id: u32,
    #[serde(default)]
    label: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    episode_number: Option<u32>,
    #[serde(default)]
    airing_date: Option<DateTime<Utc>>,
    #[serde(default)]
    created: Option<DateTime<Utc>>,
    #[serde(default)]
    changed: Option<DateTime<Utc>>,
    #[serde(default)]
    show_notes: Option<String>,
    #[serde(default)]
    clean_path: Option<String>,
    #[serde(default)]
    hero_image: Option<WireFile>,
    #[serde(rename = "video_hd", default)]
    video_hd: Option<WireMedia>,
    #[serde(rename = "video_large", default)]
    video_large: Option<WireMedia>,
    #[serde(rename = "video_small", default)]
    video_small: Option<WireMedia>,
    #[serde(rename = "video_audio", default)]
    video_audio: Option<WireMedia>,
    #[serde(rename = "video_youtube", default)]
    video_youtube: Option<WireMedia>,
    #[serde(rename = "_embedded", default)]
    embedded: Option<WireEmbedded>,
}

impl WireEpisode {
    /// Split the flattened record into the episode and its owning shows.
    fn into_entry(self) -> PageEntry {
        let mut embedded = self.embedded.unwrap_or_default();
        let shows = embedded
            .shows
            .take()
            .unwrap_or_default()
            .into_iter()
            .map(WireShow::into_show)
            .collect();
        let related = embedded.related();

        let media = [
            (self.video_hd, MediaKind::VideoHd),
            (self.video_large, MediaKind::VideoLarge),
            (self.video_small, MediaKind::VideoSmall),
            (self.video_audio, MediaKind::Audio),
            (self.video_youtube, MediaKind::Youtube),
        ]
        .into_iter()
        .filter_map(|(wire, kind)| wire.and_then(|media| media.into_variant(kind)))
        .collect();

        let airing_date = self.airing_date.unwrap_or_default();
        let episode = Episode {
            id: self.id,
            label: self.label.unwrap_or_default().trim().to_string(),
            episode_number: self.episode_number.unwrap_or_default(),
            airing_date,
            created: self.created.unwrap_or(airing_date),
            changed: self.changed,
            show_notes: self.show_notes.unwrap_or_default(),
            clean_path: self.clean_path.unwrap_or_default(),
            hero_image_url: self.hero_image.and_then(WireFile::into_url),
            media,
            related,
        };

        PageEntry {
            episode: Arc::new(episode),
            shows,
        }
    }
}
