//! Builders and fakes shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use tokio::time::Instant;

use crate::client::{Transport, TransportResponse};
use crate::error::{Result, TwitError};
use crate::types::{Episode, MediaKind, MediaVariant, Related, Show};

/// Assert that `actual` is `expected`, allowing for timer tick rounding.
pub(crate) fn assert_close(actual: Duration, expected: Duration) {
    assert!(
        actual >= expected && actual < expected + Duration::from_millis(50),
        "expected ~{:?}, got {:?}",
        expected,
        actual
    );
}

pub(crate) fn assert_elapsed(start: Instant, expected: Duration) {
    assert_close(start.elapsed(), expected);
}

/// One scripted transport outcome.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Status(u16, String),
    Fault(String),
}

impl Reply {
    pub(crate) fn status(status: u16, body: impl Into<String>) -> Self {
        Reply::Status(status, body.into())
    }

    pub(crate) fn fault(message: &str) -> Self {
        Reply::Fault(message.to_string())
    }

    pub(crate) fn page(page: Value) -> Self {
        Reply::Status(200, page.to_string())
    }
}

#[derive(Debug)]
struct Call {
    url: String,
    at: Instant,
    headers: Vec<(String, String)>,
}

/// Transport replaying a fixed sequence of replies, regardless of URL.
#[derive(Debug)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub(crate) fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|call| call.at).collect()
    }

    pub(crate) fn urls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|call| call.url.clone())
            .collect()
    }

    pub(crate) fn last_headers(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .unwrap()
            .last()
            .map(|call| call.headers.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<TransportResponse> {
        self.calls.lock().unwrap().push(Call {
            url: url.to_string(),
            at: Instant::now(),
            headers: headers
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        });

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted reply left for {}", url));

        match reply {
            Reply::Status(status, body) => Ok(TransportResponse::new(status, body)),
            Reply::Fault(message) => Err(TwitError::Transport(message)),
        }
    }
}

pub(crate) fn show(id: u32, label: &str, short_code: &str) -> Show {
    Show {
        id,
        label: label.to_string(),
        short_code: short_code.to_string(),
        clean_path: format!("/shows/{}", label.to_lowercase().replace(' ', "-")),
        description: format!("<p>{} description</p>", label),
        tag_line: None,
        cover_art_url: Some(format!("https://elroy.twit.tv/cover/{}.jpg", id)),
        created: Utc.with_ymd_and_hms(2005, 4, 1, 0, 0, 0).unwrap(),
        weight: 0,
        related: Related::default(),
    }
}

pub(crate) fn episode(id: u32, number: u32, airing_date: DateTime<Utc>) -> Episode {
    Episode {
        id,
        label: format!("Episode {}", number),
        episode_number: number,
        airing_date,
        created: airing_date,
        changed: None,
        show_notes: String::new(),
        clean_path: format!("/episodes/{}", id),
        hero_image_url: None,
        media: vec![MediaVariant {
            kind: MediaKind::VideoHd,
            url: format!("https://cdn.twit.tv/{}_hd.mp4", id),
            format: Some("mp4".to_string()),
            running_time: Some("1:00:00".to_string()),
            hours: None,
            minutes: None,
            seconds: None,
        }],
        related: Related::default(),
    }
}

/// Wire JSON for one show as it appears embedded in an episode.
pub(crate) fn wire_show(id: u32, label: &str, short_code: &str) -> Value {
    json!({
        "id": id,
        "label": label,
        "shortCode": short_code,
        "cleanPath": format!("/shows/{}", short_code.to_lowercase()),
        "description": format!("<p>{}</p>", label),
        "coverArt": { "url": format!("https://elroy.twit.tv/cover/{}.jpg", id) },
        "created": "2005-04-01T00:00:00Z",
        "weight": 1
    })
}

/// Wire JSON for one episode embedding the given shows.
pub(crate) fn wire_episode(id: u32, number: u32, airing: &str, shows: Vec<Value>) -> Value {
    json!({
        "id": id,
        "label": format!("Episode {}", number),
        "episodeNumber": number,
        "airingDate": airing,
        "created": airing,
        "showNotes": "<p>Notes</p>",
        "cleanPath": format!("/episodes/{}", id),
        "video_hd": {
            "mediaUrl": format!("https://cdn.twit.tv/{}_hd.mp4", id),
            "format": "mp4",
            "runningTime": "1:02:03"
        },
        "_embedded": { "shows": shows }
    })
}

/// Wire JSON for a page envelope.
pub(crate) fn wire_page(episodes: Vec<Value>, next: Option<&str>) -> Value {
    let mut links = json!({ "self": { "href": "https://twit.tv/api/v1.0/episodes" } });
    if let Some(next) = next {
        links["next"] = json!({ "href": next });
    }
    json!({
        "count": episodes.len(),
        "episodes": episodes,
        "_links": links
    })
}
