//! End-to-end channel tests against a mock TWiT API.

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use twit_core::{
    ChannelContentType, ChannelItemType, ChannelMediaType, ChannelQuery, SortField, TwitChannel,
    TwitConfig,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(base_url: &str) -> TwitConfig {
    TwitConfig {
        app_id: "it-app".to_string(),
        app_key: "it-key".to_string(),
        limit_requests_per_minute: 0,
        base_url: base_url.to_string(),
        timeout_secs: 5,
        ..TwitConfig::default()
    }
}

fn show(id: u32, label: &str, short_code: &str) -> Value {
    json!({
        "id": id,
        "label": label,
        "shortCode": short_code,
        "cleanPath": format!("/shows/{}", short_code.to_lowercase()),
        "description": format!("<p>{}</p>", label),
        "created": "2005-04-01T00:00:00Z",
        "weight": 3,
        "_embedded": {
            "credits": [{
                "roles": { "id": 1, "label": "Host" },
                "people": { "label": "Leo Laporte" }
            }],
            "topics": [{ "id": 9, "label": "Technology" }]
        }
    })
}

fn episode(id: u32, number: u32, airing: &str, shows: Vec<Value>) -> Value {
    json!({
        "id": id,
        "label": format!("Episode {}", number),
        "episodeNumber": number,
        "airingDate": airing,
        "created": airing,
        "showNotes": "<ul><li>First</li><li>Second</li></ul>",
        "cleanPath": format!("/shows/x/episodes/{}", number),
        "video_hd": {
            "mediaUrl": format!("https://cdn.twit.tv/{}_hd.mp4", id),
            "format": "mp4",
            "runningTime": "1:45:00"
        },
        "video_audio": {
            "mediaUrl": format!("https://cdn.twit.tv/{}.mp3", id),
            "format": "mp3",
            "hours": "1",
            "minutes": "45"
        },
        "_embedded": { "shows": shows }
    })
}

fn page(episodes: Vec<Value>, next: Option<String>) -> Value {
    let mut links = json!({});
    if let Some(next) = next {
        links["next"] = json!({ "href": next });
    }
    json!({ "count": episodes.len(), "episodes": episodes, "_links": links })
}

async fn mount_catalog(server: &MockServer) {
    let first = page(
        vec![
            episode(
                1,
                960,
                "2024-01-07T18:00:00Z",
                vec![show(1635, "This Week in Tech", "TWiT")],
            ),
            episode(
                2,
                1000,
                "2024-01-09T20:00:00Z",
                vec![show(7, "Security Now", "SN")],
            ),
        ],
        Some(format!("{}/episodes/next", server.uri())),
    );
    let second = page(
        vec![episode(
            3,
            961,
            "2024-01-14T18:00:00Z",
            vec![show(1635, "This Week in Tech", "TWiT")],
        )],
        None,
    );

    Mock::given(method("GET"))
        .and(path("/episodes"))
        .and(query_param("filter[airingDate][operator]", ">="))
        .and(header("app-id", "it-app"))
        .and(header("app-key", "it-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(first))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/episodes/next"))
        .respond_with(ResponseTemplate::new(200).set_body_json(second))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_browse_shows_then_episodes() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let channel = TwitChannel::new(config(&server.uri())).unwrap();
    let cancel = CancellationToken::new();

    let shows = channel
        .get_channel_items(&ChannelQuery::shows(), &cancel)
        .await
        .unwrap();
    assert_eq!(shows.total_record_count, 2);

    let twit = shows
        .items
        .iter()
        .find(|item| item.id == "twit-show-1635-TWiT")
        .unwrap();
    assert_eq!(twit.item_type, ChannelItemType::Folder);
    assert_eq!(twit.people[0].name, "Leo Laporte");
    assert_eq!(twit.people[0].role, "Host");
    assert_eq!(twit.tags, vec!["Technology"]);
    assert_eq!(twit.home_page_url.as_deref(), Some("https://twit.tv/shows/twit"));

    // Served from the fresh index; the mocks allow one request each.
    let episodes = channel
        .get_channel_items(&ChannelQuery::folder(twit.id.clone()), &cancel)
        .await
        .unwrap();
    assert_eq!(episodes.total_record_count, 2);
    assert_eq!(episodes.items[0].name, "TWiT 961: Episode 961");
    assert_eq!(episodes.items[1].name, "TWiT 960: Episode 960");
    assert_eq!(episodes.items[0].overview, "* First\n * Second");
    assert_eq!(episodes.items[0].item_type, ChannelItemType::Media);
    assert_eq!(episodes.items[0].content_type, Some(ChannelContentType::Podcast));
    assert_eq!(episodes.items[0].media_type, Some(ChannelMediaType::Video));

    let sources = &episodes.items[0].media_sources;
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0].width, Some(1280));
    assert_eq!(sources[0].runtime_secs, Some(6300));
    assert_eq!(sources[1].container, "mp3");
    assert_eq!(sources[1].runtime_secs, Some(6300));
}

#[tokio::test]
async fn test_paged_and_sorted_episode_listing() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let channel = TwitChannel::new(config(&server.uri())).unwrap();
    let query = ChannelQuery {
        folder_id: Some("twit-show-1635".to_string()),
        start_index: Some(0),
        limit: Some(1),
        sort_by: Some(SortField::PremiereDate),
        sort_descending: false,
    };

    let result = channel
        .get_channel_items(&query, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.total_record_count, 2);
    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].id, "twit-episode-1");
}

#[tokio::test]
async fn test_rejected_credentials_serve_empty_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/episodes"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .expect(1)
        .mount(&server)
        .await;

    let channel = TwitChannel::new(config(&server.uri())).unwrap();
    let result = channel
        .get_channel_items(&ChannelQuery::shows(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.items.is_empty());
    assert_eq!(channel.index().request_days(), 0);
}
