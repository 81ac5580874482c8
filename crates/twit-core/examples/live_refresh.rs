use std::path::Path;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use twit_core::{load_config, ChannelQuery, TwitChannel, TwitConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("twit_core=info")),
        )
        .init();

    // Credentials come from twit.toml or TWIT_APP_ID / TWIT_APP_KEY
    let config_path = Path::new("twit.toml");
    let config = if config_path.exists() {
        load_config(config_path)?
    } else {
        TwitConfig {
            app_id: std::env::var("TWIT_APP_ID").unwrap_or_default(),
            app_key: std::env::var("TWIT_APP_KEY").unwrap_or_default(),
            limit_collection_in_days: 7,
            ..TwitConfig::default()
        }
    };

    let channel = TwitChannel::new(config)?;
    let cancel = CancellationToken::new();

    // Give up after five minutes, serving whatever was harvested
    let timeout = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(300)).await;
        timeout.cancel();
    });

    println!("📡 Refreshing {}...\n", channel.name());

    let shows = channel.list_shows(&ChannelQuery::shows(), &cancel).await;
    println!("Found {} shows:", shows.total_record_count);
    for (i, show) in shows.items.iter().enumerate() {
        println!("  {}. {} - ID: {}", i + 1, show.name, show.id);
    }

    if let Some(show) = shows.items.first() {
        println!("\n🎬 Episodes of '{}':\n", show.name);

        let episodes = channel
            .list_folder(&show.id, &ChannelQuery::default(), &cancel)
            .await?;
        for episode in &episodes.items {
            let runtime = episode
                .runtime_secs
                .map(|secs| format!("{}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60))
                .unwrap_or_else(|| "—".to_string());
            println!("  {} [{}]", episode.name, runtime);
        }

        println!("\n{} episodes in total.", episodes.total_record_count);
    }

    Ok(())
}
