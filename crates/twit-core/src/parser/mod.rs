//! Decoders for TWiT API payloads and display text
//!
//! This module contains:
//! - `page`: decode page envelopes and error envelopes from the episodes feed
//! - `text`: plain-text rendering, running times and item identifiers

pub mod page;
pub mod text;

// Re-export main parsing functions
pub use page::{parse_episodes_page, parse_error_envelope, EpisodesPage, ErrorEnvelope, PageEntry};
pub use text::{
    episode_item_id, parse_episode_item_id, parse_running_time, parse_show_folder_id,
    running_time_from_parts, show_folder_id, strip_tags,
};
