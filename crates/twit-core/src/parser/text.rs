//! Text helpers for display fields and item identifiers.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html};

static RUNNING_TIME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+):)?(\d{1,2}):(\d{2})(?:\.\d+)?$")
        .expect("running time regex should compile")
});

const SHOW_ID_PREFIX: &str = "twit-show-";
const EPISODE_ID_PREFIX: &str = "twit-episode-";

/// Render an HTML fragment as plain text.
///
/// Paragraphs and list items end with a line break, list items get a
/// ` * ` bullet, entities are decoded and the result is trimmed.
///
/// # Examples
/// ```
/// use twit_core::parser::strip_tags;
///
/// assert_eq!(strip_tags("<p>Tom &amp; Jerry</p>"), "Tom & Jerry");
/// ```
pub fn strip_tags(source: &str) -> String {
    let fragment = Html::parse_fragment(source);
    let mut text = String::with_capacity(source.len());
    render_text(fragment.root_element(), &mut text);
    text.trim().to_string()
}

fn render_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let Some(child_element) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = el.name();
                if matches!(name, "script" | "style") {
                    continue;
                }
                match name {
                    "li" => out.push_str(" * "),
                    "br" => out.push('\n'),
                    _ => {}
                }
                render_text(child_element, out);
                if matches!(name, "p" | "li") {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Parse a running time such as `"1:52:04"` or `"45:10"` into seconds.
///
/// Three fields are hours, minutes and seconds; two fields are minutes and
/// seconds.
///
/// # Examples
/// ```
/// use twit_core::parser::parse_running_time;
///
/// assert_eq!(parse_running_time("1:52:04"), Some(6724));
/// assert_eq!(parse_running_time("n/a"), None);
/// ```
pub fn parse_running_time(text: &str) -> Option<u64> {
    let caps = RUNNING_TIME_PATTERN.captures(text.trim())?;

    let hours: u64 = match caps.get(1) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    let minutes: u64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: u64 = caps.get(3)?.as_str().parse().ok()?;

    if (minutes >= 60 && caps.get(1).is_some()) || seconds >= 60 {
        return None;
    }

    Some(hours * 3600 + minutes * 60 + seconds)
}

/// Combine separate hour/minute/second fields into seconds.
///
/// Missing fields count as zero; returns `None` when none parse or all are
/// zero.
pub fn running_time_from_parts(
    hours: Option<&str>,
    minutes: Option<&str>,
    seconds: Option<&str>,
) -> Option<u64> {
    let parse = |field: Option<&str>| field.and_then(|value| value.trim().parse::<u64>().ok());
    let (h, m, s) = (parse(hours), parse(minutes), parse(seconds));
    if h.is_none() && m.is_none() && s.is_none() {
        return None;
    }

    let total = h.unwrap_or(0) * 3600 + m.unwrap_or(0) * 60 + s.unwrap_or(0);
    (total > 0).then_some(total)
}

/// Folder identifier for a show: `twit-show-{id}-{short code}`.
pub fn show_folder_id(id: u32, short_code: &str) -> String {
    format!("{}{}-{}", SHOW_ID_PREFIX, id, short_code.trim().replace(' ', "-"))
}

/// Extract the show identity from a folder identifier.
///
/// Accepts `twit-show-{id}` with or without a trailing slug, and a bare
/// numeric identity.
///
/// # Examples
/// ```
/// use twit_core::parser::parse_show_folder_id;
///
/// assert_eq!(parse_show_folder_id("twit-show-1635-TWiT"), Some(1635));
/// assert_eq!(parse_show_folder_id("1635"), Some(1635));
/// assert_eq!(parse_show_folder_id("twit-episode-9"), None);
/// ```
pub fn parse_show_folder_id(folder_id: &str) -> Option<u32> {
    let folder_id = folder_id.trim();
    if let Ok(id) = folder_id.parse() {
        return Some(id);
    }

    let rest = folder_id.strip_prefix(SHOW_ID_PREFIX)?;
    let id_str = rest.split('-').next()?;
    id_str.parse().ok()
}

/// Item identifier for an episode: `twit-episode-{id}`.
pub fn episode_item_id(id: u32) -> String {
    format!("{}{}", EPISODE_ID_PREFIX, id)
}

/// Extract the episode identity from an item identifier.
pub fn parse_episode_item_id(item_id: &str) -> Option<u32> {
    item_id.trim().strip_prefix(EPISODE_ID_PREFIX)?.parse().ok()
}
