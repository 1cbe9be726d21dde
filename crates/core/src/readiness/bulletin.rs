use std::borrow::Cow;

use chrono::{DateTime, Duration, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::domain::signal::{SignalKind, SignalResult, SignalState};

pub const HEALTH_DASHBOARD_URL: &str = "https://health.aws.amazon.com";

/// Restricts which part of the incident feed is searched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecencyWindow {
    pub now: DateTime<Utc>,
    pub window: Duration,
}

impl RecencyWindow {
    pub fn hours(now: DateTime<Utc>, hours: u32) -> Self {
        Self { now, window: Duration::hours(i64::from(hours)) }
    }

    fn admits(&self, published: DateTime<Utc>) -> bool {
        published >= self.now - self.window
    }
}

/// Case-insensitive count of `target` occurrences in the bulletin text.
pub fn count_mentions(bulletin: &str, target: &str) -> usize {
    let needle = target.trim().to_lowercase();
    if needle.is_empty() {
        return 0;
    }
    bulletin.to_lowercase().matches(needle.as_str()).count()
}

/// Text of the RSS items published inside `recency`, joined for matching.
/// Items without a parsable `pubDate` are kept; a feed without items is
/// returned whole.
pub fn recent_items<'a>(feed: &'a str, recency: &RecencyWindow) -> Result<Cow<'a, str>, String> {
    let items = feed_items(feed)?;
    if items.is_empty() {
        return Ok(Cow::Borrowed(feed));
    }

    let kept = items
        .iter()
        .filter(|item| item.published.map_or(true, |published| recency.admits(published)))
        .map(|item| item.text.as_str())
        .collect::<Vec<_>>();
    Ok(Cow::Owned(kept.join("\n")))
}

pub fn service_health_signal(
    target: &str,
    feed: &str,
    recency: Option<&RecencyWindow>,
) -> SignalResult {
    let searched = match recency.map(|recency| recent_items(feed, recency)) {
        Some(Ok(text)) => text,
        Some(Err(error)) => {
            return SignalResult::unknown(
                SignalKind::ServiceHealth,
                target,
                format!("source unavailable: status feed is not valid XML: {error}"),
            );
        }
        None => Cow::Borrowed(feed),
    };
    let mentions = count_mentions(&searched, target);

    let (state, detail) = if mentions > 0 {
        (
            SignalState::Degraded,
            format!(
                "AWS status feed mentions {target}. Review {HEALTH_DASHBOARD_URL} before deploying."
            ),
        )
    } else {
        (SignalState::Ok, format!("No recent issues found for {target} in AWS status feed."))
    };

    SignalResult::new(SignalKind::ServiceHealth, target, state, detail)
        .with_metric("mentions", mentions as f64)
}

#[derive(Debug, Default)]
struct FeedItem {
    text: String,
    published: Option<DateTime<Utc>>,
}

impl FeedItem {
    fn push_text(&mut self, text: &str, in_pub_date: bool) {
        if in_pub_date {
            self.published = DateTime::parse_from_rfc2822(text.trim())
                .ok()
                .map(|date| date.with_timezone(&Utc));
            return;
        }
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(text);
    }
}

fn feed_items(feed: &str) -> Result<Vec<FeedItem>, String> {
    let mut reader = Reader::from_str(feed);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut current: Option<FeedItem> = None;
    let mut in_pub_date = false;
    loop {
        match reader.read_event().map_err(|error| error.to_string())? {
            Event::Start(start) => match start.local_name().as_ref() {
                b"item" => current = Some(FeedItem::default()),
                b"pubDate" => in_pub_date = current.is_some(),
                _ => {}
            },
            Event::End(end) => match end.local_name().as_ref() {
                b"item" => items.extend(current.take()),
                b"pubDate" => in_pub_date = false,
                _ => {}
            },
            Event::Text(text) => {
                if let Some(item) = current.as_mut() {
                    let text = text.unescape().map_err(|error| error.to_string())?;
                    item.push_text(&text, in_pub_date);
                }
            }
            Event::CData(data) => {
                if let Some(item) = current.as_mut() {
                    item.push_text(&String::from_utf8_lossy(&data), in_pub_date);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(items)
}
