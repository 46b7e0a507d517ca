// # SteamDB Feed Fetcher
//
// FeedFetcher implementation backed by SteamDB's PatchnotesRSS endpoint
// (`/api/PatchnotesRSS/?appid=<id>`).
//
// ## Responsibility boundary
//
// This is a single-shot adapter: one GET per call, no retry logic, no
// caching, no state access. The engine owns scheduling and degrades any
// error returned here to a per-app NoData classification.
//
// ## Version token
//
// The build id comes from the GUID fragment of the newest `<item>` (the
// text after the final `#`). The GUID carries the build number directly
// and is stable per build, unlike the entry title or link formatting.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::time::Duration;

use patchwatch_core::traits::{AppId, FeedEntry, FeedFetcher};
use patchwatch_core::{Error, Result};

/// Production feed endpoint
const DEFAULT_BASE_URL: &str = "https://steamdb.info";

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// SteamDB PatchnotesRSS fetcher
#[derive(Debug, Clone)]
pub struct SteamDbFetcher {
    base_url: String,
    client: reqwest::Client,
}

impl SteamDbFetcher {
    /// Create a fetcher against the production SteamDB endpoint
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a fetcher against a custom base URL (tests, mirrors)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::fetch(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    fn feed_url(&self, app: AppId) -> String {
        format!("{}/api/PatchnotesRSS/?appid={}", self.base_url, app)
    }
}

#[async_trait]
impl FeedFetcher for SteamDbFetcher {
    async fn latest(&self, app: AppId) -> Result<Option<FeedEntry>> {
        let url = self.feed_url(app);
        tracing::debug!(app = %app, "fetching {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::fetch(format!("Request for app {} failed: {}", app, e)))?;

        if !response.status().is_success() {
            return Err(Error::fetch(format!(
                "Feed for app {} returned HTTP {}",
                app,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::fetch(format!("Failed to read feed for app {}: {}", app, e)))?;

        parse_first_item(&body)
    }

    fn fetcher_name(&self) -> &'static str {
        "steamdb"
    }
}

/// Extract the newest `<item>` from an RSS document
///
/// Pure function over the body text so feed handling is testable without
/// a network. Returns `Ok(None)` for a well-formed feed with no items.
pub fn parse_first_item(xml: &str) -> Result<Option<FeedEntry>> {
    let mut reader = Reader::from_str(xml);

    let mut in_item = false;
    let mut field: Option<ItemField> = None;
    let mut title = String::new();
    let mut guid = String::new();
    let mut pub_date = String::new();
    let mut link = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"item" => in_item = true,
                b"title" if in_item => field = Some(ItemField::Title),
                b"guid" if in_item => field = Some(ItemField::Guid),
                b"pubDate" if in_item => field = Some(ItemField::PubDate),
                b"link" if in_item => field = Some(ItemField::Link),
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if let Some(f) = field {
                    let text = t
                        .unescape()
                        .map_err(|e| Error::fetch(format!("Malformed feed text: {}", e)))?;
                    push_field(f, &text, &mut title, &mut guid, &mut pub_date, &mut link);
                }
            }
            Ok(Event::CData(t)) => {
                if let Some(f) = field {
                    let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                    push_field(f, &text, &mut title, &mut guid, &mut pub_date, &mut link);
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                // Only the newest item matters
                b"item" => break,
                _ => field = None,
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(Error::fetch(format!("Malformed feed XML: {}", e)));
            }
        }
    }

    if !in_item {
        return Ok(None);
    }

    let guid = guid.trim();
    if guid.is_empty() {
        return Err(Error::fetch("Feed item has no guid"));
    }

    // Build id is the fragment after the last '#'; GUIDs without a
    // fragment are used whole.
    let build_id = guid.rsplit('#').next().unwrap_or(guid).to_string();

    let published_at = parse_pub_date(pub_date.trim())?;

    Ok(Some(FeedEntry {
        raw_title: title.trim().to_string(),
        build_id,
        published_at,
        link: link.trim().to_string(),
    }))
}

#[derive(Debug, Clone, Copy)]
enum ItemField {
    Title,
    Guid,
    PubDate,
    Link,
}

fn push_field(
    field: ItemField,
    text: &str,
    title: &mut String,
    guid: &mut String,
    pub_date: &mut String,
    link: &mut String,
) {
    match field {
        ItemField::Title => title.push_str(text),
        ItemField::Guid => guid.push_str(text),
        ItemField::PubDate => pub_date.push_str(text),
        ItemField::Link => link.push_str(text),
    }
}

fn parse_pub_date(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::fetch(format!("Unparsable pubDate '{}': {}", raw, e)))
}
