/// Video page detection and metadata normalization for utubext
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AnalysisError;
use crate::filter::CompetitionTarget;

/// Longest description kept from the page
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

const TITLE_SUFFIX: &str = " - YouTube";

/// Check whether a tab URL is a YouTube watch page
///
/// Accepts any subdomain of youtube.com (www, m, music) as long as
/// the path is `/watch`.
///
/// Examples:
/// - https://www.youtube.com/watch?v=abc → true
/// - https://m.youtube.com/watch?v=abc → true
/// - https://www.youtube.com/@channel → false
/// - https://notyoutube.com/watch → false
pub fn is_watch_page(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return false;
    };

    let host_matches = parsed
        .host_str()
        .map(|host| host == "youtube.com" || host.ends_with(".youtube.com"))
        .unwrap_or(false);

    host_matches && parsed.path() == "/watch"
}

/// Raw answer of the content script
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResponse {
    #[serde(default)]
    pub success: bool,
    pub title: Option<String>,
    pub channel_name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

/// Metadata scraped from the active video page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoMetadata {
    pub title: String,
    pub channel_name: String,
    pub description: String,
    pub url: String,
}

impl VideoMetadata {
    /// Normalize a probe answer. Unsuccessful or title-less answers
    /// yield no metadata.
    pub fn from_probe(response: ProbeResponse) -> Option<VideoMetadata> {
        if !response.success {
            return None;
        }

        let title = clean_title(response.title.as_deref()?);
        if title.is_empty() {
            return None;
        }

        let channel_name = response
            .channel_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        let description = response
            .description
            .map(|text| text.trim().chars().take(MAX_DESCRIPTION_CHARS).collect())
            .unwrap_or_default();

        Some(VideoMetadata {
            title,
            channel_name,
            description,
            url: response.url.unwrap_or_default(),
        })
    }
}

/// Trim a page title and drop the trailing " - YouTube"
fn clean_title(title: &str) -> String {
    let title = title.trim_end();
    title.strip_suffix(TITLE_SUFFIX).unwrap_or(title).trim().to_string()
}

/// Build the query sent to the analysis provider
///
/// Detected page metadata takes precedence over the typed topic. The
/// threshold values travel along so the provider can aim for them.
pub fn build_query(
    topic: &str,
    metadata: Option<&VideoMetadata>,
    min_trend: u8,
    target: CompetitionTarget,
) -> Result<String, AnalysisError> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(AnalysisError::EmptyTopic);
    }

    let query = match metadata {
        Some(video) => format!(
            "Video: {}. Target filters -> Trend: %{}, Competition: {}.",
            video.title,
            min_trend,
            target.as_value()
        ),
        None => format!(
            "Topic: {}. Filters: Trend > {}, Competition: {}.",
            topic,
            min_trend,
            target.as_value()
        ),
    };

    Ok(query)
}
