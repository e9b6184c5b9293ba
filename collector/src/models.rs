use crate::errors::CollectorError;
use serde::Deserialize;

/// One trending video, flattened from the listing payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrendingRecord {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub published_at: String, // ISO 8601 as delivered
    pub channel_id: String,
    pub channel_title: String,
    pub category_id: String,
    pub tags: Vec<String>,
    pub duration: String, // ISO 8601 duration, e.g. PT4M13S
    pub definition: String,
    pub caption: String,
    pub view_count: u64,
    pub like_count: u64,
    pub dislike_count: u64,
    pub favorite_count: u64,
    pub comment_count: u64,
}

/// Column names of the output artifact, in order.
pub const RECORD_COLUMNS: [&str; 16] = [
    "video_id",
    "title",
    "description",
    "published_at",
    "channel_id",
    "channel_title",
    "category_id",
    "tags",
    "duration",
    "definition",
    "caption",
    "view_count",
    "like_count",
    "dislike_count",
    "favorite_count",
    "comment_count",
];

/// Values used when the listing leaves a field out. Everything else on a
/// record is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionalDefaults {
    pub tags: &'static [&'static str],
    pub caption: &'static str,
    pub view_count: u64,
    pub like_count: u64,
    pub dislike_count: u64,
    pub favorite_count: u64,
    pub comment_count: u64,
}

pub const OPTIONAL_DEFAULTS: OptionalDefaults = OptionalDefaults {
    tags: &[],
    caption: "false",
    view_count: 0,
    like_count: 0,
    dislike_count: 0,
    favorite_count: 0,
    comment_count: 0,
};

fn required<T>(value: Option<T>, video_id: &str, field: &'static str) -> Result<T, CollectorError> {
    value.ok_or_else(|| CollectorError::MissingField {
        video_id: video_id.to_string(),
        field,
    })
}

fn count_or_default(
    value: Option<RawCount>,
    column: &'static str,
    default: u64,
    video_id: &str,
) -> Result<u64, CollectorError> {
    match value {
        None => Ok(default),
        Some(RawCount::Number(count)) => Ok(count),
        Some(RawCount::Text(text)) => text.trim().parse().map_err(|_| {
            CollectorError::Malformed(format!(
                "item {video_id} has non-numeric {column}: {text:?}"
            ))
        }),
    }
}

impl TryFrom<RawVideo> for TrendingRecord {
    type Error = CollectorError;

    fn try_from(item: RawVideo) -> Result<Self, Self::Error> {
        let video_id = match item.id {
            Some(id) if !id.is_empty() => id,
            _ => {
                return Err(CollectorError::MissingField {
                    video_id: "<unknown>".to_string(),
                    field: "id",
                })
            }
        };
        let id = video_id.as_str();

        let snippet = required(item.snippet, id, "snippet")?;
        let details = required(item.content_details, id, "contentDetails")?;
        let statistics = required(item.statistics, id, "statistics")?;

        Ok(TrendingRecord {
            title: required(snippet.title, id, "snippet.title")?,
            description: required(snippet.description, id, "snippet.description")?,
            published_at: required(snippet.published_at, id, "snippet.publishedAt")?,
            channel_id: required(snippet.channel_id, id, "snippet.channelId")?,
            channel_title: required(snippet.channel_title, id, "snippet.channelTitle")?,
            category_id: required(snippet.category_id, id, "snippet.categoryId")?,
            tags: snippet.tags.unwrap_or_else(|| {
                OPTIONAL_DEFAULTS.tags.iter().map(|t| t.to_string()).collect()
            }),
            duration: required(details.duration, id, "contentDetails.duration")?,
            definition: required(details.definition, id, "contentDetails.definition")?,
            caption: details
                .caption
                .unwrap_or_else(|| OPTIONAL_DEFAULTS.caption.to_string()),
            view_count: count_or_default(
                statistics.view_count,
                "view_count",
                OPTIONAL_DEFAULTS.view_count,
                id,
            )?,
            like_count: count_or_default(
                statistics.like_count,
                "like_count",
                OPTIONAL_DEFAULTS.like_count,
                id,
            )?,
            dislike_count: count_or_default(
                statistics.dislike_count,
                "dislike_count",
                OPTIONAL_DEFAULTS.dislike_count,
                id,
            )?,
            favorite_count: count_or_default(
                statistics.favorite_count,
                "favorite_count",
                OPTIONAL_DEFAULTS.favorite_count,
                id,
            )?,
            comment_count: count_or_default(
                statistics.comment_count,
                "comment_count",
                OPTIONAL_DEFAULTS.comment_count,
                id,
            )?,
            video_id,
        })
    }
}
