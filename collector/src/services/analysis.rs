use crate::models::{TrendingRecord, RECORD_COLUMNS};
use crate::utils::{parse_iso8601_duration_to_seconds, publish_hour};
use std::collections::HashMap;
use std::fmt;

/// Descriptive statistics for one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std: f64, // sample standard deviation, NaN for a single value
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

pub fn describe(values: &[f64]) -> Option<Summary> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let variance =
            sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        variance.sqrt()
    } else {
        f64::NAN
    };

    Some(Summary {
        count,
        mean,
        std,
        min: sorted[0],
        q25: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
        max: sorted[count - 1],
    })
}

/// Linear interpolation between closest ranks. `sorted` must be non-empty.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}

/// Pearson correlation. None when undefined (fewer than two points or a constant series).
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        covariance += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(covariance / (var_x.sqrt() * var_y.sqrt()))
}

/// Average engagement over a group of videos.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Engagement {
    pub videos: usize,
    pub avg_views: f64,
    pub avg_likes: f64,
    pub avg_comments: f64,
}

impl Engagement {
    fn of<'a>(records: impl IntoIterator<Item = &'a TrendingRecord>) -> Self {
        let mut engagement = Engagement::default();
        let (mut views, mut likes, mut comments) = (0.0, 0.0, 0.0);
        for record in records {
            engagement.videos += 1;
            views += record.view_count as f64;
            likes += record.like_count as f64;
            comments += record.comment_count as f64;
        }
        if engagement.videos > 0 {
            let n = engagement.videos as f64;
            engagement.avg_views = views / n;
            engagement.avg_likes = likes / n;
            engagement.avg_comments = comments / n;
        }
        engagement
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryEngagement {
    pub category: String,
    pub engagement: Engagement,
}

/// Groups by category name, highest average view count first.
/// Ids missing from `categories` are reported as the raw id.
pub fn category_engagement(
    records: &[TrendingRecord],
    categories: &HashMap<String, String>,
) -> Vec<CategoryEngagement> {
    let mut groups: HashMap<&str, Vec<&TrendingRecord>> = HashMap::new();
    for record in records {
        let name = categories
            .get(&record.category_id)
            .map_or(record.category_id.as_str(), String::as_str);
        groups.entry(name).or_default().push(record);
    }

    let mut result: Vec<CategoryEngagement> = groups
        .into_iter()
        .map(|(name, group)| CategoryEngagement {
            category: name.to_string(),
            engagement: Engagement::of(group),
        })
        .collect();
    result.sort_by(|a, b| {
        b.engagement
            .avg_views
            .total_cmp(&a.engagement.avg_views)
            .then_with(|| a.category.cmp(&b.category))
    });
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DurationRange {
    UpTo5Min,
    UpTo10Min,
    UpTo20Min,
    UpTo40Min,
    UpTo60Min,
    UpTo120Min,
    Over120Min,
}

impl DurationRange {
    pub const ALL: [DurationRange; 7] = [
        DurationRange::UpTo5Min,
        DurationRange::UpTo10Min,
        DurationRange::UpTo20Min,
        DurationRange::UpTo40Min,
        DurationRange::UpTo60Min,
        DurationRange::UpTo120Min,
        DurationRange::Over120Min,
    ];

    /// Ranges are closed on the right; zero-length videos belong to none.
    pub fn from_seconds(seconds: f64) -> Option<Self> {
        let range = match seconds {
            s if s <= 0.0 => return None,
            s if s <= 300.0 => DurationRange::UpTo5Min,
            s if s <= 600.0 => DurationRange::UpTo10Min,
            s if s <= 1200.0 => DurationRange::UpTo20Min,
            s if s <= 2400.0 => DurationRange::UpTo40Min,
            s if s <= 3600.0 => DurationRange::UpTo60Min,
            s if s <= 7200.0 => DurationRange::UpTo120Min,
            _ => DurationRange::Over120Min,
        };
        Some(range)
    }

    pub fn label(self) -> &'static str {
        match self {
            DurationRange::UpTo5Min => "0-5 min",
            DurationRange::UpTo10Min => "5-10 min",
            DurationRange::UpTo20Min => "10-20 min",
            DurationRange::UpTo40Min => "20-40 min",
            DurationRange::UpTo60Min => "40-60 min",
            DurationRange::UpTo120Min => "60-120 min",
            DurationRange::Over120Min => ">120 min",
        }
    }
}

/// Engagement per duration range, in range order. Empty ranges are omitted.
pub fn duration_engagement(records: &[TrendingRecord]) -> Vec<(DurationRange, Engagement)> {
    let mut groups: HashMap<DurationRange, Vec<&TrendingRecord>> = HashMap::new();
    for record in records {
        let range = parse_iso8601_duration_to_seconds(&record.duration)
            .and_then(DurationRange::from_seconds);
        if let Some(range) = range {
            groups.entry(range).or_default().push(record);
        }
    }

    DurationRange::ALL
        .into_iter()
        .filter_map(|range| {
            groups
                .remove(&range)
                .map(|group| (range, Engagement::of(group)))
        })
        .collect()
}

/// Videos and average views per UTC publish hour, all 24 hours.
pub fn publish_hour_distribution(records: &[TrendingRecord]) -> Vec<(u32, Engagement)> {
    let mut by_hour: Vec<Vec<&TrendingRecord>> = vec![Vec::new(); 24];
    for record in records {
        if let Some(hour) = publish_hour(&record.published_at) {
            by_hour[hour as usize].push(record);
        }
    }

    by_hour
        .into_iter()
        .zip(0_u32..)
        .map(|(group, hour)| (hour, Engagement::of(group)))
        .collect()
}

/// Empty cells per column.
pub fn missing_values(records: &[TrendingRecord]) -> Vec<(&'static str, usize)> {
    RECORD_COLUMNS
        .iter()
        .map(|&column| {
            let missing = records
                .iter()
                .filter(|r| match column {
                    "video_id" => r.video_id.is_empty(),
                    "title" => r.title.is_empty(),
                    "description" => r.description.is_empty(),
                    "published_at" => r.published_at.is_empty(),
                    "channel_id" => r.channel_id.is_empty(),
                    "channel_title" => r.channel_title.is_empty(),
                    "category_id" => r.category_id.is_empty(),
                    "tags" => r.tags.is_empty(),
                    "duration" => r.duration.is_empty(),
                    "definition" => r.definition.is_empty(),
                    "caption" => r.caption.is_empty(),
                    _ => false, // counts always carry a value
                })
                .count();
            (column, missing)
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub total_videos: usize,
    pub missing: Vec<(&'static str, usize)>,
    pub statistics: Vec<(&'static str, Option<Summary>)>,
    pub correlations: Vec<(&'static str, &'static str, Option<f64>)>,
    pub categories: Vec<CategoryEngagement>,
    pub durations: Vec<(DurationRange, Engagement)>,
    pub duration_vs_views: Option<f64>,
    pub tags_vs_views: Option<f64>,
    pub publish_hours: Vec<(u32, Engagement)>,
}

/// The numeric count columns of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountColumn {
    ViewCount,
    LikeCount,
    DislikeCount,
    FavoriteCount,
    CommentCount,
}

impl CountColumn {
    pub const ALL: [CountColumn; 5] = [
        CountColumn::ViewCount,
        CountColumn::LikeCount,
        CountColumn::DislikeCount,
        CountColumn::FavoriteCount,
        CountColumn::CommentCount,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CountColumn::ViewCount => "view_count",
            CountColumn::LikeCount => "like_count",
            CountColumn::DislikeCount => "dislike_count",
            CountColumn::FavoriteCount => "favorite_count",
            CountColumn::CommentCount => "comment_count",
        }
    }

    pub fn value(self, record: &TrendingRecord) -> u64 {
        match self {
            CountColumn::ViewCount => record.view_count,
            CountColumn::LikeCount => record.like_count,
            CountColumn::DislikeCount => record.dislike_count,
            CountColumn::FavoriteCount => record.favorite_count,
            CountColumn::CommentCount => record.comment_count,
        }
    }
}

fn column_values(records: &[TrendingRecord], column: CountColumn) -> Vec<f64> {
    records.iter().map(|r| column.value(r) as f64).collect()
}

pub fn analyze(records: &[TrendingRecord], categories: &HashMap<String, String>) -> AnalysisReport {
    let statistics = CountColumn::ALL
        .iter()
        .map(|&column| (column.name(), describe(&column_values(records, column))))
        .collect();

    let engagement_columns = [
        CountColumn::ViewCount,
        CountColumn::LikeCount,
        CountColumn::CommentCount,
    ];
    let mut correlations = Vec::new();
    for (i, &a) in engagement_columns.iter().enumerate() {
        for &b in &engagement_columns[i + 1..] {
            let value = pearson(&column_values(records, a), &column_values(records, b));
            correlations.push((a.name(), b.name(), value));
        }
    }

    let views = column_values(records, CountColumn::ViewCount);
    let tag_counts: Vec<f64> = records.iter().map(|r| r.tags.len() as f64).collect();

    let (timed_seconds, timed_views): (Vec<f64>, Vec<f64>) = records
        .iter()
        .filter_map(|r| {
            parse_iso8601_duration_to_seconds(&r.duration)
                .filter(|s| *s > 0.0)
                .map(|s| (s, r.view_count as f64))
        })
        .unzip();

    AnalysisReport {
        total_videos: records.len(),
        missing: missing_values(records),
        statistics,
        correlations,
        categories: category_engagement(records, categories),
        durations: duration_engagement(records),
        duration_vs_views: pearson(&timed_seconds, &timed_views),
        tags_vs_views: pearson(&tag_counts, &views),
        publish_hours: publish_hour_distribution(records),
    }
}

fn fmt_correlation(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"))
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Trending videos analysed: {}", self.total_videos)?;

        writeln!(f, "\nMissing values")?;
        for (column, missing) in &self.missing {
            writeln!(f, "  {column:<16} {missing}")?;
        }

        writeln!(f, "\nDescriptive statistics")?;
        writeln!(
            f,
            "  {:<16} {:>6} {:>14} {:>14} {:>12} {:>12} {:>12} {:>12} {:>14}",
            "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        )?;
        for (column, summary) in &self.statistics {
            match summary {
                Some(s) => writeln!(
                    f,
                    "  {column:<16} {:>6} {:>14.1} {:>14.1} {:>12.0} {:>12.1} {:>12.1} {:>12.1} {:>14.0}",
                    s.count, s.mean, s.std, s.min, s.q25, s.median, s.q75, s.max
                )?,
                None => writeln!(f, "  {column:<16} no data")?,
            }
        }

        writeln!(f, "\nCorrelation of engagement metrics")?;
        for (a, b, value) in &self.correlations {
            writeln!(f, "  {a} / {b}: {}", fmt_correlation(*value))?;
        }

        writeln!(f, "\nEngagement by category")?;
        writeln!(
            f,
            "  {:<28} {:>6} {:>14} {:>12} {:>12}",
            "category", "videos", "avg views", "avg likes", "avg comments"
        )?;
        for row in &self.categories {
            let e = &row.engagement;
            writeln!(
                f,
                "  {:<28} {:>6} {:>14.0} {:>12.0} {:>12.0}",
                row.category, e.videos, e.avg_views, e.avg_likes, e.avg_comments
            )?;
        }

        writeln!(f, "\nEngagement by duration")?;
        for (range, e) in &self.durations {
            writeln!(
                f,
                "  {:<12} {:>6} {:>14.0} {:>12.0} {:>12.0}",
                range.label(),
                e.videos,
                e.avg_views,
                e.avg_likes,
                e.avg_comments
            )?;
        }
        writeln!(
            f,
            "  duration / view_count: {}",
            fmt_correlation(self.duration_vs_views)
        )?;
        writeln!(
            f,
            "  tag count / view_count: {}",
            fmt_correlation(self.tags_vs_views)
        )?;

        writeln!(f, "\nPublish hour (UTC)")?;
        for (hour, e) in &self.publish_hours {
            if e.videos == 0 {
                writeln!(f, "  {hour:02}:00 {:>6} {:>14}", 0, "-")?;
            } else {
                writeln!(f, "  {hour:02}:00 {:>6} {:>14.0}", e.videos, e.avg_views)?;
            }
        }
        Ok(())
    }
}
