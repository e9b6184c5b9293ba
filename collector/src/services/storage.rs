use crate::errors::CollectorError;
use crate::models::{TrendingRecord, RECORD_COLUMNS};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk shape of a record. Tags are kept as a JSON array in a single cell.
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    video_id: String,
    title: String,
    description: String,
    published_at: String,
    channel_id: String,
    channel_title: String,
    category_id: String,
    tags: String,
    duration: String,
    definition: String,
    caption: String,
    view_count: u64,
    like_count: u64,
    dislike_count: u64,
    favorite_count: u64,
    comment_count: u64,
}

impl From<&TrendingRecord> for CsvRow {
    fn from(record: &TrendingRecord) -> Self {
        CsvRow {
            video_id: record.video_id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            published_at: record.published_at.clone(),
            channel_id: record.channel_id.clone(),
            channel_title: record.channel_title.clone(),
            category_id: record.category_id.clone(),
            tags: serde_json::to_string(&record.tags).unwrap_or_else(|_| "[]".to_string()),
            duration: record.duration.clone(),
            definition: record.definition.clone(),
            caption: record.caption.clone(),
            view_count: record.view_count,
            like_count: record.like_count,
            dislike_count: record.dislike_count,
            favorite_count: record.favorite_count,
            comment_count: record.comment_count,
        }
    }
}

impl CsvRow {
    fn into_record(self) -> Result<TrendingRecord, String> {
        let tags = if self.tags.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&self.tags)
                .map_err(|e| format!("video {}: unreadable tags {:?}: {e}", self.video_id, self.tags))?
        };

        Ok(TrendingRecord {
            video_id: self.video_id,
            title: self.title,
            description: self.description,
            published_at: self.published_at,
            channel_id: self.channel_id,
            channel_title: self.channel_title,
            category_id: self.category_id,
            tags,
            duration: self.duration,
            definition: self.definition,
            caption: self.caption,
            view_count: self.view_count,
            like_count: self.like_count,
            dislike_count: self.dislike_count,
            favorite_count: self.favorite_count,
            comment_count: self.comment_count,
        })
    }
}

/// Writes one row per record. The header row is written even for an empty run.
pub fn save_records(records: &[TrendingRecord], path: &Path) -> Result<(), CollectorError> {
    let write_error = |source: csv::Error| CollectorError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(write_error)?;
    writer.write_record(RECORD_COLUMNS).map_err(write_error)?;
    for record in records {
        writer.serialize(CsvRow::from(record)).map_err(write_error)?;
    }
    writer
        .flush()
        .map_err(|e| write_error(csv::Error::from(e)))?;

    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

pub fn load_records(path: &Path) -> Result<Vec<TrendingRecord>, CollectorError> {
    let read_error = |reason: String| CollectorError::Read {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = csv::Reader::from_path(path).map_err(|e| read_error(e.to_string()))?;
    let headers = reader.headers().map_err(|e| read_error(e.to_string()))?;
    if !headers.iter().eq(RECORD_COLUMNS.iter().copied()) {
        return Err(read_error(format!(
            "unexpected columns: {}",
            headers.iter().collect::<Vec<_>>().join(",")
        )));
    }

    reader
        .deserialize::<CsvRow>()
        .map(|row| {
            row.map_err(|e| e.to_string())
                .and_then(CsvRow::into_record)
                .map_err(read_error)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample(id: &str, tags: &[&str]) -> TrendingRecord {
        TrendingRecord {
            video_id: id.to_string(),
            title: format!("Title, with \"quotes\" {id}"),
            description: "line one\nline two".to_string(),
            published_at: "2024-08-11T17:30:05Z".to_string(),
            channel_id: "UC123".to_string(),
            channel_title: "Channel".to_string(),
            category_id: "10".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            duration: "PT1H2M3S".to_string(),
            definition: "hd".to_string(),
            caption: "false".to_string(),
            view_count: 1000,
            like_count: 10,
            dislike_count: 0,
            favorite_count: 0,
            comment_count: 3,
        }
    }

    #[test]
    fn header_matches_record_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trending_videos.csv");

        save_records(&[], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.trim_end(), RECORD_COLUMNS.join(","));
    }

    #[test]
    fn written_records_read_back_identically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trending_videos.csv");
        let records = vec![
            sample("a", &["music", "a, b", "say \"hi\""]),
            sample("b", &[]),
        ];

        save_records(&records, &path).unwrap();
        let loaded = load_records(&path).unwrap();

        assert_eq!(loaded, records);
    }

    #[test]
    fn tags_are_stored_as_json_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        save_records(&[sample("a", &["x", "y"])], &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[7], r#"["x","y"]"#);
    }

    #[test]
    fn foreign_columns_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.csv");
        fs::write(&path, "Video_id,title\nabc,hello\n").unwrap();

        assert!(matches!(
            load_records(&path),
            Err(CollectorError::Read { .. })
        ));
    }

    #[test]
    fn unwritable_path_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("out.csv");

        assert!(matches!(
            save_records(&[sample("a", &[])], &path),
            Err(CollectorError::Write { .. })
        ));
    }
}
