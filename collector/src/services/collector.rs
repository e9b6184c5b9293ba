use crate::errors::CollectorError;
use crate::models::TrendingRecord;
use crate::services::youtube::PageSource;
use log::info;

/// Pages through `source` until `max_results` records are gathered or the
/// listing runs out, whichever comes first. Any failure aborts the whole run.
pub async fn collect_trending<S>(
    source: &S,
    max_results: i64,
) -> Result<Vec<TrendingRecord>, CollectorError>
where
    S: PageSource + ?Sized,
{
    let Ok(target) = usize::try_from(max_results) else {
        return Ok(Vec::new());
    };
    if target == 0 {
        return Ok(Vec::new());
    }

    let mut records: Vec<TrendingRecord> = Vec::new();
    let mut page_token: Option<String> = None;
    let mut pages = 0_usize;

    loop {
        let page = source.fetch_page(page_token.as_deref()).await?;
        pages += 1;
        info!(
            "Fetched page {pages}: {} items, more available: {}",
            page.items.len(),
            page.next_page_token.is_some()
        );

        for item in page.items {
            records.push(TrendingRecord::try_from(item)?);
        }

        match page.next_page_token {
            Some(token) if records.len() < target => page_token = Some(token),
            _ => break,
        }
    }

    records.truncate(target);
    info!(
        "Collected {} trending videos in {pages} page request(s)",
        records.len()
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::raw_item;
    use crate::models::{RawVideo, VideoPage};
    use crate::services::youtube::tests::{spawn_fake_api, FakeApi, TEST_KEY};
    use crate::services::youtube::{TrendingVideosSource, YouTubeClient};
    use async_trait::async_trait;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;

    /// Serves `total` generated items in pages of `page_size`.
    struct FakeSource {
        total: usize,
        page_size: usize,
        fail_on_page: Option<usize>,
        requested_tokens: Mutex<Vec<Option<String>>>,
    }

    impl FakeSource {
        fn new(total: usize) -> Self {
            FakeSource {
                total,
                page_size: 50,
                fail_on_page: None,
                requested_tokens: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<Option<String>> {
            self.requested_tokens.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for FakeSource {
        async fn fetch_page(&self, page_token: Option<&str>) -> Result<VideoPage, CollectorError> {
            let mut tokens = self.requested_tokens.lock().unwrap();
            tokens.push(page_token.map(String::from));
            if self.fail_on_page == Some(tokens.len()) {
                return Err(CollectorError::HttpStatus {
                    status: 500,
                    body: "boom".into(),
                });
            }

            let offset: usize = page_token.map_or(0, |t| t.parse().unwrap());
            let end = (offset + self.page_size).min(self.total);
            let items = (offset..end)
                .map(|i| serde_json::from_value::<RawVideo>(raw_item(&format!("v{i}"))).unwrap())
                .collect();
            Ok(VideoPage {
                items,
                next_page_token: (end < self.total).then(|| end.to_string()),
            })
        }
    }

    #[tokio::test]
    async fn stops_once_target_is_reached() {
        let source = FakeSource::new(120);

        let records = collect_trending(&source, 80).await.unwrap();

        assert_eq!(records.len(), 80);
        assert_eq!(source.requests(), vec![None, Some("50".to_string())]);
        let ids: Vec<String> = (0..80).map(|i| format!("v{i}")).collect();
        let got: Vec<String> = records.into_iter().map(|r| r.video_id).collect();
        assert_eq!(got, ids);
    }

    #[tokio::test]
    async fn small_source_is_exhausted_in_one_request() {
        let source = FakeSource::new(30);

        let records = collect_trending(&source, 500).await.unwrap();

        assert_eq!(records.len(), 30);
        assert_eq!(source.requests().len(), 1);
    }

    #[tokio::test]
    async fn non_positive_target_issues_no_requests() {
        let source = FakeSource::new(120);

        assert!(collect_trending(&source, 0).await.unwrap().is_empty());
        assert!(collect_trending(&source, -5).await.unwrap().is_empty());
        assert!(source.requests().is_empty());
    }

    #[tokio::test]
    async fn empty_source_yields_nothing() {
        let source = FakeSource::new(0);

        assert!(collect_trending(&source, 10).await.unwrap().is_empty());
        assert_eq!(source.requests().len(), 1);
    }

    #[tokio::test]
    async fn full_first_page_skips_continuation() {
        let source = FakeSource::new(500);

        let records = collect_trending(&source, 50).await.unwrap();

        assert_eq!(records.len(), 50);
        assert_eq!(source.requests(), vec![None]);
    }

    #[tokio::test]
    async fn returns_min_of_target_and_available() {
        for (total, target) in [(0, 1), (1, 1), (49, 50), (50, 51), (101, 100), (250, 500)] {
            let source = FakeSource::new(total);
            let records = collect_trending(&source, target).await.unwrap();
            assert_eq!(records.len(), total.min(target as usize), "total={total} target={target}");
            let expected_pages = total.min(target as usize).div_ceil(50).max(1);
            assert_eq!(source.requests().len(), expected_pages, "total={total} target={target}");
        }
    }

    #[tokio::test]
    async fn page_failure_discards_partial_result() {
        let mut source = FakeSource::new(200);
        source.fail_on_page = Some(2);

        let err = collect_trending(&source, 200).await.unwrap_err();
        assert!(matches!(err, CollectorError::HttpStatus { status: 500, .. }));
        assert_eq!(source.requests().len(), 2);
    }

    #[tokio::test]
    async fn malformed_item_fails_the_run() {
        struct OneBadItem;

        #[async_trait]
        impl PageSource for OneBadItem {
            async fn fetch_page(&self, _: Option<&str>) -> Result<VideoPage, CollectorError> {
                let mut bad = raw_item("bad");
                bad["contentDetails"]
                    .as_object_mut()
                    .unwrap()
                    .remove("duration");
                Ok(VideoPage {
                    items: vec![
                        serde_json::from_value(raw_item("good")).unwrap(),
                        serde_json::from_value(bad).unwrap(),
                    ],
                    next_page_token: None,
                })
            }
        }

        let err = collect_trending(&OneBadItem, 10).await.unwrap_err();
        assert!(matches!(
            err,
            CollectorError::MissingField {
                field: "contentDetails.duration",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn collects_across_http_pages() {
        let api = FakeApi {
            total_items: 120,
            ..FakeApi::default()
        };
        let (base, server) = spawn_fake_api(api.clone()).await;
        let source = TrendingVideosSource::new(YouTubeClient::new(base, TEST_KEY, 0).unwrap(), "US");

        let records = collect_trending(&source, 80).await.unwrap();

        assert_eq!(records.len(), 80);
        assert_eq!(records[0].video_id, "vid0000");
        assert_eq!(records[79].video_id, "vid0079");
        assert_eq!(api.video_requests.load(Ordering::SeqCst), 2);

        server.abort();
    }
}
