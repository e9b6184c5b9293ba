use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("authorization failed: {0}")]
    Authorization(String),
    #[error("request failed")]
    Transport(#[source] reqwest::Error),
    #[error("unexpected status code {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("malformed response: item {video_id} is missing required field `{field}`")]
    MissingField {
        video_id: String,
        field: &'static str,
    },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("failed to write {}", path.display())]
    Write { path: PathBuf, source: csv::Error },
    #[error("failed to read {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },
}

impl CollectorError {
    /// Request URLs carry the API key, so they are dropped from transport errors.
    pub fn transport(err: reqwest::Error) -> Self {
        CollectorError::Transport(err.without_url())
    }

    /// The message followed by every underlying cause.
    pub fn report(&self) -> String {
        let mut text = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            text.push_str(": ");
            text.push_str(&cause.to_string());
            source = cause.source();
        }
        text
    }

    /// Transport failures and server-side statuses are worth another attempt,
    /// everything else will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            CollectorError::Transport(_) => true,
            CollectorError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_class_errors_are_retryable() {
        let server_error = CollectorError::HttpStatus {
            status: 503,
            body: String::new(),
        };
        let client_error = CollectorError::HttpStatus {
            status: 404,
            body: String::new(),
        };

        assert!(server_error.is_retryable());
        assert!(!client_error.is_retryable());
        assert!(!CollectorError::Authorization("bad key".into()).is_retryable());
        assert!(!CollectorError::Malformed("not json".into()).is_retryable());
    }

    #[test]
    fn report_walks_the_cause_chain() {
        let err = CollectorError::Write {
            path: PathBuf::from("out.csv"),
            source: csv::Error::from(std::io::Error::other("disk full")),
        };
        let report = err.report();
        assert!(report.starts_with("failed to write out.csv: disk full"), "{report}");
        assert_eq!(err.to_string(), "failed to write out.csv");
    }

    #[tokio::test]
    async fn transport_errors_do_not_carry_the_request_url() {
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:1/videos?key=SECRET-KEY-123")
            .send()
            .await
            .map_err(CollectorError::transport)
            .unwrap_err();

        assert_eq!(err.to_string(), "request failed");
        let report = err.report();
        assert!(!report.contains("SECRET-KEY-123"), "{report}");
    }

    #[test]
    fn missing_field_message_names_item_and_field() {
        let err = CollectorError::MissingField {
            video_id: "abc123".into(),
            field: "snippet.title",
        };
        assert_eq!(
            err.to_string(),
            "malformed response: item abc123 is missing required field `snippet.title`"
        );
    }
}
