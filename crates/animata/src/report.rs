use std::fmt;

use encoder::{FormatOutcome, PosterOutcome};

/// How far one token got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    Complete,
    /// Rendered, but some outputs could not be written.
    Partial { failed: Vec<String> },
    /// Nothing usable was produced.
    Failed { reason: String },
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenStatus::Complete => f.write_str("complete"),
            TokenStatus::Partial { failed } => write!(f, "partial (failed: {})", failed.join(", ")),
            TokenStatus::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug)]
pub struct TokenReport {
    pub token_id: u64,
    pub frames_rendered: u32,
    pub formats: Vec<FormatOutcome>,
    pub poster: Option<PosterOutcome>,
    pub status: TokenStatus,
}

impl TokenReport {
    pub fn failed(token_id: u64, reason: impl Into<String>) -> Self {
        Self {
            token_id,
            frames_rendered: 0,
            formats: Vec::new(),
            poster: None,
            status: TokenStatus::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == TokenStatus::Complete
    }
}

/// Collected outcomes for a whole run.
#[derive(Debug, Default)]
pub struct BatchReport {
    tokens: Vec<TokenReport>,
}

impl BatchReport {
    pub fn push(&mut self, report: TokenReport) {
        self.tokens.push(report);
    }

    pub fn tokens(&self) -> &[TokenReport] {
        &self.tokens
    }

    fn ids_where(&self, predicate: impl Fn(&TokenStatus) -> bool) -> Vec<u64> {
        self.tokens
            .iter()
            .filter(|token| predicate(&token.status))
            .map(|token| token.token_id)
            .collect()
    }

    pub fn partial_ids(&self) -> Vec<u64> {
        self.ids_where(|status| matches!(status, TokenStatus::Partial { .. }))
    }

    pub fn failed_ids(&self) -> Vec<u64> {
        self.ids_where(|status| matches!(status, TokenStatus::Failed { .. }))
    }

    /// True when every token finished with all of its outputs.
    pub fn is_success(&self) -> bool {
        self.tokens.iter().all(TokenReport::is_complete)
    }

    pub fn log_summary(&self) {
        let complete = self.tokens().iter().filter(|t| t.is_complete()).count();
        let partial = self.partial_ids();
        let failed = self.failed_ids();
        if partial.is_empty() && failed.is_empty() {
            tracing::info!(tokens = self.tokens.len(), complete, "batch finished");
        } else {
            tracing::warn!(
                tokens = self.tokens.len(),
                complete,
                ?partial,
                ?failed,
                "batch finished with errors"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(token_id: u64) -> TokenReport {
        TokenReport {
            token_id,
            frames_rendered: 96,
            formats: Vec::new(),
            poster: Some(PosterOutcome::Captured { index: 24 }),
            status: TokenStatus::Complete,
        }
    }

    #[test]
    fn classifies_tokens() {
        let mut report = BatchReport::default();
        report.push(complete(1));
        assert!(report.is_success());

        let mut partial = complete(2);
        partial.status = TokenStatus::Partial {
            failed: vec!["mp4".into(), "webm".into()],
        };
        report.push(partial);
        report.push(TokenReport::failed(3, "shader failed to compile"));

        assert!(!report.is_success());
        assert_eq!(report.partial_ids(), vec![2]);
        assert_eq!(report.failed_ids(), vec![3]);
        assert_eq!(
            report.tokens()[1].status.to_string(),
            "partial (failed: mp4, webm)"
        );
    }
}
