//! Ordered fallback across several sources.

use async_trait::async_trait;
use chrono::NaiveDate;
use fundwatch_core::error::FetchError;
use fundwatch_core::traits::SeriesSource;
use fundwatch_core::types::{InstrumentId, SeriesPoint};
use tracing::warn;

/// Tries each source in order; the first success wins.
#[derive(Default)]
pub struct FallbackSource {
    sources: Vec<Box<dyn SeriesSource>>,
}

impl FallbackSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source with lower precedence than those already added.
    pub fn with_source(mut self, source: impl SeriesSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[async_trait]
impl SeriesSource for FallbackSource {
    async fn fetch_since(
        &self,
        instrument: &InstrumentId,
        since: Option<NaiveDate>,
    ) -> Result<Vec<SeriesPoint>, FetchError> {
        let mut causes = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            match source.fetch_since(instrument, since).await {
                Ok(points) => return Ok(points),
                Err(e) => {
                    warn!(code = %instrument, source = source.name(), error = %e, "Source failed");
                    causes.push(format!("{}: {e}", source.name()));
                }
            }
        }
        Err(FetchError::AllSourcesFailed(causes))
    }

    fn name(&self) -> &str {
        "fallback"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<Vec<SeriesPoint>, FetchError>, &'static str);

    #[async_trait]
    impl SeriesSource for Fixed {
        async fn fetch_since(
            &self,
            _instrument: &InstrumentId,
            _since: Option<NaiveDate>,
        ) -> Result<Vec<SeriesPoint>, FetchError> {
            self.0.clone()
        }

        fn name(&self) -> &str {
            self.1
        }
    }

    fn point() -> SeriesPoint {
        SeriesPoint::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 1.0)
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let source = FallbackSource::new()
            .with_source(Fixed(Err(FetchError::Network("down".into())), "primary"))
            .with_source(Fixed(Ok(vec![point()]), "offline"));

        let id = InstrumentId::parse("1").unwrap();
        assert_eq!(source.fetch_since(&id, None).await.unwrap(), vec![point()]);
    }

    #[tokio::test]
    async fn test_all_failed_lists_causes() {
        let source = FallbackSource::new()
            .with_source(Fixed(Err(FetchError::Network("down".into())), "primary"))
            .with_source(Fixed(Err(FetchError::NotFound("x".into())), "offline"));

        let id = InstrumentId::parse("1").unwrap();
        match source.fetch_since(&id, None).await.unwrap_err() {
            FetchError::AllSourcesFailed(causes) => {
                assert_eq!(causes.len(), 2);
                assert!(causes[0].starts_with("primary"));
                assert!(causes[1].starts_with("offline"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_chain_fails() {
        let id = InstrumentId::parse("1").unwrap();
        assert!(FallbackSource::new().fetch_since(&id, None).await.is_err());
    }
}
