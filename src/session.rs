/// Popup session: request an analysis, record it, read history back
use crate::analysis::{Analysis, AnalysisRecord};
use crate::config::AppConfig;
use crate::error::AnalysisError;
use crate::filter::FilterState;
use crate::gemini::{AnalysisProvider, GeminiProvider};
use crate::metadata::{VideoMetadata, build_query};
use crate::recorder::Recorder;

/// History entries loaded into the popup
pub const HISTORY_FETCH_COUNT: usize = 40;

pub struct Session {
    provider: Box<dyn AnalysisProvider>,
    recorder: Recorder,
}

impl Session {
    pub fn new(provider: Box<dyn AnalysisProvider>, recorder: Recorder) -> Session {
        Session { provider, recorder }
    }

    pub fn from_config(config: &AppConfig) -> Session {
        Session::new(
            Box::new(GeminiProvider::new(config.provider.clone())),
            Recorder::from_config(&config.remote),
        )
    }

    /// Analyze a topic (or the detected video).
    ///
    /// Returns as soon as the provider answers; persisting the result is a
    /// separate step (`record`).
    pub async fn analyze(
        &self,
        topic: &str,
        metadata: Option<&VideoMetadata>,
        filters: &FilterState,
    ) -> Result<Analysis, AnalysisError> {
        let query = build_query(topic, metadata, filters.min_trend, filters.target)?;
        self.provider.analyze(&query).await
    }

    /// Persist an analysis. Store failures are handled by the recorder.
    pub async fn record(&self, analysis: &Analysis) -> Option<String> {
        let id = self.recorder.save(analysis).await;
        if let Some(id) = &id {
            log::info!("utubext: analysis saved as {}", id);
        }
        id
    }

    pub async fn history(&self) -> Vec<AnalysisRecord> {
        self.recorder.fetch_recent(HISTORY_FETCH_COUNT).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::CompetitionLevel;
    use crate::filter::CompetitionTarget;
    use crate::error::StoreError;
    use crate::remote::RemoteStore;
    use crate::storage::{HistoryVault, LocalStore, MemoryLocalStore};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use futures::FutureExt;
    use futures::executor::block_on;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Provider double echoing the query into the title
    struct CannedProvider {
        trend_score: u8,
        level: CompetitionLevel,
        queries: RefCell<Vec<String>>,
    }

    #[async_trait(?Send)]
    impl AnalysisProvider for CannedProvider {
        async fn analyze(&self, query: &str) -> Result<Analysis, AnalysisError> {
            self.queries.borrow_mut().push(query.to_string());
            Ok(Analysis {
                title: query.to_string(),
                summary: "canned".to_string(),
                trend_score: self.trend_score,
                competition_level: self.level,
                top_keywords: vec![],
                viral_hooks: vec![],
                suggested_titles: vec![],
                full_script_prompt: String::new(),
                sources: vec![],
            })
        }
    }

    struct FailingProvider;

    #[async_trait(?Send)]
    impl AnalysisProvider for FailingProvider {
        async fn analyze(&self, _: &str) -> Result<Analysis, AnalysisError> {
            Err(AnalysisError::Unparsable("expected `,` at line 3".to_string()))
        }
    }

    struct PendingRemote;

    #[async_trait(?Send)]
    impl RemoteStore for PendingRemote {
        async fn insert(&self, _: &Analysis, _: DateTime<Utc>) -> Result<String, StoreError> {
            std::future::pending().await
        }

        async fn recent(&self, _: usize) -> Result<Vec<AnalysisRecord>, StoreError> {
            std::future::pending().await
        }
    }

    struct SharedLocal(Rc<MemoryLocalStore>);

    impl LocalStore for SharedLocal {
        fn load(&self) -> Result<HistoryVault, StoreError> {
            self.0.load()
        }

        fn store(&self, vault: &HistoryVault) -> Result<(), StoreError> {
            self.0.store(vault)
        }
    }

    fn session_with(provider: Box<dyn AnalysisProvider>) -> Session {
        Session::new(provider, Recorder::new(None, Box::new(MemoryLocalStore::new())))
    }

    #[test]
    fn test_end_to_end_topic_analysis() {
        let session = session_with(Box::new(CannedProvider {
            trend_score: 82,
            level: CompetitionLevel::Low,
            queries: RefCell::new(vec![]),
        }));
        let filters = FilterState::default();

        let analysis = block_on(session.analyze("budget meal prep UK", None, &filters)).unwrap();
        assert!(block_on(session.history()).is_empty());

        block_on(session.record(&analysis));
        let history = block_on(session.history());

        assert_eq!(history.len(), 1);
        assert_eq!(history[0].analysis, analysis);
        assert_eq!(filters.apply(&history).len(), 1);

        let filters = filters.with_target(CompetitionTarget::parse("Yüksek").unwrap());
        assert!(filters.apply(&history).is_empty());
    }

    #[test]
    fn test_query_carries_thresholds() {
        let provider = CannedProvider {
            trend_score: 50,
            level: CompetitionLevel::Medium,
            queries: RefCell::new(vec![]),
        };
        let session = session_with(Box::new(provider));
        let filters = FilterState::default().with_min_trend(60);

        let analysis = block_on(session.analyze("side hustles", None, &filters)).unwrap();

        assert_eq!(analysis.title, "Topic: side hustles. Filters: Trend > 60, Competition: all.");
    }

    #[test]
    fn test_unanswered_remote_does_not_delay_result() {
        let local = Rc::new(MemoryLocalStore::new());
        let session = Session::new(
            Box::new(CannedProvider {
                trend_score: 88,
                level: CompetitionLevel::Low,
                queries: RefCell::new(vec![]),
            }),
            Recorder::new(Some(Box::new(PendingRemote)), Box::new(SharedLocal(local.clone()))),
        );

        let analysis = session
            .analyze("van life", None, &FilterState::default())
            .now_or_never()
            .expect("analysis ready while the remote store is silent")
            .unwrap();
        assert_eq!(session.record(&analysis).now_or_never(), None);

        let vault = local.load().unwrap();
        assert_eq!(vault.len(), 1);
        assert_eq!(vault.records()[0].analysis, analysis);
    }

    #[test]
    fn test_provider_failure_is_not_recorded() {
        let session = session_with(Box::new(FailingProvider));

        let result = block_on(session.analyze("topic", None, &FilterState::default()));

        assert!(matches!(result, Err(AnalysisError::Unparsable(_))));
        assert!(block_on(session.history()).is_empty());
    }

    #[test]
    fn test_blank_topic_is_rejected() {
        let session = session_with(Box::new(FailingProvider));

        let result = block_on(session.analyze("  ", None, &FilterState::default()));

        assert!(matches!(result, Err(AnalysisError::EmptyTopic)));
    }
}
