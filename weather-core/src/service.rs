use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    error::WeatherError,
    history::HistoryStore,
    model::{CurrentWeather, HistoryRecord},
    provider::{Units, WeatherProvider},
};

/// Orchestrates history recording and upstream lookups.
///
/// Holds the one provider and the one history store of the process; both are
/// created at startup and handed in here.
#[derive(Debug, Clone)]
pub struct WeatherService {
    provider: Arc<dyn WeatherProvider>,
    history: Arc<dyn HistoryStore>,
    record_empty_searches: bool,
}

impl WeatherService {
    pub fn new(provider: Arc<dyn WeatherProvider>, history: Arc<dyn HistoryStore>) -> Self {
        Self {
            provider,
            history,
            record_empty_searches: true,
        }
    }

    /// When `false`, a blank city name is rejected before anything is recorded.
    pub fn with_record_empty_searches(mut self, record: bool) -> Self {
        self.record_empty_searches = record;
        self
    }

    /// Record the search, then look up current conditions in metric units.
    ///
    /// The history write happens before validation and before the upstream call,
    /// so failed and blank searches are recorded too (unless disabled with
    /// [`WeatherService::with_record_empty_searches`]).
    pub async fn lookup(&self, city: &str) -> Result<CurrentWeather, WeatherError> {
        let query = city.trim();

        if self.record_empty_searches || !query.is_empty() {
            let record = self.history.append(city).await?;
            debug!(id = %record.id, city = %record.city_name, "search recorded");
        }

        if query.is_empty() {
            return Err(WeatherError::Validation("city name required".to_string()));
        }

        match self.provider.fetch_current(query, Units::Metric).await {
            Ok(current) => {
                info!(city = %current.snapshot.city, country = %current.snapshot.country, "weather lookup succeeded");
                Ok(current)
            }
            Err(err) if err.is_client_error() => {
                info!(city = %query, error = %err, "weather lookup rejected upstream");
                Err(err)
            }
            Err(err) => {
                warn!(city = %query, error = %err, "weather lookup failed");
                Err(err)
            }
        }
    }

    pub async fn list_history(&self) -> Result<Vec<HistoryRecord>, WeatherError> {
        Ok(self.history.list_all().await?)
    }

    /// Delete every history record. Returns how many were removed.
    pub async fn clear_history(&self) -> Result<u64, WeatherError> {
        Ok(self.history.delete_all().await?)
    }

    /// Release the history store; called once on shutdown.
    pub async fn shutdown(&self) {
        self.history.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::SqliteHistoryStore;
    use crate::model::WeatherSnapshot;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Copy)]
    enum Outcome {
        Found,
        NotFound,
        Broken,
    }

    #[derive(Debug)]
    struct StubProvider {
        outcome: Outcome,
        calls: Mutex<Vec<(String, Units)>>,
    }

    impl StubProvider {
        fn new(outcome: Outcome) -> Arc<Self> {
            Arc::new(Self { outcome, calls: Mutex::new(Vec::new()) })
        }

        fn calls(&self) -> Vec<(String, Units)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WeatherProvider for StubProvider {
        async fn fetch_current(&self, city: &str, units: Units) -> Result<CurrentWeather, WeatherError> {
            self.calls.lock().unwrap().push((city.to_string(), units));
            match self.outcome {
                Outcome::Found => Ok(CurrentWeather {
                    snapshot: WeatherSnapshot {
                        city: city.to_string(),
                        country: "FR".into(),
                        latitude: 48.85,
                        longitude: 2.35,
                        temperature_c: 15.0,
                        humidity_pct: 70,
                        wind_speed: 3.6,
                        icon: Some("01d".into()),
                    },
                    payload: json!({ "name": city }),
                }),
                Outcome::NotFound => Err(WeatherError::NotFound(city.to_string())),
                Outcome::Broken => Err(anyhow::anyhow!("connection reset").into()),
            }
        }
    }

    async fn service_with(outcome: Outcome) -> (WeatherService, Arc<StubProvider>, Arc<SqliteHistoryStore>) {
        let provider = StubProvider::new(outcome);
        let store = Arc::new(SqliteHistoryStore::in_memory().await.unwrap());
        let service = WeatherService::new(provider.clone(), store.clone());
        (service, provider, store)
    }

    #[tokio::test]
    async fn successful_lookup_records_and_returns_snapshot() {
        let (service, provider, store) = service_with(Outcome::Found).await;

        let current = service.lookup("Paris").await.unwrap();

        assert_eq!(current.snapshot.city, "Paris");
        assert_eq!(provider.calls(), vec![("Paris".to_string(), Units::Metric)]);
        let history = store.list_all().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].city_name, "Paris");
    }

    #[tokio::test]
    async fn empty_city_is_recorded_but_never_sent_upstream() {
        let (service, provider, store) = service_with(Outcome::Found).await;

        let err = service.lookup("").await.unwrap_err();

        assert!(matches!(err, WeatherError::Validation(_)));
        assert!(provider.calls().is_empty());
        let history = store.list_all().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].city_name, "");
    }

    #[tokio::test]
    async fn blank_city_counts_as_empty() {
        let (service, provider, _store) = service_with(Outcome::Found).await;

        let err = service.lookup("   ").await.unwrap_err();

        assert!(matches!(err, WeatherError::Validation(_)));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_city_is_not_recorded_when_disabled() {
        let (service, _provider, store) = service_with(Outcome::Found).await;
        let service = service.with_record_empty_searches(false);

        assert!(service.lookup("").await.is_err());
        assert!(store.list_all().await.unwrap().is_empty());

        service.lookup("Paris").await.unwrap();
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn not_found_is_still_recorded() {
        let (service, _provider, store) = service_with(Outcome::NotFound).await;

        let err = service.lookup("Nowhereville").await.unwrap_err();

        assert!(matches!(err, WeatherError::NotFound(_)));
        assert_eq!(store.list_all().await.unwrap()[0].city_name, "Nowhereville");
    }

    #[tokio::test]
    async fn upstream_failure_is_still_recorded() {
        let (service, _provider, store) = service_with(Outcome::Broken).await;

        let err = service.lookup("London").await.unwrap_err();

        assert!(matches!(err, WeatherError::Upstream(_)));
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn one_record_per_request_regardless_of_outcome() {
        let (ok, _, ok_store) = service_with(Outcome::Found).await;
        let (missing, _, missing_store) = service_with(Outcome::NotFound).await;

        for city in ["London", "", "Tokyo"] {
            let _ = ok.lookup(city).await;
            let _ = missing.lookup(city).await;
        }

        assert_eq!(ok_store.list_all().await.unwrap().len(), 3);
        assert_eq!(missing_store.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn clear_then_list_is_empty() {
        let (service, _provider, _store) = service_with(Outcome::Found).await;
        for city in ["A", "B", "C", "D"] {
            service.lookup(city).await.unwrap();
        }

        assert_eq!(service.list_history().await.unwrap().len(), 4);
        assert_eq!(service.clear_history().await.unwrap(), 4);
        assert!(service.list_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_failure_surfaces_before_upstream_call() {
        let (service, provider, store) = service_with(Outcome::Found).await;
        store.close().await;

        let err = service.lookup("Paris").await.unwrap_err();

        assert!(matches!(err, WeatherError::Store(_)));
        assert!(provider.calls().is_empty());
    }
}
