//! Client-side search session.
//!
//! Holds everything the user sees between page loads: the query, the last
//! snapshot, the temperature and humidity series observed so far, the unit
//! toggle and a mirror of the backend history.
//!
//! Searches are not cancelled. Each one is tagged with a sequence number when
//! it starts and a result is only applied if no newer search has started since,
//! so the screen always reflects the most recently issued search.

use tracing::debug;
use weather_core::{HistoryRecord, TemperatureUnit, WeatherSnapshot};

use crate::api::ClientError;

/// Shown for any failure other than "not found".
pub const GENERIC_SEARCH_ERROR: &str = "An error occurred while fetching weather data.";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SearchStatus {
    #[default]
    Idle,
    Loading,
    Displaying,
    NotFound,
    Error(String),
}

/// Why a search produced no snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchFailure {
    NotFound,
    Failed(String),
}

impl From<&ClientError> for SearchFailure {
    fn from(err: &ClientError) -> Self {
        match err {
            ClientError::NotFound => SearchFailure::NotFound,
            _ => SearchFailure::Failed(GENERIC_SEARCH_ERROR.to_string()),
        }
    }
}

/// Handle for one in-flight search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    seq: u64,
    query: String,
}

impl SearchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

/// Handle for an optimistic history clear awaiting confirmation.
#[derive(Debug)]
#[must_use = "a pending clear must be finished with SearchSession::finish_clear"]
pub struct PendingClear {
    previous: Vec<HistoryRecord>,
}

#[derive(Debug, Default)]
pub struct SearchSession {
    query: String,
    status: SearchStatus,
    snapshot: Option<WeatherSnapshot>,
    temperatures: Vec<f64>,
    humidities: Vec<u8>,
    unit: TemperatureUnit,
    history: Vec<HistoryRecord>,
    issued: u64,
    clear_pending: bool,
    notice: Option<String>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_query(&mut self, text: impl Into<String>) {
        self.query = text.into();
    }

    /// Enter `Loading` for the current query and hand out its ticket.
    pub fn begin_search(&mut self) -> SearchTicket {
        self.issued += 1;
        self.status = SearchStatus::Loading;
        SearchTicket {
            seq: self.issued,
            query: self.query.clone(),
        }
    }

    /// Apply a search result. Returns `false` when a newer search has started
    /// since `ticket` was issued, in which case the result is dropped.
    pub fn finish_search(
        &mut self,
        ticket: SearchTicket,
        outcome: Result<WeatherSnapshot, SearchFailure>,
    ) -> bool {
        if ticket.seq != self.issued {
            debug!(seq = ticket.seq, latest = self.issued, query = %ticket.query, "discarding stale search result");
            return false;
        }

        match outcome {
            Ok(snapshot) => {
                self.temperatures.push(snapshot.temperature_c.floor());
                self.humidities.push(snapshot.humidity_pct);
                self.snapshot = Some(snapshot);
                self.status = SearchStatus::Displaying;
            }
            Err(SearchFailure::NotFound) => self.status = SearchStatus::NotFound,
            Err(SearchFailure::Failed(message)) => self.status = SearchStatus::Error(message),
        }
        true
    }

    pub fn status(&self) -> &SearchStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == SearchStatus::Loading
    }

    /// The snapshot to show, if the last applied search succeeded.
    pub fn visible_snapshot(&self) -> Option<&WeatherSnapshot> {
        match self.status {
            SearchStatus::Displaying => self.snapshot.as_ref(),
            _ => None,
        }
    }

    pub fn temperatures(&self) -> &[f64] {
        &self.temperatures
    }

    pub fn humidities(&self) -> &[u8] {
        &self.humidities
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    pub fn toggle_unit(&mut self) {
        self.unit = self.unit.toggled();
    }

    pub fn history(&self) -> &[HistoryRecord] {
        &self.history
    }

    /// Mirror the backend history. Ignored while a clear is awaiting confirmation.
    pub fn replace_history(&mut self, records: Vec<HistoryRecord>) {
        if self.clear_pending {
            debug!("ignoring history refresh while a clear is pending");
            return;
        }
        self.history = records;
    }

    /// Empty the local list right away; the backend confirms later.
    pub fn begin_clear(&mut self) -> PendingClear {
        self.clear_pending = true;
        self.notice = None;
        PendingClear {
            previous: std::mem::take(&mut self.history),
        }
    }

    /// Settle an optimistic clear. On failure the previous list comes back and
    /// `error` becomes the visible notice.
    pub fn finish_clear(&mut self, pending: PendingClear, result: Result<(), String>) {
        self.clear_pending = false;
        match result {
            Ok(()) => {
                self.notice = None;
            }
            Err(error) => {
                self.history = pending.previous;
                self.notice = Some(format!("Failed to clear history: {error}"));
            }
        }
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }
}
