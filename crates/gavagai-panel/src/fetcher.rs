use std::sync::Arc;

use gavagai_api::{
    InsightsApi, InsightsApiError, InsightsErrorKind, InsightsPayload, InsightsResult,
};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

use crate::{
    is_selection_valid, CacheKey, FilterClause, InsightsStore, Notifier, PanelProps, RenderState,
    SelectionNotice, SELECTION_NOTICE_TITLE,
};

const BUSY_MESSAGE: &str = "Insights are already loading";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FetchPhase {
    Idle,
    Loading,
    Loaded,
    Failed,
}

impl FetchPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Where a loaded result came from.
pub enum ResultSource {
    Cache,
    Network,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    InvalidSelection,
    Busy,
    NetworkFailure,
    MalformedResponse,
}

impl FetchErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidSelection => "invalid_selection",
            Self::Busy => "busy",
            Self::NetworkFailure => "network_failure",
            Self::MalformedResponse => "malformed_response",
        }
    }

    /// True for failures the user should see as a notification.
    pub fn is_notifiable(self) -> bool {
        matches!(self, Self::NetworkFailure | Self::MalformedResponse)
    }
}

impl From<InsightsErrorKind> for FetchErrorKind {
    fn from(kind: InsightsErrorKind) -> Self {
        match kind {
            InsightsErrorKind::NetworkFailure => Self::NetworkFailure,
            InsightsErrorKind::MalformedResponse => Self::MalformedResponse,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
/// Rejected or failed fetch with a human readable message.
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    fn invalid_selection() -> Self {
        Self {
            kind: FetchErrorKind::InvalidSelection,
            message: SELECTION_NOTICE_TITLE.to_string(),
        }
    }

    fn busy() -> Self {
        Self {
            kind: FetchErrorKind::Busy,
            message: BUSY_MESSAGE.to_string(),
        }
    }
}

impl From<&InsightsApiError> for FetchError {
    fn from(error: &InsightsApiError) -> Self {
        Self {
            kind: error.kind().into(),
            message: error.user_message(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchSuccess {
    pub result: InsightsResult,
    pub source: ResultSource,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    Idle,
    Loading,
    Loaded {
        result: InsightsResult,
        source: ResultSource,
    },
    Failed {
        kind: FetchErrorKind,
        message: String,
    },
}

impl FetchState {
    pub fn phase(&self) -> FetchPhase {
        match self {
            Self::Idle => FetchPhase::Idle,
            Self::Loading => FetchPhase::Loading,
            Self::Loaded { .. } => FetchPhase::Loaded,
            Self::Failed { .. } => FetchPhase::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Everything the panel knows at one point in time.
pub struct PanelState {
    pub filters: Vec<FilterClause>,
    pub payload: InsightsPayload,
    pub selection_valid: bool,
    pub fetch: FetchState,
    /// Bumped whenever filters or payload are replaced; stale fetches are dropped.
    pub generation: u64,
}

impl PanelState {
    fn new(payload: InsightsPayload, filters: Vec<FilterClause>) -> Self {
        Self {
            selection_valid: is_selection_valid(&filters),
            filters,
            payload,
            fetch: FetchState::Idle,
            generation: 0,
        }
    }

    pub fn phase(&self) -> FetchPhase {
        self.fetch.phase()
    }

    pub fn render_state(&self) -> RenderState {
        let (result, error_message) = match &self.fetch {
            FetchState::Loaded { result, .. } => (Some(result.clone()), None),
            FetchState::Failed { message, .. } => (None, Some(message.clone())),
            FetchState::Idle | FetchState::Loading => (None, None),
        };
        RenderState {
            disabled: !self.selection_valid,
            loading: self.phase() == FetchPhase::Loading,
            result,
            error_message,
            notice: (!self.selection_valid).then(SelectionNotice::select_topic_and_sentiment),
        }
    }

    /// Re-validates and clears the displayed result. An outstanding fetch keeps
    /// the phase at `Loading` until it settles, so the trigger stays guarded.
    fn replace_inputs(&mut self) {
        self.selection_valid = is_selection_valid(&self.filters);
        if self.phase() != FetchPhase::Loading {
            self.fetch = FetchState::Idle;
        }
        self.generation = self.generation.wrapping_add(1);
    }
}

/// The single outstanding fetch. Dropping an unfinished ticket returns the
/// panel from `Loading` to `Idle`.
struct FetchTicket<'a> {
    state: &'a watch::Sender<PanelState>,
    generation: u64,
    payload: InsightsPayload,
    key: CacheKey,
    settled: bool,
}

impl FetchTicket<'_> {
    fn finish(mut self, next: FetchState) {
        self.settled = true;
        let generation = self.generation;
        let mut current = true;
        self.state.send_if_modified(|state| {
            if state.generation == generation {
                state.fetch = next;
                return true;
            }
            current = false;
            release_loading(state)
        });
        if !current {
            tracing::debug!(
                cache_key = %self.key,
                "dropping insights fetch outcome for replaced inputs"
            );
        }
    }
}

impl Drop for FetchTicket<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        tracing::debug!(cache_key = %self.key, "insights fetch abandoned before settling");
        self.state.send_if_modified(release_loading);
    }
}

fn release_loading(state: &mut PanelState) -> bool {
    if state.phase() != FetchPhase::Loading {
        return false;
    }
    state.fetch = FetchState::Idle;
    true
}

/// Insights panel core: selection validity, cache short-circuit and fetch lifecycle.
///
/// State is published on a watch channel; hosts call [`InsightsPanel::subscribe`]
/// to re-render on every transition. At most one fetch is in flight at a time.
pub struct InsightsPanel {
    api: Arc<dyn InsightsApi>,
    store: Arc<dyn InsightsStore>,
    state: watch::Sender<PanelState>,
}

impl InsightsPanel {
    pub fn new(
        payload: InsightsPayload,
        filters: Vec<FilterClause>,
        api: Arc<dyn InsightsApi>,
        store: Arc<dyn InsightsStore>,
    ) -> Self {
        let (state, _) = watch::channel(PanelState::new(payload, filters));
        Self { api, store, state }
    }

    pub fn from_props(
        props: &PanelProps,
        api: Arc<dyn InsightsApi>,
        store: Arc<dyn InsightsStore>,
    ) -> Self {
        Self::new(
            props.insights_payload.clone(),
            props.filters.clone(),
            api,
            store,
        )
    }

    pub fn subscribe(&self) -> watch::Receiver<PanelState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> PanelState {
        self.state.borrow().clone()
    }

    pub fn phase(&self) -> FetchPhase {
        self.state.borrow().phase()
    }

    pub fn is_selection_valid(&self) -> bool {
        self.state.borrow().selection_valid
    }

    pub fn render_state(&self) -> RenderState {
        self.state.borrow().render_state()
    }

    /// Replaces the active filters, re-validates, and clears any displayed result.
    pub fn set_filters(&self, filters: Vec<FilterClause>) {
        self.state.send_modify(|state| {
            state.filters = filters;
            state.replace_inputs();
        });
    }

    pub fn set_payload(&self, payload: InsightsPayload) {
        self.state.send_modify(|state| {
            state.payload = payload;
            state.replace_inputs();
        });
    }

    /// Runs one user-triggered fetch.
    ///
    /// Rejected without side effects when the selection is invalid or a fetch
    /// is already loading. A cache hit never touches the network; a network
    /// success is stored under the payload's cache key.
    pub async fn fetch(&self) -> Result<FetchSuccess, FetchError> {
        let ticket = self.begin_fetch()?;

        if let Some(result) = self.store.get(&ticket.key) {
            tracing::debug!(cache_key = %ticket.key, "insights cache hit");
            let success = FetchSuccess {
                result,
                source: ResultSource::Cache,
            };
            ticket.finish(loaded_state(&success));
            return Ok(success);
        }

        let response = self.api.fetch_insights(&ticket.payload).await;
        match response {
            Ok(result) => {
                self.store.put(ticket.key.clone(), result.clone());
                tracing::debug!(cache_key = %ticket.key, "insights fetched and cached");
                let success = FetchSuccess {
                    result,
                    source: ResultSource::Network,
                };
                ticket.finish(loaded_state(&success));
                Ok(success)
            }
            Err(error) => {
                tracing::warn!(
                    cache_key = %ticket.key,
                    kind = error.kind().as_str(),
                    error = %error,
                    "insights fetch failed"
                );
                let failure = FetchError::from(&error);
                ticket.finish(FetchState::Failed {
                    kind: failure.kind,
                    message: failure.message.clone(),
                });
                Err(failure)
            }
        }
    }

    /// Like [`InsightsPanel::fetch`], also sending request failures to `notifier`.
    pub async fn fetch_and_notify(
        &self,
        notifier: &dyn Notifier,
    ) -> Result<FetchSuccess, FetchError> {
        let outcome = self.fetch().await;
        if let Err(error) = &outcome {
            if error.kind.is_notifiable() {
                notifier.danger(&error.message);
            }
        }
        outcome
    }

    fn begin_fetch(&self) -> Result<FetchTicket<'_>, FetchError> {
        let mut outcome = Err(FetchError::busy());
        self.state.send_if_modified(|state| {
            if !state.selection_valid {
                outcome = Err(FetchError::invalid_selection());
                return false;
            }
            if state.phase() == FetchPhase::Loading {
                return false;
            }
            state.fetch = FetchState::Loading;
            outcome = Ok(FetchTicket {
                state: &self.state,
                generation: state.generation,
                key: CacheKey::derive(&state.payload),
                payload: state.payload.clone(),
                settled: false,
            });
            true
        });
        if let Err(rejected) = &outcome {
            tracing::debug!(reason = rejected.kind.as_str(), "insights fetch ignored");
        }
        outcome
    }
}

fn loaded_state(success: &FetchSuccess) -> FetchState {
    FetchState::Loaded {
        result: success.result.clone(),
        source: success.source,
    }
}
