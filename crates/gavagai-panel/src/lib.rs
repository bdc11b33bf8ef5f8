//! Insights panel core for Gavagai dashboards.
//!
//! Decides whether the current filter selection is specific enough to request
//! insights, short-circuits repeat requests through an injectable store, and
//! drives the `Idle → Loading → Loaded | Failed` fetch lifecycle that the
//! presentation layer renders.

pub mod cache;
pub mod fetcher;
pub mod filters;
pub mod notify;
pub mod render;

pub use cache::{CacheKey, DisabledInsightsStore, InsightsStore, MemoryInsightsStore};
pub use fetcher::{
    FetchError, FetchErrorKind, FetchPhase, FetchState, FetchSuccess, InsightsPanel, PanelState,
    ResultSource,
};
pub use filters::{is_selection_valid, FilterClause, ValidFilterColumn};
pub use notify::{BufferedNotifier, Notifier};
pub use render::{
    PanelProps, RenderState, SelectionNotice, SELECTION_NOTICE_DESCRIPTION,
    SELECTION_NOTICE_TITLE,
};
