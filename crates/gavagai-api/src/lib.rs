//! Wire types and HTTP client for the Gavagai insights endpoint.
//!
//! Exposes the `InsightsApi` seam used by the panel fetcher, the reqwest-backed
//! implementation, and the error taxonomy with user-facing message extraction.
mod error;
mod http;
mod types;

pub use error::{InsightsApiError, InsightsErrorKind, GENERIC_INSIGHTS_ERROR_MESSAGE};
pub use http::{HttpInsightsClient, HttpInsightsClientConfig};
pub use types::{
    InsightsApi, InsightsPayload, InsightsResponse, InsightsResult, INSIGHTS_ENDPOINT,
    INSIGHTS_HEALTH_ENDPOINT,
};
