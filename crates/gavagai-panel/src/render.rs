use gavagai_api::{InsightsPayload, InsightsResult};
use serde::{Deserialize, Serialize};

use crate::FilterClause;

pub const SELECTION_NOTICE_TITLE: &str = "Select a topic and a sentiment";
pub const SELECTION_NOTICE_DESCRIPTION: &str = "We can only generate insights for a topic and a sentiment at a time. To get insights, filter your data to show only one topic and one sentiment.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
/// Props handed to the panel by the hosting dashboard.
pub struct PanelProps {
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub width: f64,
    pub insights_payload: InsightsPayload,
    #[serde(default)]
    pub filters: Vec<FilterClause>,
    #[serde(default)]
    pub header_text: String,
    #[serde(default)]
    pub description_text: String,
    #[serde(default)]
    pub button_text: String,
    #[serde(default)]
    pub bold_text: bool,
    #[serde(default)]
    pub header_font_size: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
/// Info alert shown while the selection is too broad.
pub struct SelectionNotice {
    pub title: &'static str,
    pub description: &'static str,
}

impl SelectionNotice {
    pub fn select_topic_and_sentiment() -> Self {
        Self {
            title: SELECTION_NOTICE_TITLE,
            description: SELECTION_NOTICE_DESCRIPTION,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
/// State consumed by the presentation layer.
pub struct RenderState {
    pub disabled: bool,
    pub loading: bool,
    pub result: Option<InsightsResult>,
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<SelectionNotice>,
}

impl RenderState {
    /// The fetch action is offered only for a valid selection that is not loading.
    pub fn shows_fetch_action(&self) -> bool {
        !self.disabled && !self.loading
    }
}
