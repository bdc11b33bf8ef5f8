use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// One active dashboard filter.
pub struct FilterClause {
    pub subject: String,
    #[serde(default, deserialize_with = "deserialize_comparator")]
    pub comparator: Vec<String>,
}

// Hosts send `"comparator": null` for cleared filters.
fn deserialize_comparator<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl FilterClause {
    pub fn new<I, S>(subject: impl Into<String>, comparator: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subject: subject.into(),
            comparator: comparator.into_iter().map(Into::into).collect(),
        }
    }

    /// True when the clause selects exactly one value.
    pub fn is_specific(&self) -> bool {
        self.comparator.len() == 1
    }

    fn selects(&self, column: ValidFilterColumn) -> bool {
        self.subject == column.as_str() && self.is_specific()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Filter subjects that must be narrowed to one value before fetching.
pub enum ValidFilterColumn {
    Groups,
    TopicSentiment,
}

impl ValidFilterColumn {
    pub const REQUIRED: [Self; 2] = [Self::Groups, Self::TopicSentiment];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Groups => "groups",
            Self::TopicSentiment => "topicSentiment",
        }
    }
}

/// Returns true when the filters pin exactly one group and one topic sentiment.
pub fn is_selection_valid(filters: &[FilterClause]) -> bool {
    if filters.is_empty() {
        return false;
    }
    ValidFilterColumn::REQUIRED
        .iter()
        .all(|column| filters.iter().any(|filter| filter.selects(*column)))
}
