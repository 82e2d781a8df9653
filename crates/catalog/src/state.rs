use std::{collections::BTreeSet, fmt, str::FromStr};

use shared::domain::{Difficulty, LengthCategory};
use thiserror::Error;

/// Category filters a learner can toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Topic,
    Difficulty,
    Length,
}

impl FilterField {
    pub const ALL: [FilterField; 3] = [
        FilterField::Topic,
        FilterField::Difficulty,
        FilterField::Length,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterField::Topic => "topic",
            FilterField::Difficulty => "difficulty",
            FilterField::Length => "length",
        }
    }

    /// Control options that do not depend on the loaded catalog. Topics do,
    /// see [`crate::topic_options`].
    pub fn fixed_options(self) -> Option<Vec<&'static str>> {
        match self {
            FilterField::Topic => None,
            FilterField::Difficulty => Some(Difficulty::ALL.iter().map(|d| d.as_str()).collect()),
            FilterField::Length => Some(LengthCategory::ALL.iter().map(|l| l.as_str()).collect()),
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown filter field '{0}' (expected topic, difficulty or length)")]
pub struct UnknownFilterField(pub String);

impl FromStr for FilterField {
    type Err = UnknownFilterField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "topic" => Ok(FilterField::Topic),
            "difficulty" => Ok(FilterField::Difficulty),
            "length" | "lengthcategory" => Ok(FilterField::Length),
            other => Err(UnknownFilterField(other.to_string())),
        }
    }
}

/// User actions that change the filter state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterAction {
    SetSearchTerm(String),
    Toggle { field: FilterField, value: String },
    Clear,
}

/// Active search text and category selections. Empty sets mean no
/// constraint on that category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search_term: String,
    pub topic: BTreeSet<String>,
    pub difficulty: BTreeSet<String>,
    pub length: BTreeSet<String>,
}

impl FilterState {
    pub fn selections(&self, field: FilterField) -> &BTreeSet<String> {
        match field {
            FilterField::Topic => &self.topic,
            FilterField::Difficulty => &self.difficulty,
            FilterField::Length => &self.length,
        }
    }

    fn selections_mut(&mut self, field: FilterField) -> &mut BTreeSet<String> {
        match field {
            FilterField::Topic => &mut self.topic,
            FilterField::Difficulty => &mut self.difficulty,
            FilterField::Length => &mut self.length,
        }
    }

    /// Inserts `value` when absent, removes it when present.
    pub fn toggle(&mut self, field: FilterField, value: impl Into<String>) {
        let value = value.into();
        let set = self.selections_mut(field);
        if !set.remove(&value) {
            set.insert(value);
        }
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True when no search term and no category selection is active.
    pub fn is_empty(&self) -> bool {
        self.search_term.is_empty()
            && FilterField::ALL
                .iter()
                .all(|field| self.selections(*field).is_empty())
    }

    pub fn apply(mut self, action: FilterAction) -> Self {
        match action {
            FilterAction::SetSearchTerm(term) => self.set_search_term(term),
            FilterAction::Toggle { field, value } => self.toggle(field, value),
            FilterAction::Clear => self.clear(),
        }
        self
    }
}
