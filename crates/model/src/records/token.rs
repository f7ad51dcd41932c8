use crate::core::value::NativeValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open slice `(begin, end]` of the split key. `None` on either side
/// means unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRange {
    pub begin: Option<NativeValue>,
    pub end: Option<NativeValue>,
}

impl KeyRange {
    pub fn full() -> Self {
        Self {
            begin: None,
            end: None,
        }
    }

    pub fn is_full(&self) -> bool {
        self.begin.is_none() && self.end.is_none()
    }

    /// Whether `key` falls inside the range. Keys that cannot be compared
    /// with a bound are treated as outside.
    pub fn contains(&self, key: &NativeValue) -> bool {
        let after_begin = match &self.begin {
            Some(begin) => key.compare(begin).is_some_and(|o| o.is_gt()),
            None => true,
        };
        let before_end = match &self.end {
            Some(end) => key.compare(end).is_some_and(|o| o.is_le()),
            None => true,
        };
        after_begin && before_end
    }
}

impl fmt::Display for KeyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.begin {
            Some(v) => write!(f, "({v}, ")?,
            None => write!(f, "(-inf, ")?,
        }
        match &self.end {
            Some(v) => write!(f, "{v}]"),
            None => write!(f, "+inf)"),
        }
    }
}

/// One unit of extraction work, claimed by exactly one extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkToken {
    Range(KeyRange),
    Partition(String),
}

impl fmt::Display for WorkToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkToken::Range(range) => write!(f, "range {range}"),
            WorkToken::Partition(name) => write!(f, "partition {name}"),
        }
    }
}
