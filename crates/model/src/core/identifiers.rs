use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// A possibly schema-qualified table name (`db.table` on MySQL,
/// `schema.table` on Postgres).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    schema: Option<Arc<str>>,
    name: Arc<str>,
}

impl TableRef {
    pub fn new(schema: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.map(Arc::from),
            name: Arc::from(name.into()),
        }
    }

    /// Splits on the first dot. Returns `None` for an empty name or an
    /// empty segment on either side of the dot.
    pub fn parse(qualified: &str) -> Option<Self> {
        let qualified = qualified.trim();
        match qualified.split_once('.') {
            Some((schema, name)) if !schema.is_empty() && !name.is_empty() => {
                Some(Self::new(Some(schema), name))
            }
            Some(_) => None,
            None if qualified.is_empty() => None,
            None => Some(Self::new(None, qualified)),
        }
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Identifies a batch by the extractor worker that produced it and the
/// worker-local sequence number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BatchId {
    pub worker: usize,
    pub seq: u64,
}

impl BatchId {
    pub fn new(worker: usize, seq: u64) -> Self {
        Self { worker, seq }
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.worker, self.seq)
    }
}
