use crate::sql::base::{
    error::{ConnectorError, DbError},
    source::{BoundaryProbe, RowReader, SourceConnector},
};
use async_trait::async_trait;
use futures_util::{
    StreamExt,
    stream::{self, BoxStream},
};
use model::{
    core::value::NativeValue,
    execution::settings::{CopySettings, SplitMode},
    records::token::WorkToken,
};
use std::{
    cmp::Ordering,
    sync::{
        Arc,
        atomic::{AtomicIsize, AtomicUsize, Ordering as AtomicOrdering},
    },
};

#[derive(Debug, Default)]
struct MemoryTable {
    columns: Vec<String>,
    /// `(partition name, rows)`; an unpartitioned table has one unnamed entry.
    partitions: Vec<(Option<String>, Vec<Vec<NativeValue>>)>,
}

impl MemoryTable {
    fn all_rows(&self) -> impl Iterator<Item = &Vec<NativeValue>> {
        self.partitions.iter().flat_map(|(_, rows)| rows.iter())
    }

    fn position(&self, column: &str) -> Result<usize, DbError> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .ok_or_else(|| DbError::QueryBuildError(format!("unknown column '{column}'")))
    }
}

/// Source table held in memory.
#[derive(Clone)]
pub struct MemorySource {
    table: Arc<MemoryTable>,
    open_handles: Arc<AtomicIsize>,
    rows_served: Arc<AtomicUsize>,
}

impl MemorySource {
    pub fn new(columns: &[&str], rows: Vec<Vec<NativeValue>>) -> Self {
        Self::from_table(MemoryTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            partitions: vec![(None, rows)],
        })
    }

    pub fn partitioned(columns: &[&str], partitions: Vec<(&str, Vec<Vec<NativeValue>>)>) -> Self {
        Self::from_table(MemoryTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            partitions: partitions
                .into_iter()
                .map(|(name, rows)| (Some(name.to_string()), rows))
                .collect(),
        })
    }

    fn from_table(table: MemoryTable) -> Self {
        Self {
            table: Arc::new(table),
            open_handles: Arc::new(AtomicIsize::new(0)),
            rows_served: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Probes and readers opened but not yet closed.
    pub fn open_handles(&self) -> isize {
        self.open_handles.load(AtomicOrdering::SeqCst)
    }

    /// Rows handed out by all readers so far.
    pub fn rows_served(&self) -> usize {
        self.rows_served.load(AtomicOrdering::SeqCst)
    }

    fn split_key_position(&self, settings: &CopySettings) -> Result<Option<usize>, DbError> {
        match &settings.split {
            SplitMode::KeyRange { key } => self.table.position(key).map(Some),
            SplitMode::Partitioned => Ok(None),
        }
    }
}

#[async_trait]
impl SourceConnector for MemorySource {
    fn endpoint(&self) -> String {
        "memory://source".to_string()
    }

    async fn open_probe(
        &self,
        settings: &CopySettings,
    ) -> Result<Box<dyn BoundaryProbe>, ConnectorError> {
        let mut keys = match self.split_key_position(settings)? {
            Some(pos) => self
                .table
                .all_rows()
                .map(|row| row[pos].clone())
                .collect::<Vec<_>>(),
            None => Vec::new(),
        };
        keys.sort_by(|a, b| a.compare(b).unwrap_or(Ordering::Equal));

        self.open_handles.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(Box::new(MemoryProbe {
            keys,
            partitions: self
                .table
                .partitions
                .iter()
                .filter_map(|(name, _)| name.clone())
                .collect(),
            open_handles: self.open_handles.clone(),
        }))
    }

    async fn open_reader(
        &self,
        settings: &CopySettings,
    ) -> Result<Box<dyn RowReader>, ConnectorError> {
        let projection = settings
            .columns
            .iter()
            .map(|c| self.table.position(&c.name))
            .collect::<Result<Vec<_>, _>>()?;
        let key = self.split_key_position(settings)?;

        self.open_handles.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(Box::new(MemoryReader {
            table: self.table.clone(),
            projection,
            key,
            open_handles: self.open_handles.clone(),
            rows_served: self.rows_served.clone(),
        }))
    }
}

struct MemoryProbe {
    keys: Vec<NativeValue>,
    partitions: Vec<String>,
    open_handles: Arc<AtomicIsize>,
}

#[async_trait]
impl BoundaryProbe for MemoryProbe {
    async fn next_boundary(
        &mut self,
        after: Option<&NativeValue>,
        skip: usize,
    ) -> Result<Option<NativeValue>, DbError> {
        Ok(self
            .keys
            .iter()
            .filter(|k| after.is_none_or(|a| k.compare(a) == Some(Ordering::Greater)))
            .nth(skip)
            .cloned())
    }

    async fn partitions(&mut self) -> Result<Vec<String>, DbError> {
        Ok(self.partitions.clone())
    }

    async fn close(self: Box<Self>) -> Result<(), DbError> {
        self.open_handles.fetch_sub(1, AtomicOrdering::SeqCst);
        Ok(())
    }
}

struct MemoryReader {
    table: Arc<MemoryTable>,
    projection: Vec<usize>,
    key: Option<usize>,
    open_handles: Arc<AtomicIsize>,
    rows_served: Arc<AtomicUsize>,
}

impl MemoryReader {
    fn select(&self, token: &WorkToken) -> Result<Vec<Vec<NativeValue>>, DbError> {
        let project = |row: &Vec<NativeValue>| {
            self.projection
                .iter()
                .map(|&i| row[i].clone())
                .collect::<Vec<_>>()
        };

        match token {
            WorkToken::Partition(name) => self
                .table
                .partitions
                .iter()
                .find(|(p, _)| p.as_deref() == Some(name.as_str()))
                .map(|(_, rows)| rows.iter().map(project).collect())
                .ok_or_else(|| DbError::QueryBuildError(format!("unknown partition '{name}'"))),
            WorkToken::Range(range) if range.is_full() => {
                Ok(self.table.all_rows().map(project).collect())
            }
            WorkToken::Range(range) => {
                let key = self.key.ok_or_else(|| {
                    DbError::QueryBuildError("range token without a split key".into())
                })?;
                Ok(self
                    .table
                    .all_rows()
                    .filter(|row| range.contains(&row[key]))
                    .map(project)
                    .collect())
            }
        }
    }
}

#[async_trait]
impl RowReader for MemoryReader {
    fn rows<'a>(
        &'a mut self,
        token: &'a WorkToken,
    ) -> BoxStream<'a, Result<Vec<NativeValue>, DbError>> {
        match self.select(token) {
            Ok(rows) => {
                let served = self.rows_served.clone();
                stream::iter(rows)
                    .map(move |row| {
                        served.fetch_add(1, AtomicOrdering::SeqCst);
                        Ok::<_, DbError>(row)
                    })
                    .boxed()
            }
            Err(err) => stream::once(async move { Err::<Vec<NativeValue>, _>(err) }).boxed(),
        }
    }

    async fn close(self: Box<Self>) -> Result<(), DbError> {
        self.open_handles.fetch_sub(1, AtomicOrdering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::TryStreamExt;
    use model::{
        core::{data_type::MixedKindPolicy, identifiers::TableRef},
        execution::settings::ColumnSpec,
        records::token::KeyRange,
    };

    fn settings() -> CopySettings {
        CopySettings {
            source_table: TableRef::new(None, "t"),
            dest_table: TableRef::new(None, "t"),
            columns: vec![ColumnSpec::new("name"), ColumnSpec::new("id")],
            binary_columns: Default::default(),
            batch_size: 2,
            split: SplitMode::KeyRange { key: "id".into() },
            parallelism: 1,
            mixed_kinds: MixedKindPolicy::Reject,
        }
    }

    fn source() -> MemorySource {
        let rows = [3, 1, 2, 5, 4]
            .into_iter()
            .map(|i| vec![NativeValue::Int(i), NativeValue::text(format!("n{i}"))])
            .collect();
        MemorySource::new(&["id", "name"], rows)
    }

    #[tokio::test]
    async fn probes_in_key_order() {
        let source = source();
        let mut probe = source.open_probe(&settings()).await.unwrap();
        assert_eq!(
            probe.next_boundary(None, 1).await.unwrap(),
            Some(NativeValue::Int(2))
        );
        assert_eq!(
            probe
                .next_boundary(Some(&NativeValue::Int(4)), 0)
                .await
                .unwrap(),
            Some(NativeValue::Int(5))
        );
        assert_eq!(
            probe
                .next_boundary(Some(&NativeValue::Int(4)), 1)
                .await
                .unwrap(),
            None
        );
        assert_eq!(source.open_handles(), 1);
        probe.close().await.unwrap();
        assert_eq!(source.open_handles(), 0);
    }

    #[tokio::test]
    async fn reader_projects_and_filters() {
        let source = source();
        let mut reader = source.open_reader(&settings()).await.unwrap();
        let token = WorkToken::Range(KeyRange {
            begin: Some(NativeValue::Int(2)),
            end: Some(NativeValue::Int(4)),
        });
        let mut rows: Vec<_> = reader.rows(&token).try_collect().await.unwrap();
        rows.sort_by(|a, b| a[1].compare(&b[1]).unwrap());
        assert_eq!(
            rows,
            vec![
                vec![NativeValue::text("n3"), NativeValue::Int(3)],
                vec![NativeValue::text("n4"), NativeValue::Int(4)],
            ]
        );
        reader.close().await.unwrap();
        assert_eq!(source.rows_served(), 2);
    }
}
