use model::records::batch::ColumnArray;
use tokio_postgres::types::ToSql;

/// One column of a batch bound as a single array parameter.
pub struct PgParam(Box<dyn ToSql + Sync + Send>);

impl PgParam {
    pub fn from_array(array: ColumnArray) -> Self {
        match array {
            ColumnArray::Text(v) => PgParam(Box::new(v)),
            ColumnArray::Timestamp(v) => PgParam(Box::new(v)),
            ColumnArray::Bytes(v) => PgParam(Box::new(v)),
            ColumnArray::Integer(v) => PgParam(Box::new(v)),
            ColumnArray::Float(v) => PgParam(Box::new(v)),
        }
    }
}

impl AsRef<dyn ToSql + Sync> for PgParam {
    fn as_ref(&self) -> &(dyn ToSql + Sync + 'static) {
        &*self.0
    }
}

pub struct PgParamStore {
    pub params: Vec<PgParam>,
}

impl PgParamStore {
    pub fn from_columns(columns: Vec<ColumnArray>) -> Self {
        Self {
            params: columns.into_iter().map(PgParam::from_array).collect(),
        }
    }

    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|param| param.as_ref())
            .collect::<Vec<_>>()
    }
}
