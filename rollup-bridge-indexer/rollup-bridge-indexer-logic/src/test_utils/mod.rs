use chrono::NaiveDateTime;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Value};
use std::collections::BTreeMap;

pub type Row = BTreeMap<&'static str, Value>;

pub fn row<const N: usize>(columns: [(&'static str, Value); N]) -> Row {
    BTreeMap::from(columns)
}

/// Connection answering each query with the next result set, in order.
pub fn mock_db(results: Vec<Vec<Row>>) -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(results)
        .into_connection()
}

pub fn naive_ts(secs: i64) -> NaiveDateTime {
    chrono::DateTime::from_timestamp(secs, 0)
        .unwrap()
        .naive_utc()
}

pub fn none_i64() -> Value {
    Option::<i64>::None.into()
}

pub fn none_bytes() -> Value {
    Option::<Vec<u8>>::None.into()
}
