use model::core::value::Value;
use rusqlite::{
    ToSql,
    types::{ToSqlOutput, Value as SqlValue, ValueRef},
};

/// A bound parameter in its stored representation: instants as integer
/// microseconds since the epoch, booleans as 0/1 and UUIDs as hyphenated text.
pub struct SqliteParam(Value);

impl SqliteParam {
    pub fn from_value(value: Value) -> Self {
        SqliteParam(value)
    }
}

impl ToSql for SqliteParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let output = match &self.0 {
            Value::Int(v) => ToSqlOutput::Owned(SqlValue::Integer(*v)),
            Value::Float(v) => ToSqlOutput::Owned(SqlValue::Real(*v)),
            Value::String(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Boolean(v) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*v))),
            Value::DateTime(v) => ToSqlOutput::Owned(SqlValue::Integer(v.timestamp_micros())),
            Value::Uuid(v) => ToSqlOutput::Owned(SqlValue::Text(v.hyphenated().to_string())),
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
        };
        Ok(output)
    }
}

pub struct SqliteParamStore {
    pub params: Vec<SqliteParam>,
}

impl SqliteParamStore {
    pub fn from_values(values: Vec<Value>) -> Self {
        Self {
            params: values.into_iter().map(SqliteParam::from_value).collect(),
        }
    }

    pub fn as_params(&self) -> rusqlite::ParamsFromIter<std::slice::Iter<'_, SqliteParam>> {
        rusqlite::params_from_iter(self.params.iter())
    }
}
