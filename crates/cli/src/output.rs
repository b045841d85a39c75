use crate::error::CliError;
use chrono::SecondsFormat;
use model::{core::value::Value, records::row::RowData};
use serde_json::{Map, Value as Json};

pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Int(v) => Json::from(*v),
        Value::Float(v) => Json::from(*v),
        Value::String(v) => Json::from(v.as_str()),
        Value::Boolean(v) => Json::from(*v),
        Value::DateTime(v) => Json::from(v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        Value::Uuid(v) => Json::from(v.to_string()),
        Value::Null => Json::Null,
    }
}

pub fn row_to_json(row: &RowData) -> Json {
    let fields = row
        .field_values
        .iter()
        .map(|fv| (fv.name.clone(), value_to_json(&fv.value)))
        .collect::<Map<_, _>>();
    Json::Object(fields)
}

pub fn print_rows(rows: &[RowData]) -> Result<(), CliError> {
    let json = Json::Array(rows.iter().map(row_to_json).collect());
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use model::records::row::FieldValue;

    #[test]
    fn test_rows_render_as_plain_objects() {
        let date = Utc.with_ymd_and_hms(2020, 9, 1, 0, 0, 0).unwrap();
        let row = RowData::new(
            "B",
            vec![
                FieldValue::new("id", 1),
                FieldValue::new("date", date),
                FieldValue::new("fk", Value::Null),
            ],
        );

        assert_eq!(
            row_to_json(&row),
            serde_json::json!({"id": 1, "date": "2020-09-01T00:00:00Z", "fk": null})
        );
    }
}
