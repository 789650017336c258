//! Response bodies to tabular rows
//!
//! Reference endpoints answer with bare arrays (pairs or strings), facility
//! endpoints with GeoJSON features. Everything here turns those into
//! [`Row`]s with stable, flat columns.

use oshub_domain::types::row::cell_text;
use oshub_domain::{OshError, Result, Row, WorkersRange};
use serde_json::{Map, Value};

fn malformed(what: &str, body: &Value) -> OshError {
    OshError::MalformedResponse(format!("expected {what}, got {body}"))
}

fn array<'a>(body: &'a Value, what: &str) -> Result<&'a [Value]> {
    body.as_array().map(Vec::as_slice).ok_or_else(|| malformed(what, body))
}

/// `[[a, b], ...]` into rows `{first: a, second: b}`.
pub fn pair_rows(body: &Value, first: &str, second: &str) -> Result<Vec<Row>> {
    array(body, "an array of pairs")?
        .iter()
        .map(|item| match item.as_array().map(Vec::as_slice) {
            Some([a, b]) => {
                let mut row = Row::new();
                row.insert(first.into(), a.clone());
                row.insert(second.into(), b.clone());
                Ok(row)
            }
            _ => Err(malformed("a two element array", item)),
        })
        .collect()
}

/// `[a, ...]` into rows `{column: a}`.
pub fn value_rows(body: &Value, column: &str) -> Result<Vec<Row>> {
    Ok(array(body, "an array")?
        .iter()
        .map(|item| {
            let mut row = Row::new();
            row.insert(column.into(), item.clone());
            row
        })
        .collect())
}

/// Contributor types come as `[value, display]` pairs with identical halves;
/// only the value is kept.
pub fn contributor_type_rows(body: &Value) -> Result<Vec<Row>> {
    pair_rows(body, "contributor_type", "display").map(|rows| {
        rows.into_iter()
            .map(|mut row| {
                row.remove("display");
                row
            })
            .collect()
    })
}

/// One row per (facility type, processing type) combination.
pub fn processing_type_rows(body: &Value) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for entry in array(body, "an array of facility types")? {
        let facility_type =
            entry.get("facilityType").ok_or_else(|| malformed("a facilityType", entry))?;
        let processing_types = entry
            .get("processingTypes")
            .and_then(Value::as_array)
            .ok_or_else(|| malformed("a processingTypes array", entry))?;

        for processing_type in processing_types {
            let mut row = Row::new();
            row.insert("facility_type".into(), facility_type.clone());
            row.insert("processing_type".into(), processing_type.clone());
            rows.push(row);
        }
    }
    Ok(rows)
}

pub fn workers_range_rows(body: &Value) -> Result<Vec<Row>> {
    array(body, "an array of workers ranges")?
        .iter()
        .map(|item| {
            let label = item.as_str().ok_or_else(|| malformed("a workers range label", item))?;
            match serde_json::to_value(WorkersRange::parse(label)) {
                Ok(Value::Object(row)) => Ok(row),
                _ => Err(malformed("a workers range", item)),
            }
        })
        .collect()
}

/// `{"count": N}` as a number. Counts sent as numeric strings are accepted.
pub fn count(body: &Value) -> Result<u64> {
    let value = body.get("count").ok_or_else(|| malformed("a count", body))?;
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| malformed("a non-negative integer count", value))
}

fn coordinates(feature: &Value) -> (Value, Value) {
    let coordinates = feature.pointer("/geometry/coordinates").and_then(Value::as_array);
    match coordinates.map(Vec::as_slice) {
        Some([lon, lat, ..]) => (lon.clone(), lat.clone()),
        _ => (Value::Null, Value::Null),
    }
}

fn skipped_property(key: &str) -> bool {
    key.starts_with("ppe_") || key == "new_os_id"
}

fn properties(feature: &Value) -> impl Iterator<Item = (&String, &Value)> {
    feature.get("properties").and_then(Value::as_object).into_iter().flatten()
}

/// A search-result feature as `{os_id, lon, lat, <properties>}`.
pub fn feature_row(feature: &Value) -> Result<Row> {
    let id = feature.get("id").ok_or_else(|| malformed("a feature id", feature))?;
    let (lon, lat) = coordinates(feature);

    let mut row = Row::new();
    row.insert("os_id".into(), id.clone());
    row.insert("lon".into(), lon);
    row.insert("lat".into(), lat);
    for (key, value) in properties(feature) {
        if !skipped_property(key) {
            row.insert(key.clone(), value.clone());
        }
    }
    Ok(row)
}

/// A facility detail flattened to text cells.
///
/// Lists of objects become one `k:v|k:v` line per object with `lng:` renamed
/// `lon:`. `created_from` is joined the same way on a single line.
/// `extended_fields` are spread into `<field>_extended` columns only when
/// `extended` is set.
pub fn facility_detail_row(body: &Value, extended: bool) -> Result<Row> {
    let id = body.get("id").ok_or_else(|| malformed("a facility id", body))?;
    let (lon, lat) = coordinates(body);

    let mut row = Row::new();
    row.insert("id".into(), id.clone());
    row.insert("lon".into(), lon);
    row.insert("lat".into(), lat);

    for (key, value) in properties(body) {
        if skipped_property(key) {
            continue;
        }
        match (key.as_str(), value) {
            (_, Value::Array(items)) => {
                row.insert(key.clone(), Value::String(join_list(items)));
            }
            ("extended_fields", Value::Object(fields)) => {
                if extended {
                    for (field, entries) in fields {
                        let text = match entries {
                            Value::Array(items) => join_list(items),
                            other => cell_text(other),
                        };
                        row.insert(format!("{field}_extended"), Value::String(text));
                    }
                }
            }
            ("extended_fields", _) => {}
            ("created_from", Value::Object(fields)) => {
                row.insert(key.clone(), Value::String(join_pairs(fields)));
            }
            (_, Value::Null) => {
                row.insert(key.clone(), Value::String(String::new()));
            }
            _ => {
                row.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(row)
}

/// One page of `/api/facilities-downloads/`: `results.rows` zipped with
/// `results.headers`.
///
/// Cells are kept as sent; a row shorter than the headers simply lacks the
/// trailing columns.
pub fn download_rows(body: &Value) -> Result<Vec<Row>> {
    let results = body.get("results").ok_or_else(|| malformed("results", body))?;
    let headers: Vec<&str> = array(
        results.get("headers").ok_or_else(|| malformed("results.headers", body))?,
        "an array of headers",
    )?
    .iter()
    .map(|h| h.as_str().ok_or_else(|| malformed("a header name", h)))
    .collect::<Result<_>>()?;

    array(results.get("rows").ok_or_else(|| malformed("results.rows", body))?, "an array of rows")?
        .iter()
        .map(|cells| -> Result<Row> {
            let cells = array(cells, "a row of cells")?;
            Ok(headers.iter().map(|h| (*h).to_string()).zip(cells.iter().cloned()).collect())
        })
        .collect()
}

const EMBED_FIELD_COLUMNS: [&str; 4] = ["display_name", "visible", "order", "searchable"];

/// An embedded map configuration flattened into one row.
///
/// Each `embed_fields` entry becomes `<column_name>_{display_name, visible,
/// order, searchable}`; entries without a column name are numbered
/// `undefined_1`, `undefined_2`, ... `extended_fields` become
/// `extended_fields_<i>`. `id` is renamed `embedded_map_id` and
/// `contributor` is renamed `contributor_id`. Other values are kept as sent.
pub fn embed_config_row(body: &Value) -> Result<Row> {
    let object = body.as_object().ok_or_else(|| malformed("an embed config object", body))?;

    let mut row = Row::new();
    let mut undefined = 0usize;
    for (key, value) in object {
        match key.as_str() {
            "embed_fields" => {
                for field in array(value, "an array of embed fields")? {
                    let name = field.get("column_name").and_then(Value::as_str).unwrap_or_default();
                    let prefix = if name.is_empty() {
                        undefined += 1;
                        format!("undefined_{undefined}")
                    } else {
                        name.to_string()
                    };
                    for column in EMBED_FIELD_COLUMNS {
                        let cell = field.get(column).cloned().unwrap_or(Value::Null);
                        row.insert(format!("{prefix}_{column}"), cell);
                    }
                }
            }
            "extended_fields" => {
                for (index, field) in array(value, "an array of extended fields")?.iter().enumerate() {
                    row.insert(format!("extended_fields_{index}"), field.clone());
                }
            }
            "id" => {
                row.insert("embedded_map_id".into(), value.clone());
            }
            "contributor" => {
                row.insert("contributor_id".into(), value.clone());
            }
            _ => {
                row.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(row)
}

/// A JSON object body as a row, `null` cells rendered empty.
pub fn object_row(body: &Value) -> Result<Row> {
    let object = body.as_object().ok_or_else(|| malformed("an object", body))?;
    Ok(object
        .iter()
        .map(|(key, value)| {
            let value = if value.is_null() { Value::String(String::new()) } else { value.clone() };
            (key.clone(), value)
        })
        .collect())
}

pub fn object_rows(body: &Value) -> Result<Vec<Row>> {
    array(body, "an array of objects")?.iter().map(object_row).collect()
}

fn join_pairs(fields: &Map<String, Value>) -> String {
    fields.iter().map(|(k, v)| format!("{k}:{}", cell_text(v))).collect::<Vec<_>>().join("|")
}

fn join_list(items: &[Value]) -> String {
    let lines: Vec<String> = items
        .iter()
        .map(|item| match item {
            Value::Object(fields) => join_pairs(fields),
            other => cell_text(other),
        })
        .collect();

    let text = lines.join("\n");
    if items.first().is_some_and(Value::is_object) {
        text.replace("lng:", "lon:")
    } else {
        text
    }
}
