//! Decoding of the Google Visualization (gviz) JSON payload.
//!
//! The endpoint answers with a JSONP wrapper,
//! `/*O_o*/\ngoogle.visualization.Query.setResponse({...});`, whose
//! `table.rows[].c[].v` holds the cell values.

use serde::Deserialize;
use serde_json::Value;

use crate::errors::DashboardError;

const SET_RESPONSE_MARKER: &str = "setResponse(";

/// One sheet row: a sparse list of cells, or no cell data at all.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RawRow {
    #[serde(default)]
    pub c: Option<Vec<Option<RawCell>>>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RawCell {
    #[serde(default)]
    pub v: Option<Value>,
    /// Sheet-formatted text; kept for completeness, the parser reads `v`.
    #[serde(default)]
    pub f: Option<String>,
}

impl RawRow {
    /// Builds a row from plain values; `Value::Null` becomes an empty cell.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let cells = values
            .into_iter()
            .map(|value| {
                (!value.is_null()).then(|| RawCell {
                    v: Some(value),
                    f: None,
                })
            })
            .collect();
        Self { c: Some(cells) }
    }

    pub fn empty() -> Self {
        Self { c: None }
    }

    pub fn has_cells(&self) -> bool {
        self.c.is_some()
    }

    pub fn value(&self, column: usize) -> Option<&Value> {
        self.c
            .as_ref()?
            .get(column)?
            .as_ref()?
            .v
            .as_ref()
            .filter(|value| !value.is_null())
    }

    /// Cell text the way a loosely typed sheet cell reads: falsy values
    /// (empty string, zero, `false`) count as missing.
    pub fn text(&self, column: usize) -> Option<String> {
        self.value(column).and_then(value_text)
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".into()),
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => {
            let float = number.as_f64()?;
            if float == 0.0 || float.is_nan() {
                None
            } else if let Some(int) = number.as_i64() {
                Some(int.to_string())
            } else if float.fract() == 0.0 && float.abs() < 1e21 {
                Some(format!("{float:.0}"))
            } else {
                Some(float.to_string())
            }
        }
        other => Some(other.to_string()),
    }
}

#[derive(Deserialize)]
struct GvizResponse {
    table: GvizTable,
}

#[derive(Deserialize)]
struct GvizTable {
    #[serde(default)]
    rows: Vec<RawRow>,
}

#[derive(Deserialize)]
struct ProxyEnvelope {
    contents: String,
}

/// Extracts the rows from a gviz response body (JSONP wrapped or bare JSON).
pub fn decode_gviz(body: &str) -> Result<Vec<RawRow>, DashboardError> {
    let body = body.trim();
    let json = match body.find(SET_RESPONSE_MARKER) {
        Some(start) => {
            let start = start + SET_RESPONSE_MARKER.len();
            let end = body
                .rfind(')')
                .filter(|end| *end >= start)
                .ok_or_else(|| DashboardError::data_source("unterminated gviz response"))?;
            &body[start..end]
        }
        None => body,
    };

    let response: GvizResponse = serde_json::from_str(json)
        .map_err(|err| DashboardError::data_source(format!("undecodable gviz payload: {err}")))?;
    Ok(response.table.rows)
}

/// Unwraps an allorigins-style `{ "contents": "..." }` envelope first.
pub fn decode_proxy_envelope(body: &str) -> Result<Vec<RawRow>, DashboardError> {
    let envelope: ProxyEnvelope = serde_json::from_str(body)
        .map_err(|err| DashboardError::data_source(format!("undecodable proxy envelope: {err}")))?;
    decode_gviz(&envelope.contents)
}
