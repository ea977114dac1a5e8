//! Reading validation and normalization.
//!
//! A request body is either a single reading object or
//! `{ "readings": [...] }` with 1 to [`MAX_BATCH_SIZE`] entries. Validation
//! collects every field failure with its path instead of stopping at the
//! first one. Normalization fills in `timestamp` and `seq` from the receipt
//! instant when the device omitted them.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::error::{CoreError, FieldError};
use crate::types::{parse_id, DbId, Timestamp};

/// Largest batch accepted in one request.
pub const MAX_BATCH_SIZE: usize = 1000;

/// One reading as sent by a device, before normalization.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReadingInput {
    #[validate(custom(function = "validate_uuid"))]
    pub machine_id: String,
    #[validate(custom(function = "validate_uuid"))]
    pub tire_id: Option<String>,
    #[validate(range(min = 0.0, max = 10.0, message = "pressure must be between 0 and 10 bar"))]
    pub pressure: f64,
    #[validate(range(min = 0.0, max = 200.0, message = "speed must be between 0 and 200 km/h"))]
    pub speed: f64,
    #[validate(custom(function = "validate_instant"))]
    pub timestamp: Option<String>,
    pub seq: Option<i64>,
}

/// The `{ "readings": [...] }` body shape.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReadingBatch {
    #[validate(nested)]
    pub readings: Vec<ReadingInput>,
}

/// A validated reading with `timestamp` and `seq` resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub machine_id: DbId,
    pub tire_id: Option<DbId>,
    pub pressure: f64,
    pub speed: f64,
    pub timestamp: Timestamp,
    pub seq: i64,
}

/// Parse a raw request body into normalized readings.
///
/// `received_at` is the instant the request arrived; it becomes the
/// default `timestamp` and (in milliseconds) the default `seq`.
pub fn parse_readings(body: &[u8], received_at: Timestamp) -> Result<Vec<Reading>, CoreError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| body_error(format!("Invalid JSON: {e}")))?;

    let inputs = match value.get("readings") {
        Some(items) => {
            let items = items.as_array().ok_or_else(|| {
                CoreError::InvalidFields(vec![FieldError::new(
                    "readings",
                    "readings must be an array",
                )])
            })?;
            check_batch_size(items.len())?;
            let batch = ReadingBatch {
                readings: decode_batch(items)?,
            };
            batch.validate().map_err(into_field_errors)?;
            batch.readings
        }
        None => {
            let single = decode_reading(&value, "").map_err(CoreError::InvalidFields)?;
            single.validate().map_err(into_field_errors)?;
            vec![single]
        }
    };

    inputs
        .into_iter()
        .enumerate()
        .map(|(idx, input)| normalize(input, idx, received_at))
        .collect()
}

/// JSON shape a reading field must have before it can be deserialized.
#[derive(Debug, Clone, Copy)]
enum JsonKind {
    String,
    Number,
    Integer,
}

impl JsonKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            JsonKind::String => value.is_string(),
            JsonKind::Number => value.is_number(),
            JsonKind::Integer => value.is_i64(),
        }
    }

    fn expected(self) -> &'static str {
        match self {
            JsonKind::String => "must be a string",
            JsonKind::Number => "must be a number",
            JsonKind::Integer => "must be an integer",
        }
    }
}

/// Wire name, expected shape and whether the field is required.
const READING_FIELDS: [(&str, JsonKind, bool); 6] = [
    ("machineId", JsonKind::String, true),
    ("tireId", JsonKind::String, false),
    ("pressure", JsonKind::Number, true),
    ("speed", JsonKind::Number, true),
    ("timestamp", JsonKind::String, false),
    ("seq", JsonKind::Integer, false),
];

fn decode_batch(items: &[Value]) -> Result<Vec<ReadingInput>, CoreError> {
    let mut inputs = Vec::with_capacity(items.len());
    let mut errors = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        match decode_reading(item, &format!("readings.{idx}")) {
            Ok(input) => inputs.push(input),
            Err(mut item_errors) => errors.append(&mut item_errors),
        }
    }
    if errors.is_empty() {
        Ok(inputs)
    } else {
        Err(CoreError::InvalidFields(errors))
    }
}

/// Check field presence and JSON types, then deserialize one reading.
///
/// `prefix` is empty for a single-reading body and `readings.N` inside a
/// batch; type errors are reported at `prefix.field`.
fn decode_reading(value: &Value, prefix: &str) -> Result<ReadingInput, Vec<FieldError>> {
    let at = |field: &str| {
        if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        }
    };
    let own_path = if prefix.is_empty() { "body" } else { prefix };

    let Some(object) = value.as_object() else {
        return Err(vec![FieldError::new(own_path, "reading must be a JSON object")]);
    };

    let mut errors = Vec::new();
    for (name, kind, required) in READING_FIELDS {
        match object.get(name) {
            None | Some(Value::Null) if !required => {}
            None => errors.push(FieldError::new(at(name), "is required")),
            Some(v) if kind.matches(v) => {}
            Some(_) => errors.push(FieldError::new(at(name), kind.expected())),
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    ReadingInput::deserialize(value).map_err(|e| vec![FieldError::new(own_path, e.to_string())])
}

fn check_batch_size(len: usize) -> Result<(), CoreError> {
    if (1..=MAX_BATCH_SIZE).contains(&len) {
        return Ok(());
    }
    Err(CoreError::InvalidFields(vec![FieldError::new(
        "readings",
        format!("readings must contain between 1 and {MAX_BATCH_SIZE} entries, got {len}"),
    )]))
}

fn normalize(input: ReadingInput, idx: usize, received_at: Timestamp) -> Result<Reading, CoreError> {
    // Fields were validated already; a failure here means the validator and
    // the parser disagree, which is still reported as a field error.
    let field = |name: &str| FieldError::new(format!("readings.{idx}.{name}"), "invalid value");

    let machine_id = parse_id(&input.machine_id)
        .ok_or_else(|| CoreError::InvalidFields(vec![field("machineId")]))?;
    let tire_id = match input.tire_id.as_deref() {
        Some(raw) => {
            Some(parse_id(raw).ok_or_else(|| CoreError::InvalidFields(vec![field("tireId")]))?)
        }
        None => None,
    };
    let timestamp = match input.timestamp.as_deref() {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map_err(|_| CoreError::InvalidFields(vec![field("timestamp")]))?
            .with_timezone(&Utc),
        None => received_at,
    };

    Ok(Reading {
        machine_id,
        tire_id,
        pressure: input.pressure,
        speed: input.speed,
        timestamp,
        seq: input.seq.unwrap_or_else(|| received_at.timestamp_millis()),
    })
}

fn body_error(message: String) -> CoreError {
    CoreError::InvalidFields(vec![FieldError::new("body", message)])
}

fn validate_uuid(value: &str) -> Result<(), ValidationError> {
    if parse_id(value).is_some() {
        return Ok(());
    }
    let mut err = ValidationError::new("uuid");
    err.message = Some(Cow::from("must be a valid UUID"));
    Err(err)
}

fn validate_instant(value: &str) -> Result<(), ValidationError> {
    if DateTime::parse_from_rfc3339(value).is_ok() {
        return Ok(());
    }
    let mut err = ValidationError::new("datetime");
    err.message = Some(Cow::from("must be an ISO 8601 timestamp with offset"));
    Err(err)
}

fn into_field_errors(errors: ValidationErrors) -> CoreError {
    let mut out = Vec::new();
    flatten_errors("", &errors, &mut out);
    out.sort_by(|a, b| a.path.cmp(&b.path));
    CoreError::InvalidFields(out)
}

/// Walk a (possibly nested) validator result into flat `path -> message`
/// entries.
fn flatten_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let name = camel_case(field);
        let path = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}.{name}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for err in field_errors {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed {} check", err.code));
                    out.push(FieldError::new(path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    flatten_errors(&format!("{path}.{idx}"), inner, out);
                }
            }
        }
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for ch in field.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}
