//! Document Normalizer
//!
//! Turns loosely-typed request input into typed values ready for storage.
//! Form fields and query parameters arrive as [`RawField::Text`]; JSON bodies
//! keep their own shape. Each target type has one coercion function that
//! either returns the typed value or a [`ValidationError`] naming the field.

use std::collections::BTreeMap;

use bson::{oid::ObjectId, Bson, Document};
use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Number, Value};

use crate::error::ValidationError;

/// One untyped input value, tagged by the shape it arrived in
#[derive(Debug, Clone, PartialEq)]
pub enum RawField {
    Text(String),
    Number(Number),
    Flag(bool),
    Structured(Map<String, Value>),
    List(Vec<Value>),
    Null,
}

impl RawField {
    fn kind(&self) -> &'static str {
        match self {
            RawField::Text(_) => "text",
            RawField::Number(_) => "number",
            RawField::Flag(_) => "boolean",
            RawField::Structured(_) => "object",
            RawField::List(_) => "list",
            RawField::Null => "null",
        }
    }
}

impl From<Value> for RawField {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => RawField::Text(s),
            Value::Number(n) => RawField::Number(n),
            Value::Bool(b) => RawField::Flag(b),
            Value::Object(map) => RawField::Structured(map),
            Value::Array(items) => RawField::List(items),
            Value::Null => RawField::Null,
        }
    }
}

impl From<&str> for RawField {
    fn from(value: &str) -> Self {
        RawField::Text(value.to_string())
    }
}

/// Field name → raw value, as collected from one request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawInput {
    fields: BTreeMap<String, RawField>,
}

impl RawInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from string pairs (form bodies, query strings)
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fields = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), RawField::Text(v.into())))
            .collect();
        Self { fields }
    }

    /// Build from the top-level object of a JSON body
    pub fn from_json(map: Map<String, Value>) -> Self {
        let fields = map.into_iter().map(|(k, v)| (k, RawField::from(v))).collect();
        Self { fields }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<RawField>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Overlay `other` on top of `self`; fields in `other` win
    pub fn merge(&mut self, other: RawInput) {
        self.fields.extend(other.fields);
    }

    /// Field value, treating an explicit null the same as absence
    pub fn get(&self, name: &str) -> Option<&RawField> {
        match self.fields.get(name) {
            Some(RawField::Null) | None => None,
            Some(raw) => Some(raw),
        }
    }

    pub fn required(&self, name: &str) -> Result<&RawField, ValidationError> {
        self.get(name).ok_or_else(|| ValidationError::missing(name))
    }
}

/// Numeric volume or quantity
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Volume {
    Whole(i64),
    Decimal(f64),
}

impl From<Volume> for Bson {
    fn from(volume: Volume) -> Self {
        match volume {
            Volume::Whole(n) => Bson::Int64(n),
            Volume::Decimal(x) => Bson::Double(x),
        }
    }
}

pub fn coerce_text(field: &str, raw: &RawField) -> Result<String, ValidationError> {
    match raw {
        RawField::Text(s) => Ok(s.clone()),
        other => Err(ValidationError::invalid(
            field,
            format!("expected text, got {}", other.kind()),
        )),
    }
}

/// Integer or decimal; text may use `.` or `,` as the decimal separator
pub fn coerce_number(field: &str, raw: &RawField) -> Result<Volume, ValidationError> {
    match raw {
        RawField::Number(n) => {
            if let Some(whole) = n.as_i64() {
                Ok(Volume::Whole(whole))
            } else {
                n.as_f64()
                    .filter(|x| x.is_finite())
                    .map(Volume::Decimal)
                    .ok_or_else(|| ValidationError::invalid(field, "number out of range"))
            }
        }
        RawField::Text(s) => parse_number(s)
            .ok_or_else(|| ValidationError::invalid(field, format!("'{}' is not a number", s))),
        other => Err(ValidationError::invalid(
            field,
            format!("expected a number, got {}", other.kind()),
        )),
    }
}

fn parse_number(text: &str) -> Option<Volume> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(whole) = text.parse::<i64>() {
        return Some(Volume::Whole(whole));
    }
    if text.contains(',') && text.contains('.') {
        return None;
    }
    let decimal: f64 = text.replace(',', ".").parse().ok()?;
    decimal.is_finite().then_some(Volume::Decimal(decimal))
}

/// RFC 3339 date-time, or a bare `YYYY-MM-DD` date taken as midnight UTC
pub fn coerce_date(field: &str, raw: &RawField) -> Result<bson::DateTime, ValidationError> {
    let text = match raw {
        RawField::Text(s) => s.trim(),
        other => {
            return Err(ValidationError::invalid(
                field,
                format!("expected a date, got {}", other.kind()),
            ))
        }
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(bson::DateTime::from_millis(parsed.timestamp_millis()));
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| bson::DateTime::from_millis(midnight.and_utc().timestamp_millis()))
        .ok_or_else(|| ValidationError::invalid(field, format!("'{}' is not a date", text)))
}

/// Embedded sub-document carrying a required `_id`
///
/// Accepts a structured value, an object encoded as text, or a bare
/// identifier (which becomes `{ "_id": <id> }`). Encoded objects are read as
/// JSON5, so single-quoted mappings like `{'_id': '...'}` are accepted. The
/// `_id` is stored as a native object id.
pub fn coerce_embedded(field: &str, raw: &RawField) -> Result<Document, ValidationError> {
    let map = match raw {
        RawField::Structured(map) => map.clone(),
        RawField::Text(s) => {
            let s = s.trim();
            if let Ok(oid) = ObjectId::parse_str(s) {
                let mut doc = Document::new();
                doc.insert("_id", oid);
                return Ok(doc);
            }
            match json5::from_str::<Value>(s) {
                Ok(Value::Object(map)) => map,
                Ok(_) => return Err(ValidationError::invalid(field, "expected an object")),
                Err(e) => {
                    return Err(ValidationError::invalid(
                        field,
                        format!("malformed structure: {}", e),
                    ))
                }
            }
        }
        other => {
            return Err(ValidationError::invalid(
                field,
                format!("expected an object, got {}", other.kind()),
            ))
        }
    };

    let mut doc = match Bson::try_from(Value::Object(map)) {
        Ok(Bson::Document(doc)) => doc,
        Ok(_) => return Err(ValidationError::invalid(field, "expected an object")),
        Err(e) => {
            return Err(ValidationError::invalid(
                field,
                format!("malformed structure: {}", e),
            ))
        }
    };

    let oid = match doc.get("_id") {
        Some(Bson::ObjectId(oid)) => *oid,
        Some(Bson::String(s)) => ObjectId::parse_str(s)
            .map_err(|_| ValidationError::invalid(field, format!("'_id' {} is invalid", s)))?,
        Some(_) => return Err(ValidationError::invalid(field, "'_id' is not a valid identifier")),
        None => return Err(ValidationError::invalid(field, "missing '_id'")),
    };
    doc.insert("_id", oid);
    Ok(doc)
}

/// Parse a 24-character hex object id
pub fn parse_object_id(raw: &str) -> Result<ObjectId, ValidationError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| ValidationError::InvalidId(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(s: &str) -> RawField {
        RawField::Text(s.to_string())
    }

    #[test]
    fn test_number_accepts_both_decimal_separators() {
        assert_eq!(coerce_number("litros", &text("12,5")).unwrap(), Volume::Decimal(12.5));
        assert_eq!(coerce_number("litros", &text("12.5")).unwrap(), Volume::Decimal(12.5));
        assert_eq!(coerce_number("litros", &text(" 10 ")).unwrap(), Volume::Whole(10));
    }

    #[test]
    fn test_number_rejects_garbage() {
        for bad in ["abc", "", "1,234.5", "NaN", "inf"] {
            let err = coerce_number("litros", &text(bad)).unwrap_err();
            assert_eq!(err.field(), Some("litros"), "input {:?}", bad);
        }
        assert!(coerce_number("litros", &RawField::Flag(true)).is_err());
    }

    #[test]
    fn test_number_from_json() {
        let whole = RawField::from(json!(10));
        let decimal = RawField::from(json!(7.25));
        assert_eq!(coerce_number("litros", &whole).unwrap(), Volume::Whole(10));
        assert_eq!(coerce_number("litros", &decimal).unwrap(), Volume::Decimal(7.25));
    }

    #[test]
    fn test_text_does_not_reinterpret_numbers() {
        assert_eq!(coerce_text("estado", &text("curing")).unwrap(), "curing");
        assert!(coerce_text("estado", &RawField::from(json!(3))).is_err());
    }

    #[test]
    fn test_date_formats() {
        let date = coerce_date("fechaCarga", &text("2024-03-01")).unwrap();
        let datetime = coerce_date("fechaCarga", &text("2024-03-01T00:00:00Z")).unwrap();
        assert_eq!(date, datetime);

        let offset = coerce_date("fechaCarga", &text("2024-03-01T02:00:00+02:00")).unwrap();
        assert_eq!(offset, datetime);

        assert!(coerce_date("fechaCarga", &text("01/03/2024")).is_err());
    }

    #[test]
    fn test_embedded_from_structured() {
        let raw = RawField::from(json!({"_id": "65f1a2b3c4d5e6f708091a2b", "cerveza": "IPA"}));
        let doc = coerce_embedded("lote", &raw).unwrap();
        assert!(matches!(doc.get("_id"), Some(Bson::ObjectId(_))));
        assert_eq!(doc.get_str("cerveza").unwrap(), "IPA");
    }

    #[test]
    fn test_embedded_from_encoded_text() {
        let raw = text(r#"{"_id": "65f1a2b3c4d5e6f708091a2b", "estado": "listo"}"#);
        let doc = coerce_embedded("lote", &raw).unwrap();
        assert_eq!(
            doc.get_object_id("_id").unwrap().to_hex(),
            "65f1a2b3c4d5e6f708091a2b"
        );
    }

    #[test]
    fn test_embedded_from_single_quoted_mapping() {
        let raw =
            text("{'_id': '65f1a2b3c4d5e6f708091a2b', 'cerveza': 'IPA', 'cantidadLitros': 500}");
        let doc = coerce_embedded("lote", &raw).unwrap();
        assert_eq!(
            doc.get_object_id("_id").unwrap().to_hex(),
            "65f1a2b3c4d5e6f708091a2b"
        );
        assert_eq!(doc.get_str("cerveza").unwrap(), "IPA");
        assert_eq!(doc.get_i64("cantidadLitros").unwrap(), 500);
    }

    #[test]
    fn test_embedded_from_bare_identifier() {
        let doc = coerce_embedded("lote", &text("65f1a2b3c4d5e6f708091a2b")).unwrap();
        assert_eq!(doc.len(), 1);
        assert!(doc.get_object_id("_id").is_ok());
    }

    #[test]
    fn test_embedded_rejects_malformed() {
        assert!(coerce_embedded("lote", &text(r#"{"_id": "#)).is_err());
        assert!(coerce_embedded("lote", &text("{'_id': '65f1a2b3c4d5e6f708091a2b'")).is_err());
        assert!(coerce_embedded("lote", &text("{'cerveza': 'IPA'}")).is_err());
        assert!(coerce_embedded("lote", &text("[1, 2]")).is_err());
        assert!(coerce_embedded("lote", &text(r#"{"cerveza": "IPA"}"#)).is_err());
        assert!(coerce_embedded("lote", &text(r#"{"_id": "nope"}"#)).is_err());
    }

    #[test]
    fn test_input_null_counts_as_absent() {
        let mut input = RawInput::new();
        input.insert("notas", RawField::Null);
        assert!(input.get("notas").is_none());
        assert_eq!(
            input.required("notas").unwrap_err(),
            ValidationError::missing("notas")
        );
    }

    #[test]
    fn test_merge_prefers_later_fields() {
        let mut input = RawInput::from_pairs([("estado", "query"), ("id", "x")]);
        let mut body = RawInput::new();
        body.insert("estado", "body");
        input.merge(body);
        assert_eq!(input.get("estado"), Some(&text("body")));
        assert_eq!(input.get("id"), Some(&text("x")));
    }

    #[test]
    fn test_parse_object_id() {
        assert!(parse_object_id("65f1a2b3c4d5e6f708091a2b").is_ok());
        assert_eq!(
            parse_object_id("123").unwrap_err(),
            ValidationError::InvalidId("123".to_string())
        );
    }
}
