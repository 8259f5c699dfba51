//! Response Serializer
//!
//! Converts stored BSON values into transport-safe JSON: object ids become
//! their hex string, date-times become RFC 3339 strings, and containers are
//! converted recursively. Types with no plain JSON form fall back to relaxed
//! Extended JSON rather than failing.

use bson::{Bson, Document};
use chrono::SecondsFormat;
use serde_json::{Map, Value};

pub fn to_wire(value: &Bson) -> Value {
    match value {
        Bson::Null => Value::Null,
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => {
            Value::String(dt.to_chrono().to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        Bson::Document(doc) => document_to_wire(doc),
        Bson::Array(items) => Value::Array(items.iter().map(to_wire).collect()),
        Bson::String(s) => Value::String(s.clone()),
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(n) => Value::from(*n),
        Bson::Int64(n) => Value::from(*n),
        Bson::Double(x) if x.is_finite() => Value::from(*x),
        other => other.clone().into_relaxed_extjson(),
    }
}

pub fn document_to_wire(doc: &Document) -> Value {
    let map: Map<String, Value> = doc
        .iter()
        .map(|(key, value)| (key.clone(), to_wire(value)))
        .collect();
    Value::Object(map)
}

/// `null` when nothing was found
pub fn optional_document_to_wire(doc: Option<&Document>) -> Value {
    doc.map(document_to_wire).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, oid::ObjectId};
    use serde_json::json;

    fn sample() -> Document {
        let oid = ObjectId::parse_str("65f1a2b3c4d5e6f708091a2b").unwrap();
        let loaded = bson::DateTime::from_millis(1_709_251_200_000);
        doc! {
            "_id": oid,
            "litros": 10_i64,
            "estado": "curing",
            "notas": "",
            "ratio": 0.5,
            "lote": { "_id": oid, "fechaCarga": loaded, "tags": [oid, "x", Bson::Null] },
        }
    }

    #[test]
    fn test_converts_ids_and_dates_recursively() {
        let wire = document_to_wire(&sample());
        assert_eq!(
            wire,
            json!({
                "_id": "65f1a2b3c4d5e6f708091a2b",
                "litros": 10,
                "estado": "curing",
                "notas": "",
                "ratio": 0.5,
                "lote": {
                    "_id": "65f1a2b3c4d5e6f708091a2b",
                    "fechaCarga": "2024-03-01T00:00:00.000Z",
                    "tags": ["65f1a2b3c4d5e6f708091a2b", "x", null],
                },
            })
        );
    }

    #[test]
    fn test_serialization_is_idempotent() {
        let once = document_to_wire(&sample());
        let reparsed = Bson::try_from(once.clone()).unwrap();
        let twice = to_wire(&reparsed);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_not_found_is_null() {
        assert_eq!(optional_document_to_wire(None), Value::Null);
    }

    #[test]
    fn test_exotic_types_pass_through() {
        let ts = Bson::Timestamp(bson::Timestamp { time: 1, increment: 2 });
        assert_eq!(to_wire(&ts), json!({"$timestamp": {"t": 1, "i": 2}}));
        assert_eq!(to_wire(&Bson::Double(f64::NAN)), json!({"$numberDouble": "NaN"}));
    }
}
