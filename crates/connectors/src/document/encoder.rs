use bson::{Binary, Bson, DateTime, Regex, oid::ObjectId, spec::BinarySubtype};
use chrono::NaiveTime;
use model::core::value::Value;

/// Converts filter literals into the document store's value representation.
pub trait ValueEncoder {
    /// Encodes a single scalar.
    fn encode_value(&self, value: &Value) -> Bson;

    /// Encodes a literal list element by element, preserving order.
    fn encode_values(&self, values: &[Value]) -> Vec<Bson> {
        values.iter().map(|v| self.encode_value(v)).collect()
    }
}

/// Default encoder producing BSON values.
#[derive(Debug, Clone, Copy, Default)]
pub struct BsonValueEncoder;

impl BsonValueEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl ValueEncoder for BsonValueEncoder {
    fn encode_value(&self, value: &Value) -> Bson {
        match value {
            Value::Int(v) => Bson::Int64(*v),
            Value::Uint(v) => match i64::try_from(*v) {
                Ok(v) => Bson::Int64(v),
                Err(_) => Bson::Double(*v as f64),
            },
            Value::Float(v) => Bson::Double(*v),
            Value::String(v) => Bson::String(v.clone()),
            Value::Boolean(v) => Bson::Boolean(*v),
            Value::Uuid(v) => {
                let uuid = bson::Uuid::from_bytes(*v.as_bytes());
                Bson::Binary(Binary::from_uuid(uuid))
            }
            Value::ObjectId(bytes) => Bson::ObjectId(ObjectId::from_bytes(*bytes)),
            Value::Bytes(bytes) => Bson::Binary(Binary {
                subtype: BinarySubtype::Generic,
                bytes: bytes.clone(),
            }),
            Value::Date(d) => {
                let millis = d.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
                Bson::DateTime(DateTime::from_millis(millis))
            }
            Value::Timestamp(ts) => Bson::DateTime(DateTime::from_millis(ts.timestamp_millis())),
            Value::Pattern(p) => Bson::RegularExpression(Regex {
                pattern: p.pattern.clone(),
                options: p.options.clone(),
            }),
            Value::Null => Bson::Null,
        }
    }
}
