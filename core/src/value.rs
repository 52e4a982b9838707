//! The scalar value stored under every custom lobby data key.
//!
//! # Design
//! `ScalarValue` is a closed sum type, so a value always holds exactly one of
//! boolean, number or string. On the wire it is the bare JSON scalar, never a
//! `{type, value}` envelope. Integral numbers are written without a fraction
//! (`10`, not `10.0`) and every JSON number decodes to `Number`, so integer
//! and float inputs collapse to one variant.
//!
//! The one value that has no wire form is a non-finite number: serde_json
//! would write it as `null`, which the backend reads as "delete". Encoding
//! such a value is rejected instead.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ApiError, ApiResult};

/// Largest integer an `f64` represents exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Which variant a `ScalarValue` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Number,
    String,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueKind::Bool => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
        })
    }
}

/// A boolean, number or string lobby data value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl ScalarValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            ScalarValue::Bool(_) => ValueKind::Bool,
            ScalarValue::Number(_) => ValueKind::Number,
            ScalarValue::String(_) => ValueKind::String,
        }
    }

    pub fn as_bool(&self) -> ApiResult<bool> {
        match self {
            ScalarValue::Bool(b) => Ok(*b),
            other => Err(other.mismatch(ValueKind::Bool)),
        }
    }

    pub fn as_f64(&self) -> ApiResult<f64> {
        match self {
            ScalarValue::Number(n) => Ok(*n),
            other => Err(other.mismatch(ValueKind::Number)),
        }
    }

    pub fn as_str(&self) -> ApiResult<&str> {
        match self {
            ScalarValue::String(s) => Ok(s),
            other => Err(other.mismatch(ValueKind::String)),
        }
    }

    /// Whether this value has a JSON representation.
    pub fn is_encodable(&self) -> bool {
        match self {
            ScalarValue::Number(n) => n.is_finite(),
            _ => true,
        }
    }

    fn mismatch(&self, expected: ValueKind) -> ApiError {
        ApiError::TypeMismatch {
            expected,
            found: self.kind(),
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Bool(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Number(value)
    }
}

impl From<f32> for ScalarValue {
    fn from(value: f32) -> Self {
        ScalarValue::Number(f64::from(value))
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        ScalarValue::Number(f64::from(value))
    }
}

impl From<u32> for ScalarValue {
    fn from(value: u32) -> Self {
        ScalarValue::Number(f64::from(value))
    }
}

/// Values beyond 2^53 lose precision, as they would in any JSON number.
impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Number(value as f64)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::String(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::String(value)
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Bool(b) => write!(f, "{b}"),
            ScalarValue::Number(n) => write!(f, "{n}"),
            ScalarValue::String(s) => write!(f, "{s:?}"),
        }
    }
}

/// The exact integer an integral, in-range number corresponds to.
fn as_exact_integer(n: f64) -> Option<i64> {
    (n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_EXACT_INTEGER).then_some(n as i64)
}

impl Serialize for ScalarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScalarValue::Bool(b) => serializer.serialize_bool(*b),
            ScalarValue::Number(n) => match as_exact_integer(*n) {
                Some(i) => serializer.serialize_i64(i),
                None if n.is_finite() => serializer.serialize_f64(*n),
                None => Err(serde::ser::Error::custom(format!(
                    "number {n} has no JSON representation"
                ))),
            },
            ScalarValue::String(s) => serializer.serialize_str(s),
        }
    }
}

struct ScalarVisitor;

impl<'de> Visitor<'de> for ScalarVisitor {
    type Value = ScalarValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON boolean, number or string")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<ScalarValue, E> {
        Ok(ScalarValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<ScalarValue, E> {
        Ok(ScalarValue::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<ScalarValue, E> {
        Ok(ScalarValue::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<ScalarValue, E> {
        Ok(ScalarValue::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<ScalarValue, E> {
        Ok(ScalarValue::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<ScalarValue, E> {
        Ok(ScalarValue::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<ScalarValue, E> {
        Err(E::custom(ApiError::Decode { found: "null" }))
    }

    fn visit_none<E: de::Error>(self) -> Result<ScalarValue, E> {
        Err(E::custom(ApiError::Decode { found: "null" }))
    }

    fn visit_seq<A: de::SeqAccess<'de>>(self, _seq: A) -> Result<ScalarValue, A::Error> {
        Err(de::Error::custom(ApiError::Decode { found: "array" }))
    }

    fn visit_map<A: de::MapAccess<'de>>(self, _map: A) -> Result<ScalarValue, A::Error> {
        Err(de::Error::custom(ApiError::Decode { found: "object" }))
    }
}

impl<'de> Deserialize<'de> for ScalarValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ScalarVisitor)
    }
}

/// Encode a scalar into its JSON wire value.
pub fn encode(value: &ScalarValue) -> ApiResult<serde_json::Value> {
    match value {
        ScalarValue::Bool(b) => Ok(serde_json::Value::Bool(*b)),
        ScalarValue::Number(n) => match as_exact_integer(*n) {
            Some(i) => Ok(serde_json::Value::from(i)),
            None => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .ok_or_else(|| {
                    ApiError::Serialization(format!("number {n} has no JSON representation"))
                }),
        },
        ScalarValue::String(s) => Ok(serde_json::Value::String(s.clone())),
    }
}

/// Decode a JSON wire value into a scalar, rejecting non-scalar shapes.
pub fn decode(value: &serde_json::Value) -> ApiResult<ScalarValue> {
    match value {
        serde_json::Value::Bool(b) => Ok(ScalarValue::Bool(*b)),
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(ScalarValue::Number)
            .ok_or(ApiError::Decode { found: "number" }),
        serde_json::Value::String(s) => Ok(ScalarValue::String(s.clone())),
        serde_json::Value::Null => Err(ApiError::Decode { found: "null" }),
        serde_json::Value::Array(_) => Err(ApiError::Decode { found: "array" }),
        serde_json::Value::Object(_) => Err(ApiError::Decode { found: "object" }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn roundtrip_each_variant() {
        let values = [
            ScalarValue::from(true),
            ScalarValue::from(false),
            ScalarValue::from(0),
            ScalarValue::from(-42),
            ScalarValue::from(3.25),
            ScalarValue::from(1e300),
            ScalarValue::from(""),
            ScalarValue::from("room / 1?#"),
        ];
        for value in values {
            let wire = encode(&value).unwrap();
            assert_eq!(decode(&wire).unwrap(), value, "{value}");

            let text = serde_json::to_string(&value).unwrap();
            let back: ScalarValue = serde_json::from_str(&text).unwrap();
            assert_eq!(back, value, "{text}");
        }
    }

    #[test]
    fn encodes_bare_scalars() {
        assert_eq!(serde_json::to_string(&ScalarValue::from(true)).unwrap(), "true");
        assert_eq!(serde_json::to_string(&ScalarValue::from(10)).unwrap(), "10");
        assert_eq!(serde_json::to_string(&ScalarValue::from(0.5)).unwrap(), "0.5");
        assert_eq!(serde_json::to_string(&ScalarValue::from("a")).unwrap(), "\"a\"");
    }

    #[test]
    fn integer_and_float_wire_numbers_share_a_variant() {
        assert_eq!(decode(&json!(10)).unwrap(), ScalarValue::Number(10.0));
        assert_eq!(decode(&json!(10.0)).unwrap(), ScalarValue::Number(10.0));
        assert_eq!(decode(&json!(u64::MAX)).unwrap().kind(), ValueKind::Number);
    }

    #[test]
    fn non_finite_numbers_are_never_written_as_null() {
        for n in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let value = ScalarValue::from(n);
            assert!(!value.is_encodable());
            assert!(serde_json::to_string(&value).is_err());
            assert!(matches!(encode(&value), Err(ApiError::Serialization(_))));
        }
    }

    #[test]
    fn decode_rejects_non_scalar_shapes() {
        for (wire, shape) in [(json!(null), "null"), (json!([1]), "array"), (json!({"a": 1}), "object")] {
            match decode(&wire) {
                Err(ApiError::Decode { found }) => assert_eq!(found, shape),
                other => panic!("expected decode error for {wire}, got {other:?}"),
            }
        }
    }

    #[test]
    fn deserialize_rejects_non_scalar_shapes() {
        let err = serde_json::from_str::<ScalarValue>("[true]").unwrap_err();
        assert!(err.to_string().contains("unexpected JSON array"), "{err}");
        let err = serde_json::from_str::<ScalarValue>("null").unwrap_err();
        assert!(err.to_string().contains("unexpected JSON null"), "{err}");
    }

    #[test]
    fn accessors_fail_on_wrong_variant() {
        let value = ScalarValue::from("hello");
        assert_eq!(value.as_str().unwrap(), "hello");
        match value.as_f64() {
            Err(ApiError::TypeMismatch { expected, found }) => {
                assert_eq!(expected, ValueKind::Number);
                assert_eq!(found, ValueKind::String);
            }
            other => panic!("expected type mismatch, got {other:?}"),
        }
        assert!(ScalarValue::from(1).as_bool().is_err());
        assert!(ScalarValue::from(false).as_str().is_err());
        assert!(!ScalarValue::from(false).as_bool().unwrap());
    }
}
