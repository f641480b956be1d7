//! BK-001: Dish — the typed value container flowing between operations.
//!
//! A dish carries one value in a tagged union. Operations declare the dish
//! type they consume and produce; `get` converts on demand through a fixed
//! conversion matrix and anything outside the matrix fails with a typed
//! conversion error. Conversion is pure: it never mutates the container.

use super::error::EngineError;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use std::fmt;

// ============================================================================
// Type tags
// ============================================================================

/// Declared type of a dish value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DishType {
    /// UTF-8 text.
    String,
    /// Raw byte sequence.
    ByteSequence,
    /// Double-precision float.
    Number,
    /// Arbitrary-precision decimal.
    BigNumber,
    /// Structured JSON data.
    Json,
    /// Opaque binary buffer (same representation as ByteSequence, distinct tag).
    Buffer,
    /// Named file contents.
    File,
    /// List of child dishes, used by Fork fan-out/fan-in.
    List,
}

impl fmt::Display for DishType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::ByteSequence => write!(f, "byte sequence"),
            Self::Number => write!(f, "number"),
            Self::BigNumber => write!(f, "big number"),
            Self::Json => write!(f, "json"),
            Self::Buffer => write!(f, "buffer"),
            Self::File => write!(f, "file"),
            Self::List => write!(f, "list"),
        }
    }
}

// ============================================================================
// Values
// ============================================================================

/// A dish value. The variant is the type tag, so a `set` replaces value and
/// tag atomically by construction.
#[derive(Debug, Clone, PartialEq)]
pub enum DishValue {
    Str(String),
    Bytes(Vec<u8>),
    Number(f64),
    Big(Decimal),
    Json(serde_json::Value),
    Buffer(Vec<u8>),
    File { name: String, bytes: Vec<u8> },
    List(Vec<Dish>),
}

impl DishValue {
    /// The type tag of this value.
    pub fn dish_type(&self) -> DishType {
        match self {
            Self::Str(_) => DishType::String,
            Self::Bytes(_) => DishType::ByteSequence,
            Self::Number(_) => DishType::Number,
            Self::Big(_) => DishType::BigNumber,
            Self::Json(_) => DishType::Json,
            Self::Buffer(_) => DishType::Buffer,
            Self::File { .. } => DishType::File,
            Self::List(_) => DishType::List,
        }
    }

    /// Borrow as text, when the value is textual.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as bytes, when the value is a byte sequence or buffer.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) | Self::Buffer(b) => Some(b),
            _ => None,
        }
    }
}

// ============================================================================
// Dish
// ============================================================================

/// The value container owned exclusively by the bake operating on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Dish {
    value: DishValue,
}

impl Dish {
    pub fn new(value: DishValue) -> Self {
        Self { value }
    }

    /// Current type tag.
    pub fn dish_type(&self) -> DishType {
        self.value.dish_type()
    }

    /// Borrow the current value without conversion.
    pub fn value(&self) -> &DishValue {
        &self.value
    }

    /// Replace the value (and with it the type tag).
    pub fn set(&mut self, value: DishValue) {
        self.value = value;
    }

    /// Convert the current value to `target` on demand.
    ///
    /// Pure and idempotent: calling twice yields equal values and the
    /// container is never mutated. Conversions outside the matrix fail with
    /// `EngineError::Conversion` naming both types.
    pub fn get(&self, target: DishType) -> Result<DishValue, EngineError> {
        if self.dish_type() == target {
            return Ok(self.value.clone());
        }
        log::trace!("converting dish {} -> {}", self.dish_type(), target);
        convert(&self.value, target)
    }
}

impl Default for Dish {
    fn default() -> Self {
        Self::new(DishValue::Str(String::new()))
    }
}

impl From<&str> for Dish {
    fn from(s: &str) -> Self {
        Self::new(DishValue::Str(s.to_string()))
    }
}

impl From<String> for Dish {
    fn from(s: String) -> Self {
        Self::new(DishValue::Str(s))
    }
}

impl From<Vec<u8>> for Dish {
    fn from(b: Vec<u8>) -> Self {
        Self::new(DishValue::Bytes(b))
    }
}

// ============================================================================
// Conversion matrix
// ============================================================================

fn unsupported(value: &DishValue, target: DishType) -> EngineError {
    EngineError::Conversion {
        from: value.dish_type(),
        to: target,
    }
}

/// The fixed conversion matrix. Identity conversions are handled by `get`.
fn convert(value: &DishValue, target: DishType) -> Result<DishValue, EngineError> {
    match target {
        DishType::String => to_string_value(value).map(DishValue::Str),
        DishType::ByteSequence => to_bytes(value, target).map(DishValue::Bytes),
        DishType::Buffer => to_bytes(value, target).map(DishValue::Buffer),
        DishType::Number => to_number(value).map(DishValue::Number),
        DishType::BigNumber => to_big(value).map(DishValue::Big),
        DishType::Json => to_json(value).map(DishValue::Json),
        DishType::File => to_bytes(value, target).map(|bytes| DishValue::File {
            name: "unknown".to_string(),
            bytes,
        }),
        DishType::List => match value {
            DishValue::Str(s) => Ok(DishValue::List(vec![Dish::from(s.as_str())])),
            _ => Err(unsupported(value, target)),
        },
    }
}

fn to_string_value(value: &DishValue) -> Result<String, EngineError> {
    match value {
        DishValue::Str(s) => Ok(s.clone()),
        // Byte-to-text is lossy-safe: invalid UTF-8 becomes U+FFFD.
        DishValue::Bytes(b) | DishValue::Buffer(b) => Ok(String::from_utf8_lossy(b).into_owned()),
        DishValue::Number(n) => Ok(format_f64(*n)),
        DishValue::Big(d) => Ok(d.to_string()),
        DishValue::Json(v) => Ok(v.to_string()),
        DishValue::File { bytes, .. } => Ok(String::from_utf8_lossy(bytes).into_owned()),
        DishValue::List(items) => {
            let mut out = String::new();
            for item in items {
                match item.get(DishType::String)? {
                    DishValue::Str(s) => out.push_str(&s),
                    _ => unreachable!("string conversion returned a non-string"),
                }
            }
            Ok(out)
        }
    }
}

fn to_bytes(value: &DishValue, target: DishType) -> Result<Vec<u8>, EngineError> {
    match value {
        DishValue::Str(s) => Ok(s.clone().into_bytes()),
        DishValue::Bytes(b) | DishValue::Buffer(b) => Ok(b.clone()),
        DishValue::File { bytes, .. } => Ok(bytes.clone()),
        DishValue::Number(n) => Ok(format_f64(*n).into_bytes()),
        DishValue::Big(d) => Ok(d.to_string().into_bytes()),
        other => Err(unsupported(other, target)),
    }
}

fn to_number(value: &DishValue) -> Result<f64, EngineError> {
    match value {
        DishValue::Number(n) => Ok(*n),
        DishValue::Big(d) => d
            .to_f64()
            .ok_or_else(|| unsupported(value, DishType::Number)),
        DishValue::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| unsupported(value, DishType::Number)),
        DishValue::Bytes(b) | DishValue::Buffer(b) => String::from_utf8_lossy(b)
            .trim()
            .parse::<f64>()
            .map_err(|_| unsupported(value, DishType::Number)),
        // Structured data to number is illegal by design of the matrix.
        other => Err(unsupported(other, DishType::Number)),
    }
}

fn to_big(value: &DishValue) -> Result<Decimal, EngineError> {
    match value {
        DishValue::Big(d) => Ok(*d),
        DishValue::Number(n) => {
            Decimal::from_f64(*n).ok_or_else(|| unsupported(value, DishType::BigNumber))
        }
        DishValue::Str(s) => s
            .trim()
            .parse::<Decimal>()
            .map_err(|_| unsupported(value, DishType::BigNumber)),
        DishValue::Bytes(b) | DishValue::Buffer(b) => String::from_utf8_lossy(b)
            .trim()
            .parse::<Decimal>()
            .map_err(|_| unsupported(value, DishType::BigNumber)),
        other => Err(unsupported(other, DishType::BigNumber)),
    }
}

fn to_json(value: &DishValue) -> Result<serde_json::Value, EngineError> {
    match value {
        DishValue::Json(v) => Ok(v.clone()),
        DishValue::Str(s) => {
            serde_json::from_str(s).map_err(|_| unsupported(value, DishType::Json))
        }
        DishValue::Bytes(b) | DishValue::Buffer(b) => {
            serde_json::from_slice(b).map_err(|_| unsupported(value, DishType::Json))
        }
        other => Err(unsupported(other, DishType::Json)),
    }
}

/// Format a float without a trailing ".0" for whole values.
pub(crate) fn format_f64(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bk001_identity_get() {
        let dish = Dish::from("hello");
        assert_eq!(
            dish.get(DishType::String).unwrap(),
            DishValue::Str("hello".to_string())
        );
    }

    #[test]
    fn test_bk001_get_is_idempotent_and_pure() {
        let dish = Dish::from("61 62");
        let a = dish.get(DishType::ByteSequence).unwrap();
        let b = dish.get(DishType::ByteSequence).unwrap();
        assert_eq!(a, b);
        // Container untouched — tag still string.
        assert_eq!(dish.dish_type(), DishType::String);
    }

    #[test]
    fn test_bk001_string_bytes_roundtrip() {
        let dish = Dish::from("ab");
        assert_eq!(
            dish.get(DishType::ByteSequence).unwrap(),
            DishValue::Bytes(vec![0x61, 0x62])
        );
        let dish = Dish::from(vec![0x63u8, 0x64]);
        assert_eq!(
            dish.get(DishType::String).unwrap(),
            DishValue::Str("cd".to_string())
        );
    }

    #[test]
    fn test_bk001_bytes_to_string_is_lossy_safe() {
        let dish = Dish::from(vec![0xFFu8, 0x61]);
        let DishValue::Str(s) = dish.get(DishType::String).unwrap() else {
            panic!("expected string");
        };
        assert!(s.contains('\u{FFFD}'));
        assert!(s.contains('a'));
    }

    #[test]
    fn test_bk001_string_to_number() {
        let dish = Dish::from(" 42.5 ");
        assert_eq!(
            dish.get(DishType::Number).unwrap(),
            DishValue::Number(42.5)
        );
    }

    #[test]
    fn test_bk001_non_numeric_string_fails() {
        let dish = Dish::from("duck");
        let err = dish.get(DishType::Number).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Conversion {
                from: DishType::String,
                to: DishType::Number,
            }
        ));
    }

    #[test]
    fn test_bk001_json_to_number_is_illegal() {
        let dish = Dish::new(DishValue::Json(serde_json::json!({"a": 1})));
        let err = dish.get(DishType::Number).unwrap_err();
        assert_eq!(err.to_string(), "cannot convert json to number");
    }

    #[test]
    fn test_bk001_number_to_string_whole() {
        let dish = Dish::new(DishValue::Number(7.0));
        assert_eq!(
            dish.get(DishType::String).unwrap(),
            DishValue::Str("7".to_string())
        );
    }

    #[test]
    fn test_bk001_big_number_conversions() {
        let dish = Dish::from("1234567890123456789012345.5");
        let DishValue::Big(d) = dish.get(DishType::BigNumber).unwrap() else {
            panic!("expected decimal");
        };
        assert_eq!(d.to_string(), "1234567890123456789012345.5");

        let dish = Dish::new(DishValue::Big(Decimal::new(255, 1)));
        assert_eq!(
            dish.get(DishType::String).unwrap(),
            DishValue::Str("25.5".to_string())
        );
    }

    #[test]
    fn test_bk001_json_string_roundtrip() {
        let dish = Dish::from(r#"{"k":[1,2]}"#);
        let DishValue::Json(v) = dish.get(DishType::Json).unwrap() else {
            panic!("expected json");
        };
        assert_eq!(v["k"][1], 2);
    }

    #[test]
    fn test_bk001_buffer_and_bytes_share_representation() {
        let dish = Dish::from(vec![1u8, 2, 3]);
        assert_eq!(
            dish.get(DishType::Buffer).unwrap(),
            DishValue::Buffer(vec![1, 2, 3])
        );
    }

    #[test]
    fn test_bk001_file_conversions() {
        let dish = Dish::from("content");
        let DishValue::File { name, bytes } = dish.get(DishType::File).unwrap() else {
            panic!("expected file");
        };
        assert_eq!(name, "unknown");
        assert_eq!(bytes, b"content");

        let file = Dish::new(DishValue::File {
            name: "x.txt".to_string(),
            bytes: b"hi".to_vec(),
        });
        assert_eq!(
            file.get(DishType::String).unwrap(),
            DishValue::Str("hi".to_string())
        );
    }

    #[test]
    fn test_bk001_list_to_string_concatenates() {
        let dish = Dish::new(DishValue::List(vec![Dish::from("a"), Dish::from("b")]));
        assert_eq!(
            dish.get(DishType::String).unwrap(),
            DishValue::Str("ab".to_string())
        );
    }

    #[test]
    fn test_bk001_string_to_list_single_element() {
        let dish = Dish::from("solo");
        let DishValue::List(items) = dish.get(DishType::List).unwrap() else {
            panic!("expected list");
        };
        assert_eq!(items.len(), 1);
        assert_eq!(items[0], Dish::from("solo"));
    }

    #[test]
    fn test_bk001_set_replaces_value_and_tag() {
        let mut dish = Dish::from("text");
        dish.set(DishValue::Number(1.0));
        assert_eq!(dish.dish_type(), DishType::Number);
        assert_eq!(dish.value(), &DishValue::Number(1.0));
    }
}
