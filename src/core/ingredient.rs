//! BK-002: Ingredient — a single typed argument bound to an operation.
//!
//! Raw config args (usually strings) are normalized into the ingredient's
//! declared semantic type once, at bind time. The raw arg is kept alongside
//! the coerced value so a recipe's config snapshot reproduces exactly what
//! the caller provided.

use serde_json::Value;
use thiserror::Error;

// ============================================================================
// Types
// ============================================================================

/// Declared semantic type of an ingredient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngredientType {
    /// Plain text, passed through unchanged.
    String,
    /// Plain text, single-line editor hint. Same coercion as String.
    ShortString,
    /// Text with escape sequences (`\n`, `\t`, `\xNN`, ...) unescaped.
    BinaryString,
    /// Single-line variant of BinaryString. Same coercion.
    BinaryShortString,
    /// Byte sequence; text input is parsed as whitespace-separated hex pairs.
    ByteSequence,
    /// Floating-point number.
    Number,
    /// Boolean flag.
    Boolean,
    /// One choice from a fixed set, passed through unchanged.
    Option,
}

/// A coerced ingredient value — the tagged union resolved at bind time.
#[derive(Debug, Clone, PartialEq)]
pub enum IngredientValue {
    Str(String),
    Bytes(Vec<u8>),
    Number(f64),
    Bool(bool),
}

impl IngredientValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Coercion failure, before positional context is attached.
#[derive(Debug, Clone, Error)]
#[error("expected {expected}, got \"{sample}\"")]
pub struct CoercionError {
    pub expected: &'static str,
    /// Truncated (≤10 char) sample of the offending input.
    pub sample: String,
}

// ============================================================================
// Ingredient
// ============================================================================

/// One typed argument bound to an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Ingredient {
    name: String,
    ty: IngredientType,
    raw: Value,
    value: IngredientValue,
}

impl Ingredient {
    /// Create from a static descriptor (name + type), with the type's
    /// neutral default value.
    pub fn new(name: impl Into<String>, ty: IngredientType) -> Self {
        let value = match ty {
            IngredientType::ByteSequence => IngredientValue::Bytes(Vec::new()),
            IngredientType::Number => IngredientValue::Number(0.0),
            IngredientType::Boolean => IngredientValue::Bool(false),
            _ => IngredientValue::Str(String::new()),
        };
        Self {
            name: name.into(),
            ty,
            raw: Value::Null,
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ingredient_type(&self) -> IngredientType {
        self.ty
    }

    /// The caller-provided raw arg, for config snapshots.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// The coerced value used at execution time.
    pub fn value(&self) -> &IngredientValue {
        &self.value
    }

    /// Store a raw arg, coercing it to the declared type. Coercion failure
    /// is fatal and immediate.
    pub fn set_value(&mut self, raw: &Value) -> Result<(), CoercionError> {
        self.value = prepare(raw, self.ty)?;
        self.raw = raw.clone();
        Ok(())
    }
}

// ============================================================================
// Coercion
// ============================================================================

/// Normalize a raw arg into its declared semantic type. Pure, no side
/// effects, no dependency on any other ingredient.
pub fn prepare(raw: &Value, ty: IngredientType) -> Result<IngredientValue, CoercionError> {
    match ty {
        IngredientType::BinaryString | IngredientType::BinaryShortString => {
            Ok(IngredientValue::Str(unescape(&raw_text(raw))))
        }
        IngredientType::ByteSequence => match raw {
            Value::Array(items) => {
                let mut bytes = Vec::with_capacity(items.len());
                for item in items {
                    let b = item
                        .as_u64()
                        .filter(|b| *b <= 0xFF)
                        .ok_or_else(|| coercion("byte sequence", &item.to_string()))?;
                    bytes.push(b as u8);
                }
                Ok(IngredientValue::Bytes(bytes))
            }
            Value::String(s) => parse_hex(s).map(IngredientValue::Bytes),
            other => Err(coercion("byte sequence", &other.to_string())),
        },
        IngredientType::Number => match raw {
            Value::Number(n) => Ok(IngredientValue::Number(n.as_f64().unwrap_or(0.0))),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(IngredientValue::Number)
                .map_err(|_| coercion("number", s)),
            other => Err(coercion("number", &other.to_string())),
        },
        IngredientType::Boolean => match raw {
            Value::Bool(b) => Ok(IngredientValue::Bool(*b)),
            other => Err(coercion("boolean", &other.to_string())),
        },
        // Plain text and option choices pass through unchanged.
        _ => Ok(IngredientValue::Str(raw_text(raw))),
    }
}

fn coercion(expected: &'static str, sample: &str) -> CoercionError {
    CoercionError {
        expected,
        sample: truncate(sample, 10),
    }
}

fn raw_text(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Truncate to at most `max` characters, marking the cut.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{head}…")
    }
}

/// Strip whitespace and parse hex pairs into bytes.
fn parse_hex(s: &str) -> Result<Vec<u8>, CoercionError> {
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.len() % 2 != 0 {
        return Err(coercion("hex byte pairs", s));
    }
    (0..compact.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&compact[i..i + 2], 16).map_err(|_| coercion("hex byte pairs", s))
        })
        .collect()
}

/// Unescape control-character sequences in text.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('x') => push_hex_escape(&mut out, &mut chars, 2, 'x'),
            Some('u') => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    let digits: String =
                        std::iter::from_fn(|| chars.next_if(|c| *c != '}')).collect();
                    chars.next(); // closing brace
                    match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
                        Some(ch) => out.push(ch),
                        None => {
                            out.push_str("\\u{");
                            out.push_str(&digits);
                            out.push('}');
                        }
                    }
                } else {
                    push_hex_escape(&mut out, &mut chars, 4, 'u');
                }
            }
            // Unknown escape: keep it verbatim.
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn push_hex_escape(
    out: &mut String,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    len: usize,
    marker: char,
) {
    let digits: String = std::iter::from_fn(|| chars.next_if(char::is_ascii_hexdigit))
        .take(len)
        .collect();
    if digits.len() == len {
        if let Some(ch) = u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
            out.push(ch);
            return;
        }
    }
    out.push('\\');
    out.push(marker);
    out.push_str(&digits);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bk002_binary_string_unescapes() {
        let v = prepare(&json!("a\\nb\\tc"), IngredientType::BinaryString).unwrap();
        assert_eq!(v, IngredientValue::Str("a\nb\tc".to_string()));
    }

    #[test]
    fn test_bk002_unescape_hex_and_unicode() {
        assert_eq!(unescape("\\x41\\u0042\\u{1F600}"), "AB😀");
    }

    #[test]
    fn test_bk002_unescape_idempotent_on_plain_text() {
        assert_eq!(unescape("already\nplain"), "already\nplain");
    }

    #[test]
    fn test_bk002_unescape_keeps_unknown_escapes() {
        assert_eq!(unescape("\\q"), "\\q");
        assert_eq!(unescape("trailing\\"), "trailing\\");
    }

    #[test]
    fn test_bk002_byte_sequence_from_hex_text() {
        let v = prepare(&json!("61 62\n63"), IngredientType::ByteSequence).unwrap();
        assert_eq!(v, IngredientValue::Bytes(vec![0x61, 0x62, 0x63]));
    }

    #[test]
    fn test_bk002_byte_sequence_passthrough() {
        let v = prepare(&json!([1, 2, 255]), IngredientType::ByteSequence).unwrap();
        assert_eq!(v, IngredientValue::Bytes(vec![1, 2, 255]));
    }

    #[test]
    fn test_bk002_byte_sequence_rejects_odd_hex() {
        assert!(prepare(&json!("abc"), IngredientType::ByteSequence).is_err());
    }

    #[test]
    fn test_bk002_number_from_string() {
        let v = prepare(&json!("2.5"), IngredientType::Number).unwrap();
        assert_eq!(v, IngredientValue::Number(2.5));
    }

    #[test]
    fn test_bk002_number_error_truncates_sample() {
        let err = prepare(
            &json!("definitely not a number"),
            IngredientType::Number,
        )
        .unwrap_err();
        assert_eq!(err.sample, "definitely…");
        assert_eq!(err.expected, "number");
    }

    #[test]
    fn test_bk002_string_passthrough() {
        let v = prepare(&json!("raw \\n kept"), IngredientType::String).unwrap();
        assert_eq!(v, IngredientValue::Str("raw \\n kept".to_string()));
    }

    #[test]
    fn test_bk002_boolean() {
        let v = prepare(&json!(true), IngredientType::Boolean).unwrap();
        assert_eq!(v, IngredientValue::Bool(true));
        assert!(prepare(&json!("yes"), IngredientType::Boolean).is_err());
    }

    #[test]
    fn test_bk002_ingredient_keeps_raw_arg() {
        let mut ing = Ingredient::new("Split delimiter", IngredientType::BinaryString);
        ing.set_value(&json!("\\n")).unwrap();
        assert_eq!(ing.raw(), &json!("\\n"));
        assert_eq!(ing.value(), &IngredientValue::Str("\n".to_string()));
    }

    #[test]
    fn test_bk002_ingredient_defaults() {
        let ing = Ingredient::new("Radix", IngredientType::Number);
        assert_eq!(ing.value(), &IngredientValue::Number(0.0));
        assert_eq!(ing.raw(), &Value::Null);
    }
}
