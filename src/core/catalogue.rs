//! BK-004: Operation catalogue — descriptors the engine builds steps from.
//!
//! The catalogue is an explicit, constructor-injected object (no global
//! singletons): callers hand it to `Recipe::from_config` and can register
//! their own descriptors next to the built-ins. Built-ins cover a small set
//! of transforms plus the five flow-control primitives.

use super::dish::{format_f64, DishType, DishValue};
use super::error::EngineError;
use super::ingredient::{Ingredient, IngredientType, IngredientValue};
use super::operation::{FlowKind, OpRun, Operation};
use indexmap::IndexMap;

/// Declared argument shape: name + semantic type.
#[derive(Debug, Clone)]
pub struct ArgDescriptor {
    pub name: &'static str,
    pub ty: IngredientType,
}

impl ArgDescriptor {
    pub const fn new(name: &'static str, ty: IngredientType) -> Self {
        Self { name, ty }
    }
}

/// Static description of an operation the engine can instantiate.
#[derive(Debug, Clone)]
pub struct OpDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_type: DishType,
    pub output_type: DishType,
    pub run: OpRun,
    pub args: Vec<ArgDescriptor>,
}

/// The operation catalogue, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    ops: IndexMap<&'static str, OpDescriptor>,
}

impl Catalogue {
    /// An empty catalogue. Useful for callers supplying their own full set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in operation set.
    pub fn with_builtins() -> Self {
        let mut cat = Self::new();
        for desc in builtins() {
            cat.register(desc);
        }
        cat
    }

    /// Register a descriptor, replacing any previous one of the same name.
    pub fn register(&mut self, desc: OpDescriptor) {
        self.ops.insert(desc.name, desc);
    }

    pub fn get(&self, name: &str) -> Option<&OpDescriptor> {
        self.ops.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.ops.keys().copied()
    }

    /// Instantiate a fresh operation from its descriptor. Ingredient values
    /// start at their type defaults; the recipe builder binds the step args.
    pub fn build(&self, name: &str) -> Result<Operation, EngineError> {
        let desc = self
            .get(name)
            .ok_or_else(|| EngineError::UnknownOperation(name.to_string()))?;
        let ingredients = desc
            .args
            .iter()
            .map(|a| Ingredient::new(a.name, a.ty))
            .collect();
        Ok(Operation::new(
            desc.name,
            desc.description,
            desc.input_type,
            desc.output_type,
            desc.run,
            ingredients,
        ))
    }
}

// ============================================================================
// Built-in descriptors
// ============================================================================

fn builtins() -> Vec<OpDescriptor> {
    vec![
        OpDescriptor {
            name: "To Hex",
            description: "Converts the input bytes to hexadecimal.",
            input_type: DishType::ByteSequence,
            output_type: DishType::String,
            run: OpRun::Transform(to_hex),
            args: vec![ArgDescriptor::new("Delimiter", IngredientType::Option)],
        },
        OpDescriptor {
            name: "From Hex",
            description: "Decodes hexadecimal text back into bytes.",
            input_type: DishType::String,
            output_type: DishType::ByteSequence,
            run: OpRun::Transform(from_hex),
            args: vec![ArgDescriptor::new("Delimiter", IngredientType::Option)],
        },
        OpDescriptor {
            name: "To Base",
            description: "Converts an integer to a different numeric base.",
            input_type: DishType::Number,
            output_type: DishType::String,
            run: OpRun::Transform(to_base),
            args: vec![ArgDescriptor::new("Radix", IngredientType::Number)],
        },
        OpDescriptor {
            name: "To Upper case",
            description: "Uppercases the input text.",
            input_type: DishType::String,
            output_type: DishType::String,
            run: OpRun::Transform(to_upper),
            args: vec![],
        },
        OpDescriptor {
            name: "To Lower case",
            description: "Lowercases the input text.",
            input_type: DishType::String,
            output_type: DishType::String,
            run: OpRun::Transform(to_lower),
            args: vec![],
        },
        OpDescriptor {
            name: "Reverse",
            description: "Reverses the input bytes.",
            input_type: DishType::ByteSequence,
            output_type: DishType::ByteSequence,
            run: OpRun::Transform(reverse),
            args: vec![],
        },
        OpDescriptor {
            name: "Fork",
            description: "Splits the input and runs the following operations over each part.",
            input_type: DishType::String,
            output_type: DishType::String,
            run: OpRun::Flow(FlowKind::Fork),
            args: vec![
                ArgDescriptor::new("Split delimiter", IngredientType::BinaryString),
                ArgDescriptor::new("Merge delimiter", IngredientType::BinaryString),
            ],
        },
        OpDescriptor {
            name: "Merge",
            description: "Ends the section of operations a Fork fans out over.",
            input_type: DishType::String,
            output_type: DishType::String,
            run: OpRun::Flow(FlowKind::Merge),
            args: vec![],
        },
        OpDescriptor {
            name: "Jump",
            description: "Moves execution forwards or backwards by a fixed amount.",
            input_type: DishType::String,
            output_type: DishType::String,
            run: OpRun::Flow(FlowKind::Jump),
            args: vec![
                ArgDescriptor::new("Jump amount", IngredientType::Number),
                ArgDescriptor::new("Maximum jumps", IngredientType::Number),
            ],
        },
        OpDescriptor {
            name: "Conditional Jump",
            description: "Jumps when the input matches a regular expression.",
            input_type: DishType::String,
            output_type: DishType::String,
            run: OpRun::Flow(FlowKind::ConditionalJump),
            args: vec![
                ArgDescriptor::new("Match (regex)", IngredientType::ShortString),
                ArgDescriptor::new("Jump amount", IngredientType::Number),
                ArgDescriptor::new("Maximum jumps", IngredientType::Number),
            ],
        },
        OpDescriptor {
            name: "Return",
            description: "Ends the recipe early.",
            input_type: DishType::String,
            output_type: DishType::String,
            run: OpRun::Flow(FlowKind::Return),
            args: vec![],
        },
    ]
}

// ============================================================================
// Built-in transforms
// ============================================================================

/// Map a delimiter option name to its text.
fn delimiter_text(name: &str) -> &'static str {
    match name {
        "Comma" => ",",
        "Semi-colon" => ";",
        "Colon" => ":",
        "Line feed" => "\n",
        "None" => "",
        // "Space" and anything unrecognized.
        _ => " ",
    }
}

fn arg_str<'a>(args: &'a [IngredientValue], idx: usize) -> &'a str {
    args.get(idx).and_then(|v| v.as_str()).unwrap_or_default()
}

fn to_hex(input: DishValue, args: &[IngredientValue]) -> Result<DishValue, EngineError> {
    let bytes = input
        .as_bytes()
        .ok_or_else(|| EngineError::op("expected byte input"))?;
    let delim = delimiter_text(arg_str(args, 0));
    let out = bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(delim);
    Ok(DishValue::Str(out))
}

fn from_hex(input: DishValue, _args: &[IngredientValue]) -> Result<DishValue, EngineError> {
    let text = input
        .as_str()
        .ok_or_else(|| EngineError::op("expected text input"))?;
    let compact: String = text.chars().filter(char::is_ascii_hexdigit).collect();
    if compact.len() % 2 != 0 {
        return Err(EngineError::op(format!(
            "odd number of hex digits ({})",
            compact.len()
        )));
    }
    let bytes = (0..compact.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&compact[i..i + 2], 16)
                .map_err(|e| EngineError::op(format!("bad hex pair: {e}")))
        })
        .collect::<Result<Vec<u8>, _>>()?;
    Ok(DishValue::Bytes(bytes))
}

fn to_base(input: DishValue, args: &[IngredientValue]) -> Result<DishValue, EngineError> {
    let DishValue::Number(n) = input else {
        return Err(EngineError::op("expected numeric input"));
    };
    if n.fract() != 0.0 || !n.is_finite() {
        return Err(EngineError::op(format!(
            "cannot change the base of a non-integer ({})",
            format_f64(n)
        )));
    }
    let radix = args
        .first()
        .and_then(|v| v.as_number())
        .unwrap_or(16.0) as u32;
    if !(2..=36).contains(&radix) {
        return Err(EngineError::op(format!(
            "radix must be between 2 and 36, got {radix}"
        )));
    }
    Ok(DishValue::Str(to_radix(n as i64, radix)))
}

/// Format an integer in an arbitrary radix (2..=36), lowercase digits.
fn to_radix(mut n: i64, radix: u32) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let negative = n < 0;
    let mut out = Vec::new();
    while n != 0 {
        let d = (n % i64::from(radix)).unsigned_abs() as usize;
        out.push(DIGITS[d]);
        n /= i64::from(radix);
    }
    if negative {
        out.push(b'-');
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

fn to_upper(input: DishValue, _args: &[IngredientValue]) -> Result<DishValue, EngineError> {
    match input {
        DishValue::Str(s) => Ok(DishValue::Str(s.to_uppercase())),
        _ => Err(EngineError::op("expected text input")),
    }
}

fn to_lower(input: DishValue, _args: &[IngredientValue]) -> Result<DishValue, EngineError> {
    match input {
        DishValue::Str(s) => Ok(DishValue::Str(s.to_lowercase())),
        _ => Err(EngineError::op("expected text input")),
    }
}

fn reverse(input: DishValue, _args: &[IngredientValue]) -> Result<DishValue, EngineError> {
    match input {
        DishValue::Bytes(mut b) => {
            b.reverse();
            Ok(DishValue::Bytes(b))
        }
        _ => Err(EngineError::op("expected byte input")),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bk004_builtin_lookup() {
        let cat = Catalogue::with_builtins();
        assert!(cat.get("To Hex").is_some());
        assert!(cat.get("Conditional Jump").is_some());
        assert!(cat.get("Base64 Bake").is_none());
    }

    #[test]
    fn test_bk004_build_unknown_operation() {
        let cat = Catalogue::with_builtins();
        let err = cat.build("Nonexistent").unwrap_err();
        assert_eq!(err.to_string(), "unknown operation 'Nonexistent'");
    }

    #[test]
    fn test_bk004_build_creates_fresh_instances() {
        let cat = Catalogue::with_builtins();
        let mut a = cat.build("Fork").unwrap();
        let b = cat.build("Fork").unwrap();
        a.set_breakpoint(true);
        assert!(!b.is_breakpoint());
    }

    #[test]
    fn test_bk004_register_custom_descriptor() {
        fn noop(input: DishValue, _: &[IngredientValue]) -> Result<DishValue, EngineError> {
            Ok(input)
        }
        let mut cat = Catalogue::new();
        cat.register(OpDescriptor {
            name: "Identity",
            description: "Passes the dish through.",
            input_type: DishType::String,
            output_type: DishType::String,
            run: OpRun::Transform(noop),
            args: vec![],
        });
        assert!(cat.build("Identity").is_ok());
    }

    #[test]
    fn test_bk004_to_hex_space_delimited() {
        let out = to_hex(
            DishValue::Bytes(vec![0x61, 0x62]),
            &[IngredientValue::Str("Space".to_string())],
        )
        .unwrap();
        assert_eq!(out, DishValue::Str("61 62".to_string()));
    }

    #[test]
    fn test_bk004_from_hex_ignores_delimiters() {
        let out = from_hex(
            DishValue::Str("61,62\n63".to_string()),
            &[IngredientValue::Str("Comma".to_string())],
        )
        .unwrap();
        assert_eq!(out, DishValue::Bytes(vec![0x61, 0x62, 0x63]));
    }

    #[test]
    fn test_bk004_to_base_radix_16() {
        let out = to_base(
            DishValue::Number(255.0),
            &[IngredientValue::Number(16.0)],
        )
        .unwrap();
        assert_eq!(out, DishValue::Str("ff".to_string()));
    }

    #[test]
    fn test_bk004_to_base_negative_and_binary() {
        assert_eq!(to_radix(-10, 2), "-1010");
        assert_eq!(to_radix(0, 36), "0");
        assert_eq!(to_radix(35, 36), "z");
    }

    #[test]
    fn test_bk004_to_base_rejects_non_integer() {
        let err = to_base(
            DishValue::Number(1.5),
            &[IngredientValue::Number(16.0)],
        )
        .unwrap_err();
        assert!(err.to_string().contains("non-integer"));
    }

    #[test]
    fn test_bk004_to_base_rejects_bad_radix() {
        let err = to_base(
            DishValue::Number(10.0),
            &[IngredientValue::Number(1.0)],
        )
        .unwrap_err();
        assert!(err.to_string().contains("radix"));
    }

    #[test]
    fn test_bk004_reverse() {
        let out = reverse(DishValue::Bytes(vec![1, 2, 3]), &[]).unwrap();
        assert_eq!(out, DishValue::Bytes(vec![3, 2, 1]));
    }

    #[test]
    fn test_bk004_catalogue_preserves_declaration_order() {
        let cat = Catalogue::with_builtins();
        let names: Vec<_> = cat.names().collect();
        assert_eq!(names.first(), Some(&"To Hex"));
        assert_eq!(names.last(), Some(&"Return"));
    }
}
