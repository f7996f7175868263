//! Scalar type registry and sigil resolution.
//!
//! Types are reference-counted rather than interned by index: every AST node
//! that carries a type clones an `Rc<Type>` pointing back into the handful
//! of built-ins (or into a per-parse cache of parametric types), and
//! equality compares the type's name and bounds rather than the pointer.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::OnceLock;

use crate::error::{ParseError, ParseErrorKind};

/// The numeric range a type's values must fall within, if any.
#[derive(Debug, Clone, PartialEq)]
pub enum Bounds {
    /// No numeric range (e.g. `string`, `_none`).
    None,
    Int(i128, i128),
    Float(f64, f64),
}

/// A scalar type: a built-in, or a cached parametric fixed-width type.
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub name: String,
    pub bounds: Bounds,
}

impl Type {
    fn int(name: &str, min: i128, max: i128) -> Type {
        Type {
            name: name.to_string(),
            bounds: Bounds::Int(min, max),
        }
    }

    fn float(name: &str, min: f64, max: f64) -> Type {
        Type {
            name: name.to_string(),
            bounds: Bounds::Float(min, max),
        }
    }

    fn none(name: &str) -> Type {
        Type {
            name: name.to_string(),
            bounds: Bounds::None,
        }
    }

    /// `true` when a value fits this type's declared range.
    pub fn contains_int(&self, v: i128) -> bool {
        matches!(self.bounds, Bounds::Int(min, max) if v >= min && v <= max)
    }

    pub fn is_signed_int(&self) -> bool {
        matches!(self.bounds, Bounds::Int(min, _) if min < 0)
    }
}

fn signed_bounds(width: u32) -> (i128, i128) {
    let max = (1i128 << (width - 1)) - 1;
    (-max - 1, max)
}

fn unsigned_bounds(width: u32) -> (i128, i128) {
    (0, (1i128 << width) - 1)
}

/// The fixed set of built-in scalar types, keyed by name.
pub fn builtin_types() -> &'static HashMap<&'static str, Rc<Type>> {
    static TYPES: OnceLock<HashMap<&'static str, Rc<Type>>> = OnceLock::new();
    TYPES.get_or_init(|| {
        let mut m = HashMap::new();
        let mut put = |name: &'static str, ty: Type| {
            m.insert(name, Rc::new(ty));
        };

        put("_none", Type::none("_none"));

        for (name, width) in [
            ("_bit", 1u32),
            ("_byte", 8),
            ("integer", 16),
            ("long", 32),
            ("_integer64", 64),
            ("_offset", 32),
        ] {
            let (min, max) = signed_bounds(width);
            put(name, Type::int(name, min, max));
        }
        for (name, width) in [
            ("_unsigned _bit", 1u32),
            ("_unsigned _byte", 8),
            ("_unsigned integer", 16),
            ("_unsigned long", 32),
            ("_unsigned _integer64", 64),
            ("_unsigned _offset", 32),
        ] {
            let (min, max) = unsigned_bounds(width);
            put(name, Type::int(name, min, max));
        }

        put("single", Type::float("single", f32::MIN as f64, f32::MAX as f64));
        put("double", Type::float("double", f64::MIN, f64::MAX));
        // 80-bit extended precision has no representable stdlib bound; the
        // original leaves this type's range implicit, so we mark it unbounded.
        put("_float", Type::float("_float", 0.0, 0.0));

        put("string", Type::none("string"));

        m
    })
}

pub fn default_type() -> Rc<Type> {
    Rc::clone(&builtin_types()["single"])
}

/// Sigil text (without any parametric width digits) to built-in type name.
fn builtin_sigils() -> &'static HashMap<&'static str, &'static str> {
    static SIGILS: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    SIGILS.get_or_init(|| {
        HashMap::from([
            ("`", "_bit"),
            ("~`", "_unsigned _bit"),
            ("%%", "_byte"),
            ("~%%", "_unsigned _byte"),
            ("%", "integer"),
            ("~%", "_unsigned integer"),
            ("&", "long"),
            ("~&", "_unsigned long"),
            ("&&", "_integer64"),
            ("~&&", "_unsigned _integer64"),
            ("%&", "_offset"),
            ("~%&", "_unsigned _offset"),
            ("!", "single"),
            ("#", "double"),
            ("##", "_float"),
            ("$", "string"),
        ])
    })
}

/// Per-parse cache of parametric fixed-width types (`_bit*N`, `string*N`, …),
/// canonicalized so repeated lookups of the same sigil return the same
/// `Rc<Type>` contents.
#[derive(Debug, Default)]
pub struct TypeCache {
    cache: HashMap<String, Rc<Type>>,
}

impl TypeCache {
    pub fn new() -> Self {
        TypeCache::default()
    }

    fn get_or_build(&mut self, name: String, build: impl FnOnce() -> Type) -> Rc<Type> {
        if let Some(ty) = self.cache.get(&name) {
            return Rc::clone(ty);
        }
        let ty = Rc::new(build());
        self.cache.insert(name, Rc::clone(&ty));
        ty
    }

    fn bit_type(&mut self, width: u32) -> Rc<Type> {
        let name = format!("_bit*{width}");
        let (min, max) = signed_bounds(width);
        self.get_or_build(name.clone(), move || Type::int(&name, min, max))
    }

    fn unsigned_bit_type(&mut self, width: u32) -> Rc<Type> {
        let name = format!("_unsigned _bit*{width}");
        let (min, max) = unsigned_bounds(width);
        self.get_or_build(name.clone(), move || Type::int(&name, min, max))
    }

    fn string_type(&mut self, width: u32) -> Rc<Type> {
        let name = format!("string*{width}");
        self.get_or_build(name.clone(), move || Type::none(&name))
    }
}

/// Resolves a lexical sigil (e.g. `"$"`, `` "`3" ``) to a type, creating and
/// caching a parametric type on first use. `sigil = None` yields the default
/// type (`single`).
pub fn lookup_sigil(sigil: Option<&str>, cache: &mut TypeCache) -> Result<Rc<Type>, ParseError> {
    let Some(sigil) = sigil else {
        return Ok(default_type());
    };
    if let Some(name) = builtin_sigils().get(sigil) {
        return Ok(Rc::clone(&builtin_types()[name]));
    }

    let (prefix, rest) = if let Some(rest) = sigil.strip_prefix("~`") {
        ("~`", rest)
    } else if let Some(rest) = sigil.strip_prefix('`') {
        ("`", rest)
    } else if let Some(rest) = sigil.strip_prefix('$') {
        ("$", rest)
    } else {
        return Err(ParseError::new(
            ParseErrorKind::UnknownSigil,
            format!("unknown sigil '{sigil}'"),
        ));
    };

    let width: u32 = rest.parse().map_err(|_| {
        ParseError::new(
            ParseErrorKind::UnknownSigil,
            format!("unknown sigil '{sigil}'"),
        )
    })?;
    if width == 0 {
        return Err(ParseError::new(
            ParseErrorKind::UnknownSigil,
            format!("unknown sigil '{sigil}'"),
        ));
    }

    Ok(match prefix {
        "`" => cache.bit_type(width),
        "~`" => cache.unsigned_bit_type(width),
        "$" => cache.string_type(width),
        _ => unreachable!(),
    })
}

/// A procedure's return type plus parameter types.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSignature {
    pub ret: Rc<Type>,
    pub params: Vec<Rc<Type>>,
}

/// Finds the narrowest of `integer`, `long`, `_integer64` that fits `v`
/// either directly or via a two's-complement reinterpretation of an
/// out-of-signed-range unsigned magnitude.
pub fn detect_base_int_type(v: u128) -> Result<(i64, Rc<Type>), ParseError> {
    for name in ["integer", "long", "_integer64"] {
        let ty = &builtin_types()[name];
        let Bounds::Int(min, max) = ty.bounds else {
            unreachable!()
        };
        if (v as i128) <= max {
            return Ok((v as i64, Rc::clone(ty)));
        }
        let unsigned_max = max - min; // 2*max + 1
        if (v as i128) <= unsigned_max {
            let reinterpreted = v as i128 - (unsigned_max + 1);
            return Ok((reinterpreted as i64, Rc::clone(ty)));
        }
    }
    Err(ParseError::new(
        ParseErrorKind::LiteralOutOfRange,
        format!("literal {v} does not fit any integer type"),
    ))
}

/// Constrains `v` to fit `ty`, reinterpreting as two's-complement if `ty` is
/// signed and `v` fits the type's unsigned range of the same width.
pub fn constrain_base_int_value(v: u128, ty: &Rc<Type>) -> Result<(i64, Rc<Type>), ParseError> {
    let Bounds::Int(min, max) = ty.bounds else {
        return Err(ParseError::new(
            ParseErrorKind::LiteralOutOfRange,
            format!("'{}' is not an integer type", ty.name),
        ));
    };
    if (v as i128) <= max {
        return Ok((v as i128 as i64, Rc::clone(ty)));
    }
    if min < 0 && (v as i128) <= 2 * max + 1 {
        let reinterpreted = v as i128 - (2 * max + 2);
        return Ok((reinterpreted as i64, Rc::clone(ty)));
    }
    Err(ParseError::new(
        ParseErrorKind::LiteralOutOfRange,
        format!("literal {v} out of range for '{}'", ty.name),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_sigil_round_trip() {
        let mut cache = TypeCache::new();
        for (sigil, name) in builtin_sigils() {
            let ty = lookup_sigil(Some(sigil), &mut cache).unwrap();
            assert_eq!(ty.name, *name);
        }
    }

    #[test]
    fn no_sigil_yields_default_type() {
        let mut cache = TypeCache::new();
        let ty = lookup_sigil(None, &mut cache).unwrap();
        assert_eq!(ty.name, "single");
    }

    #[test]
    fn parametric_sigil_is_cached_by_identity_of_content() {
        let mut cache = TypeCache::new();
        let a = lookup_sigil(Some("`3"), &mut cache).unwrap();
        let b = lookup_sigil(Some("`3"), &mut cache).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(a.name, "_bit*3");
    }

    #[test]
    fn unknown_sigil_errors() {
        let mut cache = TypeCache::new();
        assert!(lookup_sigil(Some("@"), &mut cache).is_err());
    }

    #[test]
    fn detect_base_int_type_picks_narrowest_fit() {
        let (v, ty) = detect_base_int_type(42).unwrap();
        assert_eq!(v, 42);
        assert_eq!(ty.name, "integer");
    }

    #[test]
    fn detect_base_int_type_reinterprets_two_s_complement() {
        // 0xFFFF fits unsigned 16-bit range but not signed; reinterpret as -1.
        let (v, ty) = detect_base_int_type(0xFFFF).unwrap();
        assert_eq!(v, -1);
        assert_eq!(ty.name, "integer");
    }

    #[test]
    fn constrain_base_int_value_reinterprets_when_sigil_given() {
        let integer = Rc::clone(&builtin_types()["integer"]);
        let (v, _) = constrain_base_int_value(0xFFFF, &integer).unwrap();
        assert_eq!(v, -1);
    }

    #[test]
    fn constrain_base_int_value_rejects_overflow() {
        let bit = Rc::clone(&builtin_types()["_bit"]);
        assert!(constrain_base_int_value(100, &bit).is_err());
    }
}
