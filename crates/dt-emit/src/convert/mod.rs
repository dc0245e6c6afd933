//! Conversion strategies.
//!
//! - [`BuildConverter`] writes the primary module, which reaches tracked items through the
//!   companion module's namespace.
//! - [`SupportConverter`] writes the companion module, defining every tracked item and
//!   patching edges that point forward.
//! - [`ClosureConverter`] writes function bodies, resolving captured comptime variables to
//!   the values captured when the function was created.

mod build;
mod closure;
mod support;

pub use build::*;
pub use closure::*;
pub use support::*;

use dt_core::error::Error;
use dt_core::item::{Item, NestSlot, UnknownItem};
use dt_core::Result;

/// Literal text of a host primitive; `None` for composite references.
pub fn primitive_literal(item: &Item) -> Result<Option<String>> {
    Ok(Some(match item {
        Item::Undefined => "undefined".to_string(),
        Item::Null => "null".to_string(),
        Item::Bool(b) => b.to_string(),
        Item::Num(n) => number_literal(*n),
        Item::Str(s) => string_literal(s)?,
        Item::Ref(_) => return Ok(None),
        Item::Unknown(UnknownItem::Absent(absent)) => {
            return Err(Error::unknown_item(absent.reason.clone()))
        }
        Item::Unknown(unknown @ UnknownItem::Unresolved(_)) => {
            return Err(Error::unknown_item(format!("{} never resolved", unknown)))
        }
    }))
}

pub fn number_literal(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        (if n > 0.0 { "Infinity" } else { "-Infinity" }).to_string()
    } else {
        format!("{}", n)
    }
}

pub fn string_literal(s: &str) -> Result<String> {
    serde_json::to_string(s).map_err(|err| Error::generic(err.to_string()))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Key of an object literal entry.
pub(crate) fn property_key(name: &str) -> Result<String> {
    if is_identifier(name) {
        Ok(name.to_string())
    } else {
        string_literal(name)
    }
}

fn property_access(name: &str) -> Result<String> {
    if is_identifier(name) {
        Ok(format!(".{}", name))
    } else {
        Ok(format!("[{}]", string_literal(name)?))
    }
}

/// Access path from a parent's emitted value to the child stored at `slot`. `None` for
/// children only read when a function runs.
pub fn slot_accessor(slot: &NestSlot) -> Result<Option<String>> {
    Ok(Some(match slot {
        NestSlot::Index(idx) => format!("[{}]", idx),
        NestSlot::Field(name) => property_access(name)?,
        NestSlot::Feature(idx) => format!(".__features[{}]", idx),
        NestSlot::FeatureAnchor | NestSlot::TypeAnchor => ".anchor".to_string(),
        NestSlot::FeatureField(name) | NestSlot::TypeField(name) => {
            format!(".fields{}", property_access(name)?)
        }
        NestSlot::TypeElement => ".element".to_string(),
        NestSlot::TypeFeature(idx) => format!(".features[{}]", idx),
        NestSlot::QualArg { entry, index } => format!(".args[{}][{}]", entry, index),
        NestSlot::Capture(_) | NestSlot::BodyItem(_) => return Ok(None),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_render_as_literals() -> Result<()> {
        assert_eq!(primitive_literal(&Item::Num(3.0))?.unwrap(), "3");
        assert_eq!(primitive_literal(&Item::Num(0.5))?.unwrap(), "0.5");
        assert_eq!(primitive_literal(&Item::Num(f64::NEG_INFINITY))?.unwrap(), "-Infinity");
        assert_eq!(primitive_literal(&Item::str("a\"b"))?.unwrap(), r#""a\"b""#);
        assert_eq!(primitive_literal(&Item::Undefined)?.unwrap(), "undefined");
        assert!(primitive_literal(&Item::absent("T unset")).is_err());
        Ok(())
    }

    #[test]
    fn accessors_quote_non_identifiers() -> Result<()> {
        assert_eq!(slot_accessor(&NestSlot::Field("child".into()))?.unwrap(), ".child");
        assert_eq!(slot_accessor(&NestSlot::Field("my key".into()))?.unwrap(), "[\"my key\"]");
        assert_eq!(slot_accessor(&NestSlot::Capture("x".into()))?, None);
        Ok(())
    }
}
