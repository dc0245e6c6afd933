//! Compile-time values.
//!
//! An [`Item`] is either a host primitive, a handle to a composite object living in an
//! [`ItemArena`], or an [`UnknownItem`] standing in for a value that is not available.

mod arena;
mod nest;
mod ty;

pub use arena::*;
pub use nest::*;
pub use ty::*;

use std::fmt::{Display, Formatter};

use crate::context::{CompContext, VarLookup};
use crate::error::Result;
use crate::id::{GroupId, ItemRef, VarId};

/// Outcome of an attempt to produce a value whose inputs may not be known yet.
///
/// `Pending` is ordinary control flow: the caller leaves its own work unfinished and retries
/// on a later sweep.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Resolved(T),
    Pending,
}

impl<T> Resolution<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Resolution::Pending)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Resolution::Resolved(value) => Resolution::Resolved(f(value)),
            Resolution::Pending => Resolution::Pending,
        }
    }

    pub fn resolved(self) -> Option<T> {
        match self {
            Resolution::Resolved(value) => Some(value),
            Resolution::Pending => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Undefined,
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    Ref(ItemRef),
    Unknown(UnknownItem),
}

impl Item {
    pub fn str(value: impl Into<String>) -> Self {
        Item::Str(value.into())
    }

    pub fn absent(reason: impl Into<String>) -> Self {
        Item::Unknown(UnknownItem::Absent(AbsentItem {
            reason: reason.into(),
        }))
    }

    pub fn unresolved_slot(group: GroupId, slot: usize) -> Self {
        Item::Unknown(UnknownItem::Unresolved(UnresolvedItem::Slot { group, slot }))
    }

    pub fn unresolved_var(var: VarId) -> Self {
        Item::Unknown(UnknownItem::Unresolved(UnresolvedItem::Var(var)))
    }

    pub fn item_ref(&self) -> Option<ItemRef> {
        match self {
            Item::Ref(r) => Some(*r),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Item::Unknown(_))
    }

    /// Host primitives are never tracked; they are always written inline.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Item::Undefined | Item::Null | Item::Bool(_) | Item::Num(_) | Item::Str(_)
        )
    }
}

impl Display for Item {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Item::Undefined => write!(f, "undefined"),
            Item::Null => write!(f, "null"),
            Item::Bool(b) => write!(f, "{}", b),
            Item::Num(n) => write!(f, "{}", n),
            Item::Str(s) => write!(f, "{:?}", s),
            Item::Ref(r) => write!(f, "{}", r),
            Item::Unknown(unknown) => write!(f, "{}", unknown),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnknownItem {
    Absent(AbsentItem),
    Unresolved(UnresolvedItem),
}

impl Display for UnknownItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            UnknownItem::Absent(absent) => write!(f, "<absent: {}>", absent.reason),
            UnknownItem::Unresolved(UnresolvedItem::Slot { group, slot }) => {
                write!(f, "<unresolved {}[{}]>", group, slot)
            }
            UnknownItem::Unresolved(UnresolvedItem::Var(var)) => write!(f, "<unresolved {}>", var),
        }
    }
}

/// A value that can never be obtained, such as an unset generic parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct AbsentItem {
    pub reason: String,
}

/// A value that is not known yet but may become known once its slot or variable resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnresolvedItem {
    Slot { group: GroupId, slot: usize },
    Var(VarId),
}

impl UnresolvedItem {
    pub fn read(&self, ctx: &CompContext<'_>) -> Result<Resolution<Item>> {
        match *self {
            UnresolvedItem::Slot { group, slot } => ctx.get_slot_item(group, slot),
            UnresolvedItem::Var(var) => Ok(match ctx.get_var_item(var)? {
                VarLookup::Known(item) => Resolution::Resolved(item),
                VarLookup::Pending => Resolution::Pending,
                VarLookup::Unqualified => {
                    Resolution::Resolved(Item::absent(format!("{} is not qualified", var)))
                }
            }),
        }
    }
}

/// Check that no unknown item remains.
///
/// Any absent item is fatal. A remaining unresolved item yields `Pending` so the caller can
/// decide whether another attempt makes sense.
pub fn validate_known_items<'a>(items: impl IntoIterator<Item = &'a Item>) -> Result<Resolution<()>> {
    let mut pending = false;
    for item in items {
        match item {
            Item::Unknown(UnknownItem::Absent(absent)) => {
                return Err(crate::error::Error::unknown_item(absent.reason.clone()));
            }
            Item::Unknown(UnknownItem::Unresolved(_)) => pending = true,
            _ => {}
        }
    }
    Ok(if pending {
        Resolution::Pending
    } else {
        Resolution::Resolved(())
    })
}
