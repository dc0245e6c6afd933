use derive_more::{Display, From};

/// Handle of a composite item stored in an [`ItemArena`](crate::item::ItemArena).
///
/// Two handles are equal only when they name the same object; structural equality of the
/// objects behind them never matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("#{_0}")]
pub struct ItemRef(pub(crate) u32);

impl ItemRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifies one comptime expression group of a compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From)]
#[display("group{_0}")]
pub struct GroupId(pub u32);

/// Identifies one comptime variable (including generic parameters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From)]
#[display("var{_0}")]
pub struct VarId(pub u32);

/// Identifies one generic declaration site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From)]
#[display("site{_0}")]
pub struct SiteId(pub u32);
