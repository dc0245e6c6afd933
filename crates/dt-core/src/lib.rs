#[macro_use]
pub mod macros;

pub mod context;
pub mod diagnostics;
pub mod error;
pub mod expr;
pub mod generic;
pub mod id;
pub mod item;
pub mod runtime;

// Re-export commonly used items for convenience
pub use tracing;

pub use context::{CompContext, SweepReport, VarBinding, VarLookup};
pub use id::{GroupId, ItemRef, SiteId, VarId};
pub use item::{Item, ItemArena, Resolution, UnknownItem, UnresolvedItem};

// Alias for error types
pub type Error = crate::error::Error;
pub type Result<T> = crate::error::Result<T>;
