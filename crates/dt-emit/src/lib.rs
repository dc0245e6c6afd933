// dt-emit: turns the resolved item graph of a unit into target source text
//
// - aggregate: identity assignment and reachability closure over tracked items
// - convert: Build / Support / Closure strategies for writing items
// - module: assembling the primary and companion modules

pub mod aggregate;
pub mod convert;
pub mod module;
pub mod options;

pub use aggregate::Aggregator;
pub use convert::{BuildConverter, ClosureConverter, SupportConverter, SupportModule};
pub use module::{emit_modules, EmittedModules};
pub use options::EmitOptions;
