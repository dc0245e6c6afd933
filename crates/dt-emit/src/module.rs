use dt_core::item::ItemArena;
use dt_core::runtime::Program;
use dt_core::{debug, Result};

use crate::aggregate::Aggregator;
use crate::convert::{BuildConverter, SupportConverter};
use crate::options::EmitOptions;

/// The primary module and its companion module, as source text.
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedModules {
    pub primary: String,
    pub support: String,
    pub primary_file: String,
    pub support_file: String,
    /// Deferred cycle patches in the companion module.
    pub patch_count: usize,
    /// Number of tracked items the companion module exports.
    pub tracked_count: usize,
}

/// Render `program` and every item the aggregator tracks.
///
/// The aggregator must already hold the closure of everything `program` mentions.
pub fn emit_modules(
    program: &Program,
    arena: &ItemArena,
    aggregator: &Aggregator,
    options: &EmitOptions,
) -> Result<EmittedModules> {
    let mut build = BuildConverter::new(arena, aggregator, options);
    let body = program.convert_to_output(&mut build)?;
    let primary = if aggregator.is_empty() {
        body
    } else {
        format!(
            "import * as {} from \"{}\";\n{}",
            options.items_alias, options.support_module, body
        )
    };
    let support = SupportConverter::new(arena, aggregator, options).emit_module()?;
    debug!(
        "emitted {} tracked items with {} patches",
        aggregator.len(),
        support.patch_count
    );
    Ok(EmittedModules {
        primary,
        support: support.text,
        primary_file: options.primary_module.clone(),
        support_file: options.support_file().to_string(),
        patch_count: support.patch_count,
        tracked_count: aggregator.len(),
    })
}
