use itertools::Itertools;

use dt_core::error::category;
use dt_core::item::{Item, ItemArena, Object};
use dt_core::runtime::ItemConverter;
use dt_core::{compile_bail, Result};

use crate::aggregate::Aggregator;
use crate::convert::{primitive_literal, render_function};
use crate::options::EmitOptions;

/// Writes items for the primary module.
pub struct BuildConverter<'a> {
    arena: &'a ItemArena,
    aggregator: &'a Aggregator,
    options: &'a EmitOptions,
}

impl<'a> BuildConverter<'a> {
    pub fn new(arena: &'a ItemArena, aggregator: &'a Aggregator, options: &'a EmitOptions) -> Self {
        Self {
            arena,
            aggregator,
            options,
        }
    }
}

impl ItemConverter for BuildConverter<'_> {
    fn convert_item(&mut self, item: &Item) -> Result<String> {
        if let Some(literal) = primitive_literal(item)? {
            return Ok(literal);
        }
        let Some(r) = item.item_ref() else {
            compile_bail!(category::CANNOT_CONVERT, "cannot convert {}", item);
        };
        if let Some(id) = self.aggregator.id_of(r) {
            return Ok(format!(
                "{}.{}",
                self.options.items_alias,
                self.options.binding_name(id)
            ));
        }
        let arena = self.arena;
        match arena.get(r) {
            Object::Seq(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| self.convert_item(item))
                    .try_collect()?;
                Ok(format!("[{}]", parts.join(", ")))
            }
            Object::Function(func) => render_function(func, self),
            other => compile_bail!(
                category::CANNOT_CONVERT,
                "cannot convert untracked {} {} inline",
                other.kind_name(),
                r
            ),
        }
    }
}
