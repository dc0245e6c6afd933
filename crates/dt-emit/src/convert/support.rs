use std::collections::HashSet;

use itertools::Itertools;

use dt_core::error::category;
use dt_core::item::{Field, Item, ItemArena, ItemType, ItemTypeKind, NestSlot, Object};
use dt_core::runtime::ItemConverter;
use dt_core::{compile_bail, ItemRef, Result};

use crate::aggregate::Aggregator;
use crate::convert::{primitive_literal, property_key, render_function, slot_accessor, string_literal};
use crate::options::EmitOptions;

/// Text of the companion module.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportModule {
    pub text: String,
    /// Number of deferred assignments appended after the bindings.
    pub patch_count: usize,
}

/// Writes the companion module: one binding per tracked item.
///
/// Bindings are written dependencies first, starting from each tracked item in id order. An
/// item is visible once its binding has been written. A reference to a tracked item that is not
/// visible yet can only close a cycle; it is written as `undefined` and fixed by a patch
/// statement that runs after every binding exists. References inside function bodies are only
/// read when the function runs, so they always name the binding directly.
pub struct SupportConverter<'a> {
    arena: &'a ItemArena,
    aggregator: &'a Aggregator,
    options: &'a EmitOptions,
    visible: HashSet<ItemRef>,
    patches: Vec<String>,
}

impl<'a> SupportConverter<'a> {
    pub fn new(arena: &'a ItemArena, aggregator: &'a Aggregator, options: &'a EmitOptions) -> Self {
        Self {
            arena,
            aggregator,
            options,
            visible: HashSet::new(),
            patches: Vec::new(),
        }
    }

    pub fn emit_module(mut self) -> Result<SupportModule> {
        let aggregator = self.aggregator;
        let mut entered = HashSet::new();
        let mut lines = Vec::with_capacity(aggregator.len());
        for (_, r) in aggregator.tracked() {
            self.emit_binding(r, &mut entered, &mut lines)?;
        }
        let patch_count = self.patches.len();
        lines.append(&mut self.patches);
        Ok(SupportModule {
            text: lines.join("\n"),
            patch_count,
        })
    }

    /// Write the bindings `root` needs at construction time, then `root` itself. An item
    /// already entered is either written or on the current path, which makes the edge a cycle.
    fn emit_binding(
        &mut self,
        root: ItemRef,
        entered: &mut HashSet<ItemRef>,
        lines: &mut Vec<String>,
    ) -> Result<()> {
        if !entered.insert(root) {
            return Ok(());
        }
        // (item, its dependencies, next dependency to visit)
        let mut stack = vec![(root, self.dependencies(root), 0usize)];
        while let Some((r, dependencies, cursor)) = stack.last_mut() {
            if let Some(&dependency) = dependencies.get(*cursor) {
                *cursor += 1;
                if entered.insert(dependency) {
                    let next = self.dependencies(dependency);
                    stack.push((dependency, next, 0));
                }
                continue;
            }
            let r = *r;
            stack.pop();
            let Some(name) = self.binding(r) else {
                compile_bail!(category::CANNOT_CONVERT, "{} is not tracked", r);
            };
            let value = self.define(r, &name)?;
            lines.push(format!("export const {} = {};", name, value));
            self.visible.insert(r);
        }
        Ok(())
    }

    /// Tracked items read while constructing `r`, looking through inline children.
    fn dependencies(&self, r: ItemRef) -> Vec<ItemRef> {
        let mut dependencies = Vec::new();
        let mut seen = HashSet::from([r]);
        let mut stack = vec![r];
        while let Some(parent) = stack.pop() {
            for nest in self.arena.nests(parent) {
                if nest.slot.is_deferred() {
                    continue;
                }
                let Some(child) = nest.child.item_ref() else {
                    continue;
                };
                if self.aggregator.is_tracked(child) {
                    dependencies.push(child);
                } else if seen.insert(child) {
                    stack.push(child);
                }
            }
        }
        dependencies
    }

    fn binding(&self, r: ItemRef) -> Option<String> {
        self.aggregator
            .id_of(r)
            .map(|id| self.options.binding_name(id))
    }

    /// Full definition of `r`, which ends up stored at the path `target`.
    fn define(&mut self, r: ItemRef, target: &str) -> Result<String> {
        let arena = self.arena;
        match arena.get(r) {
            Object::Seq(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .enumerate()
                    .map(|(idx, item)| self.nested(item, target, &NestSlot::Index(idx)))
                    .try_collect()?;
                Ok(format!("[{}]", parts.join(", ")))
            }
            Object::Function(func) => render_function(func, self),
            Object::Type(ty) => self.define_type(ty, target),
            Object::Anchor(anchor) => Ok(format!("Symbol({})", string_literal(&anchor.name)?)),
            Object::Feature(feature) => {
                let anchor = self.nested(&feature.anchor, target, &NestSlot::FeatureAnchor)?;
                let fields = self.fields(&feature.fields, target, NestSlot::FeatureField)?;
                Ok(format!(
                    "{{ feature: {}, anchor: {}, fields: {} }}",
                    string_literal(&feature.name)?,
                    anchor,
                    fields
                ))
            }
            Object::Record(record) => {
                let mut entries = Vec::new();
                if !record.features.is_empty() {
                    let features: Vec<String> = record
                        .features
                        .iter()
                        .enumerate()
                        .map(|(idx, item)| self.nested(item, target, &NestSlot::Feature(idx)))
                        .try_collect()?;
                    entries.push(format!("__features: [{}]", features.join(", ")));
                }
                for field in &record.fields {
                    let slot = NestSlot::Field(field.name.clone());
                    let value = self.nested(&field.item, target, &slot)?;
                    entries.push(format!("{}: {}", property_key(&field.name)?, value));
                }
                if entries.is_empty() {
                    Ok("{}".to_string())
                } else {
                    Ok(format!("{{ {} }}", entries.join(", ")))
                }
            }
        }
    }

    fn define_type(&mut self, ty: &ItemType, target: &str) -> Result<String> {
        let mut entries = vec![format!("kind: {}", string_literal(type_kind_name(&ty.kind))?)];
        match &ty.kind {
            ItemTypeKind::List(Some(element)) => {
                let element = self.nested(element, target, &NestSlot::TypeElement)?;
                entries.push(format!("element: {}", element));
            }
            ItemTypeKind::Feature(anchor) => {
                let anchor = self.nested(anchor, target, &NestSlot::TypeAnchor)?;
                entries.push(format!("anchor: {}", anchor));
            }
            ItemTypeKind::Object { features, fields } => {
                let features: Vec<String> = features
                    .iter()
                    .enumerate()
                    .map(|(idx, item)| self.nested(item, target, &NestSlot::TypeFeature(idx)))
                    .try_collect()?;
                entries.push(format!("features: [{}]", features.join(", ")));
                let fields = self.fields(fields, target, NestSlot::TypeField)?;
                entries.push(format!("fields: {}", fields));
            }
            ItemTypeKind::Generic(site) => {
                entries.push(format!("name: {}", string_literal(&site.name)?));
            }
            _ => {}
        }
        if !ty.qualifications.is_empty() {
            let mut entries_args = Vec::with_capacity(ty.qualifications.len());
            for (entry, qualification) in ty.qualifications.iter().enumerate() {
                match &qualification.args {
                    Some(args) => {
                        let args: Vec<String> = args
                            .iter()
                            .enumerate()
                            .map(|(index, item)| {
                                self.nested(item, target, &NestSlot::QualArg { entry, index })
                            })
                            .try_collect()?;
                        entries_args.push(format!("[{}]", args.join(", ")));
                    }
                    None => entries_args.push("null".to_string()),
                }
            }
            entries.push(format!("args: [{}]", entries_args.join(", ")));
        }
        Ok(format!("{{ {} }}", entries.join(", ")))
    }

    fn fields(
        &mut self,
        fields: &[Field],
        target: &str,
        slot: impl Fn(String) -> NestSlot,
    ) -> Result<String> {
        if fields.is_empty() {
            return Ok("{}".to_string());
        }
        let entries: Vec<String> = fields
            .iter()
            .map(|field| {
                let value = self.nested(&field.item, target, &slot(field.name.clone()))?;
                Ok(format!("{}: {}", property_key(&field.name)?, value))
            })
            .try_collect::<_, _, dt_core::Error>()?;
        Ok(format!("{{ {} }}", entries.join(", ")))
    }

    /// Child of the value stored at `parent_target`, sitting at `slot`.
    fn nested(&mut self, child: &Item, parent_target: &str, slot: &NestSlot) -> Result<String> {
        if let Some(literal) = primitive_literal(child)? {
            return Ok(literal);
        }
        let Some(r) = child.item_ref() else {
            compile_bail!(category::CANNOT_CONVERT, "cannot convert {}", child);
        };
        let Some(accessor) = slot_accessor(slot)? else {
            return self.convert_item(child);
        };
        let target = format!("{}{}", parent_target, accessor);
        match self.binding(r) {
            Some(name) if self.visible.contains(&r) => Ok(name),
            Some(name) => {
                self.patches.push(format!("{} = {};", target, name));
                Ok("undefined".to_string())
            }
            None => self.define(r, &target),
        }
    }
}

impl ItemConverter for SupportConverter<'_> {
    /// Deferred position: bindings are all in place by the time this text runs.
    fn convert_item(&mut self, item: &Item) -> Result<String> {
        if let Some(literal) = primitive_literal(item)? {
            return Ok(literal);
        }
        let Some(r) = item.item_ref() else {
            compile_bail!(category::CANNOT_CONVERT, "cannot convert {}", item);
        };
        if let Some(name) = self.binding(r) {
            return Ok(name);
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

fn type_kind_name(kind: &ItemTypeKind) -> &'static str {
    match kind {
        ItemTypeKind::Missing => "missing",
        ItemTypeKind::Undef => "undefined",
        ItemTypeKind::Null => "null",
        ItemTypeKind::Bool => "boolean",
        ItemTypeKind::Num => "number",
        ItemTypeKind::Str => "string",
        ItemTypeKind::List(_) => "list",
        ItemTypeKind::TypeOf => "type",
        ItemTypeKind::Anchor => "anchor",
        ItemTypeKind::Feature(_) => "feature",
        ItemTypeKind::Object { .. } => "object",
        ItemTypeKind::Generic(_) => "generic",
    }
}
