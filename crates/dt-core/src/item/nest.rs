use std::collections::HashSet;

use crate::error::Result;
use crate::id::ItemRef;
use crate::item::{Item, ItemArena, ItemTypeKind, Object};
use crate::runtime::{iterate_block_items, visit_block_items};

/// Where a child sits inside its parent's representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NestSlot {
    /// Element of a sequence.
    Index(usize),
    /// Named field of an object.
    Field(String),
    /// Entry of an object's feature list.
    Feature(usize),
    /// Anchor of a feature value.
    FeatureAnchor,
    /// Named field of a feature value.
    FeatureField(String),
    TypeElement,
    TypeAnchor,
    TypeFeature(usize),
    TypeField(String),
    /// Explicit argument `index` of qualification entry `entry`.
    QualArg { entry: usize, index: usize },
    /// Value captured by a function at its creation site.
    Capture(String),
    /// `n`-th literal item inside a function body, in traversal order.
    BodyItem(usize),
}

impl NestSlot {
    /// Children read only when a function runs are never needed while the parent is being
    /// constructed.
    pub fn is_deferred(&self) -> bool {
        matches!(self, NestSlot::Capture(_) | NestSlot::BodyItem(_))
    }
}

/// Parent/child edge of the item graph.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemNest {
    pub parent: ItemRef,
    pub slot: NestSlot,
    pub child: Item,
}

impl ItemArena {
    /// Direct children of `parent`, in declaration order.
    pub fn nests(&self, parent: ItemRef) -> Vec<ItemNest> {
        let mut nests = Vec::new();
        let mut push = |slot: NestSlot, child: &Item| {
            nests.push(ItemNest {
                parent,
                slot,
                child: child.clone(),
            })
        };
        match self.get(parent) {
            Object::Seq(items) => {
                for (idx, item) in items.iter().enumerate() {
                    push(NestSlot::Index(idx), item);
                }
            }
            Object::Function(func) => {
                for capture in &func.captures {
                    push(NestSlot::Capture(capture.name.clone()), &capture.item);
                }
                let mut n = 0;
                visit_block_items(&func.body, &mut |item| {
                    push(NestSlot::BodyItem(n), item);
                    n += 1;
                });
            }
            Object::Type(ty) => {
                match &ty.kind {
                    ItemTypeKind::List(Some(element)) => push(NestSlot::TypeElement, element),
                    ItemTypeKind::Feature(anchor) => push(NestSlot::TypeAnchor, anchor),
                    ItemTypeKind::Object { features, fields } => {
                        for (idx, feature) in features.iter().enumerate() {
                            push(NestSlot::TypeFeature(idx), feature);
                        }
                        for field in fields {
                            push(NestSlot::TypeField(field.name.clone()), &field.item);
                        }
                    }
                    _ => {}
                }
                for (entry, qualification) in ty.qualifications.iter().enumerate() {
                    for (index, arg) in qualification.args.iter().flatten().enumerate() {
                        push(NestSlot::QualArg { entry, index }, arg);
                    }
                }
            }
            Object::Anchor(_) => {}
            Object::Feature(feature) => {
                push(NestSlot::FeatureAnchor, &feature.anchor);
                for field in &feature.fields {
                    push(NestSlot::FeatureField(field.name.clone()), &field.item);
                }
            }
            Object::Record(record) => {
                for (idx, feature) in record.features.iter().enumerate() {
                    push(NestSlot::Feature(idx), feature);
                }
                for field in &record.fields {
                    push(NestSlot::Field(field.name.clone()), &field.item);
                }
            }
        }
        nests
    }

    /// Invoke `visitor` on every direct child of `parent`; a returned item replaces the child
    /// in place. Returns the number of replacements.
    pub fn iterate_nested_items(
        &mut self,
        parent: ItemRef,
        mut visitor: impl FnMut(&ItemNest) -> Option<Item>,
    ) -> Result<usize> {
        let mut replaced = 0;
        for nest in self.nests(parent) {
            if let Some(item) = visitor(&nest) {
                self.splice(parent, &nest.slot, item)?;
                replaced += 1;
            }
        }
        Ok(replaced)
    }

    /// Overwrite the child stored at `slot` of `parent`.
    pub fn splice(&mut self, parent: ItemRef, slot: &NestSlot, item: Item) -> Result<()> {
        let target = match (self.get_mut(parent), slot) {
            (Object::Seq(items), NestSlot::Index(idx)) => items.get_mut(*idx),
            (Object::Record(record), NestSlot::Feature(idx)) => record.features.get_mut(*idx),
            (Object::Record(record), NestSlot::Field(name)) => record
                .fields
                .iter_mut()
                .find(|field| &field.name == name)
                .map(|field| &mut field.item),
            (Object::Feature(feature), NestSlot::FeatureAnchor) => Some(&mut feature.anchor),
            (Object::Feature(feature), NestSlot::FeatureField(name)) => feature
                .fields
                .iter_mut()
                .find(|field| &field.name == name)
                .map(|field| &mut field.item),
            (Object::Function(func), NestSlot::Capture(name)) => func
                .captures
                .iter_mut()
                .find(|capture| &capture.name == name)
                .map(|capture| &mut capture.item),
            (Object::Function(func), NestSlot::BodyItem(n)) => {
                let mut seen = 0;
                let mut replacement = Some(item);
                iterate_block_items(&mut func.body, &mut |_| {
                    let current = seen;
                    seen += 1;
                    if current == *n {
                        replacement.take()
                    } else {
                        None
                    }
                });
                if replacement.is_none() {
                    return Ok(());
                }
                bail!("function {} has no body item {}", parent, n)
            }
            (Object::Type(ty), slot) => match (&mut ty.kind, slot) {
                (ItemTypeKind::List(Some(element)), NestSlot::TypeElement) => Some(element),
                (ItemTypeKind::Feature(anchor), NestSlot::TypeAnchor) => Some(anchor),
                (ItemTypeKind::Object { features, .. }, NestSlot::TypeFeature(idx)) => {
                    features.get_mut(*idx)
                }
                (ItemTypeKind::Object { fields, .. }, NestSlot::TypeField(name)) => fields
                    .iter_mut()
                    .find(|field| &field.name == name)
                    .map(|field| &mut field.item),
                (_, NestSlot::QualArg { entry, index }) => ty
                    .qualifications
                    .get_mut(*entry)
                    .and_then(|qualification| qualification.args.as_mut())
                    .and_then(|args| args.get_mut(*index)),
                _ => None,
            },
            _ => None,
        };
        match target {
            Some(target) => {
                *target = item;
                Ok(())
            }
            None => bail!("{} has no nested slot {:?}", parent, slot),
        }
    }

    /// Every composite reachable from `roots`, in discovery order. Cycles are fine: an object
    /// is marked before its children are visited and never visited twice.
    pub fn reachable<'a>(&self, roots: impl IntoIterator<Item = &'a Item>) -> Vec<ItemRef> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut stack: Vec<ItemRef> = roots.into_iter().filter_map(Item::item_ref).collect();
        stack.reverse();
        while let Some(r) = stack.pop() {
            if !seen.insert(r) {
                continue;
            }
            order.push(r);
            let children: Vec<ItemRef> = self
                .nests(r)
                .iter()
                .filter_map(|nest| nest.child.item_ref())
                .collect();
            stack.extend(children.into_iter().rev());
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Field;

    #[test]
    fn visitor_replacement_installs_items() -> Result<()> {
        let mut arena = ItemArena::new();
        let seq = arena.alloc_seq(vec![Item::Num(1.0), Item::Null]);
        let r = seq.item_ref().unwrap();
        let replaced = arena.iterate_nested_items(r, |nest| {
            (nest.child == Item::Null).then(|| Item::str("filled"))
        })?;
        assert_eq!(replaced, 1);
        assert_eq!(
            arena.get(r),
            &Object::Seq(vec![Item::Num(1.0), Item::str("filled")])
        );
        Ok(())
    }

    #[test]
    fn reachable_tolerates_cycles() {
        let mut arena = ItemArena::new();
        let a = arena.alloc_record(vec![Field::new("child", Item::Null)]);
        let b = arena.alloc_record(vec![Field::new("child", a.clone())]);
        let a_ref = a.item_ref().unwrap();
        arena
            .splice(a_ref, &NestSlot::Field("child".into()), b.clone())
            .unwrap();
        let found = arena.reachable([&a]);
        assert_eq!(found, vec![a_ref, b.item_ref().unwrap()]);
    }
}
