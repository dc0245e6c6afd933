use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use itertools::Itertools;

use crate::generic::{GenericQualification, GenericSite};
use crate::item::{Field, Item, ItemArena, ItemRef, Object, UnknownItem};

#[derive(Debug, Clone, PartialEq)]
pub enum ItemTypeKind {
    /// Type of values that are permanently unavailable.
    Missing,
    Undef,
    Null,
    Bool,
    Num,
    Str,
    /// Sequence whose elements all belong to the element type, if any.
    List(Option<Item>),
    /// Type of type values.
    TypeOf,
    /// Type of anchors.
    Anchor,
    /// Objects carrying a feature keyed by the given anchor.
    Feature(Item),
    /// Objects carrying every listed feature anchor and every listed field.
    Object {
        features: Vec<Item>,
        fields: Vec<Field>,
    },
    /// Unspecialized generic; must be qualified before it describes any value.
    Generic(Rc<GenericSite>),
}

/// A type value together with the chain of qualifications applied to it so far.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemType {
    pub kind: ItemTypeKind,
    pub qualifications: Vec<GenericQualification>,
}

impl ItemType {
    pub fn new(kind: ItemTypeKind) -> Self {
        Self {
            kind,
            qualifications: Vec::new(),
        }
    }

    pub fn generic(site: Rc<GenericSite>) -> Self {
        Self::new(ItemTypeKind::Generic(site))
    }

    /// Fresh qualification chain, shared leaf items. Later qualifications on the copy never
    /// reach the original.
    pub fn copy(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            qualifications: self.qualifications.to_vec(),
        }
    }

    /// Record a staged application of `args` without evaluating anything.
    pub fn apply(&self, args: Option<Vec<Item>>) -> Self {
        let mut ty = self.copy();
        if let ItemTypeKind::Generic(site) = &self.kind {
            ty.qualifications.push(GenericQualification {
                site: site.clone(),
                args,
            });
        }
        ty
    }

    pub fn is_generic(&self) -> bool {
        matches!(self.kind, ItemTypeKind::Generic(_))
    }

    /// Whether `item` is a value of this type. Cyclic types against cyclic values hold when
    /// no finite path through them fails.
    pub fn contains(&self, arena: &ItemArena, item: &Item) -> bool {
        self.contains_in(arena, item, &mut HashSet::new())
    }

    fn contains_in(
        &self,
        arena: &ItemArena,
        item: &Item,
        seen: &mut HashSet<(ItemRef, ItemRef)>,
    ) -> bool {
        let object = arena.object(item);
        match &self.kind {
            ItemTypeKind::Missing => matches!(item, Item::Unknown(UnknownItem::Absent(_))),
            ItemTypeKind::Undef => matches!(item, Item::Undefined),
            ItemTypeKind::Null => matches!(item, Item::Null),
            ItemTypeKind::Bool => matches!(item, Item::Bool(_)),
            ItemTypeKind::Num => matches!(item, Item::Num(_)),
            ItemTypeKind::Str => matches!(item, Item::Str(_)),
            ItemTypeKind::List(element) => match object {
                Some(Object::Seq(items)) => match element {
                    Some(element) => items
                        .iter()
                        .all(|item| type_contains(arena, element, item, seen)),
                    None => true,
                },
                _ => false,
            },
            ItemTypeKind::TypeOf => matches!(object, Some(Object::Type(_))),
            ItemTypeKind::Anchor => matches!(object, Some(Object::Anchor(_))),
            ItemTypeKind::Feature(anchor) => match object {
                Some(Object::Feature(feature)) => &feature.anchor == anchor,
                Some(Object::Record(_)) => has_feature(arena, item, anchor),
                _ => false,
            },
            ItemTypeKind::Object { features, fields } => match object {
                Some(Object::Record(record)) => {
                    features
                        .iter()
                        .all(|anchor| has_feature(arena, item, anchor))
                        && fields.iter().all(|field| {
                            record
                                .field(&field.name)
                                .map(|value| type_contains(arena, &field.item, value, seen))
                                .unwrap_or(false)
                        })
                }
                _ => false,
            },
            ItemTypeKind::Generic(_) => false,
        }
    }
}

/// `ty` is expected to reference a type value; anything else contains nothing. A pair already
/// under test holds.
fn type_contains(
    arena: &ItemArena,
    ty: &Item,
    item: &Item,
    seen: &mut HashSet<(ItemRef, ItemRef)>,
) -> bool {
    if let (Some(t), Some(r)) = (ty.item_ref(), item.item_ref()) {
        if !seen.insert((t, r)) {
            return true;
        }
    }
    match arena.object(ty) {
        Some(Object::Type(ty)) => ty.contains_in(arena, item, seen),
        _ => false,
    }
}

fn has_feature(arena: &ItemArena, item: &Item, anchor: &Item) -> bool {
    let Some(Object::Record(record)) = arena.object(item) else {
        return false;
    };
    record.features.iter().any(|feature| match arena.object(feature) {
        Some(Object::Feature(feature)) => &feature.anchor == anchor,
        _ => false,
    })
}

impl Display for ItemType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ItemTypeKind::Missing => write!(f, "missing"),
            ItemTypeKind::Undef => write!(f, "undef"),
            ItemTypeKind::Null => write!(f, "null"),
            ItemTypeKind::Bool => write!(f, "bool"),
            ItemTypeKind::Num => write!(f, "num"),
            ItemTypeKind::Str => write!(f, "str"),
            ItemTypeKind::List(Some(element)) => write!(f, "list<{}>", element),
            ItemTypeKind::List(None) => write!(f, "list"),
            ItemTypeKind::TypeOf => write!(f, "type"),
            ItemTypeKind::Anchor => write!(f, "anchor"),
            ItemTypeKind::Feature(anchor) => write!(f, "feature<{}>", anchor),
            ItemTypeKind::Object { fields, .. } => write!(
                f,
                "{{{}}}",
                fields
                    .iter()
                    .map(|field| format!("{}: {}", field.name, field.item))
                    .join(", ")
            ),
            ItemTypeKind::Generic(site) => {
                write!(f, "{}", site.name)?;
                for qualification in &self.qualifications {
                    match &qualification.args {
                        Some(args) => write!(f, "[{}]", args.iter().join(", "))?,
                        None => write!(f, "[_]")?,
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{AnchorValue, FeatureValue, RecordValue};

    #[test]
    fn list_type_checks_every_element() {
        let mut arena = ItemArena::new();
        let num = arena.alloc(Object::Type(ItemType::new(ItemTypeKind::Num)));
        let nums = ItemType::new(ItemTypeKind::List(Some(num)));
        let good = arena.alloc_seq(vec![Item::Num(1.0), Item::Num(2.0)]);
        let bad = arena.alloc_seq(vec![Item::Num(1.0), Item::str("x")]);
        assert!(nums.contains(&arena, &good));
        assert!(!nums.contains(&arena, &bad));
        assert!(!nums.contains(&arena, &Item::Num(1.0)));
    }

    #[test]
    fn feature_type_matches_by_anchor_identity() {
        let mut arena = ItemArena::new();
        let anchor = arena.alloc(Object::Anchor(AnchorValue { name: "Show".into() }));
        let twin = arena.alloc(Object::Anchor(AnchorValue { name: "Show".into() }));
        let feature = arena.alloc(Object::Feature(FeatureValue {
            name: "Show".into(),
            anchor: anchor.clone(),
            fields: vec![],
        }));
        let object = arena.alloc(Object::Record(RecordValue {
            features: vec![feature],
            fields: vec![],
        }));
        assert!(ItemType::new(ItemTypeKind::Feature(anchor)).contains(&arena, &object));
        assert!(!ItemType::new(ItemTypeKind::Feature(twin)).contains(&arena, &object));
    }

    #[test]
    fn cyclic_list_type_checks_cyclic_sequences() {
        let mut arena = ItemArena::new();
        let nested = arena.alloc(Object::Type(ItemType::new(ItemTypeKind::List(None))));
        let r = nested.item_ref().unwrap();
        // nested = list<nested>
        *arena.get_mut(r) = Object::Type(ItemType::new(ItemTypeKind::List(Some(nested.clone()))));
        let ty = match arena.object(&nested) {
            Some(Object::Type(ty)) => ty.clone(),
            other => panic!("expected a type, found {:?}", other),
        };

        // looped = [looped]
        let looped = arena.alloc_seq(vec![]);
        if let Object::Seq(items) = arena.get_mut(looped.item_ref().unwrap()) {
            items.push(looped.clone());
        }
        assert!(ty.contains(&arena, &looped));

        // tainted = [tainted, "x"]
        let tainted = arena.alloc_seq(vec![]);
        if let Object::Seq(items) = arena.get_mut(tainted.item_ref().unwrap()) {
            items.push(tainted.clone());
            items.push(Item::str("x"));
        }
        assert!(!ty.contains(&arena, &tainted));
    }
}
