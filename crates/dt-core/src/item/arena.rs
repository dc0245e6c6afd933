use std::fmt::{Display, Formatter};

use crate::id::ItemRef;
use crate::item::{Item, ItemType};
use crate::runtime::RtStmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub item: Item,
}

impl Field {
    pub fn new(name: impl Into<String>, item: Item) -> Self {
        Self {
            name: name.into(),
            item,
        }
    }
}

/// A comptime value captured by a function value when it was created.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub name: String,
    pub item: Item,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionValue {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<RtStmt>,
    pub captures: Vec<Capture>,
}

impl FunctionValue {
    pub fn capture(&self, name: &str) -> Option<&Item> {
        self.captures
            .iter()
            .find(|capture| capture.name == name)
            .map(|capture| &capture.item)
    }
}

/// Unique key tying feature instances to the declaration that introduced them.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorValue {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureValue {
    pub name: String,
    /// Always a reference to an [`Object::Anchor`] once resolved.
    pub anchor: Item,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordValue {
    /// Feature values composing the identity set of this object.
    pub features: Vec<Item>,
    pub fields: Vec<Field>,
}

impl RecordValue {
    pub fn field(&self, name: &str) -> Option<&Item> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.item)
    }
}

/// Composite compile-time value.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Seq(Vec<Item>),
    Function(FunctionValue),
    Type(ItemType),
    Anchor(AnchorValue),
    Feature(FeatureValue),
    Record(RecordValue),
}

impl Object {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Object::Seq(_) => "sequence",
            Object::Function(_) => "function",
            Object::Type(_) => "type",
            Object::Anchor(_) => "anchor",
            Object::Feature(_) => "feature",
            Object::Record(_) => "object",
        }
    }

    /// Whether the object has a literal form that can be written in place of a reference.
    pub fn is_inlinable(&self) -> bool {
        matches!(self, Object::Seq(_) | Object::Function(_))
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Object::Seq(items) => write!(f, "sequence of {}", items.len()),
            Object::Function(func) => write!(f, "function {}", func.name),
            Object::Type(ty) => write!(f, "type {}", ty),
            Object::Anchor(anchor) => write!(f, "anchor {}", anchor.name),
            Object::Feature(feature) => write!(f, "feature {}", feature.name),
            Object::Record(record) => write!(f, "object with {} fields", record.fields.len()),
        }
    }
}

/// Owner of every composite item of a compilation unit.
///
/// Items refer to each other through [`ItemRef`] handles, so arbitrary graphs (including
/// cycles) are representable without shared ownership.
#[derive(Debug, Default)]
pub struct ItemArena {
    objects: Vec<Object>,
}

impl ItemArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, object: Object) -> Item {
        let r = ItemRef(self.objects.len() as u32);
        self.objects.push(object);
        Item::Ref(r)
    }

    pub fn alloc_seq(&mut self, items: Vec<Item>) -> Item {
        self.alloc(Object::Seq(items))
    }

    pub fn alloc_record(&mut self, fields: Vec<Field>) -> Item {
        self.alloc(Object::Record(RecordValue {
            features: Vec::new(),
            fields,
        }))
    }

    pub fn get(&self, r: ItemRef) -> &Object {
        &self.objects[r.index()]
    }

    pub fn get_mut(&mut self, r: ItemRef) -> &mut Object {
        &mut self.objects[r.index()]
    }

    /// Object behind `item`, if `item` is a composite reference.
    pub fn object(&self, item: &Item) -> Option<&Object> {
        item.item_ref().map(|r| self.get(r))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
