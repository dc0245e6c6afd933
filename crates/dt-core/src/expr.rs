//! Comptime expression groups.
//!
//! [`ExprGroup`] is the seam to the parsing layer: anything that can resolve one slot at a
//! time against a [`CompContext`] can take part in resolution. [`CompGroup`] is the
//! reference implementation over the small [`CompExpr`] language.

use std::rc::Rc;

use crate::context::{CompContext, VarLookup};
use crate::error::{category, Result};
use crate::generic::GenericSite;
use crate::id::{GroupId, VarId};
use crate::item::{
    AnchorValue, Capture, FeatureValue, Field, FunctionValue, Item, ItemArena, ItemType,
    ItemTypeKind, Object, RecordValue, Resolution,
};
use crate::runtime::{BinOp, RtStmt};

pub trait ExprGroup {
    fn id(&self) -> GroupId;

    fn slot_count(&self) -> usize;

    /// Resolve one slot. `Pending` means a dependency is not known yet.
    fn resolve_comp_item(
        &self,
        ctx: &CompContext<'_>,
        slot: usize,
        arena: &mut ItemArena,
    ) -> Result<Resolution<Item>>;

    /// Evaluate the whole group directly, without consulting slot records.
    fn evaluate(&self, ctx: &CompContext<'_>, arena: &mut ItemArena) -> Result<Resolution<Item>>;

    /// Human-readable name of a slot for diagnostics.
    fn describe_slot(&self, slot: usize) -> String;
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Missing,
    Undef,
    Null,
    Bool,
    Num,
    Str,
    List(Option<Box<CompExpr>>),
    TypeOf,
    Anchor,
    Feature(Box<CompExpr>),
    Object {
        features: Vec<CompExpr>,
        fields: Vec<(String, CompExpr)>,
    },
    Generic(Rc<GenericSite>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompExpr {
    Lit(Item),
    Var(VarId),
    /// Strict slot read: pending until the slot resolves.
    Slot { group: GroupId, slot: usize },
    /// Lazy slot read: embeds an unresolved placeholder while the slot is pending.
    LazySlot { group: GroupId, slot: usize },
    Seq(Vec<CompExpr>),
    Record {
        features: Vec<CompExpr>,
        fields: Vec<(String, CompExpr)>,
    },
    Anchor(String),
    Feature {
        name: String,
        anchor: Box<CompExpr>,
        fields: Vec<(String, CompExpr)>,
    },
    Type(TypeExpr),
    /// Staged application: records the arguments on a copy of the generic type.
    Apply {
        ty: Box<CompExpr>,
        args: Option<Vec<CompExpr>>,
    },
    /// Specialize a generic type now, feeding `args` to the entry awaiting arguments.
    Qualify {
        ty: Box<CompExpr>,
        args: Option<Vec<CompExpr>>,
    },
    Function {
        name: String,
        params: Vec<String>,
        body: Vec<RtStmt>,
        captures: Vec<(String, CompExpr)>,
    },
    Member {
        obj: Box<CompExpr>,
        name: String,
    },
    Contains {
        ty: Box<CompExpr>,
        value: Box<CompExpr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<CompExpr>,
        rhs: Box<CompExpr>,
    },
}

impl CompExpr {
    pub fn lit(item: Item) -> Self {
        CompExpr::Lit(item)
    }

    pub fn slot(group: GroupId, slot: usize) -> Self {
        CompExpr::Slot { group, slot }
    }

    pub fn lazy_slot(group: GroupId, slot: usize) -> Self {
        CompExpr::LazySlot { group, slot }
    }

    pub fn seq(items: Vec<CompExpr>) -> Self {
        CompExpr::Seq(items)
    }

    pub fn record(fields: Vec<(&str, CompExpr)>) -> Self {
        CompExpr::Record {
            features: vec![],
            fields: fields
                .into_iter()
                .map(|(name, expr)| (name.to_string(), expr))
                .collect(),
        }
    }

    pub fn ty(ty: TypeExpr) -> Self {
        CompExpr::Type(ty)
    }

    pub fn qualify(ty: CompExpr, args: Option<Vec<CompExpr>>) -> Self {
        CompExpr::Qualify {
            ty: Box::new(ty),
            args,
        }
    }

    pub fn apply(ty: CompExpr, args: Vec<CompExpr>) -> Self {
        CompExpr::Apply {
            ty: Box::new(ty),
            args: Some(args),
        }
    }

    pub fn member(obj: CompExpr, name: impl Into<String>) -> Self {
        CompExpr::Member {
            obj: Box::new(obj),
            name: name.into(),
        }
    }

    pub fn binary(op: BinOp, lhs: CompExpr, rhs: CompExpr) -> Self {
        CompExpr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn eval(&self, ctx: &CompContext<'_>, arena: &mut ItemArena) -> Result<Resolution<Item>> {
        let item = match self {
            CompExpr::Lit(item) => item.clone(),
            CompExpr::Var(var) => match ctx.get_var_item(*var)? {
                VarLookup::Known(item) => item,
                VarLookup::Pending => return Ok(Resolution::Pending),
                VarLookup::Unqualified => Item::absent(format!("{} has no value", var)),
            },
            CompExpr::Slot { group, slot } => resolved!(ctx.get_slot_item(*group, *slot)?),
            CompExpr::LazySlot { group, slot } => match ctx.get_slot_item(*group, *slot)? {
                Resolution::Resolved(item) => item,
                Resolution::Pending => Item::unresolved_slot(*group, *slot),
            },
            CompExpr::Seq(exprs) => {
                let items = resolved!(eval_all(exprs, ctx, arena)?);
                arena.alloc_seq(items)
            }
            CompExpr::Record { features, fields } => {
                let features = resolved!(eval_all(features, ctx, arena)?);
                let fields = resolved!(eval_fields(fields, ctx, arena)?);
                arena.alloc(Object::Record(RecordValue { features, fields }))
            }
            CompExpr::Anchor(name) => arena.alloc(Object::Anchor(AnchorValue { name: name.clone() })),
            CompExpr::Feature {
                name,
                anchor,
                fields,
            } => {
                let anchor = resolved!(anchor.eval(ctx, arena)?);
                let fields = resolved!(eval_fields(fields, ctx, arena)?);
                arena.alloc(Object::Feature(FeatureValue {
                    name: name.clone(),
                    anchor,
                    fields,
                }))
            }
            CompExpr::Type(ty) => {
                let ty = resolved!(eval_type(ty, ctx, arena)?);
                arena.alloc(Object::Type(ty))
            }
            CompExpr::Apply { ty, args } => {
                let args = match args {
                    Some(args) => Some(resolved!(eval_all(args, ctx, arena)?)),
                    None => None,
                };
                let ty = resolved!(expect_type(ty, ctx, arena)?);
                if !ty.is_generic() {
                    compile_bail!(category::QUALIFY, "cannot apply arguments to {}", ty);
                }
                arena.alloc(Object::Type(ty.apply(args)))
            }
            CompExpr::Qualify { ty, args } => {
                let args = match args {
                    Some(args) => Some(resolved!(eval_all(args, ctx, arena)?)),
                    None => None,
                };
                let ty = resolved!(expect_type(ty, ctx, arena)?);
                resolved!(ty.qualify(ctx, args, arena)?)
            }
            CompExpr::Function {
                name,
                params,
                body,
                captures,
            } => {
                let captures = resolved!(eval_fields(captures, ctx, arena)?)
                    .into_iter()
                    .map(|field| Capture {
                        name: field.name,
                        item: field.item,
                    })
                    .collect();
                arena.alloc(Object::Function(FunctionValue {
                    name: name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                    captures,
                }))
            }
            CompExpr::Member { obj, name } => {
                let obj = resolved!(obj.eval(ctx, arena)?);
                let found = match arena.object(&obj) {
                    Some(Object::Record(record)) => record.field(name).cloned(),
                    Some(Object::Feature(feature)) => feature
                        .fields
                        .iter()
                        .find(|field| &field.name == name)
                        .map(|field| field.item.clone()),
                    _ => None,
                };
                match found {
                    Some(Item::Unknown(crate::item::UnknownItem::Unresolved(unresolved))) => {
                        resolved!(unresolved.read(ctx)?)
                    }
                    Some(item) => item,
                    None => compile_bail!(category::UNKNOWN_MEMBER, "{} has no member `{}`", obj, name),
                }
            }
            CompExpr::Contains { ty, value } => {
                let ty = resolved!(expect_type(ty, ctx, arena)?);
                let value = resolved!(value.eval(ctx, arena)?);
                Item::Bool(ty.contains(arena, &value))
            }
            CompExpr::Binary { op, lhs, rhs } => {
                let lhs = resolved!(lhs.eval(ctx, arena)?);
                let rhs = resolved!(rhs.eval(ctx, arena)?);
                eval_binary(*op, &lhs, &rhs)?
            }
        };
        Ok(Resolution::Resolved(item))
    }
}

fn eval_all(
    exprs: &[CompExpr],
    ctx: &CompContext<'_>,
    arena: &mut ItemArena,
) -> Result<Resolution<Vec<Item>>> {
    let mut items = Vec::with_capacity(exprs.len());
    for expr in exprs {
        items.push(resolved!(expr.eval(ctx, arena)?));
    }
    Ok(Resolution::Resolved(items))
}

fn eval_fields(
    fields: &[(String, CompExpr)],
    ctx: &CompContext<'_>,
    arena: &mut ItemArena,
) -> Result<Resolution<Vec<Field>>> {
    let mut out = Vec::with_capacity(fields.len());
    for (name, expr) in fields {
        out.push(Field::new(name.clone(), resolved!(expr.eval(ctx, arena)?)));
    }
    Ok(Resolution::Resolved(out))
}

fn expect_type(
    expr: &CompExpr,
    ctx: &CompContext<'_>,
    arena: &mut ItemArena,
) -> Result<Resolution<ItemType>> {
    // inline type expressions are used directly, never stored
    if let CompExpr::Type(ty) = expr {
        return eval_type(ty, ctx, arena);
    }
    let item = resolved!(expr.eval(ctx, arena)?);
    match arena.object(&item) {
        Some(Object::Type(ty)) => Ok(Resolution::Resolved(ty.clone())),
        _ => compile_bail!(category::TYPE_MISMATCH, "expected a type, found {}", item),
    }
}

fn eval_type(
    ty: &TypeExpr,
    ctx: &CompContext<'_>,
    arena: &mut ItemArena,
) -> Result<Resolution<ItemType>> {
    let kind = match ty {
        TypeExpr::Missing => ItemTypeKind::Missing,
        TypeExpr::Undef => ItemTypeKind::Undef,
        TypeExpr::Null => ItemTypeKind::Null,
        TypeExpr::Bool => ItemTypeKind::Bool,
        TypeExpr::Num => ItemTypeKind::Num,
        TypeExpr::Str => ItemTypeKind::Str,
        TypeExpr::List(None) => ItemTypeKind::List(None),
        TypeExpr::List(Some(element)) => {
            ItemTypeKind::List(Some(resolved!(element.eval(ctx, arena)?)))
        }
        TypeExpr::TypeOf => ItemTypeKind::TypeOf,
        TypeExpr::Anchor => ItemTypeKind::Anchor,
        TypeExpr::Feature(anchor) => ItemTypeKind::Feature(resolved!(anchor.eval(ctx, arena)?)),
        TypeExpr::Object { features, fields } => ItemTypeKind::Object {
            features: resolved!(eval_all(features, ctx, arena)?),
            fields: resolved!(eval_fields(fields, ctx, arena)?),
        },
        TypeExpr::Generic(site) => ItemTypeKind::Generic(site.clone()),
    };
    Ok(Resolution::Resolved(ItemType::new(kind)))
}

fn eval_binary(op: BinOp, lhs: &Item, rhs: &Item) -> Result<Item> {
    Ok(match (op, lhs, rhs) {
        (BinOp::Add, Item::Num(a), Item::Num(b)) => Item::Num(a + b),
        (BinOp::Add, Item::Str(a), Item::Str(b)) => Item::Str(format!("{}{}", a, b)),
        (BinOp::Sub, Item::Num(a), Item::Num(b)) => Item::Num(a - b),
        (BinOp::Mul, Item::Num(a), Item::Num(b)) => Item::Num(a * b),
        (BinOp::Div, Item::Num(a), Item::Num(b)) => Item::Num(a / b),
        (BinOp::Lt, Item::Num(a), Item::Num(b)) => Item::Bool(a < b),
        (BinOp::Gt, Item::Num(a), Item::Num(b)) => Item::Bool(a > b),
        (BinOp::And, Item::Bool(a), Item::Bool(b)) => Item::Bool(*a && *b),
        (BinOp::Or, Item::Bool(a), Item::Bool(b)) => Item::Bool(*a || *b),
        // identity comparison for composites, value comparison for primitives
        (BinOp::Eq, a, b) if !a.is_unknown() && !b.is_unknown() => Item::Bool(a == b),
        (BinOp::Ne, a, b) if !a.is_unknown() && !b.is_unknown() => Item::Bool(a != b),
        (op, lhs, rhs) => compile_bail!(
            category::TYPE_MISMATCH,
            "operator {} does not apply to {} and {}",
            op.symbol(),
            lhs,
            rhs
        ),
    })
}

/// Reference [`ExprGroup`]: a labelled list of expressions, one per slot.
#[derive(Debug, Clone)]
pub struct CompGroup {
    id: GroupId,
    label: String,
    slots: Vec<CompExpr>,
}

impl CompGroup {
    pub fn new(id: GroupId, label: impl Into<String>, slots: Vec<CompExpr>) -> Self {
        Self {
            id,
            label: label.into(),
            slots,
        }
    }

    pub fn into_shared(self) -> Rc<dyn ExprGroup> {
        Rc::new(self)
    }
}

impl ExprGroup for CompGroup {
    fn id(&self) -> GroupId {
        self.id
    }

    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn resolve_comp_item(
        &self,
        ctx: &CompContext<'_>,
        slot: usize,
        arena: &mut ItemArena,
    ) -> Result<Resolution<Item>> {
        match self.slots.get(slot) {
            Some(expr) => expr.eval(ctx, arena),
            None => compile_bail!(category::UNKNOWN_GROUP, "{} has no slot {}", self.label, slot),
        }
    }

    /// Evaluates every slot in order and yields the last one.
    fn evaluate(&self, ctx: &CompContext<'_>, arena: &mut ItemArena) -> Result<Resolution<Item>> {
        let mut last = Item::Undefined;
        for expr in &self.slots {
            last = resolved!(expr.eval(ctx, arena)?);
        }
        Ok(Resolution::Resolved(last))
    }

    fn describe_slot(&self, slot: usize) -> String {
        format!("{}[{}]", self.label, slot)
    }
}
