//! Run-time program tree.
//!
//! Statements here are emitted as ordinary target code. Compile-time values show up as
//! literal [`Item`]s (or as references to comptime slots until they are lowered), and every
//! item is written through an [`ItemConverter`].

use std::collections::HashSet;

use itertools::Itertools;

use crate::context::CompContext;
use crate::error::{category, Result};
use crate::id::GroupId;
use crate::item::{Item, Resolution};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Gt,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "===",
            BinOp::Ne => "!==",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RtExpr {
    Lit(Item),
    /// Value of a comptime slot; replaced by [`RtExpr::Lit`] during lowering.
    Comptime { group: GroupId, slot: usize },
    Ident(String),
    Call { callee: Box<RtExpr>, args: Vec<RtExpr> },
    Member { obj: Box<RtExpr>, name: String },
    Index { obj: Box<RtExpr>, index: Box<RtExpr> },
    Array(Vec<RtExpr>),
    Binary { op: BinOp, lhs: Box<RtExpr>, rhs: Box<RtExpr> },
    Lambda { params: Vec<String>, body: Vec<RtStmt> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RtStmt {
    Let { name: String, init: RtExpr },
    Export { name: String, init: RtExpr },
    Expr(RtExpr),
    Return(Option<RtExpr>),
}

impl RtExpr {
    pub fn ident(name: impl Into<String>) -> Self {
        RtExpr::Ident(name.into())
    }

    pub fn call(callee: RtExpr, args: Vec<RtExpr>) -> Self {
        RtExpr::Call {
            callee: Box::new(callee),
            args,
        }
    }

    pub fn member(obj: RtExpr, name: impl Into<String>) -> Self {
        RtExpr::Member {
            obj: Box::new(obj),
            name: name.into(),
        }
    }

    pub fn binary(op: BinOp, lhs: RtExpr, rhs: RtExpr) -> Self {
        RtExpr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    fn children_mut(&mut self) -> Vec<&mut RtExpr> {
        match self {
            RtExpr::Lit(_) | RtExpr::Comptime { .. } | RtExpr::Ident(_) => vec![],
            RtExpr::Call { callee, args } => {
                let mut children = vec![callee.as_mut()];
                children.extend(args.iter_mut());
                children
            }
            RtExpr::Member { obj, .. } => vec![obj.as_mut()],
            RtExpr::Index { obj, index } => vec![obj.as_mut(), index.as_mut()],
            RtExpr::Array(elements) => elements.iter_mut().collect(),
            RtExpr::Binary { lhs, rhs, .. } => vec![lhs.as_mut(), rhs.as_mut()],
            RtExpr::Lambda { body, .. } => body.iter_mut().filter_map(RtStmt::expr_mut).collect(),
        }
    }

    fn children(&self) -> Vec<&RtExpr> {
        match self {
            RtExpr::Lit(_) | RtExpr::Comptime { .. } | RtExpr::Ident(_) => vec![],
            RtExpr::Call { callee, args } => {
                let mut children = vec![callee.as_ref()];
                children.extend(args.iter());
                children
            }
            RtExpr::Member { obj, .. } => vec![obj.as_ref()],
            RtExpr::Index { obj, index } => vec![obj.as_ref(), index.as_ref()],
            RtExpr::Array(elements) => elements.iter().collect(),
            RtExpr::Binary { lhs, rhs, .. } => vec![lhs.as_ref(), rhs.as_ref()],
            RtExpr::Lambda { body, .. } => body.iter().filter_map(RtStmt::expr).collect(),
        }
    }

    pub fn visit_items(&self, visitor: &mut dyn FnMut(&Item)) {
        if let RtExpr::Lit(item) = self {
            visitor(item);
        }
        for child in self.children() {
            child.visit_items(visitor);
        }
    }

    /// Visit every literal item; a returned item replaces the literal.
    pub fn iterate_nested_items(&mut self, visitor: &mut dyn FnMut(&Item) -> Option<Item>) {
        if let RtExpr::Lit(item) = self {
            if let Some(replacement) = visitor(item) {
                *item = replacement;
            }
        }
        for child in self.children_mut() {
            child.iterate_nested_items(visitor);
        }
    }

    /// Replace comptime slot references with the items they resolved to.
    pub fn lower_comptime(&mut self, ctx: &CompContext<'_>) -> Result<()> {
        if let RtExpr::Comptime { group, slot } = *self {
            match ctx.get_slot_item(group, slot)? {
                Resolution::Resolved(item) => *self = RtExpr::Lit(item),
                Resolution::Pending => compile_bail!(
                    category::UNRESOLVED,
                    "run-time code reads {}[{}] before it resolved",
                    group,
                    slot
                ),
            }
            return Ok(());
        }
        for child in self.children_mut() {
            child.lower_comptime(ctx)?;
        }
        Ok(())
    }

    pub fn convert_to_output(
        &self,
        converter: &mut dyn ItemConverter,
        scope: &RtScope<'_>,
    ) -> Result<String> {
        Ok(match self {
            RtExpr::Lit(item) => converter.convert_item(item)?,
            RtExpr::Comptime { group, slot } => compile_bail!(
                category::NOT_LOWERED,
                "comptime reference {}[{}] reached emission",
                group,
                slot
            ),
            RtExpr::Ident(name) => {
                if scope.is_local(name) {
                    name.clone()
                } else {
                    converter.convert_free_ident(name)?
                }
            }
            RtExpr::Call { callee, args } => format!(
                "{}({})",
                callee.convert_to_output(converter, scope)?,
                convert_list(args, converter, scope)?
            ),
            RtExpr::Member { obj, name } => {
                format!("{}.{}", obj.convert_to_output(converter, scope)?, name)
            }
            RtExpr::Index { obj, index } => format!(
                "{}[{}]",
                obj.convert_to_output(converter, scope)?,
                index.convert_to_output(converter, scope)?
            ),
            RtExpr::Array(elements) => format!("[{}]", convert_list(elements, converter, scope)?),
            RtExpr::Binary { op, lhs, rhs } => format!(
                "({} {} {})",
                lhs.convert_to_output(converter, scope)?,
                op.symbol(),
                rhs.convert_to_output(converter, scope)?
            ),
            RtExpr::Lambda { params, body } => {
                let inner = RtScope::child(scope, params.iter().cloned());
                format!(
                    "(({}) => {{ {} }})",
                    params.join(", "),
                    convert_block(body, converter, &inner)?.join(" ")
                )
            }
        })
    }
}

fn convert_list(
    exprs: &[RtExpr],
    converter: &mut dyn ItemConverter,
    scope: &RtScope<'_>,
) -> Result<String> {
    let parts = exprs
        .iter()
        .map(|expr| expr.convert_to_output(converter, scope))
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join(", "))
}

impl RtStmt {
    fn expr(&self) -> Option<&RtExpr> {
        match self {
            RtStmt::Let { init, .. } | RtStmt::Export { init, .. } => Some(init),
            RtStmt::Expr(expr) => Some(expr),
            RtStmt::Return(expr) => expr.as_ref(),
        }
    }

    fn expr_mut(&mut self) -> Option<&mut RtExpr> {
        match self {
            RtStmt::Let { init, .. } | RtStmt::Export { init, .. } => Some(init),
            RtStmt::Expr(expr) => Some(expr),
            RtStmt::Return(expr) => expr.as_mut(),
        }
    }

    /// Name this statement introduces into its block, if any.
    pub fn binding(&self) -> Option<&str> {
        match self {
            RtStmt::Let { name, .. } | RtStmt::Export { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn convert_to_output(
        &self,
        converter: &mut dyn ItemConverter,
        scope: &RtScope<'_>,
    ) -> Result<String> {
        Ok(match self {
            RtStmt::Let { name, init } => {
                format!("let {} = {};", name, init.convert_to_output(converter, scope)?)
            }
            RtStmt::Export { name, init } => format!(
                "export const {} = {};",
                name,
                init.convert_to_output(converter, scope)?
            ),
            RtStmt::Expr(expr) => format!("{};", expr.convert_to_output(converter, scope)?),
            RtStmt::Return(Some(expr)) => {
                format!("return {};", expr.convert_to_output(converter, scope)?)
            }
            RtStmt::Return(None) => "return;".to_string(),
        })
    }
}

/// Convert a block of statements; names bound anywhere in the block are local to it.
pub fn convert_block(
    stmts: &[RtStmt],
    converter: &mut dyn ItemConverter,
    parent: &RtScope<'_>,
) -> Result<Vec<String>> {
    let scope = RtScope::child(parent, stmts.iter().filter_map(RtStmt::binding).map(String::from));
    stmts
        .iter()
        .map(|stmt| stmt.convert_to_output(converter, &scope))
        .collect()
}

pub fn visit_block_items(stmts: &[RtStmt], visitor: &mut dyn FnMut(&Item)) {
    for expr in stmts.iter().filter_map(RtStmt::expr) {
        expr.visit_items(visitor);
    }
}

pub fn iterate_block_items(stmts: &mut [RtStmt], visitor: &mut dyn FnMut(&Item) -> Option<Item>) {
    for expr in stmts.iter_mut().filter_map(RtStmt::expr_mut) {
        expr.iterate_nested_items(visitor);
    }
}

/// Run-time variable lookup environment. A child borrows its parent, which outlives it.
#[derive(Debug, Default)]
pub struct RtScope<'p> {
    parent: Option<&'p RtScope<'p>>,
    locals: HashSet<String>,
}

impl<'p> RtScope<'p> {
    pub fn root() -> RtScope<'static> {
        RtScope {
            parent: None,
            locals: HashSet::new(),
        }
    }

    pub fn child(parent: &'p RtScope<'p>, locals: impl IntoIterator<Item = String>) -> Self {
        Self {
            parent: Some(parent),
            locals: locals.into_iter().collect(),
        }
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.locals.contains(name) || self.parent.is_some_and(|parent| parent.is_local(name))
    }
}

/// Strategy for writing items into emitted source.
pub trait ItemConverter {
    /// Text evaluating to `item` wherever run-time code mentions it.
    fn convert_item(&mut self, item: &Item) -> Result<String>;

    /// Text for an identifier that no enclosing run-time scope binds.
    fn convert_free_ident(&mut self, name: &str) -> Result<String> {
        Ok(name.to_string())
    }
}

/// The run-time part of a compilation unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub stmts: Vec<RtStmt>,
}

impl Program {
    pub fn new(stmts: Vec<RtStmt>) -> Self {
        Self { stmts }
    }

    pub fn lower_comptime(&mut self, ctx: &CompContext<'_>) -> Result<()> {
        for expr in self.stmts.iter_mut().filter_map(RtStmt::expr_mut) {
            expr.lower_comptime(ctx)?;
        }
        Ok(())
    }

    pub fn iterate_nested_items(&mut self, visitor: &mut dyn FnMut(&Item) -> Option<Item>) {
        iterate_block_items(&mut self.stmts, visitor);
    }

    /// Literal items in traversal order.
    pub fn items(&self) -> Vec<Item> {
        let mut items = Vec::new();
        visit_block_items(&self.stmts, &mut |item| items.push(item.clone()));
        items
    }

    pub fn convert_to_output(&self, converter: &mut dyn ItemConverter) -> Result<String> {
        let root = RtScope::root();
        Ok(convert_block(&self.stmts, converter, &root)?
            .into_iter()
            .join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl ItemConverter for Plain {
        fn convert_item(&mut self, item: &Item) -> Result<String> {
            Ok(item.to_string())
        }

        fn convert_free_ident(&mut self, name: &str) -> Result<String> {
            Ok(format!("global.{}", name))
        }
    }

    #[test]
    fn lambda_params_shadow_free_identifiers() -> Result<()> {
        let expr = RtExpr::Lambda {
            params: vec!["x".into()],
            body: vec![RtStmt::Return(Some(RtExpr::binary(
                BinOp::Add,
                RtExpr::ident("x"),
                RtExpr::ident("y"),
            )))],
        };
        let root = RtScope::root();
        assert_eq!(
            expr.convert_to_output(&mut Plain, &root)?,
            "((x) => { return (x + global.y); })"
        );
        Ok(())
    }

    #[test]
    fn block_bindings_are_local() -> Result<()> {
        let program = Program::new(vec![
            RtStmt::Let {
                name: "a".into(),
                init: RtExpr::Lit(Item::Num(1.0)),
            },
            RtStmt::Expr(RtExpr::call(RtExpr::ident("log"), vec![RtExpr::ident("a")])),
        ]);
        assert_eq!(
            program.convert_to_output(&mut Plain)?,
            "let a = 1;\nglobal.log(a);"
        );
        Ok(())
    }
}
