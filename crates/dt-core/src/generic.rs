//! Generic type qualification.

use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use crate::context::CompContext;
use crate::error::{category, Result};
use crate::expr::ExprGroup;
use crate::id::{SiteId, VarId};
use crate::item::{Item, ItemArena, ItemType, ItemTypeKind, Object, Resolution};

/// Declaration of a generic: its parameters, the comptime groups declared inside it and the
/// body that produces the specialized type.
pub struct GenericSite {
    pub id: SiteId,
    pub name: String,
    pub params: Vec<VarId>,
    pub groups: Vec<Rc<dyn ExprGroup>>,
    pub body: Rc<dyn ExprGroup>,
}

impl Debug for GenericSite {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericSite")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

impl PartialEq for GenericSite {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// One application recorded on a generic type. `args` is `None` for the entry that takes its
/// arguments at qualification time.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericQualification {
    pub site: Rc<GenericSite>,
    pub args: Option<Vec<Item>>,
}

impl ItemType {
    /// Specialize this generic type.
    ///
    /// The qualification chain is walked from the most recent entry to the first. Entries
    /// with explicit arguments bind those; the single entry without arguments takes
    /// `input_args`. When no entry awaits arguments, `input_args` counts as the most recent
    /// application. Arguments for the same site concatenate in application order, so applying
    /// `[x]` then `[y]` equals applying `[x, y]` at once.
    pub fn qualify(
        &self,
        caller: &CompContext<'_>,
        input_args: Option<Vec<Item>>,
        arena: &mut ItemArena,
    ) -> Result<Resolution<Item>> {
        let ItemTypeKind::Generic(target) = &self.kind else {
            compile_bail!(category::QUALIFY, "{} is not generic", self);
        };
        let awaiting = self
            .qualifications
            .iter()
            .filter(|qualification| qualification.args.is_none())
            .count();
        if awaiting > 1 {
            compile_bail!(
                category::QUALIFY,
                "{} has {} qualifications awaiting arguments",
                self,
                awaiting
            );
        }

        // per site, argument chunks from most recent to first
        let mut bound: Vec<(Rc<GenericSite>, Vec<Vec<Item>>)> = Vec::new();
        let mut bind = |site: &Rc<GenericSite>, args: Vec<Item>| {
            match bound.iter_mut().find(|(known, _)| known.id == site.id) {
                Some((_, chunks)) => chunks.push(args),
                None => bound.push((site.clone(), vec![args])),
            }
        };
        let mut input_args = input_args;
        if awaiting == 0 {
            if let Some(args) = input_args.take() {
                bind(target, args);
            }
        }
        for qualification in self.qualifications.iter().rev() {
            let args = match &qualification.args {
                Some(args) => args.clone(),
                None => match input_args.take() {
                    Some(args) => args,
                    None => compile_bail!(
                        category::QUALIFY,
                        "{} awaits arguments but none were given",
                        self
                    ),
                },
            };
            bind(&qualification.site, args);
        }
        if !bound.iter().any(|(site, _)| site.id == target.id) {
            bound.push((target.clone(), vec![]));
        }

        let mut ctx = CompContext::child(caller);
        for (site, chunks) in &bound {
            for group in &site.groups {
                ctx.add_group(group.clone());
            }
            let args: Vec<Item> = chunks.iter().rev().flatten().cloned().collect();
            ctx.add_generic_args(site, args)?;
        }
        if !ctx.resolve_until_stalled(arena)? {
            debug!(
                "qualifying {} is waiting on {}",
                self,
                ctx.describe_unresolved().unwrap_or_default()
            );
            return Ok(Resolution::Pending);
        }

        let body = resolved!(target.body.evaluate(&ctx, arena)?);
        match arena.object(&body) {
            Some(Object::Type(_)) => Ok(Resolution::Resolved(body)),
            _ => compile_bail!(
                category::TYPE_MISMATCH,
                "body of generic {} produced {}, not a type",
                target.name,
                body
            ),
        }
    }
}
