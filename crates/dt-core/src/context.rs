use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

use crate::error::{category, Error, Result};
use crate::expr::ExprGroup;
use crate::generic::GenericSite;
use crate::id::{GroupId, ItemRef, SiteId, VarId};
use crate::item::{Item, ItemArena, Resolution, UnknownItem};

/// Resolution record of one slot. `item` is frozen once `resolved` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotRecord {
    pub resolved: bool,
    pub item: Item,
}

struct GroupRecord {
    group: Rc<dyn ExprGroup>,
    slots: Vec<SlotRecord>,
}

/// How a comptime variable obtains its value.
#[derive(Debug, Clone, PartialEq)]
pub enum VarBinding {
    Item(Item),
    /// The variable takes whatever the slot resolves to.
    Slot { group: GroupId, slot: usize },
}

/// Result of looking a variable up through the context chain.
#[derive(Debug, Clone, PartialEq)]
pub enum VarLookup {
    Known(Item),
    /// Declared, but its value depends on a slot that has not resolved yet.
    Pending,
    /// No context in the chain declares the variable.
    Unqualified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub resolved_count: usize,
    pub unresolved_groups: Vec<GroupId>,
}

impl SweepReport {
    pub fn is_complete(&self) -> bool {
        self.unresolved_groups.is_empty()
    }
}

/// Resolution engine for comptime expression slots and variables.
///
/// A context owns the slot records of the groups registered with it and the variables bound
/// in it. Lookups that miss fall through to the parent, which always outlives the child.
pub struct CompContext<'p> {
    parent: Option<&'p CompContext<'p>>,
    groups: BTreeMap<GroupId, GroupRecord>,
    vars: HashMap<VarId, VarBinding>,
    qualified: HashSet<SiteId>,
}

impl Default for CompContext<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl CompContext<'static> {
    pub fn new() -> Self {
        CompContext {
            parent: None,
            groups: BTreeMap::new(),
            vars: HashMap::new(),
            qualified: HashSet::new(),
        }
    }
}

impl<'p> CompContext<'p> {
    pub fn child(parent: &'p CompContext<'p>) -> Self {
        CompContext {
            parent: Some(parent),
            groups: BTreeMap::new(),
            vars: HashMap::new(),
            qualified: HashSet::new(),
        }
    }

    /// Register a group; all of its slots start unresolved.
    pub fn add_group(&mut self, group: Rc<dyn ExprGroup>) {
        let id = group.id();
        let slots = (0..group.slot_count())
            .map(|slot| SlotRecord {
                resolved: false,
                item: Item::unresolved_slot(id, slot),
            })
            .collect();
        self.groups.insert(id, GroupRecord { group, slots });
    }

    pub fn declare_var(&mut self, var: VarId, binding: VarBinding) {
        self.vars.insert(var, binding);
    }

    /// One sweep over every unresolved slot, in (group, slot) order.
    pub fn resolve_comp_items(&mut self, arena: &mut ItemArena) -> Result<SweepReport> {
        let mut resolved_count = 0;
        let mut unresolved_groups = Vec::new();
        let ids: Vec<GroupId> = self.groups.keys().copied().collect();
        for id in ids {
            let (group, slot_count) = {
                let record = &self.groups[&id];
                (record.group.clone(), record.slots.len())
            };
            let mut group_done = true;
            for slot in 0..slot_count {
                if self.groups[&id].slots[slot].resolved {
                    continue;
                }
                match group.resolve_comp_item(self, slot, arena)? {
                    Resolution::Resolved(item) => {
                        trace!("{}[{}] resolved to {}", id, slot, item);
                        if let Some(record) = self.groups.get_mut(&id) {
                            record.slots[slot] = SlotRecord {
                                resolved: true,
                                item,
                            };
                        }
                        resolved_count += 1;
                    }
                    Resolution::Pending => group_done = false,
                }
            }
            if !group_done {
                unresolved_groups.push(id);
            }
        }
        debug!(
            "sweep resolved {} slots, {} groups still unresolved",
            resolved_count,
            unresolved_groups.len()
        );
        Ok(SweepReport {
            resolved_count,
            unresolved_groups,
        })
    }

    /// Sweep until every slot is resolved. A sweep without progress while slots remain is a
    /// genuine fixed point and is reported as an error naming one unresolved expression.
    pub fn resolve_all(&mut self, arena: &mut ItemArena) -> Result<usize> {
        let mut sweeps = 0;
        loop {
            let report = self.resolve_comp_items(arena)?;
            sweeps += 1;
            if report.is_complete() {
                return Ok(sweeps);
            }
            if report.resolved_count == 0 {
                compile_bail!(
                    category::UNRESOLVED,
                    "cannot resolve comptime expression {}",
                    self.describe_unresolved().unwrap_or_default()
                );
            }
        }
    }

    /// Sweep until nothing more resolves. Returns whether every slot is resolved; stalled
    /// slots may still depend on a parent that has not settled.
    pub fn resolve_until_stalled(&mut self, arena: &mut ItemArena) -> Result<bool> {
        loop {
            let report = self.resolve_comp_items(arena)?;
            if report.is_complete() {
                return Ok(true);
            }
            if report.resolved_count == 0 {
                return Ok(false);
            }
        }
    }

    /// Description of the first unresolved slot in sweep order.
    pub fn describe_unresolved(&self) -> Option<String> {
        self.groups.values().find_map(|record| {
            record
                .slots
                .iter()
                .position(|slot| !slot.resolved)
                .map(|slot| record.group.describe_slot(slot))
        })
    }

    fn find_group(&self, group: GroupId) -> Option<&GroupRecord> {
        match self.groups.get(&group) {
            Some(record) => Some(record),
            None => self.parent.and_then(|parent| parent.find_group(group)),
        }
    }

    pub fn get_slot_item(&self, group: GroupId, slot: usize) -> Result<Resolution<Item>> {
        let Some(record) = self.find_group(group) else {
            compile_bail!(category::UNKNOWN_GROUP, "no expression group {}", group);
        };
        match record.slots.get(slot) {
            Some(SlotRecord {
                resolved: true,
                item,
            }) => Ok(Resolution::Resolved(item.clone())),
            Some(_) => Ok(Resolution::Pending),
            None => compile_bail!(category::UNKNOWN_GROUP, "{} has no slot {}", group, slot),
        }
    }

    /// Frozen items of every slot of `group`, or pending while any slot is unresolved.
    pub fn get_seq_items(&self, group: GroupId) -> Result<Resolution<Vec<Item>>> {
        let Some(record) = self.find_group(group) else {
            compile_bail!(category::UNKNOWN_GROUP, "no expression group {}", group);
        };
        if record.slots.iter().any(|slot| !slot.resolved) {
            return Ok(Resolution::Pending);
        }
        Ok(Resolution::Resolved(
            record.slots.iter().map(|slot| slot.item.clone()).collect(),
        ))
    }

    /// Value of `var`. A binding to a slot no context knows about is an error, not an
    /// unqualified variable.
    pub fn get_var_item(&self, var: VarId) -> Result<VarLookup> {
        Ok(match self.vars.get(&var) {
            Some(VarBinding::Item(item)) => VarLookup::Known(item.clone()),
            Some(VarBinding::Slot { group, slot }) => match self.get_slot_item(*group, *slot)? {
                Resolution::Resolved(item) => VarLookup::Known(item),
                Resolution::Pending => VarLookup::Pending,
            },
            None => match self.parent {
                Some(parent) => return parent.get_var_item(var),
                None => VarLookup::Unqualified,
            },
        })
    }

    /// Bind the parameters of `site` in this context only.
    pub fn add_generic_args(&mut self, site: &GenericSite, args: Vec<Item>) -> Result<()> {
        if args.len() != site.params.len() {
            compile_bail!(
                category::ARITY,
                "generic {} expects {} arguments, got {}",
                site.name,
                site.params.len(),
                args.len()
            );
        }
        for (param, arg) in site.params.iter().zip(args) {
            self.vars.insert(*param, VarBinding::Item(arg));
        }
        self.qualified.insert(site.id);
        Ok(())
    }

    pub fn generic_is_qualified(&self, site: SiteId) -> bool {
        self.qualified.contains(&site)
            || self
                .parent
                .is_some_and(|parent| parent.generic_is_qualified(site))
    }

    /// Items of every resolved slot registered directly in this context, in sweep order.
    pub fn slot_items(&self) -> Vec<Item> {
        self.groups
            .values()
            .flat_map(|record| record.slots.iter())
            .filter(|slot| slot.resolved)
            .map(|slot| slot.item.clone())
            .collect()
    }

    /// Follow a chain of placeholders to the item it ends in. `None` when `item` is not a
    /// placeholder or reading it changes nothing yet.
    pub fn settle(&self, item: &Item) -> Result<Option<Item>> {
        let mut current = item.clone();
        let mut seen = HashSet::new();
        while let Item::Unknown(UnknownItem::Unresolved(unresolved)) = &current {
            if !seen.insert(*unresolved) {
                return Err(Error::unknown_item(format!("{} refers to itself", item)));
            }
            match unresolved.read(self)? {
                Resolution::Resolved(next) => current = next,
                Resolution::Pending => break,
            }
        }
        Ok((&current != item).then_some(current))
    }

    /// Replace unresolved placeholders nested anywhere below `roots` by the items they now
    /// read as. Returns the number of placeholders installed.
    pub fn install_resolved_items(&self, arena: &mut ItemArena, roots: &[Item]) -> Result<usize> {
        let mut installed = 0;
        let mut seen: HashSet<ItemRef> = HashSet::new();
        let mut stack: Vec<ItemRef> = roots.iter().filter_map(Item::item_ref).collect();
        while let Some(r) = stack.pop() {
            if !seen.insert(r) {
                continue;
            }
            let mut failure = None;
            installed += arena.iterate_nested_items(r, |nest| {
                match self.settle(&nest.child) {
                    Ok(settled) => settled,
                    Err(err) => {
                        failure.get_or_insert(err);
                        None
                    }
                }
            })?;
            if let Some(err) = failure {
                return Err(err);
            }
            stack.extend(arena.nests(r).iter().filter_map(|nest| nest.child.item_ref()));
        }
        Ok(installed)
    }
}
