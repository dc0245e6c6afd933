use std::collections::{HashMap, HashSet, VecDeque};

use dt_core::debug;
use dt_core::item::{Item, ItemArena};
use dt_core::ItemRef;

/// Assigns stable output identities to composite items.
///
/// Identity is the arena handle, never the object's structure. Anchors, features, objects and
/// types are always tracked. Sequences and functions are written inline unless they are
/// reached more than once, in which case they are promoted to tracked items so that sharing
/// and cycles survive emission.
#[derive(Debug, Default)]
pub struct Aggregator {
    ids: HashMap<ItemRef, usize>,
    order: Vec<ItemRef>,
    inline_refs: HashMap<ItemRef, usize>,
    expanded: HashSet<ItemRef>,
    worklist: VecDeque<ItemRef>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `r`. Registering the same object again returns the id it already has.
    pub fn add_item(&mut self, r: ItemRef) -> usize {
        if let Some(id) = self.ids.get(&r) {
            return *id;
        }
        let id = self.order.len();
        self.ids.insert(r, id);
        self.order.push(r);
        if !self.expanded.contains(&r) {
            self.worklist.push_back(r);
        }
        id
    }

    pub fn add_items<'a>(&mut self, items: impl IntoIterator<Item = &'a Item>) {
        for r in items.into_iter().filter_map(Item::item_ref) {
            self.add_item(r);
        }
    }

    /// Note a reference to `item` from emitted code outside the item graph.
    pub fn add_root(&mut self, arena: &ItemArena, item: &Item) {
        if let Some(r) = item.item_ref() {
            self.reference(arena, r);
        }
    }

    fn reference(&mut self, arena: &ItemArena, r: ItemRef) {
        if !arena.get(r).is_inlinable() {
            self.add_item(r);
            return;
        }
        let count = self.inline_refs.entry(r).or_insert(0);
        *count += 1;
        if *count > 1 {
            self.add_item(r);
        } else if !self.expanded.contains(&r) {
            self.worklist.push_back(r);
        }
    }

    /// Walk children of everything discovered so far until nothing new shows up.
    /// Returns the number of tracked items.
    pub fn compute_closure(&mut self, arena: &ItemArena) -> usize {
        while let Some(r) = self.worklist.pop_front() {
            if !self.expanded.insert(r) {
                continue;
            }
            for nest in arena.nests(r) {
                if let Some(child) = nest.child.item_ref() {
                    self.reference(arena, child);
                }
            }
        }
        debug!(
            "aggregated {} tracked items, {} inline",
            self.order.len(),
            self.expanded.len().saturating_sub(self.order.len())
        );
        self.order.len()
    }

    pub fn id_of(&self, r: ItemRef) -> Option<usize> {
        self.ids.get(&r).copied()
    }

    pub fn is_tracked(&self, r: ItemRef) -> bool {
        self.ids.contains_key(&r)
    }

    /// Tracked items in id order.
    pub fn tracked(&self) -> impl Iterator<Item = (usize, ItemRef)> + '_ {
        self.order.iter().copied().enumerate()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
