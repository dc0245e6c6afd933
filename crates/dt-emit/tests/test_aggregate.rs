// Identity assignment and reachability closure

use dt_core::item::{Field, NestSlot};
use dt_core::{Item, ItemArena, Result};
use dt_emit::{emit_modules, Aggregator, EmitOptions};
use dt_core::runtime::Program;

#[test]
fn registering_twice_keeps_one_id() {
    let mut arena = ItemArena::new();
    let a = arena.alloc_record(vec![Field::new("x", Item::Num(1.0))]);
    let twin = arena.alloc_record(vec![Field::new("x", Item::Num(1.0))]);
    let mut aggregator = Aggregator::new();
    let first = aggregator.add_item(a.item_ref().unwrap());
    let again = aggregator.add_item(a.item_ref().unwrap());
    let other = aggregator.add_item(twin.item_ref().unwrap());
    assert_eq!(first, again);
    assert_ne!(first, other);
    assert_eq!(aggregator.len(), 2);
}

#[test]
fn deeply_nested_items_are_discovered() {
    let mut arena = ItemArena::new();
    let leaf = arena.alloc_record(vec![Field::new("depth", Item::Num(3.0))]);
    let inner = arena.alloc_seq(vec![leaf.clone()]);
    let middle = arena.alloc_seq(vec![inner]);
    let outer = arena.alloc_seq(vec![Item::Null, middle]);
    let mut aggregator = Aggregator::new();
    aggregator.add_root(&arena, &outer);
    assert_eq!(aggregator.compute_closure(&arena), 1);
    assert_eq!(aggregator.id_of(leaf.item_ref().unwrap()), Some(0));
    assert!(!aggregator.is_tracked(outer.item_ref().unwrap()));
}

#[test]
fn shared_sequences_are_promoted() {
    let mut arena = ItemArena::new();
    let shared = arena.alloc_seq(vec![Item::Num(1.0)]);
    let holder = arena.alloc_record(vec![
        Field::new("left", shared.clone()),
        Field::new("right", shared.clone()),
    ]);
    let mut aggregator = Aggregator::new();
    aggregator.add_root(&arena, &holder);
    aggregator.compute_closure(&arena);
    assert_eq!(aggregator.id_of(holder.item_ref().unwrap()), Some(0));
    assert_eq!(aggregator.id_of(shared.item_ref().unwrap()), Some(1));
}

#[test]
fn cycles_terminate() -> Result<()> {
    let mut arena = ItemArena::new();
    let a = arena.alloc_record(vec![Field::new("child", Item::Null)]);
    let b = arena.alloc_record(vec![Field::new("child", a.clone())]);
    arena.splice(a.item_ref().unwrap(), &NestSlot::Field("child".into()), b.clone())?;
    let mut aggregator = Aggregator::new();
    aggregator.add_items([&a, &b, &a]);
    assert_eq!(aggregator.compute_closure(&arena), 2);
    Ok(())
}

#[test]
fn list_of_one_nested_pair_emits_two_bindings() -> Result<()> {
    let mut arena = ItemArena::new();
    let b = arena.alloc_record(vec![Field::new("name", Item::str("b"))]);
    let a = arena.alloc_record(vec![Field::new("next", b.clone())]);
    let list = arena.alloc_seq(vec![a.clone()]);
    let mut aggregator = Aggregator::new();
    aggregator.add_root(&arena, &list);
    assert_eq!(aggregator.compute_closure(&arena), 2);
    let id_a = aggregator.id_of(a.item_ref().unwrap());
    let id_b = aggregator.id_of(b.item_ref().unwrap());
    assert!(id_a.is_some() && id_b.is_some());
    assert_ne!(id_a, id_b);

    let modules = emit_modules(
        &Program::default(),
        &arena,
        &aggregator,
        &EmitOptions::default(),
    )?;
    assert_eq!(modules.patch_count, 0);
    assert_eq!(
        modules
            .support
            .lines()
            .filter(|line| line.starts_with("export const "))
            .count(),
        2
    );
    Ok(())
}
