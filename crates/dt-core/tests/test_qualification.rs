// Generic qualification: staged application, currying and context isolation

use std::rc::Rc;

use dt_core::expr::{CompExpr, CompGroup, ExprGroup, TypeExpr};
use dt_core::generic::GenericSite;
use dt_core::item::{Item, ItemArena, ItemType, Object};
use dt_core::runtime::BinOp;
use dt_core::{CompContext, GroupId, Result, SiteId, VarId};
use pretty_assertions::assert_eq;

const A: VarId = VarId(0);
const B: VarId = VarId(1);

/// `Pair[A, B] = { first: A, second: B }`
fn pair_site() -> Rc<GenericSite> {
    let body = CompGroup::new(
        GroupId(100),
        "Pair.body",
        vec![CompExpr::ty(TypeExpr::Object {
            features: vec![],
            fields: vec![
                ("first".into(), CompExpr::Var(A)),
                ("second".into(), CompExpr::Var(B)),
            ],
        })],
    );
    Rc::new(GenericSite {
        id: SiteId(0),
        name: "Pair".into(),
        params: vec![A, B],
        groups: vec![],
        body: Rc::new(body),
    })
}

/// `Step[A] = { first: A, next: g101[0] }` where group 101 computes `A + 1`
fn step_site() -> Rc<GenericSite> {
    let next = CompGroup::new(
        GroupId(101),
        "Step.next",
        vec![CompExpr::binary(BinOp::Add, CompExpr::Var(A), CompExpr::lit(Item::Num(1.0)))],
    );
    let body = CompGroup::new(
        GroupId(102),
        "Step.body",
        vec![CompExpr::ty(TypeExpr::Object {
            features: vec![],
            fields: vec![
                ("first".into(), CompExpr::Var(A)),
                ("next".into(), CompExpr::slot(GroupId(101), 0)),
            ],
        })],
    );
    Rc::new(GenericSite {
        id: SiteId(1),
        name: "Step".into(),
        params: vec![A],
        groups: vec![next.into_shared()],
        body: Rc::new(body),
    })
}

fn specialized(arena: &ItemArena, item: &Item) -> ItemType {
    match arena.object(item) {
        Some(Object::Type(ty)) => ty.clone(),
        other => panic!("expected a type, found {:?}", other),
    }
}

fn qualify(ty: &ItemType, args: Option<Vec<Item>>, arena: &mut ItemArena) -> Result<ItemType> {
    let ctx = CompContext::new();
    let item = ty
        .qualify(&ctx, args, arena)?
        .resolved()
        .expect("qualification should not be pending");
    Ok(specialized(arena, &item))
}

#[test]
fn staged_application_equals_single_application() -> Result<()> {
    let mut arena = ItemArena::new();
    let template = ItemType::generic(pair_site());
    let x = Item::str("x");
    let y = Item::Num(2.0);

    let at_once = qualify(&template, Some(vec![x.clone(), y.clone()]), &mut arena)?;
    let staged = template.apply(Some(vec![x.clone()])).apply(Some(vec![y.clone()]));
    let curried = qualify(&staged, None, &mut arena)?;
    let half = template.apply(Some(vec![x.clone()]));
    let completed = qualify(&half, Some(vec![y.clone()]), &mut arena)?;

    assert_eq!(at_once, curried);
    assert_eq!(at_once, completed);
    Ok(())
}

#[test]
fn placeholder_entry_consumes_input_arguments_once() -> Result<()> {
    let mut arena = ItemArena::new();
    let template = ItemType::generic(pair_site());
    let x = Item::str("x");
    let y = Item::str("y");

    // [_] then [y]: the placeholder takes the input arguments in its own position
    let staged = template.apply(None).apply(Some(vec![y.clone()]));
    let result = qualify(&staged, Some(vec![x.clone()]), &mut arena)?;
    let expected = qualify(&template, Some(vec![x, y]), &mut arena)?;
    assert_eq!(result, expected);

    let twice = template.apply(None).apply(None);
    let err = qualify(&twice, Some(vec![Item::Null]), &mut arena).unwrap_err();
    assert_eq!(err.category(), "qualify");
    Ok(())
}

#[test]
fn copies_never_mutate_the_template() {
    let template = ItemType::generic(pair_site());
    let applied = template.apply(Some(vec![Item::Num(1.0)]));
    assert!(template.qualifications.is_empty());
    assert_eq!(applied.qualifications.len(), 1);
    let copy = applied.copy();
    let extended = copy.apply(Some(vec![Item::Num(2.0)]));
    assert_eq!(copy.qualifications.len(), 1);
    assert_eq!(extended.qualifications.len(), 2);
}

#[test]
fn wrong_argument_count_is_reported() {
    let mut arena = ItemArena::new();
    let template = ItemType::generic(pair_site());
    let err = qualify(&template, Some(vec![Item::Null]), &mut arena).unwrap_err();
    assert_eq!(err.category(), "arity");
}

#[test]
fn qualification_marks_only_the_child_context() -> Result<()> {
    let site = pair_site();
    let root = CompContext::new();
    let mut child = CompContext::child(&root);
    child.add_generic_args(&site, vec![Item::Null, Item::Bool(true)])?;
    assert!(child.generic_is_qualified(site.id));
    assert!(!root.generic_is_qualified(site.id));
    let grandchild = CompContext::child(&child);
    assert!(grandchild.generic_is_qualified(site.id));
    Ok(())
}

#[test]
fn unqualified_parameters_evaluate_to_absent_items() -> Result<()> {
    let mut arena = ItemArena::new();
    let ctx = CompContext::new();
    let body = pair_site().body.clone();
    let item = body.evaluate(&ctx, &mut arena)?.resolved().unwrap();
    let ty = specialized(&arena, &item);
    assert!(ty.to_string().contains("absent"));
    Ok(())
}

#[test]
fn qualification_inside_resolution_waits_for_arguments() -> Result<()> {
    let mut arena = ItemArena::new();
    let mut ctx = CompContext::new();
    let pair = CompExpr::ty(TypeExpr::Generic(pair_site()));
    // slot 0 specializes Pair with slot 1, which only resolves afterwards
    ctx.add_group(
        CompGroup::new(
            GroupId(0),
            "unit",
            vec![
                CompExpr::qualify(
                    pair,
                    Some(vec![CompExpr::slot(GroupId(0), 1), CompExpr::lit(Item::Num(0.0))]),
                ),
                CompExpr::lit(Item::str("late")),
            ],
        )
        .into_shared(),
    );
    let first = ctx.resolve_comp_items(&mut arena)?;
    assert_eq!(first.resolved_count, 1);
    ctx.resolve_all(&mut arena)?;
    let item = ctx.get_slot_item(GroupId(0), 0)?.resolved().unwrap();
    assert_eq!(
        specialized(&arena, &item).to_string(),
        "{first: \"late\", second: 0}"
    );
    Ok(())
}

#[test]
fn site_groups_resolve_in_the_qualifying_context_only() -> Result<()> {
    let mut arena = ItemArena::new();
    let site = step_site();
    let mut caller = CompContext::new();
    caller.add_group(
        CompGroup::new(GroupId(0), "unit", vec![CompExpr::lit(Item::str("kept"))]).into_shared(),
    );
    caller.resolve_all(&mut arena)?;
    let before = caller.slot_items();

    let template = ItemType::generic(site.clone());
    let item = template
        .qualify(&caller, Some(vec![Item::Num(2.0)]), &mut arena)?
        .resolved()
        .expect("qualification should not be pending");
    assert_eq!(specialized(&arena, &item).to_string(), "{first: 2, next: 3}");

    let again = template
        .qualify(&caller, Some(vec![Item::Num(10.0)]), &mut arena)?
        .resolved()
        .unwrap();
    assert_eq!(specialized(&arena, &again).to_string(), "{first: 10, next: 11}");

    assert_eq!(caller.slot_items(), before);
    assert!(!caller.generic_is_qualified(site.id));
    let err = caller.get_slot_item(GroupId(101), 0).unwrap_err();
    assert_eq!(err.category(), "unknown-group");
    Ok(())
}
