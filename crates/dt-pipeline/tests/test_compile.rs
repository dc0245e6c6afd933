// End-to-end compilation of small units

use pretty_assertions::assert_eq;

use dt_core::expr::{CompExpr, CompGroup};
use dt_core::runtime::{BinOp, Program, RtExpr, RtStmt};
use dt_core::{GroupId, Item, Result, VarId};
use dt_pipeline::{compile, CompilationUnit, PipelineOptions, WriteModules};

fn export_slot(name: &str, group: u32, slot: usize) -> RtStmt {
    RtStmt::Export {
        name: name.to_string(),
        init: RtExpr::Comptime {
            group: GroupId(group),
            slot,
        },
    }
}

/// `config.peer.back` is `config` again.
fn cyclic_unit() -> CompilationUnit {
    CompilationUnit::new("cyclic")
        .with_group(
            CompGroup::new(
                GroupId(0),
                "config",
                vec![CompExpr::record(vec![
                    ("name", CompExpr::lit(Item::str("demo"))),
                    ("peer", CompExpr::lazy_slot(GroupId(1), 0)),
                ])],
            )
            .into_shared(),
        )
        .with_group(
            CompGroup::new(
                GroupId(1),
                "peer",
                vec![CompExpr::record(vec![(
                    "back",
                    CompExpr::lazy_slot(GroupId(0), 0),
                )])],
            )
            .into_shared(),
        )
        .with_program(Program::new(vec![export_slot("config", 0, 0)]))
}

#[test]
fn cyclic_records_compile_with_one_patch() {
    let modules = compile(cyclic_unit(), &PipelineOptions::default()).unwrap();
    assert_eq!(
        modules.primary,
        "import * as __items from \"./items.js\";\nexport const config = __items.item0;"
    );
    assert_eq!(
        modules.support,
        [
            "export const item1 = { back: undefined };",
            "export const item0 = { name: \"demo\", peer: item1 };",
            "item1.back = item0;",
        ]
        .join("\n")
    );
    assert_eq!(modules.patch_count, 1);
}

#[test]
fn options_rename_bindings() -> Result<()> {
    let options = PipelineOptions::from_json_str(
        r#"{"emit": {"binding_prefix": "v", "items_alias": "items"}}"#,
    )?;
    let modules = compile(cyclic_unit(), &options).unwrap();
    assert_eq!(
        modules.primary,
        "import * as items from \"./items.js\";\nexport const config = items.v0;"
    );
    assert!(modules.support.ends_with("v1.back = v0;"));
    Ok(())
}

#[test]
fn captured_comptime_values_are_inlined() {
    let unit = CompilationUnit::new("closure")
        .with_group(
            CompGroup::new(
                GroupId(0),
                "adder",
                vec![
                    CompExpr::lit(Item::Num(10.0)),
                    CompExpr::Function {
                        name: "add".into(),
                        params: vec!["x".into()],
                        body: vec![RtStmt::Return(Some(RtExpr::binary(
                            BinOp::Add,
                            RtExpr::ident("x"),
                            RtExpr::ident("base"),
                        )))],
                        captures: vec![("base".into(), CompExpr::slot(GroupId(0), 0))],
                    },
                ],
            )
            .into_shared(),
        )
        .with_program(Program::new(vec![export_slot("add", 0, 1)]));
    let modules = compile(unit, &PipelineOptions::default()).unwrap();
    assert_eq!(
        modules.primary,
        "export const add = function add(x) { return (x + 10); };"
    );
    assert_eq!(modules.support, "");
    assert_eq!(modules.tracked_count, 0);
}

#[test]
fn self_dependent_slot_is_reported() {
    let unit = CompilationUnit::new("stuck")
        .with_group(
            CompGroup::new(GroupId(0), "loop", vec![CompExpr::slot(GroupId(0), 0)]).into_shared(),
        )
        .with_program(Program::new(vec![export_slot("x", 0, 0)]));
    let err = compile(unit, &PipelineOptions::default()).unwrap_err();
    assert_eq!(err.stage, "resolve");
    assert_eq!(err.category, "unresolved");
    assert!(err.message.contains("loop[0]"), "{}", err.message);
}

#[test]
fn absent_values_abort_compilation() {
    let unit = CompilationUnit::new("absent")
        .with_group(
            CompGroup::new(
                GroupId(0),
                "holder",
                vec![CompExpr::record(vec![("missing", CompExpr::Var(VarId(9)))])],
            )
            .into_shared(),
        )
        .with_program(Program::new(vec![export_slot("holder", 0, 0)]));
    let err = compile(unit, &PipelineOptions::default()).unwrap_err();
    assert_eq!(err.stage, "resolve");
    assert_eq!(err.category, "unknown-item");
}

#[test]
fn modules_are_written_verbatim() -> Result<()> {
    let modules = compile(cyclic_unit(), &PipelineOptions::default()).unwrap();
    let dir = tempfile::TempDir::new()?;
    let written = modules.write_to(dir.path())?;
    assert_eq!(
        written,
        vec![dir.path().join("main.js"), dir.path().join("items.js")]
    );
    assert_eq!(std::fs::read_to_string(&written[0])?, modules.primary);
    assert_eq!(std::fs::read_to_string(&written[1])?, modules.support);
    Ok(())
}

#[test]
fn chained_lazy_slots_settle_to_their_final_value() {
    // [[lazy g0[1]], lazy g0[2], 5]
    let unit = CompilationUnit::new("chain")
        .with_group(
            CompGroup::new(
                GroupId(0),
                "chain",
                vec![
                    CompExpr::seq(vec![CompExpr::lazy_slot(GroupId(0), 1)]),
                    CompExpr::lazy_slot(GroupId(0), 2),
                    CompExpr::lit(Item::Num(5.0)),
                ],
            )
            .into_shared(),
        )
        .with_program(Program::new(vec![
            export_slot("list", 0, 0),
            export_slot("alias", 0, 1),
        ]));
    let modules = compile(unit, &PipelineOptions::default()).unwrap();
    assert_eq!(
        modules.primary,
        "export const list = [5];\nexport const alias = 5;"
    );
}
