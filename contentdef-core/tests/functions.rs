mod common;

use std::path::PathBuf;

use common::{engine, seeded_config, values, MemoryHost};
use contentdef_core::func::Function;
use contentdef_core::{
    ContentEngine, Context, DiagnosticKind, EngineConfig, FuncCall, Outcome, Simplifier,
};
use serde::Deserialize;

#[test]
fn join_flattens_nested_arrays() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text(r#"Join(", ", [a, [b, c]], d, ~)"#, "main.txt");
    assert!(loaded.diagnostics.is_empty(), "{:?}", loaded.diagnostics);
    assert_eq!(loaded.items()[0].as_token().unwrap().value, "a, b, c, d");
}

#[test]
fn join_waits_for_late_members() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text("Join(+, [a, Choose([b])])", "main.txt");
    assert_eq!(loaded.items()[0].function_name(), Some("Join"));
    assert_eq!(engine.resolve_token(&loaded.items()[0]).unwrap().value, "a+b");
}

#[test]
fn asset_paths() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text(
        "@@(textures/A.png); @(textures/A.png); @@(../shared/b.png); @@(/root.png)",
        "mods/pack/content.txt",
    );
    assert_eq!(
        values(loaded.items()),
        vec![
            "mods/pack/textures/A.png",
            "assets/mods/pack/textures/a.png",
            "mods/shared/b.png",
            "root.png",
        ]
    );
}

#[test]
fn raw_asset_paths_include_content_root() {
    let config = EngineConfig {
        content_root: PathBuf::from("packs"),
        ..seeded_config(1)
    };
    let mut engine = ContentEngine::new(config, Box::new(MemoryHost::new()));
    let loaded = engine.load_text("@@(textures/A.png); @(textures/A.png)", "mods/content.txt");
    assert_eq!(
        values(loaded.items()),
        vec!["packs/mods/textures/A.png", "assets/mods/textures/a.png"]
    );
}

#[test]
fn combine_arrays_and_blocks() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text(
        "Combine([a], ~, [b, c]); Combine({ A: 1 }, { B: 2; A: 3 }); Combine(); Combine([a], { B: 1 })",
        "main.txt",
    );
    let items = loaded.items();
    assert_eq!(items.len(), 3);
    assert_eq!(values(&items[0].as_array().unwrap().items), vec!["a", "b", "c"]);
    let block = items[1].as_block().unwrap();
    assert_eq!(block.len(), 2);
    assert_eq!(block.get("A").unwrap().as_token().unwrap().value, "3");
    assert_eq!(items[2].as_token().unwrap().value, "error");
    assert_eq!(loaded.diagnostics.len(), 1);
}

#[test]
fn remove_block_keys() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text("Remove({ A: 1; B: 2; C: 3 }, A, C); Remove(x, A)", "main.txt");
    let block = loaded.items()[0].as_block().unwrap();
    assert_eq!(block.len(), 1);
    assert!(block.get("B").is_some());
    assert_eq!(loaded.items()[1].as_token().unwrap().value, "error");
    assert!(matches!(
        loaded.diagnostics[0].kind,
        DiagnosticKind::InvalidArgument { .. }
    ));
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
struct ColorRecord {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

#[test]
fn record_constructors() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text(
        "Vector2(1, 2.5); Color(255, 0, 10); Rectangle(0, 0, 4, 3); Color(300, 0, 0); Point(1)",
        "main.txt",
    );
    let items = loaded.items();
    assert_eq!(items.len(), 5);

    let vector = items[0].as_block().unwrap();
    assert_eq!(vector.get("Y").unwrap().as_token().unwrap().value, "2.5");
    let color: ColorRecord = items[1].deserialize().unwrap();
    assert_eq!(
        color,
        ColorRecord {
            r: 255,
            g: 0,
            b: 10,
            a: 255
        }
    );
    let rectangle = items[2].as_block().unwrap();
    assert_eq!(rectangle.get("Width").unwrap().as_token().unwrap().value, "4");

    assert_eq!(items[3].as_token().unwrap().value, "error");
    assert_eq!(items[4].as_token().unwrap().value, "error");
    assert!(matches!(
        loaded.diagnostics[0].kind,
        DiagnosticKind::InvalidArgument { .. }
    ));
    assert!(matches!(
        loaded.diagnostics[1].kind,
        DiagnosticKind::InvalidArity { found: 1, .. }
    ));
}

#[test]
fn seeded_and_static_choices_are_stable() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text(
        "Choose([a, b, c, d, e, f, g, h], Static); Choose([a, b, c, d, e, f, g, h], lucky)",
        "main.txt",
    );
    for item in loaded.items() {
        let first = engine.resolve_token(item).unwrap();
        for _ in 0..10 {
            assert_eq!(engine.resolve_token(item).unwrap(), first);
        }
    }
}

#[test]
fn weighted_choice_without_weights() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text(
        "ChooseWeighted([{ Weight: 0; V: a }, { Weight: 0; V: b }]); ChooseWeighted([{ V: only }], Flatten)",
        "main.txt",
    );
    assert_eq!(engine.resolve_token(&loaded.items()[0]).unwrap().value, "error");
    assert!(matches!(
        engine.take_diagnostics()[0].kind,
        DiagnosticKind::InvalidArgument { .. }
    ));
    assert_eq!(engine.resolve_token(&loaded.items()[1]).unwrap().value, "only");
}

#[test]
fn choosing_from_bound_list() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text("Set^(Pick, Choose([a, b])); ^(Pick)", "main.txt");
    assert_eq!(loaded.items()[0].function_name(), Some("Choose"));
    let value = engine.resolve_token(&loaded.items()[0]).unwrap().value;
    assert!(value == "a" || value == "b");
}

struct Upper;

impl Function for Upper {
    fn simplify(&self, call: &FuncCall, sx: &mut Simplifier, ctx: &Context) -> Outcome {
        let mut out = String::new();
        for param in &call.params {
            match sx.require_token(param, ctx) {
                Ok(token) => out.push_str(&token.value.to_uppercase()),
                Err(outcome) => return outcome,
            }
        }
        Outcome::token(out, &call.meta)
    }
}

#[test]
fn host_functions() {
    let mut engine = engine(MemoryHost::new());
    engine.register("Upper", Upper);
    let loaded = engine.load_text("Upper(abc, Concatenate(d, e)); Uper(x)", "main.txt");
    assert_eq!(loaded.items()[0].as_token().unwrap().value, "ABCDE");
    assert_eq!(loaded.items()[1].function_name(), Some("Uper"));

    let token = engine.resolve_token(&loaded.items()[1]).unwrap();
    assert_eq!(token.value, "error");
    assert_eq!(
        engine.take_diagnostics()[0].kind,
        DiagnosticKind::UnknownFunction {
            name: "Uper".to_string(),
            suggestion: Some("Upper".to_string()),
        }
    );
}

#[test]
fn combine_rejects_unknown_calls() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text("Combine([a], Missing(b))", "main.txt");
    assert_eq!(loaded.items()[0].as_token().unwrap().value, "error");
    assert!(matches!(
        loaded.diagnostics[0].kind,
        DiagnosticKind::InvalidArgument { .. }
    ));
}
