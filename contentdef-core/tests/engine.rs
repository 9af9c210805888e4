mod common;

use common::{engine, seeded_config, values, MemoryHost};
use contentdef_core::{ContentEngine, DiagnosticKind, Node, Outcome};

#[test]
fn regular_functions_collapse_on_load() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text(r#"Concatenate("a", "b", "c")"#, "main.txt");
    assert!(loaded.diagnostics.is_empty(), "{:?}", loaded.diagnostics);
    let token = loaded.items()[0].as_token().unwrap();
    assert_eq!(token.value, "abc");
    assert!(token.is_string);
}

#[test]
fn remove_from_array() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text("Remove([1, 2, 3], 2)", "main.txt");
    let array = loaded.items()[0].as_array().unwrap();
    assert_eq!(values(&array.items), vec!["1", "3"]);
}

#[test]
fn include_is_spliced_in_place() {
    let host = MemoryHost::new()
        .with_file("data/main.txt", "a; Include(other.txt); b")
        .with_file("data/other.txt", "x; y; z");
    let mut engine = engine(host);
    let loaded = engine.load_file("data/main.txt").unwrap();
    assert!(loaded.diagnostics.is_empty(), "{:?}", loaded.diagnostics);
    assert_eq!(values(loaded.items()), vec!["a", "x", "y", "z", "b"]);

    // included nodes are marked with the include chain
    let uid = &loaded.items()[1].meta().uid;
    assert!(uid.starts_with("data/main.txt:"), "{}", uid);
    assert!(uid.ends_with(">data/other.txt:1:1"), "{}", uid);
}

#[test]
fn included_single_array_is_spliced() {
    let host = MemoryHost::new()
        .with_file("main.txt", "[a, Include(list.txt), b]")
        .with_file("list.txt", "[x, y, z]");
    let mut engine = engine(host);
    let loaded = engine.load_file("main.txt").unwrap();
    let array = loaded.items()[0].as_array().unwrap();
    assert_eq!(values(&array.items), vec!["a", "x", "y", "z", "b"]);
}

#[test]
fn include_overrides_context() {
    let host = MemoryHost::new()
        .with_file("main.txt", "Include(greet.txt, { Name: Bob }); ^(Name, nobody)")
        .with_file("greet.txt", r#"Concatenate("Hello ", ^(Name))"#);
    let mut engine = engine(host);
    let loaded = engine.load_file("main.txt").unwrap();
    assert_eq!(values(loaded.items()), vec!["Hello Bob", "nobody"]);
}

#[test]
fn missing_include_leaves_null() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text("Include(missing.txt); after", "main.txt");
    assert_eq!(loaded.items().len(), 2);
    assert!(loaded.items()[0].is_null());
    assert_eq!(
        loaded.diagnostics[0].kind,
        DiagnosticKind::IncludeNotFound("missing.txt".to_string())
    );
}

#[test]
fn include_cycle_is_reported() {
    let host = MemoryHost::new()
        .with_file("a.txt", "Include(b.txt)")
        .with_file("b.txt", "Include(a.txt); x");
    let mut engine = engine(host);
    let loaded = engine.load_file("a.txt").unwrap();
    assert_eq!(loaded.diagnostics.len(), 1);
    assert_eq!(
        loaded.diagnostics[0].kind,
        DiagnosticKind::IncludeCycle(vec![
            "a.txt".to_string(),
            "b.txt".to_string(),
            "a.txt".to_string()
        ])
    );
    assert!(loaded.items()[0].is_null());
    assert_eq!(loaded.items()[1].as_token().unwrap().value, "x");
}

#[test]
fn include_depth_is_limited() {
    let host = MemoryHost::new()
        .with_file("f0.txt", "Include(f1.txt)")
        .with_file("f1.txt", "Include(f2.txt)")
        .with_file("f2.txt", "Include(f3.txt)")
        .with_file("f3.txt", "end");
    let mut config = seeded_config(1);
    config.max_include_depth = 2;
    let mut engine = ContentEngine::new(config, Box::new(host));
    let loaded = engine.load_file("f0.txt").unwrap();
    assert_eq!(loaded.diagnostics.len(), 1);
    assert_eq!(loaded.diagnostics[0].kind, DiagnosticKind::IncludeDepth(2));
    assert!(loaded.items()[0].is_null());
}

#[test]
fn context_shadowing() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text(
        "^(X, default); Set^(X, 1); ^(X); Set^(X, 2); ^(X)",
        "main.txt",
    );
    assert!(loaded.diagnostics.is_empty(), "{:?}", loaded.diagnostics);
    assert_eq!(values(loaded.items()), vec!["default", "1", "2"]);
}

#[test]
fn context_read_before_binding_fails() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text("^(X); Set^(X, 1) ^(X)", "main.txt");
    assert_eq!(
        values(loaded.items()),
        vec!["invalid context value X", "1"]
    );
    assert_eq!(
        loaded.diagnostics[0].kind,
        DiagnosticKind::InvalidContextValue("X".to_string())
    );
}

#[test]
fn bindings_stay_in_enclosing_list() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text("[Set^(A, 1), ^(A)]; ^(A, none); { K: ^(A, none) }", "main.txt");
    assert_eq!(values(&loaded.items()[0].as_array().unwrap().items), vec!["1"]);
    assert_eq!(loaded.items()[1].as_token().unwrap().value, "none");
    let block = loaded.items()[2].as_block().unwrap();
    assert_eq!(block.get("K").unwrap().as_token().unwrap().value, "none");
}

#[test]
fn conditional_sections() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text("If(true) yes; If(False) no; If(TRUE) [a, b]", "main.txt");
    assert_eq!(loaded.items().len(), 2);
    assert_eq!(loaded.items()[0].as_token().unwrap().value, "yes");
    assert_eq!(values(&loaded.items()[1].as_array().unwrap().items), vec!["a", "b"]);

    let loaded = engine.load_text("If(a, b) x", "main.txt");
    assert!(matches!(
        loaded.diagnostics[0].kind,
        DiagnosticKind::InvalidArity { .. }
    ));
}

#[test]
fn late_calls_survive_structural_pass() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text("Choose([a, b, c])", "main.txt");
    let source = match &loaded.source {
        Node::Array(array) => array.items[0].clone(),
        other => panic!("unexpected root {:?}", other),
    };
    assert_eq!(loaded.items()[0], source);
    assert_eq!(loaded.items()[0].function_name(), Some("Choose"));

    for _ in 0..20 {
        let picked = engine.resolve(&loaded.items()[0]).unwrap();
        let value = &picked.as_token().unwrap().value;
        assert!(["a", "b", "c"].contains(&value.as_str()), "{}", value);
    }
}

#[test]
fn regular_call_waits_for_late_params() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text("Concatenate(x, Choose([a]))", "main.txt");
    assert_eq!(loaded.items()[0].function_name(), Some("Concatenate"));
    let token = engine.resolve_token(&loaded.items()[0]).unwrap();
    assert_eq!(token.value, "xa");
}

#[test]
fn late_calls_keep_their_context() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text(
        "Set^(Color, red); Choose([Concatenate(^(Color), -ish)])",
        "main.txt",
    );
    assert_eq!(loaded.items().len(), 1);
    let token = engine.resolve_token(&loaded.items()[0]).unwrap();
    assert_eq!(token.value, "red-ish");
}

#[test]
fn weighted_choice_follows_weights() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text(
        "ChooseWeighted([{ Weight: 1; V: a }, { Weight: 3; V: b }], Flatten)",
        "main.txt",
    );
    let call = loaded.items()[0].clone();
    let (mut a, mut b) = (0, 0);
    for _ in 0..10_000 {
        match engine.resolve_token(&call).unwrap().value.as_str() {
            "a" => a += 1,
            "b" => b += 1,
            other => panic!("unexpected pick {}", other),
        }
    }
    let ratio = b as f64 / a as f64;
    assert!(ratio > 2.7 && ratio < 3.3, "ratio: {}", ratio);
}

#[test]
fn structural_pass_is_idempotent() {
    let host = MemoryHost::new()
        .with_file("main.txt", "Set^(N, 2); Include(part.txt); Entry(x) { A: ^(N) }; Choose([a, b])")
        .with_file("part.txt", "Vector2(^(N), 3); Join(-, [a, b])");
    let mut engine = engine(host);
    let loaded = engine.load_file("main.txt").unwrap();
    let again = match engine.simplify(&loaded.root, false) {
        Outcome::Value(node) => node,
        other => panic!("unexpected outcome {:?}", other),
    };
    assert_eq!(again, loaded.root);
    assert_eq!(again.to_string(), loaded.root.to_string());

    let mut refreshed = loaded.clone();
    engine.refresh(&mut refreshed);
    assert_eq!(refreshed.root, loaded.root);
}

#[test]
fn malformed_entry_is_contained() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text("{ a: 1; b; c: 3 }; tail", "main.txt");
    assert_eq!(loaded.diagnostics.len(), 1);
    assert!(loaded.diagnostics[0].kind.is_parse_error());
    assert_eq!(loaded.items().len(), 2);
    let block = loaded.items()[0].as_block().unwrap();
    assert!(block.get("a").is_some() && block.get("c").is_some());
}

#[test]
fn refresh_keeps_parse_diagnostics() {
    let mut engine = engine(MemoryHost::new());
    let mut loaded = engine.load_text("{ a: 1; b }; ^(Missing)", "main.txt");
    assert_eq!(loaded.diagnostics.len(), 2);
    engine.refresh(&mut loaded);
    assert_eq!(loaded.diagnostics.len(), 2);
}

#[test]
fn unknown_statements_are_kept() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text("Entry(key) { A: Concatenate(x, y) }", "main.txt");
    match &loaded.items()[0] {
        Node::Statement(st) => {
            assert_eq!(st.call.function, "Entry");
            let data = st.data.as_block().unwrap();
            assert_eq!(data.get("A").unwrap().as_token().unwrap().value, "xy");
        }
        other => panic!("expected statement, found {:?}", other),
    }
}

#[test]
fn unknown_function_suggests_name() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text("Concatenate(a, Chose([b]))", "main.txt");
    assert_eq!(loaded.items()[0].as_token().unwrap().value, "error");
    assert_eq!(
        loaded.diagnostics[0].kind,
        DiagnosticKind::UnknownFunction {
            name: "Chose".to_string(),
            suggestion: Some("Choose".to_string()),
        }
    );
}

#[test]
fn filter_reports_refresh_changes() {
    let host = MemoryHost::new();
    let conditions = host.conditions();
    conditions.borrow_mut().insert("Spring".to_string(), true);
    conditions.borrow_mut().insert("Summer".to_string(), false);
    let mut engine = engine(host);

    let loaded = engine.load_text(
        "FilterByCondition([{ Condition: Spring; Value: a }, { Condition: Summer; Value: b }, c], Flatten)",
        "main.txt",
    );
    assert_eq!(loaded.items()[0].function_name(), Some("FilterByCondition"));
    assert!(!engine.would_change_from_refresh(&loaded));

    let filtered = engine.resolve(&loaded.items()[0]).unwrap();
    assert_eq!(values(&filtered.as_array().unwrap().items), vec!["a", "c"]);
    assert!(!engine.would_change_from_refresh(&loaded));

    conditions.borrow_mut().insert("Summer".to_string(), true);
    assert!(engine.would_change_from_refresh(&loaded));
    let filtered = engine.resolve(&loaded.items()[0]).unwrap();
    assert_eq!(values(&filtered.as_array().unwrap().items), vec!["a", "b", "c"]);
    assert!(!engine.would_change_from_refresh(&loaded));

    // a full reload forgets what was seen
    conditions.borrow_mut().insert("Summer".to_string(), false);
    let loaded = engine.load_text(
        "FilterByCondition([{ Condition: Summer; Value: b }])",
        "main.txt",
    );
    assert!(!engine.would_change_from_refresh(&loaded));
}

#[test]
fn unready_condition_is_pending() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text("FilterByCondition([{ Condition: Later; Value: a }])", "main.txt");
    assert_eq!(engine.resolve(&loaded.items()[0]), None);
    assert!(engine.take_diagnostics().is_empty());
}

#[test]
fn unique_id_is_substituted() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text("&.Item", "main.txt");
    assert_eq!(loaded.items()[0].as_token().unwrap().value, "author.pack.Item");
}

#[test]
fn include_with_late_path_waits_for_consumption() {
    let host = MemoryHost::new()
        .with_file(
            "main.txt",
            "Set^(N, 2); Concatenate(a, ^(N)); If(true) yes; Include(Concatenate(p, Choose([1])))",
        )
        .with_file("p1", "b");
    let mut engine = engine(host);
    let loaded = engine.load_file("main.txt").unwrap();
    assert!(loaded.diagnostics.is_empty(), "{:?}", loaded.diagnostics);

    let items = loaded.items();
    assert_eq!(items.len(), 3);
    assert_eq!(values(&items[..2]), vec!["a2", "yes"]);
    assert_eq!(items[2].function_name(), Some("Include"));
    assert_eq!(engine.resolve_token(&items[2]).unwrap().value, "b");
}

#[test]
fn waiting_block_entry_keeps_siblings() {
    let host = MemoryHost::new()
        .with_file(
            "main.txt",
            "{ A: Concatenate(x, y); B: Include(Choose([p1])) }; Concatenate(q, r)",
        )
        .with_file("p1", "b");
    let mut engine = engine(host);
    let loaded = engine.load_file("main.txt").unwrap();

    let block = loaded.items()[0].as_block().unwrap();
    assert_eq!(block.get("A").unwrap().as_token().unwrap().value, "xy");
    let include = block.get("B").unwrap();
    assert_eq!(include.function_name(), Some("Include"));
    assert_eq!(engine.resolve_token(include).unwrap().value, "b");
    assert_eq!(loaded.items()[1].as_token().unwrap().value, "qr");
}

#[test]
fn control_constructs_with_late_arguments() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text(
        "If(Choose([true])) x; Set^(N, Choose([1])); Concatenate(a, ^(N)); Concatenate(q, r)",
        "main.txt",
    );
    assert!(loaded.diagnostics.is_empty(), "{:?}", loaded.diagnostics);

    let items = loaded.items();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].function_name(), Some("If"));
    assert_eq!(items[1].function_name(), Some("Concatenate"));
    assert_eq!(items[2].as_token().unwrap().value, "qr");

    assert_eq!(engine.resolve_token(&items[0]).unwrap().value, "x");
    assert_eq!(engine.resolve_token(&items[1]).unwrap().value, "a1");
}

#[test]
fn null_and_quoted_names_bind_separately() {
    let mut engine = engine(MemoryHost::new());
    let loaded = engine.load_text(r#"Set^("~", a); ^("~", none); ^(~, none)"#, "main.txt");
    assert!(loaded.diagnostics.is_empty(), "{:?}", loaded.diagnostics);
    assert_eq!(values(loaded.items()), vec!["a", "none"]);
}
