use tq::value::{person, row};
use tq::{Column, MenuKind, QueryConfig, Row, SortDirection, TableQueryEngine, Value};

fn customers() -> Vec<Row> {
    vec![
        row([
            ("fullName", Value::from("Ali")),
            ("phoneNumber", Value::from("900000001")),
            ("manager", person("Dilshod", "Aliyev")),
            ("amount", Value::from(300)),
        ]),
        row([
            ("fullName", Value::from("Vali")),
            ("phoneNumber", Value::from("900000002")),
            ("manager", person("Bobur", "Valiyev")),
            ("amount", Value::from(100)),
        ]),
        row([
            ("fullName", Value::from("Nodira")),
            ("phoneNumber", Value::from("911234567")),
            ("manager", person("Ali", "Qodirov")),
            ("amount", Value::from(200)),
        ]),
        row([
            ("fullName", Value::from("Jasur")),
            ("phoneNumber", Value::Null),
            ("manager", Value::Null),
            ("amount", Value::from(50)),
        ]),
    ]
}

fn field(rows: &[&Row], key: &str) -> Vec<String> {
    rows.iter().map(|r| r[key].to_string()).collect()
}

#[test]
fn untouched_state_returns_the_source_rows() {
    let rows = customers();
    let engine = TableQueryEngine::default();
    let derived = engine.derive(&rows);
    assert_eq!(derived.len(), rows.len());
    assert!(derived.iter().zip(&rows).all(|(a, b)| *a == b));
}

#[test]
fn two_row_search_and_filter_examples() {
    let rows = vec![
        row([("fullName", "Ali"), ("phoneNumber", "900000001")]),
        row([("fullName", "Vali"), ("phoneNumber", "900000002")]),
    ];
    let mut engine = TableQueryEngine::default();

    // "Vali" contains "ali" as well, search is a plain substring match.
    engine.state.set_search_text("ali");
    assert_eq!(field(&engine.derive(&rows), "fullName"), ["Ali", "Vali"]);
    engine.state.set_search_text("900000001");
    assert_eq!(field(&engine.derive(&rows), "fullName"), ["Ali"]);

    engine.state.set_search_text("");
    engine.state.set_filter_value("fullName", "v");
    assert_eq!(field(&engine.derive(&rows), "fullName"), ["Vali"]);
}

#[test]
fn every_row_with_a_matching_candidate_field_is_kept() {
    let rows = customers();
    let mut engine = TableQueryEngine::default();
    engine.state.set_search_text("ALI");
    // Ali and Vali by name, Dilshod Aliyev and Ali Qodirov by manager.
    assert_eq!(field(&engine.derive(&rows), "fullName"), ["Ali", "Vali", "Nodira"]);

    engine.state.set_search_text("no such text");
    assert!(engine.derive(&rows).is_empty());
}

#[test]
fn filtering_twice_changes_nothing() {
    let rows = customers();
    let mut engine = TableQueryEngine::default();
    engine.state.set_filter_value("manager", "dilshod");
    let once = engine.derive_indices(&rows);
    engine.state.set_filter_value("manager", "dilshod");
    assert_eq!(engine.derive_indices(&rows), once);
    // Jasur has no manager and passes.
    assert_eq!(once, vec![0, 3]);
}

#[test]
fn clearing_filters_restores_the_count() {
    let rows = customers();
    let mut engine = TableQueryEngine::default();
    engine.state.set_filter_value("amount", "0");
    engine.state.set_filter_value("phoneNumber", "9000");
    assert_eq!(engine.derive(&rows).len(), 3);
    engine.state.clear_filters();
    assert_eq!(engine.derive(&rows).len(), rows.len());
}

#[test]
fn toggling_the_sort_key_reverses_the_order() {
    let rows = vec![row([("amount", 300)]), row([("amount", 100)]), row([("amount", 200)])];
    let mut engine = TableQueryEngine::default();
    engine.state.set_sort("amount");
    let ascending = engine.derive_indices(&rows);
    assert_eq!(field(&engine.derive(&rows), "amount"), ["100", "200", "300"]);

    engine.state.set_sort("amount");
    let mut descending = engine.derive_indices(&rows);
    assert_eq!(field(&engine.derive(&rows), "amount"), ["300", "200", "100"]);
    descending.reverse();
    assert_eq!(descending, ascending);
}

#[test]
fn manager_sorts_by_full_name() {
    let rows = customers();
    let mut engine = TableQueryEngine::default();
    engine.state.set_sort("manager");
    // Null first, then "Ali Qodirov", "Bobur Valiyev", "Dilshod Aliyev".
    assert_eq!(field(&engine.derive(&rows), "fullName"), ["Jasur", "Nodira", "Vali", "Ali"]);
    engine.state.set_sort("manager");
    assert_eq!(engine.state.sort().map(|s| s.direction), Some(SortDirection::Descending));
    assert_eq!(field(&engine.derive(&rows), "fullName"), ["Ali", "Vali", "Nodira", "Jasur"]);
}

#[test]
fn search_then_filter_then_sort() {
    let rows = customers();
    let mut engine = TableQueryEngine::default();
    engine.state.set_search_text("ali");
    engine.state.set_filter_value("phoneNumber", "900");
    engine.state.set_sort("amount");
    assert_eq!(field(&engine.derive(&rows), "fullName"), ["Vali", "Ali"]);
}

#[test]
fn injected_search_fields_replace_the_defaults() {
    let rows = vec![
        row([("productName", "Samsung A54"), ("status", "active")]),
        row([("productName", "LG Washer"), ("status", "closed")]),
    ];
    let config = QueryConfig {
        search_fields: vec!["status".into()],
        ..QueryConfig::default()
    };
    let mut engine = TableQueryEngine::new(config, &[]);
    engine.state.set_search_text("samsung");
    assert!(engine.derive(&rows).is_empty());
    engine.state.set_search_text("clos");
    assert_eq!(field(&engine.derive(&rows), "productName"), ["LG Washer"]);
}

#[test]
fn column_selection_and_menus_leave_the_rows_alone() {
    let rows = customers();
    let columns = vec![
        Column::new("fullName", "Full Name"),
        Column::new("manager", "Manager"),
        Column::new("amount", "Amount"),
    ];
    let mut engine = TableQueryEngine::new(QueryConfig::default(), &columns);
    engine.state.toggle_column("manager");
    engine.state.open_menu(MenuKind::Columns, 1);
    assert_eq!(engine.derive(&rows).len(), rows.len());

    let visible: Vec<&str> = engine
        .state
        .visible_columns(&columns)
        .iter()
        .map(|c| c.label.as_str())
        .collect();
    assert_eq!(visible, ["Full Name", "Amount"]);
    assert_eq!(engine.state.anchors().get(MenuKind::Columns), Some(1));
}
