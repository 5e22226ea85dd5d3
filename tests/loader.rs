use std::path::PathBuf;

use tq::value::person;
use tq::{TQError, TableQueryEngine, Value, infer_columns, load_rows};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn loads_the_json_envelope() {
    let dataset = load_rows(fixture("customers.json")).unwrap();
    assert_eq!(dataset.name, "customers.json");
    assert_eq!(dataset.rows.len(), 4);
    assert_eq!(dataset.fields[..3], ["id", "fullName", "phoneNumber"]);
    assert_eq!(dataset.rows[0]["manager"], person("Dilshod", "Aliyev"));
    assert_eq!(dataset.rows[3]["manager"], Value::Null);
    assert_eq!(dataset.rows[1]["balance"], Value::Int(250000));
}

#[test]
fn json_rows_drive_the_engine() {
    let dataset = load_rows(fixture("customers.json")).unwrap();
    let columns = infer_columns(&dataset.fields, &dataset.rows);
    let mut engine = TableQueryEngine::new(Default::default(), &columns);

    engine.state.set_search_text("tashkent");
    assert_eq!(engine.derive(&dataset.rows).len(), 2);

    // Object fields other than manager never filter rows out.
    engine.state.set_search_text("");
    engine.state.set_filter_value("branch", "nowhere");
    assert_eq!(engine.derive(&dataset.rows).len(), 4);

    engine.state.set_filter_value("manager", "qodirov");
    engine.state.set_sort("balance");
    let names: Vec<String> = engine
        .derive(&dataset.rows)
        .iter()
        .map(|r| r["fullName"].to_string())
        .collect();
    assert_eq!(names, ["Nodira Usmonova", "Jasur Toshpulatov"]);
}

#[test]
fn loads_csv_with_dotted_columns() {
    let dataset = load_rows(fixture("contracts.csv")).unwrap();
    assert_eq!(
        dataset.fields,
        ["contractId", "customerName", "productName", "amount", "manager", "status"]
    );
    assert_eq!(dataset.rows.len(), 3);
    assert_eq!(dataset.rows[0]["amount"], Value::Int(300));
    assert_eq!(dataset.rows[1]["manager"], person("Bobur", "Valiyev"));
    assert!(!dataset.rows[2].contains_key("manager"));

    let mut engine = TableQueryEngine::default();
    engine.state.set_search_text("bobur");
    assert_eq!(engine.derive(&dataset.rows).len(), 1);
    engine.state.set_search_text("");
    engine.state.set_sort("amount");
    let ids: Vec<String> = engine
        .derive(&dataset.rows)
        .iter()
        .map(|r| r["contractId"].to_string())
        .collect();
    assert_eq!(ids, ["C-1002", "C-1003", "C-1001"]);
}

#[test]
fn missing_and_unknown_files_are_rejected() {
    assert!(matches!(
        load_rows(fixture("contracts.xlsx")),
        Err(TQError::FileNotFound)
    ));
    assert!(matches!(
        load_rows(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml")),
        Err(TQError::UnknownFileType)
    ));
}
