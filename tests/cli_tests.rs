//! End-to-end tests of the `marketrun` binary.

mod harness;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use harness::temp_db::TempDb;

const CATALOG: &str = r#"
[[stores]]
name = "North"

[[stores]]
name = "South"

[[stalls]]
name = "Greens"
sort_order = 1

[[categories]]
name = "Vegetables"
sort_order = 1

[[products]]
name = "Tomato"
unit = "kg"
category = "Vegetables"
stall = "Greens"
"#;

fn marketrun(db: &TempDb) -> Command {
    let mut cmd = cargo_bin_cmd!("marketrun");
    cmd.env_remove("MARKETRUN_DATABASE")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(db.missing_config())
        .arg("--database")
        .arg(db.database());
    cmd
}

/// Run with `--json` and return the payload result of the single data line.
fn json_result(db: &TempDb, args: &[&str]) -> Value {
    let output = marketrun(db)
        .arg("--json")
        .args(args)
        .output()
        .expect("run marketrun");
    assert!(
        output.status.success(),
        "marketrun {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).expect("utf-8 stdout");
    let line = stdout.lines().last().expect("one json line");
    let envelope: Value = serde_json::from_str(line).expect("json envelope");
    assert_eq!(envelope["type"], "data");
    envelope["payload"]["result"].clone()
}

/// Decimals serialize as strings; compare them numerically.
fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .unwrap_or_else(|| panic!("expected decimal string, got {value}"))
        .parse()
        .expect("decimal")
}

fn seed(db: &TempDb) {
    let catalog = db.write("catalog.toml", CATALOG);
    marketrun(db)
        .args(["catalog", "import"])
        .arg(&catalog)
        .assert()
        .success();
}

fn order(db: &TempDb, name: &str, store: &str, quantity: u32) {
    let file = db.write(
        name,
        &format!(
            "store = \"{store}\"\nrequester = \"clerk\"\ndelivery_date = \"2026-03-01\"\n\n[[items]]\nproduct = \"Tomato\"\nquantity = {quantity}\n"
        ),
    );
    marketrun(db).args(["order", "submit"]).arg(&file).assert().success();
}

#[test]
fn test_help() {
    cargo_bin_cmd!("marketrun")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("marketrun"))
        .stdout(predicate::str::contains("consolidate"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("bill"));
}

#[test]
fn test_version() {
    cargo_bin_cmd!("marketrun")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("marketrun"));
}

#[test]
fn catalog_import_reports_counts() {
    let db = TempDb::create();
    let catalog = db.write("catalog.toml", CATALOG);

    let summary = json_result(&db, &["catalog", "import", catalog.to_str().unwrap()]);
    assert_eq!(summary["stores"], 2);
    assert_eq!(summary["products"], 1);

    marketrun(&db)
        .args(["--color", "never", "catalog", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tomato"))
        .stdout(predicate::str::contains("Greens"));
}

#[test]
fn consolidation_shows_outstanding_demand_per_store() {
    let db = TempDb::create();
    seed(&db);
    order(&db, "north.toml", "North", 10);
    order(&db, "south.toml", "south", 5);

    let demand = json_result(&db, &["consolidate"]);
    assert_eq!(demand[0]["product_name"], "Tomato");
    assert_eq!(decimal(&demand[0]["total_quantity"]), dec!(15));
    assert_eq!(demand[0]["breakdown"].as_array().unwrap().len(), 2);

    let groups = json_result(&db, &["consolidate", "--by-stall"]);
    assert_eq!(groups[0]["stall_name"], "Greens");
}

#[test]
fn purchase_to_bill_flow() {
    let db = TempDb::create();
    seed(&db);
    order(&db, "north.toml", "North", 10);
    order(&db, "south.toml", "South", 5);

    let batch = db.write(
        "batch.toml",
        "purchaser = \"ana\"\ndate = \"2026-03-01\"\n\n[[items]]\nproduct = \"Tomato\"\nquantity = 12\ncost = 96000\n",
    );
    let receipt = json_result(&db, &["batch", "submit", batch.to_str().unwrap()]);
    assert_eq!(receipt["status_changes"].as_array().unwrap().len(), 2);

    let expense = json_result(
        &db,
        &[
            "expense", "add", "--date", "2026-03-01", "--kind", "transport", "--amount", "300",
            "--split", "equal",
        ],
    );
    assert_eq!(decimal(&expense["amount"]), dec!(300));

    let summary = json_result(&db, &["bill", "generate", "2026-03-01"]);
    assert_eq!(summary["total_stores"], 2);
    assert_eq!(decimal(&summary["total_items_amount"]), dec!(96000));
    assert_eq!(decimal(&summary["total_shared_amount"]), dec!(300));

    let bills = summary["bills"].as_array().unwrap();
    let north = bills.iter().find(|b| b["store_name"] == "North").unwrap();
    assert_eq!(decimal(&north["items_total"]), dec!(64000));
    assert_eq!(decimal(&north["shared_total"]), dec!(150));

    let id = north["id"].as_str().unwrap();
    let confirmed = json_result(&db, &["bill", "confirm", id]);
    assert_eq!(confirmed["status"], "confirmed");

    // Nothing left to buy once every order is delivered.
    let demand = json_result(&db, &["consolidate"]);
    assert_eq!(demand.as_array().unwrap().len(), 0);
}

#[test]
fn bill_generate_without_deliveries_fails() {
    let db = TempDb::create();
    seed(&db);

    marketrun(&db)
        .args(["bill", "generate", "2026-03-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no delivered orders"));
}

#[test]
fn order_for_unknown_product_fails() {
    let db = TempDb::create();
    seed(&db);
    let file = db.write(
        "order.toml",
        "store = \"North\"\nrequester = \"clerk\"\ndelivery_date = \"2026-03-01\"\n\n[[items]]\nproduct = \"Durian\"\nquantity = 1\n",
    );

    marketrun(&db)
        .args(["order", "submit"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Durian"));
}

#[test]
fn malformed_config_is_rejected() {
    let db = TempDb::create();
    let config = db.write("config.toml", "[logging]\nformat = \"xml\"\n");

    cargo_bin_cmd!("marketrun")
        .args(["config", "validate", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("logging.format"));
}

#[test]
fn config_init_writes_a_valid_file() {
    let db = TempDb::create();
    let config = db.root().join("config.toml");

    cargo_bin_cmd!("marketrun")
        .args(["config", "init", "--config"])
        .arg(&config)
        .assert()
        .success();
    cargo_bin_cmd!("marketrun")
        .args(["config", "validate", "--config"])
        .arg(&config)
        .assert()
        .success();
}
