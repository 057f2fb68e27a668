use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

fn florin(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("florin").unwrap();
    cmd.env("HOME", home);
    cmd
}

fn setup(home: &Path) -> PathBuf {
    let data_dir = home.join("books");
    florin(home)
        .arg("init")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--owner")
        .arg("Mitesh Chhatbar")
        .assert()
        .success();
    data_dir
}

fn add_account(home: &Path, name: &str) {
    florin(home)
        .args(["accounts", "add", name])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added account"));
}

fn write_statement(home: &Path, name: &str, body: &str) -> PathBuf {
    let path = home.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

const STATEMENT_CSV: &str = "\
Date,Description,Amount
01/05/2024,NETFLIX.COM,-15.49
01/06/2024,PAYROLL DEPOSIT COMPANY,2500.00
01/07/2024,SUBWAY RESTAURANT 114,-42.50
";

#[test]
fn init_creates_database_and_seeds_budgets() {
    let home = tempfile::tempdir().unwrap();
    let data_dir = setup(home.path());
    assert!(data_dir.join("florin.db").exists());

    florin(home.path())
        .args(["budgets", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Food & Dining"))
        .stdout(predicate::str::contains("Entertainment"));
}

#[test]
fn status_reports_counts() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());
    add_account(home.path(), "Chase Checking");

    florin(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Owner:      Mitesh Chhatbar"))
        .stdout(predicate::str::contains("Accounts:      1"))
        .stdout(predicate::str::contains("Transactions:  0"));
}

#[test]
fn import_csv_end_to_end() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());
    add_account(home.path(), "Chase Checking");
    let statement = write_statement(home.path(), "jan.csv", STATEMENT_CSV);

    florin(home.path())
        .arg("import")
        .arg(&statement)
        .args(["--account", "Chase Checking"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 imported, 0 skipped"));

    florin(home.path())
        .args(["transactions", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NETFLIX.COM"))
        .stdout(predicate::str::contains("Entertainment"))
        .stdout(predicate::str::contains("2024-01-05"));

    florin(home.path())
        .args(["accounts", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2,442.01"));
}

#[test]
fn reimporting_the_same_file_short_circuits() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());
    add_account(home.path(), "Chase Checking");
    let statement = write_statement(home.path(), "jan.csv", STATEMENT_CSV);

    florin(home.path())
        .arg("import")
        .arg(&statement)
        .args(["--account", "Chase Checking"])
        .assert()
        .success();

    florin(home.path())
        .arg("import")
        .arg(&statement)
        .args(["--account", "Chase Checking"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already been imported"));
}

#[test]
fn same_statement_imports_into_a_second_account() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());
    add_account(home.path(), "Chase Checking");
    add_account(home.path(), "Savings");
    let statement = write_statement(home.path(), "jan.csv", STATEMENT_CSV);

    florin(home.path())
        .arg("import")
        .arg(&statement)
        .args(["--account", "Chase Checking"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 imported"));

    // The checksum guard is per account, so the shared statement loads here too.
    florin(home.path())
        .arg("import")
        .arg(&statement)
        .args(["--account", "Savings"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 imported, 0 skipped into Savings"));
}

#[test]
fn changed_file_with_same_rows_dedups_per_row() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());
    add_account(home.path(), "Chase Checking");
    let first = write_statement(home.path(), "jan.csv", STATEMENT_CSV);
    // different bytes, same rows: row-level dedup takes over
    let second = write_statement(
        home.path(),
        "jan-copy.csv",
        &format!("{STATEMENT_CSV}\n"),
    );

    florin(home.path())
        .arg("import")
        .arg(&first)
        .args(["--account", "Chase Checking"])
        .assert()
        .success();

    florin(home.path())
        .arg("import")
        .arg(&second)
        .args(["--account", "Chase Checking"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 imported, 3 skipped"));
}

#[test]
fn import_into_missing_account_fails() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());
    let statement = write_statement(home.path(), "jan.csv", STATEMENT_CSV);

    florin(home.path())
        .arg("import")
        .arg(&statement)
        .args(["--account", "Nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown account: Nope"));
}

#[test]
fn unsupported_extension_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());
    add_account(home.path(), "Chase Checking");
    let statement = write_statement(home.path(), "jan.txt", STATEMENT_CSV);

    florin(home.path())
        .arg("import")
        .arg(&statement)
        .args(["--account", "Chase Checking"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}

#[test]
fn preview_emits_json() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());
    let statement = write_statement(home.path(), "jan.csv", STATEMENT_CSV);

    florin(home.path())
        .arg("preview")
        .arg(&statement)
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"file_type\": \"csv\""))
        .stdout(predicate::str::contains("\"total_count\": 3"))
        .stdout(predicate::str::contains("NETFLIX.COM"));
}

#[test]
fn budget_spent_updates_on_import() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());
    add_account(home.path(), "Chase Checking");
    florin(home.path())
        .args(["budgets", "set", "Food & Dining", "500"])
        .assert()
        .success();
    let statement = write_statement(home.path(), "jan.csv", STATEMENT_CSV);

    florin(home.path())
        .arg("import")
        .arg(&statement)
        .args(["--account", "Chase Checking"])
        .assert()
        .success();

    florin(home.path())
        .args(["budgets", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$42.50"))
        .stdout(predicate::str::contains("$457.50"));
}

#[test]
fn learned_mapping_changes_preview_and_categorize() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());
    add_account(home.path(), "Chase Checking");
    let statement = write_statement(
        home.path(),
        "vendor.csv",
        "Date,Description,Amount\n01/08/2024,ACME CORP INVOICE 4471,-30.00\n",
    );

    florin(home.path())
        .arg("import")
        .arg(&statement)
        .args(["--account", "Chase Checking"])
        .assert()
        .success();

    florin(home.path())
        .args(["mappings", "learn", "ACME CORP", "Bills & Utilities"])
        .assert()
        .success();

    florin(home.path())
        .arg("categorize")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 recategorized"));

    florin(home.path())
        .args(["transactions", "list", "--category", "Bills & Utilities"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ACME CORP INVOICE 4471"));
}

#[test]
fn delete_transaction_restores_balance() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());
    add_account(home.path(), "Chase Checking");
    let statement = write_statement(
        home.path(),
        "one.csv",
        "Date,Description,Amount\n01/08/2024,BIG PURCHASE,-250.00\n",
    );

    florin(home.path())
        .arg("import")
        .arg(&statement)
        .args(["--account", "Chase Checking"])
        .assert()
        .success();

    florin(home.path())
        .args(["transactions", "delete", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted transaction 1"));

    florin(home.path())
        .args(["accounts", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$0.00"));
}

#[test]
fn goals_add_and_list_show_progress() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());

    florin(home.path())
        .args([
            "goals",
            "add",
            "Emergency fund",
            "--target",
            "3000",
            "--saved",
            "750",
            "--date",
            "2025-06-01",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added goal: Emergency fund"));

    florin(home.path())
        .args(["goals", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Emergency fund"))
        .stdout(predicate::str::contains("$3,000.00"))
        .stdout(predicate::str::contains("25%"))
        .stdout(predicate::str::contains("2025-06-01"));
}

#[test]
fn account_delete_refuses_while_transactions_exist() {
    let home = tempfile::tempdir().unwrap();
    setup(home.path());
    add_account(home.path(), "Chase Checking");
    let statement = write_statement(home.path(), "jan.csv", STATEMENT_CSV);

    florin(home.path())
        .arg("import")
        .arg(&statement)
        .args(["--account", "Chase Checking"])
        .assert()
        .success();

    florin(home.path())
        .args(["accounts", "delete", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("still has 3 transactions"));
}
