// Integration tests for `orderqa run`, `validate` and `check-names`.
// Run with: cargo test -p orderqa-cli --test run_tests -- --nocapture

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

const HEADER: &str = "Row ID|Order ID|Order Date|Ship Date|Ship Mode|Customer ID|Customer Name|Segment|Country|City|State|Postal Code|Region|Product ID|Category|Sub-Category|Product Name|Sales|Quantity|Discount|Profit";

const GOOD_A: &str = "010203_Orders_2024_03_01_08_00_00.csv";
const GOOD_B: &str = "010204_Orders_2024_03_02_08_00_00.csv";

fn orderqa() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_orderqa"));
    cmd.env_remove("ORDERQA_CONFIG");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn line(row_id: u32, order: &str, customer: &str, name: &str, product: &str, sales: &str, qty: &str, profit: &str) -> String {
    format!(
        "{row_id}|{order}|2024-03-01|2024-03-04|Second Class|{customer}|{name}|Corporate|United States|Seattle|Washington|98101|West|{product}|Technology|Phones|Handset {product}|{sales}|{qty}|0.0|{profit}"
    )
}

fn write_extract(dir: &Path, name: &str, lines: &[String]) {
    let mut text = String::from(HEADER);
    for l in lines {
        text.push('\n');
        text.push_str(l);
    }
    text.push('\n');
    fs::write(dir.join(name), text).unwrap();
}

/// Two good extracts plus one misnamed file.
fn seed_input(dir: &Path) {
    write_extract(
        dir,
        GOOD_A,
        &[
            line(1, "WA-1", "C1", "Alice", "P1", "100.0", "1", "20.0"),
            line(2, "WA-2", "C2", "Bob", "P2", "0.0", "0", "0.0"),
            line(3, "WA-3", "C3", "Cara", "P3", "30.0", "1", "3.0"),
        ],
    );
    write_extract(
        dir,
        GOOD_B,
        &[
            line(4, "WA-4", "C1", "Alicia", "P1", "100.0", "1", "20.0"),
            line(5, "WA-3", "C3", "Cara", "P3", "31.0", "1", "3.0"),
        ],
    );
    write_extract(dir, "bad_file.csv", &[line(9, "WA-9", "C9", "Zed", "P9", "10.0", "1", "1.0")]);
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[test]
fn run_writes_all_outputs() {
    let input = tempdir().unwrap();
    let out = tempdir().unwrap();
    seed_input(input.path());

    let output = orderqa()
        .args(["run", input.path().to_str().unwrap(), "--out", out.path().to_str().unwrap()])
        .output()
        .expect("orderqa run");
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    for name in [
        "Inconsistencies_Analysis.xlsx",
        "Data_Marts_Rows.csv",
        "Data_Marts.zip",
        "inconsistencies_to_review.csv",
    ] {
        assert!(out.path().join(name).exists(), "missing {name}");
    }
    for mart in ["customers", "products", "geography", "orders", "order_details"] {
        assert!(out.path().join("data_marts").join(format!("{mart}.csv")).exists(), "missing mart {mart}");
    }

    let counts = fs::read_to_string(out.path().join("Data_Marts_Rows.csv")).unwrap();
    assert!(counts.starts_with("Data Mart System Name,Count Rows,Count Distinct Primary Key,Count Distinct Row ID"));

    let err = stderr(&output);
    assert!(err.contains("3 file(s): 2 merged, 1 rejected"), "stderr: {err}");
    assert!(err.contains("bad_file.csv: rejected"), "stderr: {err}");
}

#[test]
fn run_json_summary() {
    let input = tempdir().unwrap();
    let out = tempdir().unwrap();
    seed_input(input.path());

    let output = orderqa()
        .args(["run", input.path().to_str().unwrap(), "--out", out.path().to_str().unwrap(), "--json"])
        .output()
        .expect("orderqa run --json");
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let doc: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");

    assert_eq!(doc["merged_rows"], 5);
    // Row 2 is a zero-sales, zero-quantity placeholder
    assert_eq!(doc["cleaned_rows"], 4);
    assert_eq!(doc["findings"]["File Name Issues"], 1);
    assert_eq!(doc["findings"]["Inconsistent Associations Issues"], 1);
    assert_eq!(doc["files"][2]["file"], "bad_file.csv");
    assert_eq!(doc["files"][2]["state"], "rejected");
    assert_eq!(doc["marts"].as_array().unwrap().len(), 5);
    assert_eq!(doc["meta"]["config_name"], "orders");
}

#[test]
fn run_strict_exits_3_on_findings() {
    let input = tempdir().unwrap();
    let out = tempdir().unwrap();
    seed_input(input.path());

    let output = orderqa()
        .args(["run", input.path().to_str().unwrap(), "--out", out.path().to_str().unwrap(), "--strict"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("finding(s) reported"));
}

#[test]
fn run_strict_passes_clean_batch() {
    let input = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_extract(
        input.path(),
        GOOD_A,
        &[
            line(1, "WA-1", "C1", "Alice", "P1", "100.0", "1", "20.0"),
            line(2, "WA-2", "C2", "Bob", "P2", "50.0", "2", "5.0"),
        ],
    );

    let output = orderqa()
        .args(["run", input.path().to_str().unwrap(), "--out", out.path().to_str().unwrap(), "--strict"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("0 finding(s)"));
}

#[test]
fn run_missing_input_dir_exits_5() {
    let out = tempdir().unwrap();
    let missing = out.path().join("does-not-exist");
    let output = orderqa()
        .args(["run", missing.to_str().unwrap(), "--out", out.path().to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(5));
    let err = stderr(&output);
    assert!(err.contains("error: cannot read input directory"), "stderr: {err}");
    assert!(err.contains("hint:"), "stderr: {err}");
}

#[test]
fn run_with_config_overrides_outputs() {
    let input = tempdir().unwrap();
    let out = tempdir().unwrap();
    seed_input(input.path());
    let config = input.path().join("orders.toml");
    fs::write(
        &config,
        "name = \"march\"\n\n[output]\nreport = \"march.xlsx\"\nreview = \"march_review.csv\"\n",
    )
    .unwrap();

    let output = orderqa()
        .args([
            "run",
            input.path().to_str().unwrap(),
            "--out",
            out.path().to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
            "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(out.path().join("march.xlsx").exists());
    assert!(out.path().join("march_review.csv").exists());

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["meta"]["config_name"], "march");
    // The config file itself sits in the input directory and is rejected by extension
    assert_eq!(doc["findings"]["File Extension Issues"], 1);
}

#[test]
fn run_with_invalid_config_exits_4() {
    let input = tempdir().unwrap();
    let config = input.path().join("bad.toml");
    fs::write(&config, "[checks]\nprice_tolerance = -1.0\n").unwrap();

    let output = orderqa()
        .args(["run", input.path().to_str().unwrap(), "--config", config.to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("orderqa validate"));
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn validate_accepts_good_config() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("orders.toml");
    fs::write(&config, "name = \"monthly\"\n\n[checks]\nprice_tolerance = 0.2\n").unwrap();

    let output = orderqa().args(["validate", config.to_str().unwrap()]).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("config ok: 'monthly'"));
}

#[test]
fn validate_rejects_unknown_key_column() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("orders.toml");
    fs::write(&config, "[checks]\nbusiness_key = [\"Order ID\", \"Colour\"]\n").unwrap();

    let output = orderqa().args(["validate", config.to_str().unwrap()]).output().unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("'Colour'"));
}

#[test]
fn validate_missing_file_exits_5() {
    let dir = tempdir().unwrap();
    let output = orderqa()
        .args(["validate", dir.path().join("nope.toml").to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(5));
}

// ---------------------------------------------------------------------------
// check-names
// ---------------------------------------------------------------------------

#[test]
fn check_names_all_valid() {
    let output = orderqa()
        .args(["check-names", GOOD_A, &format!("incoming/{GOOD_B}")])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().filter(|l| l.starts_with("ok")).count(), 2);
}

#[test]
fn check_names_reports_each_bad_name() {
    let output = orderqa()
        .args(["check-names", GOOD_A, "bad_file.csv", "notes.txt"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(6));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Invalid file name format: bad_file.csv"));
    assert!(stdout.contains("Invalid file extension: notes.txt"));
    assert!(stderr(&output).contains("2 of 3 file name(s) rejected"));
}

#[test]
fn missing_subcommand_is_a_usage_error() {
    let output = orderqa().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}
