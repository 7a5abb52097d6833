use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

/// Run wafflegraph with `args`, feeding `stdin` when given
fn run_wafflegraph(args: &[&str], stdin: Option<&str>) -> Result<Vec<u8>, String> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_wafflegraph"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("Failed to spawn process: {}", e))?;

    if let Some(mut handle) = child.stdin.take() {
        if let Some(content) = stdin {
            handle
                .write_all(content.as_bytes())
                .map_err(|e| format!("Failed to write to stdin: {}", e))?;
        }
    }

    let output = child
        .wait_with_output()
        .map_err(|e| format!("Failed to wait for process: {}", e))?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(String::from_utf8_lossy(&output.stderr).to_string())
    }
}

/// Check if bytes are a valid PNG
fn is_valid_png(bytes: &[u8]) -> bool {
    bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
}

fn as_svg(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).expect("SVG output is not UTF-8")
}

#[test]
fn test_end_to_end_csv_file_png() {
    let result = run_wafflegraph(&["test/fruit.csv", "--no-legend"], None);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()), "Output is not a valid PNG");
}

#[test]
fn test_end_to_end_stdin_csv() {
    let csv = fs::read_to_string("test/fruit.csv").expect("Failed to read test CSV");
    let result = run_wafflegraph(&["--no-legend"], Some(&csv));
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));

    let result = run_wafflegraph(&["-", "--format", "svg"], Some(&csv));
    assert!(as_svg(result.unwrap()).contains("<svg"));
}

#[test]
fn test_end_to_end_json_svg_with_legend() {
    let result = run_wafflegraph(&["test/fruit.json", "--format", "svg"], None);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    let svg = as_svg(result.unwrap());
    assert!(svg.contains("<svg"));
    assert!(svg.contains("apple"));
    assert!(svg.contains("banana"));
    assert!(svg.contains("cherry"));
}

#[test]
fn test_end_to_end_tsv() {
    let result = run_wafflegraph(
        &["test/fruit.tsv", "--format", "svg", "--columns", "5", "--rows", "2"],
        None,
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(as_svg(result.unwrap()).contains("plum"));
}

#[test]
fn test_end_to_end_inline_json() {
    let data = r#"[{"team": "red", "score": 3}, {"team": "blue", "score": 1}]"#;
    let result = run_wafflegraph(&[data, "--format", "svg", "--columns", "2", "--rows", "2"], None);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(as_svg(result.unwrap()).contains("blue"));
}

#[test]
fn test_end_to_end_config_file_and_flags() {
    let result = run_wafflegraph(
        &[
            "test/fruit.csv",
            "--config",
            "test/options.json",
            "--colors",
            "#000, steelblue, rgb(0, 128, 0)",
            "--square-value",
            "2",
            "--no-legend",
        ],
        None,
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    let png = result.unwrap();
    assert!(is_valid_png(&png));
    // 10 columns of 12px
    assert_eq!(u32::from_be_bytes([png[16], png[17], png[18], png[19]]), 120);
}

#[test]
fn test_end_to_end_container_width() {
    let result = run_wafflegraph(
        &["test/fruit.csv", "--width", "500", "--square-size", "25", "--no-legend"],
        None,
    );
    let png = result.expect("chart should render");
    assert!(is_valid_png(&png));
    assert_eq!(u32::from_be_bytes([png[16], png[17], png[18], png[19]]), 500);
}

#[test]
fn test_end_to_end_temporal_categories() {
    let result = run_wafflegraph(&["test/monthly.csv", "--format", "svg"], None);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    let svg = as_svg(result.unwrap());
    assert!(svg.contains("2020-01-01"));
    assert!(svg.contains("2020-03-01"));
}

#[test]
fn test_end_to_end_explicit_columns() {
    let result = run_wafflegraph(
        &["test/fruit.csv", "--category", "fruit", "--value", "count", "--format", "svg"],
        None,
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
}

#[test]
fn test_unsupported_extension() {
    let result = run_wafflegraph(&["test/data.xlsx"], None);
    assert!(result.is_err());
    let err = result.unwrap_err();
    assert!(err.contains("Unsupported data source"), "stderr: {}", err);
}

#[test]
fn test_missing_file() {
    let result = run_wafflegraph(&["test/does_not_exist.csv"], None);
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Failed to load"));
}

#[test]
fn test_empty_csv() {
    let result = run_wafflegraph(&["test/empty.csv"], None);
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("at least one data row"));
}

#[test]
fn test_zero_total_is_degenerate() {
    let result = run_wafflegraph(&["test/zero.csv", "--value", "count"], None);
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Degenerate waffle layout"));
}

#[test]
fn test_invalid_date_in_temporal_column() {
    let result = run_wafflegraph(&["test/bad_dates.csv", "--format", "svg"], None);
    assert!(result.is_err());
    let err = result.unwrap_err();
    assert!(err.contains("not-a-date"), "stderr: {}", err);
    assert!(err.contains("is not a valid date"));
}

#[test]
fn test_missing_column() {
    let result = run_wafflegraph(&["test/fruit.csv", "--value", "weight"], None);
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Column 'weight' not found"));
}

#[test]
fn test_invalid_options() {
    let result = run_wafflegraph(&["test/fruit.csv", "--gap", "30"], None);
    assert!(result.unwrap_err().contains("gap must be smaller than squareSize"));

    let result = run_wafflegraph(&["test/fruit.csv", "--colors", "#f00, nope"], None);
    assert!(result.unwrap_err().contains("Invalid colour list"));
}
