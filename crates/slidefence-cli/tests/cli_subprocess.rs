use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tempfile::tempdir;

fn slidefence_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_slidefence"))
}

fn run(args: &[&str]) -> Output {
    Command::new(slidefence_bin())
        .args(args)
        .env_remove("SLIDEFENCE_LOG")
        .output()
        .expect("spawn slidefence")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn slide(index: u32, vertical: u32, horizontal: u32) -> Value {
    json!({
        "title": format!("Slide {index}"),
        "rect": {"width": 1920, "height": 1080},
        "scroll": {"height": 1080 + vertical, "width": 1920 + horizontal},
        "client": {"height": 1080, "width": 1920},
        "overflow": {
            "vertical": vertical > 2,
            "horizontal": horizontal > 2,
            "y": "hidden",
            "x": "hidden",
            "methods": {
                "scroll": {"v": vertical > 2, "h": horizontal > 2},
                "bbox": {"v": vertical > 2, "h": horizontal > 2}
            }
        },
        "hasOverflow": vertical > 2 || horizontal > 2,
        "overflowAmount": {"vertical": vertical, "horizontal": horizontal},
        "index": index,
        "indices": {"h": index - 1, "v": 0}
    })
}

fn write_report(dir: &Path) -> PathBuf {
    let results = vec![slide(1, 0, 0), slide(2, 640, 0), slide(3, 75, 0), slide(4, 0, 12)];
    let overflow: Vec<Value> = results
        .iter()
        .filter(|s| s["hasOverflow"] == true)
        .cloned()
        .collect();
    let report = json!({
        "timestamp": "2025-01-31T08:15:00.250Z",
        "config": {
            "url": "http://localhost:8000/deck/index.html",
            "width": 1920,
            "height": 1080,
            "waitTime": 1000,
            "outputFile": "overflow-report.json"
        },
        "summary": {"total": 4, "ok": 1, "overflow": 3},
        "results": results,
        "overflowSlides": overflow
    });
    let path = dir.join("overflow-report.json");
    fs::write(&path, serde_json::to_string_pretty(&report).unwrap()).unwrap();
    path
}

#[test]
fn summary_prints_counts_and_overflowing_slides() {
    let dir = tempdir().unwrap();
    let report = write_report(dir.path());
    let output = run(&["summary", "--report", report.to_str().unwrap()]);
    assert!(output.status.success(), "{output:?}");
    let text = stdout(&output);
    assert!(text.starts_with("slides: 4 total, 1 ok, 3 overflow\n"), "{text}");
    assert!(text.contains("[1.0] \"Slide 2\": vertical 640px, horizontal 0px"), "{text}");
}

#[test]
fn summary_fail_on_overflow_exits_two() {
    let dir = tempdir().unwrap();
    let report = write_report(dir.path());
    let output = run(&[
        "summary",
        "--report",
        report.to_str().unwrap(),
        "--fail-on-overflow",
    ]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("3 of 4 slides overflow"));
}

#[test]
fn summary_json_is_machine_readable() {
    let dir = tempdir().unwrap();
    let report = write_report(dir.path());
    let output = run(&["summary", "--report", report.to_str().unwrap(), "--json"]);
    assert!(output.status.success());
    let value: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["status"], "ok");
    assert_eq!(value["summary"], json!({"total": 4, "ok": 1, "overflow": 3}));
    assert_eq!(value["overflowSlides"].as_array().unwrap().len(), 3);
}

#[test]
fn suggest_writes_fix_suggestions() {
    let dir = tempdir().unwrap();
    let report = write_report(dir.path());
    let out_path = dir.path().join("out").join("fix-suggestions.json");
    let output = run(&[
        "suggest",
        "--report",
        report.to_str().unwrap(),
        "--output",
        out_path.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{output:?}");
    let text = stdout(&output);
    assert!(text.contains("severe   002.html: 640px - add-dense-slide"), "{text}");
    assert!(text.contains("minor    003.html: 75px - check-manually"), "{text}");

    let written: Value = serde_json::from_str(&fs::read_to_string(&out_path).unwrap()).unwrap();
    assert_eq!(written["denseSlideFiles"], json!(["002.html"]));
    assert_eq!(written["fixes"].as_array().unwrap().len(), 2);
}

#[test]
fn check_config_accepts_valid_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("slidefence.toml");
    fs::write(
        &path,
        "mode = \"auto-fix\"\nthreshold = 4.0\nmaxIterations = 3\nexcludeSelectors = [\".notes\", \"aside\", \"[data-overflow-ignore]\"]\n",
    )
    .unwrap();
    let output = run(&["check-config", path.to_str().unwrap()]);
    assert!(output.status.success(), "{output:?}");
    let text = stdout(&output);
    assert!(text.contains("  mode: auto-fix\n"), "{text}");
    assert!(text.contains("  maxIterations: 3\n"), "{text}");
    assert!(text.contains("  exclude: .notes, aside, [data-overflow-ignore]\n"), "{text}");
}

#[test]
fn check_config_rejects_invalid_json_with_exit_one() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("slidefence.json");
    fs::write(&path, r#"{"checkInterval": 0}"#).unwrap();
    let output = run(&["check-config", path.to_str().unwrap(), "--json"]);
    assert_eq!(output.status.code(), Some(1));
    let err: Value = serde_json::from_str(String::from_utf8_lossy(&output.stderr).trim()).unwrap();
    assert_eq!(err["status"], "error");
    assert_eq!(err["exit_code"], 1);
    assert!(
        err["error"].as_str().unwrap().contains("checkInterval"),
        "{err}"
    );
}
