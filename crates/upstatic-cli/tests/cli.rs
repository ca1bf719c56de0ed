use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

fn upstatic() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("upstatic"));
    cmd.env_remove("UPSTATIC_CONFIG_PATH").env_remove("RUST_LOG");
    cmd
}

fn fixture() -> TempDir {
    let temp = TempDir::new().unwrap();
    temp.child("titles.txt")
        .write_str("Caching Layer\nCache Eviction\nSearch Index\n")
        .unwrap();
    temp.child("fast.toml")
        .write_str("[suggest]\ncadence_ms = 20\n\n[logging]\nstderr = false\n")
        .unwrap();
    temp
}

#[test]
fn help_mentions_core_commands() {
    upstatic().arg("--help").assert().success().stdout(
        predicate::str::contains("score")
            .and(predicate::str::contains("rank"))
            .and(predicate::str::contains("session"))
            .and(predicate::str::contains("schema")),
    );
}

#[test]
fn score_prints_the_raw_value() {
    let temp = fixture();
    upstatic()
        .current_dir(temp.path())
        .args(["score", "foobar", "bar"])
        .assert()
        .success()
        .stdout("0.5\n");
}

#[test]
fn rank_json_orders_matches() {
    let temp = fixture();
    let output = upstatic()
        .current_dir(temp.path())
        .args(["rank", "Cache", "--candidates", "titles.txt", "--json"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let indices: Vec<u64> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["index"].as_u64().unwrap())
        .collect();
    assert_eq!(indices, vec![1, 0]);
    assert_eq!(rows[0]["text"], "Cache Eviction");
}

#[test]
fn rank_reads_stdin_and_exits_one_without_matches() {
    let temp = fixture();
    upstatic()
        .current_dir(temp.path())
        .args(["rank", "zzz"])
        .write_stdin("alpha\nbeta\n")
        .assert()
        .code(1)
        .stdout("");
}

#[test]
fn non_text_candidates_are_rejected() {
    let temp = fixture();
    temp.child("bad.txt")
        .write_binary(b"fine\nalso fine\n\xff\xfe\n")
        .unwrap();
    upstatic()
        .current_dir(temp.path())
        .args(["rank", "fine", "--candidates", "bad.txt"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("candidate #2"));
}

#[test]
fn scripted_session_selects_a_result() {
    let temp = fixture();
    temp.child("script.txt")
        .write_str("focus\ntype cache\nwait 200\ndown\nenter\n")
        .unwrap();

    let output = upstatic()
        .current_dir(temp.path())
        .args([
            "--config",
            "fast.toml",
            "session",
            "--candidates",
            "titles.txt",
            "--script",
            "script.txt",
            "--json",
        ])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let reports: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(reports.len(), 5);

    assert_eq!(reports[1]["step"], "type cache");
    assert_eq!(reports[1]["loading"], true);

    assert_eq!(reports[2]["kind"], "ranked");
    assert_eq!(reports[2]["pending"], false);
    assert_eq!(reports[2]["results"].as_array().unwrap().len(), 2);

    assert_eq!(reports[3]["active"], 1);
    assert_eq!(reports[4]["selected"], 1);
    assert_eq!(reports[4]["list_open"], false);
}

#[test]
fn schema_lists_config_tables() {
    let output = upstatic().arg("schema").output().unwrap();
    assert!(output.status.success());
    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(schema["properties"]["suggest"].is_object());
    assert!(schema["properties"]["logging"].is_object());
}

#[test]
fn invalid_config_fails_with_exit_code_two() {
    let temp = fixture();
    temp.child("zero.toml")
        .write_str("[suggest]\ncadence_ms = 0\n")
        .unwrap();
    upstatic()
        .current_dir(temp.path())
        .args(["--config", "zero.toml", "score", "a", "a"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("suggest.cadence_ms"));
}
