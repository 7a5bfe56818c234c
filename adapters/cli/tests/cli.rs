use std::process::Command;

#[test]
fn leaderboard_command_seeds_and_filters() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let file = dir.path().join("board.json");

    let output = Command::new(env!("CARGO_BIN_EXE_lawn-defence"))
        .arg("leaderboard")
        .arg("--file")
        .arg(&file)
        .args(["--filter", "score:>=2500"])
        .output()
        .expect("failed to invoke lawn-defence binary");

    assert!(output.status.success(), "lawn-defence leaderboard should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let rows: Vec<&str> = stdout.lines().skip(1).collect();
    assert_eq!(rows.len(), 2, "unexpected output:\n{stdout}");
    assert!(rows[0].starts_with("David"));
    assert!(rows[1].starts_with("Bob"));
    assert!(file.exists(), "seed records are written to disk");
}

#[test]
fn unreadable_session_file_fails() {
    let dir = tempfile::TempDir::new().expect("temp dir");

    let output = Command::new(env!("CARGO_BIN_EXE_lawn-defence"))
        .arg("play")
        .arg("--config")
        .arg(dir.path().join("missing.toml"))
        .output()
        .expect("failed to invoke lawn-defence binary");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.toml"));
}
