use assert_cmd::cargo;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::process::Command;
use tempfile::TempDir;

fn vastsync(dir: &TempDir) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("vastsync"));
    cmd.current_dir(dir.path());
    // Any tool reached by accident would fail to resolve
    cmd.env("PATH", "");
    cmd
}

fn write_secrets(dir: &TempDir) {
    fs::create_dir(dir.path().join("secrets")).unwrap();
    fs::write(
        dir.path().join("secrets/.vastnode"),
        r#"{"vast_num": 3, "port": 2222}"#,
    )
    .unwrap();
}

#[test]
fn unrecognised_command_fails() {
    let dir = TempDir::new().unwrap();
    write_secrets(&dir);

    vastsync(&dir)
        .arg("bogus")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("command bogus not recognised"));
}

#[test]
fn missing_command_fails() {
    let dir = TempDir::new().unwrap();
    write_secrets(&dir);

    vastsync(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no command given"));
}

#[test]
fn missing_command_and_secrets_reports_config() {
    let dir = TempDir::new().unwrap();

    vastsync(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load remote host config"))
        .stderr(predicate::str::contains("no command given").not());
}

// Installs an rsync that records its argv and exits 7
fn fake_rsync(dir: &TempDir) -> std::path::PathBuf {
    let bin = dir.path().join("bin");
    fs::create_dir(&bin).unwrap();
    let script = bin.join("rsync");
    fs::write(
        &script,
        "#!/bin/sh\nprintf '%s\\n' \"$@\" > \"$(dirname \"$0\")/argv\"\nexit 7\n",
    )
    .unwrap();
    let mut perms = fs::metadata(&script).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&script, perms).unwrap();
    bin
}

#[test]
fn interp_sync_prints_command_and_ignores_tool_status() {
    let dir = TempDir::new().unwrap();
    write_secrets(&dir);
    let bin = fake_rsync(&dir);

    vastsync(&dir)
        .env("PATH", format!("{}:/usr/bin:/bin", bin.display()))
        .arg("interp_sync")
        .assert()
        .success()
        .stdout(
            "rsync -r --exclude \"*.hdf\" --exclude \"*.pkl\" -e \"ssh -p 2222\" \
             root@ssh3.vast.ai:/mnt/ssd-cluster/auto_interp_results/ ./auto_interp_results\n",
        );

    let argv = fs::read_to_string(bin.join("argv")).unwrap();
    assert_eq!(
        argv.lines().collect::<Vec<_>>(),
        vec![
            "-r",
            "--exclude",
            "*.hdf",
            "--exclude",
            "*.pkl",
            "-e",
            "ssh -p 2222",
            "root@ssh3.vast.ai:/mnt/ssd-cluster/auto_interp_results/",
            "./auto_interp_results",
        ]
    );
}

#[test]
fn missing_secrets_fails_before_dispatch() {
    let dir = TempDir::new().unwrap();

    vastsync(&dir)
        .arg("interp_sync")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("failed to load remote host config"));
}

#[test]
fn malformed_secrets_fails() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("secrets")).unwrap();
    fs::write(dir.path().join("secrets/.vastnode"), "{\"vast_num\": 3").unwrap();

    vastsync(&dir)
        .arg("sync")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse JSON"));
}

#[test]
fn secrets_path_can_be_overridden() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("node.json"), r#"{"vast_num": 3, "port": 2222}"#).unwrap();

    // Loads fine, then fails on the command name rather than the config
    vastsync(&dir)
        .args(["--secrets", "node.json", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not recognised"));
}
