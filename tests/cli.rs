//! CLI integration tests for the lunatransfer admin binary.
//!
//! Each test uses an isolated temp directory and a config file with cheap
//! password hashing, so tests can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::path::PathBuf;

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;
use serde_json::Value;

const TEST_CONFIG: &str = r#"
[password]
memory_kib = 64
iterations = 1
parallelism = 1
"#;

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        temp_dir
            .child("lunatransfer.toml")
            .write_str(TEST_CONFIG)
            .expect("failed to write config");
        Self { temp_dir }
    }

    fn data_dir(&self) -> PathBuf {
        self.temp_dir.path().join("data")
    }

    fn config_path(&self) -> String {
        self.temp_dir
            .path()
            .join("lunatransfer.toml")
            .to_string_lossy()
            .to_string()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("lunatransfer").expect("failed to find binary");
        cmd.env("NO_COLOR", "1")
            .env_remove("LUNA_DATA_DIR")
            .env_remove("LUNA_STORAGE_PATH")
            .env_remove("LUNA_SESSION_SECRET")
            .env_remove("LUNA_TOKEN_EXPIRY_HOURS")
            .current_dir(self.temp_dir.path());
        cmd
    }

    /// Runs `args` followed by the shared location flags.
    fn run(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        let data_dir = self.data_dir().to_string_lossy().to_string();
        let config = self.config_path();
        self.cmd()
            .args(args)
            .args(["--data-dir", &data_dir, "--config", &config])
            .assert()
    }

    fn init(&self) -> assert_cmd::assert::Assert {
        self.run(&[
            "admin",
            "init",
            "--username",
            "root",
            "--password",
            "Password1",
            "--non-interactive",
        ])
    }

    fn add_user(&self, username: &str) {
        self.run(&[
            "user",
            "add",
            "--username",
            username,
            "--password",
            "Password1",
            "--non-interactive",
        ])
        .success();
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.run(args).success().get_output().stdout.clone();
        serde_json::from_slice(&output).expect("failed to parse JSON")
    }

    fn group_id(&self, name: &str) -> String {
        let groups = self.json(&["group", "list", "--json"]);
        groups
            .as_array()
            .expect("groups not an array")
            .iter()
            .find(|g| g["name"] == name)
            .expect("group not found")["id"]
            .as_str()
            .expect("id not a string")
            .to_string()
    }

    fn check(&self, args: &[&str], expected: &str) {
        self.run(args)
            .success()
            .stdout(predicate::str::diff(format!("{expected}\n")));
    }
}

#[test]
fn test_init_creates_secret_and_admin() {
    let ctx = TestContext::new();

    ctx.init()
        .success()
        .stdout(predicate::str::contains("Created admin 'root'"))
        .stdout(predicate::str::is_match(r"luna_[0-9a-f]{64}").unwrap());

    ctx.temp_dir
        .child("data/.session_secret")
        .assert(predicate::path::is_file());
    ctx.temp_dir
        .child("data/users.json")
        .assert(predicate::str::contains("\"role\": \"admin\""));
    ctx.temp_dir
        .child("data/storage/root")
        .assert(predicate::path::is_dir());
}

#[test]
fn test_init_twice_fails() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.init()
        .failure()
        .stderr(predicate::str::contains("Already initialized"));
}

#[test]
fn test_commands_require_init() {
    let ctx = TestContext::new();
    ctx.run(&["user", "list"])
        .failure()
        .stderr(predicate::str::contains("lunatransfer admin init"));
}

#[test]
fn test_user_add_rejects_weak_password() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.run(&[
        "user",
        "add",
        "--username",
        "alice",
        "--password",
        "weak",
        "--non-interactive",
    ])
    .failure()
    .stderr(predicate::str::contains("password must be at least 8 characters"));
}

#[test]
fn test_user_add_prints_credential_and_rotation_hint() {
    let ctx = TestContext::new();
    ctx.init().success();

    ctx.run(&[
        "user",
        "add",
        "--username",
        "alice",
        "--password",
        "Password1",
        "--non-interactive",
    ])
    .success()
    .stdout(predicate::str::is_match(r"API credential: luna_[0-9a-f]{64}").unwrap())
    .stdout(predicate::str::contains("user rotate-key"))
    .stdout(predicate::str::contains("retrieved").not());
}

#[test]
fn test_user_list_json() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.add_user("bob");
    ctx.add_user("alice");

    let users = ctx.json(&["user", "list", "--json"]);
    let names: Vec<&str> = users
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["alice", "bob", "root"]);
    assert!(users[0].get("password_hash").is_none());
    assert!(users[0].get("api_key").is_none());
}

#[test]
fn test_rotate_key_changes_stored_credential() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.add_user("alice");

    let read_key = || -> String {
        let raw = std::fs::read_to_string(ctx.data_dir().join("users.json")).unwrap();
        let users: Value = serde_json::from_str(&raw).unwrap();
        users
            .as_array()
            .unwrap()
            .iter()
            .find(|u| u["username"] == "alice")
            .unwrap()["api_key"]
            .as_str()
            .unwrap()
            .to_string()
    };

    let before = read_key();
    ctx.run(&["user", "rotate-key", "--username", "alice"])
        .success()
        .stdout(predicate::str::contains("New API credential for 'alice'"));
    assert_ne!(read_key(), before);
}

#[test]
fn test_group_membership_and_checks() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.add_user("alice");
    ctx.add_user("bob");

    ctx.run(&["group", "create", "--name", "eng", "--owner", "alice"])
        .success()
        .stdout(predicate::str::contains("Created group \"eng\""));
    ctx.run(&[
        "group",
        "add-member",
        "--group",
        "eng",
        "--username",
        "bob",
        "--role",
        "reader",
    ])
    .success();

    let members = ctx.json(&["group", "members", "--group", "eng", "--json"]);
    assert_eq!(members.as_array().unwrap().len(), 2);

    ctx.check(
        &["check", "group", "--user", "bob", "--group", "eng", "--action", "read"],
        "allowed",
    );
    ctx.check(
        &["check", "group", "--user", "bob", "--group", "eng", "--action", "write"],
        "denied",
    );
    ctx.check(
        &["check", "group", "--user", "bob", "--group", "nope", "--action", "read"],
        "denied",
    );

    ctx.run(&["group", "remove-member", "--group", "eng", "--username", "bob"])
        .success();
    ctx.check(
        &["check", "group", "--user", "bob", "--group", "eng", "--action", "read"],
        "denied",
    );
}

#[test]
fn test_access_rules_and_file_checks() {
    let ctx = TestContext::new();
    ctx.init().success();
    for name in ["alice", "bob", "carol"] {
        ctx.add_user(name);
    }
    ctx.run(&["group", "create", "--name", "eng", "--owner", "alice"])
        .success();
    ctx.run(&["group", "add-member", "--group", "eng", "--username", "bob"])
        .success();

    ctx.check(
        &["check", "file", "--user", "bob", "--path", "alice/report.pdf"],
        "denied",
    );

    ctx.run(&[
        "access",
        "set",
        "--path",
        "alice/report.pdf",
        "--owner",
        "alice",
        "--group",
        "eng",
    ])
    .success();

    let rule = ctx.json(&["access", "show", "--path", "alice/report.pdf", "--json"]);
    assert_eq!(rule["owner"], "alice");
    assert_eq!(rule["is_public"], false);
    assert_eq!(rule["group_ids"][0], ctx.group_id("eng").as_str());

    ctx.check(
        &["check", "file", "--user", "bob", "--path", "alice/report.pdf"],
        "allowed",
    );
    ctx.check(
        &["check", "file", "--user", "carol", "--path", "alice/report.pdf"],
        "denied",
    );
    ctx.check(
        &["check", "file", "--user", "root", "--path", "anything/at/all"],
        "allowed",
    );
}

#[test]
fn test_checks_normalize_paths_like_rules() {
    let ctx = TestContext::new();
    ctx.init().success();
    for name in ["alice", "bob", "carol"] {
        ctx.add_user(name);
    }

    ctx.run(&[
        "access",
        "set",
        "--path",
        "/alice/a.txt",
        "--owner",
        "alice",
        "--public",
    ])
    .success();
    for path in ["/alice/a.txt", "alice/a.txt", "alice//a.txt"] {
        ctx.check(&["check", "file", "--user", "carol", "--path", path], "allowed");
    }

    ctx.run(&["group", "create", "--name", "eng", "--owner", "alice"])
        .success();
    ctx.run(&["group", "create", "--name", "sales", "--owner", "bob"])
        .success();
    ctx.run(&[
        "share",
        "add",
        "--path",
        "/eng/doc.txt",
        "--source-group",
        "eng",
        "--target-group",
        "sales",
        "--shared-by",
        "alice",
    ])
    .success();
    for path in ["/eng/doc.txt", "eng/doc.txt"] {
        ctx.check(&["check", "share", "--user", "bob", "--path", path], "allowed");
    }

    ctx.run(&["check", "file", "--user", "carol", "--path", "alice/../bob/x"])
        .failure()
        .stderr(predicate::str::contains("traversal"));
}

#[test]
fn test_access_set_rejects_traversal() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.add_user("alice");

    ctx.run(&["access", "set", "--path", "alice/../bob/x", "--owner", "alice"])
        .failure()
        .stderr(predicate::str::contains("traversal"));
}

#[test]
fn test_share_lifecycle() {
    let ctx = TestContext::new();
    ctx.init().success();
    for name in ["alice", "bob", "carol"] {
        ctx.add_user(name);
    }
    ctx.run(&["group", "create", "--name", "eng", "--owner", "alice"])
        .success();
    ctx.run(&["group", "create", "--name", "sales", "--owner", "bob"])
        .success();
    ctx.run(&["group", "add-member", "--group", "sales", "--username", "carol"])
        .success();

    let share_args = [
        "share",
        "add",
        "--path",
        "eng/doc.txt",
        "--source-group",
        "eng",
        "--target-group",
        "sales",
        "--shared-by",
        "alice",
    ];
    ctx.run(&share_args)
        .success()
        .stdout(predicate::str::contains("Share ID:"));
    ctx.run(&share_args)
        .failure()
        .stderr(predicate::str::contains("already shared"));

    ctx.run(&[
        "share",
        "add",
        "--path",
        "eng/doc.txt",
        "--source-group",
        "eng",
        "--target-group",
        "eng",
        "--shared-by",
        "alice",
    ])
    .failure()
    .stderr(predicate::str::contains("same group"));

    ctx.check(
        &["check", "share", "--user", "carol", "--path", "eng/doc.txt"],
        "allowed",
    );
    ctx.check(
        &["check", "share", "--user", "carol", "--path", "eng/doc.txt", "--write"],
        "denied",
    );

    let shares = ctx.json(&["share", "list", "--group", "sales", "--json"]);
    let id = shares[0]["id"].as_str().unwrap().to_string();
    assert_eq!(shares[0]["permission"], "read");

    ctx.run(&["share", "remove", "--id", &id, "--as", "carol"])
        .failure()
        .stderr(predicate::str::contains("unauthorized"));
    ctx.run(&["share", "remove", "--id", &id, "--as", "alice"])
        .success();

    ctx.check(
        &["check", "share", "--user", "carol", "--path", "eng/doc.txt"],
        "denied",
    );
}

#[test]
fn test_user_remove_cascades() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.add_user("alice");
    ctx.add_user("bob");
    ctx.run(&["group", "create", "--name", "eng", "--owner", "bob"])
        .success();
    ctx.run(&["group", "add-member", "--group", "eng", "--username", "alice"])
        .success();
    ctx.run(&[
        "access",
        "set",
        "--path",
        "alice/notes.txt",
        "--owner",
        "alice",
        "--public",
    ])
    .success();

    ctx.run(&["user", "remove", "--username", "alice", "--non-interactive"])
        .failure()
        .stderr(predicate::str::contains("--yes is required"));

    ctx.run(&[
        "user",
        "remove",
        "--username",
        "alice",
        "--non-interactive",
        "--yes",
    ])
    .success()
    .stdout(predicate::str::contains(
        "Removed 1 memberships, 1 access rules, 0 shares",
    ));

    let members = ctx.json(&["group", "members", "--group", "eng", "--json"]);
    assert_eq!(members.as_array().unwrap().len(), 1);
    ctx.run(&["access", "show", "--path", "alice/notes.txt"])
        .failure()
        .stderr(predicate::str::contains("no access control defined"));
    ctx.temp_dir
        .child("data/storage/alice")
        .assert(predicate::path::missing());
}
