use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Nothing listens here; requests fail fast with "connection refused"
const UNREACHABLE_API: &str = "http://127.0.0.1:9";

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
    work: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");
        let work = base.join("work");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");
        fs::create_dir_all(&work).expect("failed to create work dir");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_config,
            xdg_state,
            work,
        }
    }

    fn write_config(&self, contents: &str) {
        let dir = self.xdg_config.join("logsplitter");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(dir.join("config.toml"), contents).expect("failed to write config");
    }

    fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.work.join(name);
        fs::write(&path, contents).expect("failed to write input file");
        path
    }

    fn log_dir(&self) -> PathBuf {
        self.xdg_state.join("logsplitter")
    }
}

fn run(env: &CliTestEnv, args: &[&str], envs: &[(&str, &str)]) -> Output {
    let mut command = Command::new(PathBuf::from(assert_cmd::cargo::cargo_bin!("logsplitter")));

    command
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env("LOGSPLITTER_API_URL", UNREACHABLE_API)
        .env_remove("LOGSPLITTER_TOKEN")
        .env_remove("LOGSPLITTER_JWT_TEMPLATE")
        .env_remove("RUST_LOG");
    for (key, value) in envs {
        command.env(key, value);
    }

    command
        .output()
        .unwrap_or_else(|e| panic!("failed to execute logsplitter: {e}"))
}

fn render_args(args: &[&str]) -> String {
    args.iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }
    panic!(
        "logsplitter {} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        render_args(args),
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn assert_failure(args: &[&str], output: &Output) {
    assert!(
        !output.status.success(),
        "logsplitter {} unexpectedly succeeded\nstdout:\n{}",
        render_args(args),
        String::from_utf8_lossy(&output.stdout)
    );
}

#[test]
fn status_without_token_reports_signed_out() {
    let env = CliTestEnv::new();

    let args = ["status"];
    let output = run(&env, &args, &[]);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("signed out"), "got:\n{stdout}");
    assert!(stdout.contains(UNREACHABLE_API), "got:\n{stdout}");
    assert!(stdout.contains("<not set>"), "got:\n{stdout}");

    assert!(
        env.log_dir().exists(),
        "log directory should exist at {}",
        env.log_dir().display()
    );
}

#[test]
fn status_with_token_and_unreachable_api_degrades() {
    let env = CliTestEnv::new();

    let args = ["status"];
    let output = run(&env, &args, &[("LOGSPLITTER_TOKEN", "sess_123")]);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("signed in as me"), "got:\n{stdout}");
    assert!(stdout.contains("Permissions:  unavailable"), "got:\n{stdout}");
}

#[test]
fn config_file_values_are_used() {
    let env = CliTestEnv::new();
    env.write_config(
        r#"
[api]
base_url = "http://127.0.0.1:9/from-config"
timeout_secs = 7
"#,
    );

    let args = ["status"];
    // Empty overrides are ignored, so the file wins
    let output = run(&env, &args, &[("LOGSPLITTER_API_URL", "")]);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("http://127.0.0.1:9/from-config"), "got:\n{stdout}");
    assert!(stdout.contains("7s"), "got:\n{stdout}");
}

#[test]
fn invalid_api_url_is_rejected() {
    let env = CliTestEnv::new();

    let args = ["status"];
    let output = run(&env, &args, &[("LOGSPLITTER_API_URL", "ftp://example.com")]);
    assert_failure(&args, &output);
}

#[test]
fn upload_rejects_unsupported_extension_before_sending() {
    let env = CliTestEnv::new();
    let file = env.write_file("trace.csv", "ts,level,message\n");
    let file = file.to_string_lossy().into_owned();

    let args = ["upload", file.as_str()];
    let output = run(&env, &args, &[]);
    assert_failure(&args, &output);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Only .log and .txt files are allowed"),
        "got:\n{stderr}"
    );
}

#[test]
fn permissions_require_sign_in() {
    let env = CliTestEnv::new();

    let args = ["permissions"];
    let output = run(&env, &args, &[]);
    assert_failure(&args, &output);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Not signed in"), "got:\n{stderr}");
}

#[test]
fn webhook_create_is_refused_without_api_access() {
    let env = CliTestEnv::new();

    let args = [
        "webhooks",
        "create",
        "--url",
        "https://hooks.example.com/ls",
        "--event",
        "error.new",
    ];
    let output = run(&env, &args, &[]);
    assert_failure(&args, &output);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Upgrade to access webhooks"), "got:\n{stderr}");
}
