use assert_cmd::Command;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Tracker settings read from the environment; cleared for every run so the
/// host's variables never leak into a test.
const TRACKER_ENV: &[&str] = &[
    "JIRA_URL",
    "JIRA_PAT",
    "CLOUD_URL",
    "CLOUD_EMAIL",
    "CLOUD_TOKEN",
    "ASSET_ENDPOINT",
];

/// Proxy settings would route the fake tracker's loopback traffic elsewhere.
const PROXY_ENV: &[&str] = &[
    "HTTP_PROXY",
    "HTTPS_PROXY",
    "ALL_PROXY",
    "http_proxy",
    "https_proxy",
    "all_proxy",
];

#[derive(Debug)]
pub struct BridgeRun {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
    pub duration: Duration,
    pub log_path: PathBuf,
}

impl BridgeRun {
    pub fn exit_code(&self) -> Option<i32> {
        self.status.code()
    }
}

pub struct BridgeWorkspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub log_dir: PathBuf,
}

impl BridgeWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().to_path_buf();
        let log_dir = root.join("logs");
        fs::create_dir_all(&log_dir).expect("log dir");
        Self {
            temp_dir,
            root,
            log_dir,
        }
    }

    /// Write a file relative to the workspace root and return its path.
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dir");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

pub fn run_bridge<I, S>(workspace: &BridgeWorkspace, args: I, label: &str) -> BridgeRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_bridge_with_env(
        workspace,
        args,
        std::iter::empty::<(String, String)>(),
        label,
    )
}

pub fn run_bridge_with_env<I, S, E, K, V>(
    workspace: &BridgeWorkspace,
    args: I,
    env_vars: E,
    label: &str,
) -> BridgeRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    E: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("asset-bridge"));
    cmd.current_dir(&workspace.root);
    for key in TRACKER_ENV.iter().chain(PROXY_ENV) {
        cmd.env_remove(key);
    }
    for (key, _) in std::env::vars() {
        if key.starts_with("ASSET_BRIDGE_") {
            cmd.env_remove(key);
        }
    }
    cmd.args(args);
    cmd.envs(env_vars);
    cmd.env("NO_COLOR", "1");
    cmd.env("RUST_LOG", "asset_bridge=debug");
    cmd.env("RUST_BACKTRACE", "1");
    cmd.env("HOME", &workspace.root);

    let start = Instant::now();
    let output = cmd.output().expect("run asset-bridge");
    let duration = start.elapsed();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let log_path = workspace.log_dir.join(format!("{label}.log"));
    let log_body = format!(
        "label: {label}\nduration: {:?}\nstatus: {}\nargs: {:?}\ncwd: {}\n\nstdout:\n{}\n\nstderr:\n{}\n",
        duration,
        output.status,
        cmd.get_args().collect::<Vec<_>>(),
        workspace.root.display(),
        stdout,
        stderr
    );
    fs::write(&log_path, log_body).expect("write log");

    BridgeRun {
        stdout,
        stderr,
        status: output.status,
        duration,
        log_path,
    }
}

pub fn extract_json_payload(stdout: &str) -> String {
    let lines: Vec<&str> = stdout.lines().collect();
    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            return lines[idx..].join("\n").trim().to_string();
        }
    }
    stdout.trim().to_string()
}

/// Parse the structured error a failed `--json` run prints on stderr.
pub fn parse_error_json(run: &BridgeRun) -> serde_json::Value {
    let payload = extract_json_payload(&run.stderr);
    serde_json::from_str(&payload)
        .unwrap_or_else(|e| panic!("stderr is not JSON ({e}): {}", run.stderr))
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).expect("read file")
}
