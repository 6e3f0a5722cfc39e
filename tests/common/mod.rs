//! Common test utilities for riskbook integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't pollute
//! the user's `~/.local/share/riskbook/` directory.

#![allow(dead_code)]

use assert_cmd::Command;
pub use tempfile::TempDir;

/// A test environment with isolated data storage.
///
/// Each `TestEnv` creates two temporary directories:
/// - `workspace_dir`: Acts as the project workspace root
/// - `data_dir`: Holds riskbook's data (via `RB_DATA_DIR` env var)
///
/// The `rb()` method returns a `Command` that automatically sets `RB_DATA_DIR`
/// per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub workspace_dir: TempDir,
    pub data_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with isolated directories.
    pub fn new() -> Self {
        Self {
            workspace_dir: TempDir::new().unwrap(),
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// Create a new test environment and initialize riskbook.
    pub fn init() -> Self {
        let env = Self::new();
        env.rb().args(["system", "init"]).assert().success();
        env
    }

    /// Create a new initialized environment with an admin session open.
    pub fn init_admin() -> Self {
        let env = Self::init();
        env.login("admin", "admin123");
        env
    }

    /// Open a session as the given demo account.
    pub fn login(&self, username: &str, password: &str) {
        self.rb()
            .args(["auth", "login", username, "--password", password])
            .assert()
            .success();
    }

    /// Get a Command for the rb binary with isolated data directory.
    ///
    /// Sets `RB_DATA_DIR` per-command for parallel safety.
    pub fn rb(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_rb"));
        cmd.current_dir(self.workspace_dir.path());
        cmd.env("RB_DATA_DIR", self.data_dir.path());
        cmd
    }

    /// Get the path to the workspace directory.
    pub fn path(&self) -> &std::path::Path {
        self.workspace_dir.path()
    }

    /// Get the path to the data directory.
    pub fn data_path(&self) -> &std::path::Path {
        self.data_dir.path()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
