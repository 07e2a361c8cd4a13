#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// A scratch board directory for driving the CLI.
pub struct TestBoard {
    dir: TempDir,
}

impl TestBoard {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn write_tasks(&self, tasks: &Value) -> std::io::Result<PathBuf> {
        self.write_file("tasks.json", &tasks.to_string())
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        self.write_file(".salesboard.toml", contents)
    }

    /// The binary with its board directory pointed here.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("salesboard").expect("binary");
        cmd.current_dir(self.path())
            .env_remove("SALESBOARD_SOURCE")
            .env_remove("RUST_LOG")
            .env("SALESBOARD_DIR", self.path());
        cmd
    }
}

/// Parse every JSON document printed to stdout, in order.
pub fn json_documents(stdout: &[u8]) -> Vec<Value> {
    serde_json::Deserializer::from_slice(stdout)
        .into_iter::<Value>()
        .collect::<Result<Vec<_>, _>>()
        .expect("stdout should be a stream of JSON documents")
}
