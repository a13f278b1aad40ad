//! Shared helpers for CLI integration tests.

use assert_cmd::Command;
use tempfile::TempDir;

/// A `tz` command isolated from the developer's config files and environment.
pub fn tz(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tz").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env_remove("TENSORZERO_GATEWAY_URL")
        .env_remove("OPENAI_API_KEY")
        .env_remove("OPENAI_BASE_URL");
    cmd
}
