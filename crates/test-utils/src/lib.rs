//! Shared test utilities for skein crates.
//!
//! Provides a fake home/config tree for adapter tests and guards for tests
//! that touch process-global state.

use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};

/// Serialize tests that mutate process-global state (env vars, cwd, etc).
///
/// Acquire this guard at the start of any test that modifies environment
/// variables to prevent race conditions between parallel tests.
pub fn env_guard() -> MutexGuard<'static, ()> {
    static TEST_SERIAL: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    TEST_SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

/// RAII guard for environment variables - restores original value on drop.
pub struct EnvVarGuard {
    key: &'static str,
    previous: Option<String>,
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        if let Some(v) = &self.previous {
            std::env::set_var(self.key, v);
        } else {
            std::env::remove_var(self.key);
        }
    }
}

/// Set an environment variable and return a guard that restores the original on drop.
///
/// # Example
/// ```
/// let _guard = skein_test_utils::set_env_var("MY_VAR", Some("value"));
/// // MY_VAR is set to "value"
/// // When _guard drops, MY_VAR is restored to its original value
/// ```
pub fn set_env_var(key: &'static str, value: Option<&str>) -> EnvVarGuard {
    let previous = std::env::var(key).ok();
    if let Some(val) = value {
        std::env::set_var(key, val);
    } else {
        std::env::remove_var(key);
    }
    EnvVarGuard { key, previous }
}

/// A throwaway machine layout: `<tmp>/home`, `<tmp>/config` and a canonical
/// store at `<tmp>/store`.
///
/// The layout matches `ToolPaths::under(fixture.root())`, so adapters built
/// from it read and write inside the tempdir only.
pub struct TestFixture {
    pub tempdir: tempfile::TempDir,
    pub home: PathBuf,
    pub config: PathBuf,
    pub store: PathBuf,
}

impl TestFixture {
    /// Creates the three directories. Tool directories are not created, so
    /// no tool is detected until a test installs one.
    pub fn new() -> std::io::Result<Self> {
        let tempdir = tempfile::tempdir()?;
        let home = tempdir.path().join("home");
        let config = tempdir.path().join("config");
        let store = tempdir.path().join("store");
        for dir in [&home, &config, &store] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(Self {
            tempdir,
            home,
            config,
            store,
        })
    }

    pub fn root(&self) -> &Path {
        self.tempdir.path()
    }

    /// Create an RAII guard that sets HOME to this fixture's home directory.
    pub fn home_guard(&self) -> EnvVarGuard {
        set_env_var("HOME", self.home.to_str())
    }

    /// Creates `rel` under home (e.g. `.cursor`) so the tool is detected.
    pub fn install_home_tool(&self, rel: &str) -> std::io::Result<PathBuf> {
        let dir = self.home.join(rel);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Creates `rel` under the config directory (e.g. `zed`).
    pub fn install_config_tool(&self, rel: &str) -> std::io::Result<PathBuf> {
        let dir = self.config.join(rel);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Writes `content` to `home/<rel>`, creating parents.
    pub fn write_home(&self, rel: &str, content: &str) -> std::io::Result<PathBuf> {
        write(&self.home.join(rel), content)
    }

    /// Writes `content` to `config/<rel>`, creating parents.
    pub fn write_config(&self, rel: &str, content: &str) -> std::io::Result<PathBuf> {
        write(&self.config.join(rel), content)
    }

    pub fn read_home(&self, rel: &str) -> std::io::Result<String> {
        std::fs::read_to_string(self.home.join(rel))
    }

    pub fn read_config(&self, rel: &str) -> std::io::Result<String> {
        std::fs::read_to_string(self.config.join(rel))
    }
}

fn write(path: &Path, content: &str) -> std::io::Result<PathBuf> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_guard_serializes_tests() {
        let _g = env_guard();
    }

    #[test]
    fn test_set_env_var_sets_and_restores() {
        let _g = env_guard();

        const KEY: &str = "SKEIN_TEST_UTILS_TEST_VAR";
        std::env::remove_var(KEY);

        {
            let _guard = set_env_var(KEY, Some("test_value"));
            assert_eq!(std::env::var(KEY).ok(), Some("test_value".to_string()));
        }
        assert!(std::env::var(KEY).is_err());
    }

    #[test]
    fn test_set_env_var_restores_previous_value() {
        let _g = env_guard();

        const KEY: &str = "SKEIN_TEST_RESTORE_VAR";
        std::env::set_var(KEY, "original");

        {
            let _guard = set_env_var(KEY, Some("changed"));
            assert_eq!(std::env::var(KEY).ok(), Some("changed".to_string()));
        }
        assert_eq!(std::env::var(KEY).ok(), Some("original".to_string()));

        std::env::remove_var(KEY);
    }

    #[test]
    fn test_set_env_var_removes_when_none() {
        let _g = env_guard();

        const KEY: &str = "SKEIN_TEST_REMOVE_VAR";
        std::env::set_var(KEY, "exists");

        {
            let _guard = set_env_var(KEY, None);
            assert!(std::env::var(KEY).is_err());
        }
        assert_eq!(std::env::var(KEY).ok(), Some("exists".to_string()));

        std::env::remove_var(KEY);
    }

    #[test]
    fn test_fixture_creates_layout() {
        let fixture = TestFixture::new().expect("fixture creation");
        assert!(fixture.home.is_dir());
        assert!(fixture.config.is_dir());
        assert!(fixture.store.is_dir());
        assert!(fixture.home.starts_with(fixture.root()));
        assert!(!fixture.home.join(".cursor").exists());
    }

    #[test]
    fn test_fixture_writes_and_reads_files() {
        let fixture = TestFixture::new().expect("fixture creation");
        let body = serde_json::json!({"mcpServers": {}}).to_string();
        let path = fixture.write_home(".cursor/mcp.json", &body).unwrap();
        assert!(path.is_file());
        assert_eq!(fixture.read_home(".cursor/mcp.json").unwrap(), body);

        fixture.install_config_tool("zed").unwrap();
        assert!(fixture.config.join("zed").is_dir());
    }

    #[test]
    fn test_home_guard_points_home_at_fixture() {
        let _g = env_guard();
        let fixture = TestFixture::new().expect("fixture creation");
        {
            let _home = fixture.home_guard();
            assert_eq!(
                std::env::var("HOME").ok().as_deref(),
                fixture.home.to_str()
            );
        }
    }
}
