//! Integration tests for shellcache

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write a config that keeps buckets inside `dir`, disables the audit log and
/// points the origin at a port nothing listens on
fn write_config(dir: &Path) -> PathBuf {
    let path = dir.join("config.toml");
    let content = format!(
        "[general]\naudit_log = false\n\n\
         [app]\norigin = \"http://127.0.0.1:9\"\n\n\
         [storage]\nbackend = \"disk\"\npath = '{}'\n\n\
         [network]\ntimeout_secs = 5\n",
        dir.join("buckets").display()
    );
    std::fs::write(&path, content).unwrap();
    path
}

fn temp_env() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());
    (dir, config)
}

mod cli_tests {
    use super::*;
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use shellcache::cache::{BucketState, Request, Response};
    use shellcache::storage::{CacheStorage, DiskStorage};

    fn shellcache(config: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("shellcache");
        cmd.arg("--config").arg(config);
        cmd.env_remove("SHELLCACHE_CACHE_VERSION");
        cmd
    }

    /// Seed a stale v1 bucket and a complete v2 bucket holding index.html
    fn seed(dir: &Path) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let storage = DiskStorage::new(dir.join("buckets"));
            storage.open("shekhawats-cache-v1").await.unwrap();
            storage.open("shekhawats-cache-v2").await.unwrap();
            let request =
                Request::parse("http://127.0.0.1:9/shekhawats-pwa/index.html").unwrap();
            storage
                .put(
                    "shekhawats-cache-v2",
                    &request,
                    &Response::new(200, "<html>offline shell</html>"),
                )
                .await
                .unwrap();
            storage
                .set_state("shekhawats-cache-v2", BucketState::Complete)
                .await
                .unwrap();
        });
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("shellcache")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Offline cache for progressive web app shells"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("shellcache")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("shellcache"));
    }

    #[test]
    fn config_path() {
        let (_dir, config) = temp_env();
        shellcache(&config)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let (_dir, config) = temp_env();
        shellcache(&config)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"))
            .stdout(predicate::str::contains("shekhawats"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(&config, "[app]\nid = \"../escape\"\n").unwrap();

        shellcache(&config)
            .arg("list")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn list_empty() {
        let (_dir, config) = temp_env();
        shellcache(&config)
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("No cache buckets found"));
    }

    #[test]
    fn install_fails_when_origin_unreachable() {
        let (_dir, config) = temp_env();
        shellcache(&config)
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to fetch manifest asset"))
            .stderr(predicate::str::contains("Hint:"));

        // Nothing servable was left behind
        shellcache(&config)
            .args(["list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"complete\"").not());
    }

    #[test]
    fn activate_requires_install() {
        let (_dir, config) = temp_env();
        shellcache(&config)
            .arg("activate")
            .assert()
            .failure()
            .stderr(predicate::str::contains("is not installed"))
            .stderr(predicate::str::contains("shellcache install"));
    }

    #[test]
    fn activate_sweeps_stale_bucket() {
        let (dir, config) = temp_env();
        seed(dir.path());

        shellcache(&config).arg("activate").assert().success();

        shellcache(&config)
            .args(["list", "--format", "plain"])
            .assert()
            .success()
            .stdout("shekhawats-cache-v2\n");
    }

    #[test]
    fn fetch_serves_from_cache_without_network() {
        let (dir, config) = temp_env();
        seed(dir.path());

        shellcache(&config)
            .args(["fetch", "/shekhawats-pwa/index.html"])
            .assert()
            .success()
            .stdout("<html>offline shell</html>")
            .stderr(predicate::str::contains("cache"));
    }

    #[test]
    fn fetch_miss_reports_network_failure() {
        let (dir, config) = temp_env();
        seed(dir.path());

        shellcache(&config)
            .args(["fetch", "/api/expenses"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Network request failed"));
    }

    #[test]
    fn cache_version_override_changes_current_bucket() {
        let (dir, config) = temp_env();
        seed(dir.path());

        shellcache(&config)
            .args(["list", "--cache-version", "1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("shekhawats-cache-v1"));

        shellcache(&config)
            .args(["activate", "--cache-version", "1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("shekhawats-cache-v1 is not installed"));
    }

    #[test]
    fn status_reports_current_bucket() {
        let (dir, config) = temp_env();
        seed(dir.path());

        shellcache(&config)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("shekhawats-cache-v2"))
            .stdout(predicate::str::contains("complete"));
    }

    #[test]
    fn clear_removes_everything() {
        let (dir, config) = temp_env();
        seed(dir.path());

        shellcache(&config)
            .args(["clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cleared 2 bucket(s)"));

        shellcache(&config)
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("No cache buckets found"));
    }

    #[test]
    fn clear_without_confirmation_aborts() {
        let (dir, config) = temp_env();
        seed(dir.path());

        shellcache(&config)
            .arg("clear")
            .assert()
            .success()
            .stdout(predicate::str::contains("Aborted"));
    }
}

mod lifecycle_tests {
    use super::*;
    use async_trait::async_trait;
    use shellcache::cache::{Request, Response};
    use shellcache::config::schema::AppConfig;
    use shellcache::network::Fetcher;
    use shellcache::storage::{CacheStorage, DiskStorage};
    use shellcache::worker::{CacheManager, ResponseSource, WorkerState};
    use shellcache::{ShellCacheError, ShellCacheResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Serves a body naming the asset and the deployed version
    struct Origin {
        version: u32,
        online: bool,
        calls: AtomicUsize,
    }

    impl Origin {
        fn new(version: u32, online: bool) -> Arc<Self> {
            Arc::new(Self {
                version,
                online,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Fetcher for Origin {
        async fn fetch(&self, request: &Request) -> ShellCacheResult<Response> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.online {
                return Err(ShellCacheError::network(request.url.as_str(), "offline"));
            }
            Ok(Response::new(
                200,
                format!("{} v{}", request.url.path(), self.version),
            ))
        }
    }

    fn app(version: u32) -> AppConfig {
        AppConfig {
            version,
            ..AppConfig::default()
        }
    }

    fn index() -> Request {
        Request::parse("http://localhost:5173/shekhawats-pwa/index.html").unwrap()
    }

    #[tokio::test]
    async fn version_upgrade_across_restarts() {
        let dir = TempDir::new().unwrap();
        let storage: Arc<dyn CacheStorage> = Arc::new(DiskStorage::new(dir.path().to_path_buf()));

        // v1 installs and activates
        let v1 = CacheManager::new(&app(1), storage.clone(), Origin::new(1, true)).unwrap();
        v1.install().await.unwrap();
        v1.activate().await.unwrap();

        // v2 installs alongside; the old worker keeps serving v1 offline
        let v2 = CacheManager::new(&app(2), storage.clone(), Origin::new(2, true)).unwrap();
        v2.install().await.unwrap();
        assert_eq!(
            storage.names().await.unwrap(),
            vec!["shekhawats-cache-v1", "shekhawats-cache-v2"]
        );
        let old = v1.respond_to_fetch(&index()).await.unwrap();
        assert_eq!(old.response.body, b"/shekhawats-pwa/index.html v1");

        // A restarted v2 worker activates and serves v2 with no network
        let offline = Origin::new(2, false);
        let restarted = CacheManager::new(&app(2), storage.clone(), offline.clone())
            .unwrap()
            .restore()
            .await
            .unwrap();
        assert_eq!(restarted.state().await, WorkerState::Installed);

        let report = restarted.activate().await.unwrap();
        assert_eq!(report.deleted, vec!["shekhawats-cache-v1"]);
        assert_eq!(storage.names().await.unwrap(), vec!["shekhawats-cache-v2"]);

        let served = restarted.respond_to_fetch(&index()).await.unwrap();
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(served.response.body, b"/shekhawats-pwa/index.html v2");
        assert_eq!(offline.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn offline_install_keeps_previous_version_intact() {
        let dir = TempDir::new().unwrap();
        let storage: Arc<dyn CacheStorage> = Arc::new(DiskStorage::new(dir.path().to_path_buf()));

        let v1 = CacheManager::new(&app(1), storage.clone(), Origin::new(1, true)).unwrap();
        v1.install().await.unwrap();

        let v2 = CacheManager::new(&app(2), storage.clone(), Origin::new(2, false)).unwrap();
        let err = v2.install().await.unwrap_err();
        assert!(matches!(err, ShellCacheError::ManifestFetch { .. }));
        assert_eq!(v2.state().await, WorkerState::InstallFailed);

        let old = storage.inspect("shekhawats-cache-v1").await.unwrap().unwrap();
        assert!(old.state.is_servable());
        assert_eq!(old.entry_count, Some(5));
    }
}
