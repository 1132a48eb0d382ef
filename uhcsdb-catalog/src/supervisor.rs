//! Explorer process lifecycle
//!
//! When the explorer is managed, the catalog starts it the first time a page
//! needs a session, waits for its health endpoint, restarts it if it has
//! exited, and kills it on the catalog's shutdown path. The child is also
//! spawned with kill-on-drop so an abnormal catalog exit does not orphan it.
//!
//! An unmanaged explorer is only health-checked.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uhcsdb_common::config::ExplorerSettings;

use crate::bridge::{BridgeError, ExplorerClient};

const HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Arguments forwarded to a managed explorer so both processes read the same data
#[derive(Debug, Clone, Default)]
pub struct LaunchArgs {
    pub settings_file: Option<std::path::PathBuf>,
    pub data_dir: Option<std::path::PathBuf>,
    pub database: Option<std::path::PathBuf>,
}

/// Starts, health-checks and stops the explorer process
pub struct ExplorerSupervisor {
    settings: ExplorerSettings,
    launch: LaunchArgs,
    client: ExplorerClient,
    child: Mutex<Option<Child>>,
}

impl ExplorerSupervisor {
    pub fn new(settings: ExplorerSettings, launch: LaunchArgs, client: ExplorerClient) -> Self {
        Self {
            settings,
            launch,
            client,
            child: Mutex::new(None),
        }
    }

    pub fn client(&self) -> &ExplorerClient {
        &self.client
    }

    pub fn is_managed(&self) -> bool {
        self.settings.managed
    }

    /// Make sure a healthy explorer is answering, starting one if managed
    pub async fn ensure_running(&self) -> Result<(), BridgeError> {
        if !self.settings.managed {
            return self.client.health().await.map(|_| ());
        }

        // Held across start-up so concurrent page loads never spawn twice
        let mut guard = self.child.lock().await;

        if let Some(child) = guard.as_mut() {
            match child.try_wait() {
                Ok(None) => return self.client.health().await.map(|_| ()),
                Ok(Some(status)) => {
                    warn!("Explorer process exited ({}), restarting", status);
                    *guard = None;
                }
                Err(e) => {
                    warn!("Could not poll explorer process: {}", e);
                    *guard = None;
                }
            }
        }

        // Something (a previous catalog, an operator) may already be serving
        if self.client.health().await.is_ok() {
            info!("Explorer already running at {}", self.client.base_url());
            return Ok(());
        }

        let child = self.spawn()?;
        *guard = Some(child);

        let child = guard.as_mut().ok_or_else(|| {
            BridgeError::Protocol("explorer handle missing after spawn".to_string())
        })?;

        match self.wait_healthy(child).await {
            Ok(()) => Ok(()),
            Err(e) => {
                if let Some(mut child) = guard.take() {
                    let _ = child.kill().await;
                }
                Err(e)
            }
        }
    }

    fn spawn(&self) -> Result<Child, BridgeError> {
        let mut command = Command::new(&self.settings.binary);
        command
            .arg("--bind")
            .arg(&self.settings.bind)
            .arg("--allowed-origin")
            .arg(&self.settings.allowed_origin)
            .arg("--public-url")
            .arg(self.client.base_url())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        if let Some(settings_file) = &self.launch.settings_file {
            command.arg("--settings").arg(settings_file);
        }
        if let Some(data_dir) = &self.launch.data_dir {
            command.arg("--data-dir").arg(data_dir);
        }
        if let Some(database) = &self.launch.database {
            command.arg("--database").arg(database);
        }

        let child = command.spawn().map_err(|e| BridgeError::Unreachable {
            url: self.client.base_url().to_string(),
            reason: format!(
                "failed to start {}: {}",
                self.settings.binary.display(),
                e
            ),
        })?;

        info!(
            "Started explorer process {} (pid {:?})",
            self.settings.binary.display(),
            child.id()
        );
        Ok(child)
    }

    async fn wait_healthy(&self, child: &mut Child) -> Result<(), BridgeError> {
        let deadline = Instant::now() + Duration::from_millis(self.settings.startup_timeout_ms);

        loop {
            if self.client.health().await.is_ok() {
                info!("Explorer healthy at {}", self.client.base_url());
                return Ok(());
            }

            if let Ok(Some(status)) = child.try_wait() {
                return Err(BridgeError::Unreachable {
                    url: self.client.base_url().to_string(),
                    reason: format!("explorer exited during startup ({})", status),
                });
            }

            if Instant::now() >= deadline {
                return Err(BridgeError::Unreachable {
                    url: self.client.base_url().to_string(),
                    reason: format!(
                        "explorer not healthy after {} ms",
                        self.settings.startup_timeout_ms
                    ),
                });
            }

            tokio::time::sleep(HEALTH_POLL_INTERVAL).await;
        }
    }

    /// Process id of the explorer this supervisor started, if still held
    pub async fn pid(&self) -> Option<u32> {
        self.child.lock().await.as_ref().and_then(|child| child.id())
    }

    /// Stop a managed explorer; no-op when none was started
    pub async fn shutdown(&self) {
        let mut guard = self.child.lock().await;
        if let Some(mut child) = guard.take() {
            let pid = child.id();
            match child.kill().await {
                Ok(()) => info!("Explorer process {:?} stopped", pid),
                Err(e) => warn!("Failed to stop explorer process {:?}: {}", pid, e),
            }
        }
    }
}
