//! Driver process supervision.
//!
//! Owns the long-lived geckodriver process every evaluation shares:
//! spawning with a writable profile root, readiness polling against the
//! status endpoint, crash detection, and best-effort shutdown. Spawning a
//! fresh browser per request would be prohibitively slow and would exhaust
//! the fixed port, so the handle is reused until it dies.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::time::{Instant, sleep};

use super::protocol::DriverClient;

/// Launch parameters for the driver process and its loopback endpoint.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub host: String,
    pub port: u16,
    pub driver_path: PathBuf,
    pub browser_binary: PathBuf,
    pub profile_root: PathBuf,
    pub poll_interval: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 4444,
            driver_path: "/opt/geckodriver".into(),
            browser_binary: "/opt/firefox/firefox-bin".into(),
            profile_root: "/tmp/profile".into(),
            poll_interval: Duration::from_millis(200),
        }
    }
}

impl DriverConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("geckodriver startup timed out after {0:?}")]
    StartupTimeout(Duration),
    #[error("geckodriver exited during startup (code: {code:?}, signal: {signal:?})")]
    Crashed {
        code: Option<i32>,
        signal: Option<i32>,
    },
    #[error("failed to spawn geckodriver: {0}")]
    Spawn(std::io::Error),
    #[error("failed to prepare profile root: {0}")]
    ProfileRoot(std::io::Error),
    #[error("failed to poll geckodriver: {0}")]
    Wait(std::io::Error),
}

#[derive(Debug, Clone, Copy)]
enum Liveness {
    Absent,
    Running,
    Exited {
        code: Option<i32>,
        signal: Option<i32>,
    },
}

/// Supervises at most one driver process at a time.
///
/// Not safe for concurrent `ensure_running` calls; callers hold it behind a
/// mutex, matching the single-flight evaluation model.
pub struct DriverSupervisor {
    config: DriverConfig,
    child: Option<Child>,
}

impl DriverSupervisor {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            child: None,
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Guarantees a ready driver process before any session is opened.
    ///
    /// Reuses the existing process when it is still alive; otherwise spawns
    /// a replacement and polls the status endpoint every poll interval until
    /// it reports ready or `startup_timeout` elapses. A failure here leaves
    /// the supervisor free to respawn on the next call.
    pub async fn ensure_running(
        &mut self,
        client: &DriverClient,
        startup_timeout: Duration,
    ) -> Result<(), SupervisorError> {
        if !matches!(self.probe()?, Liveness::Running) {
            self.spawn().await?;
        }

        let deadline = Instant::now() + startup_timeout;
        loop {
            match self.probe()? {
                Liveness::Running => {}
                Liveness::Absent => {
                    return Err(SupervisorError::Crashed {
                        code: None,
                        signal: None,
                    });
                }
                Liveness::Exited { code, signal } => {
                    return Err(SupervisorError::Crashed { code, signal });
                }
            }

            if client.ping().await {
                log::info!("geckodriver ready on {}", self.config.base_url());
                return Ok(());
            }

            if Instant::now() >= deadline {
                // A process that never became ready is not a healthy handle;
                // kill it so the next call spawns a fresh one.
                self.close();
                return Err(SupervisorError::StartupTimeout(startup_timeout));
            }

            sleep(self.config.poll_interval).await;
        }
    }

    /// Sends a kill signal to the driver process if one is present. Does not
    /// wait for it to exit; safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(child) = self.child.as_mut() {
            if let Err(err) = child.start_kill() {
                log::debug!("kill signal not delivered to geckodriver: {err}");
            }
        }
    }

    fn probe(&mut self) -> Result<Liveness, SupervisorError> {
        let Some(child) = self.child.as_mut() else {
            return Ok(Liveness::Absent);
        };
        match child.try_wait().map_err(SupervisorError::Wait)? {
            None => Ok(Liveness::Running),
            Some(status) => Ok(Liveness::Exited {
                code: status.code(),
                signal: exit_signal(&status),
            }),
        }
    }

    async fn spawn(&mut self) -> Result<(), SupervisorError> {
        tokio::fs::create_dir_all(&self.config.profile_root)
            .await
            .map_err(SupervisorError::ProfileRoot)?;

        let mut command = Command::new(&self.config.driver_path);
        command
            .arg("--log=fatal")
            .arg(format!("--host={}", self.config.host))
            .arg(format!("--port={}", self.config.port))
            .arg(format!("--profile-root={}", self.config.profile_root.display()))
            .arg(format!("--binary={}", self.config.browser_binary.display()))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        log::info!(
            "spawning geckodriver from {} on {}",
            self.config.driver_path.display(),
            self.config.base_url()
        );
        let child = command.spawn().map_err(SupervisorError::Spawn)?;
        self.child = Some(child);
        Ok(())
    }
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}
