//! Browser automation layer.
//!
//! Splits the concerns the judge composes: supervising the driver process,
//! speaking the WebDriver wire subset, and the `Browser` seam the
//! orchestrator is written against so tests can substitute a stub.

pub mod firefox;
pub mod protocol;
pub mod supervisor;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use firefox::FirefoxBrowser;
pub use protocol::{DriverClient, ProtocolError};
pub use supervisor::{DriverConfig, DriverSupervisor, SupervisorError};

/// Failure states of the browser layer, preserving where they came from.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("driver supervision failed: {0}")]
    Supervisor(#[from] SupervisorError),
    #[error("webdriver protocol failed: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Contract the orchestrator evaluates through.
///
/// Implementations own one long-lived driver process shared across calls
/// and open a fresh execution context per script run.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Guarantees a healthy driver process, spawning or respawning as needed,
    /// bounded by `startup_timeout`.
    async fn ensure_running(&self, startup_timeout: Duration) -> Result<(), BrowserError>;

    /// Runs a script in a fresh session and returns its raw result value.
    /// The session is torn down best-effort regardless of the outcome.
    async fn run_script(&self, script: &str) -> Result<Value, BrowserError>;

    /// Signals the driver process to terminate. Does not wait for exit.
    async fn close(&self);
}
