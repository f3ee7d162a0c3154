//! Firefox browser handle: supervised geckodriver plus the wire client.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use url::Url;

use super::protocol::{DriverClient, ProtocolError};
use super::supervisor::{DriverConfig, DriverSupervisor};
use super::{Browser, BrowserError};

/// Shared handle over one geckodriver process and its loopback endpoint.
///
/// The driver process is reused across evaluations; each script run gets a
/// fresh session that is torn down before the result is returned. The
/// supervisor sits behind a mutex because `ensure_running` mutates the
/// process handle and is not reentrant.
pub struct FirefoxBrowser {
    client: DriverClient,
    supervisor: Mutex<DriverSupervisor>,
}

impl FirefoxBrowser {
    pub fn new(config: DriverConfig) -> Result<Self, BrowserError> {
        let base_url = Url::parse(&config.base_url()).map_err(ProtocolError::Endpoint)?;
        let client = DriverClient::new(base_url)?;
        Ok(Self {
            client,
            supervisor: Mutex::new(DriverSupervisor::new(config)),
        })
    }

    pub fn client(&self) -> &DriverClient {
        &self.client
    }
}

#[async_trait]
impl Browser for FirefoxBrowser {
    async fn ensure_running(&self, startup_timeout: Duration) -> Result<(), BrowserError> {
        let mut supervisor = self.supervisor.lock().await;
        supervisor
            .ensure_running(&self.client, startup_timeout)
            .await?;
        Ok(())
    }

    async fn run_script(&self, script: &str) -> Result<Value, BrowserError> {
        let session_id = self.client.create_session().await?;
        // Delete the session even when execution failed; the driver stays
        // reusable for the next evaluation either way.
        let result = self.client.execute_sync(&session_id, script).await;
        self.client.delete_session(&session_id).await;
        Ok(result?)
    }

    async fn close(&self) {
        self.supervisor.lock().await.close();
    }
}
