//! High level judge orchestration.
//!
//! Wires the supervised browser handle, the sandbox script generator, and
//! the verdict decoder into a single timeout-bounded evaluation call.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::browser::{Browser, BrowserError, DriverConfig, FirefoxBrowser};
use crate::catalog::Catalog;
use crate::sandbox::{ScriptError, build_eval_script};
use crate::verdict::{Outcome, OutcomeError, Verdict};

/// Result alias used across the orchestration layer.
pub type JudgeResult<T> = Result<T, JudgeError>;

/// Engine-level failures, as opposed to a failed puzzle: a verdict with
/// `passed: false` (including runtime errors in user code) is a normal
/// return value, never one of these.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),
    #[error("evaluation script error: {0}")]
    Script(#[from] ScriptError),
    #[error("puzzle not found: {0}")]
    PuzzleNotFound(String),
    #[error("solution run timed out after {0:?}")]
    ExecutionTimeout(Duration),
    #[error("browser returned an invalid outcome: {0}")]
    InvalidOutcome(#[from] OutcomeError),
}

/// Timeout policy for one evaluation.
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    pub startup_timeout: Duration,
    pub execution_timeout: Duration,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            startup_timeout: Duration::from_secs(60),
            execution_timeout: Duration::from_secs(60),
        }
    }
}

/// Fluent builder for [`Judge`].
pub struct JudgeBuilder {
    config: JudgeConfig,
    driver: DriverConfig,
    catalog: Option<Arc<Catalog>>,
    browser: Option<Arc<dyn Browser>>,
}

impl JudgeBuilder {
    pub fn new() -> Self {
        Self {
            config: JudgeConfig::default(),
            driver: DriverConfig::default(),
            catalog: None,
            browser: None,
        }
    }

    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.config.startup_timeout = timeout;
        self
    }

    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.config.execution_timeout = timeout;
        self
    }

    /// Launch parameters for the default Firefox browser handle. Ignored
    /// when an explicit browser is injected.
    pub fn with_driver_config(mut self, config: DriverConfig) -> Self {
        self.driver = config;
        self
    }

    /// Substitutes the browser handle, e.g. a stub in tests.
    pub fn with_browser(mut self, browser: Arc<dyn Browser>) -> Self {
        self.browser = Some(browser);
        self
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(Arc::new(catalog));
        self
    }

    pub fn build(self) -> JudgeResult<Judge> {
        let browser: Arc<dyn Browser> = match self.browser {
            Some(browser) => browser,
            None => Arc::new(FirefoxBrowser::new(self.driver)?),
        };
        let catalog = self
            .catalog
            .unwrap_or_else(|| Arc::new(Catalog::builtin()));

        Ok(Judge {
            config: self.config,
            catalog,
            browser,
            flight: Mutex::new(()),
        })
    }
}

impl Default for JudgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Judge evaluation engine.
///
/// Holds the shared browser handle and serializes evaluations against it:
/// browser sessions are not isolated enough to run side by side (shared
/// globals can leak between them), so at most one evaluation is in flight
/// at a time.
pub struct Judge {
    config: JudgeConfig,
    catalog: Arc<Catalog>,
    browser: Arc<dyn Browser>,
    flight: Mutex<()>,
}

impl Judge {
    /// Engine with the built-in catalogue and default Firefox handle.
    pub fn new() -> JudgeResult<Self> {
        JudgeBuilder::new().build()
    }

    pub fn builder() -> JudgeBuilder {
        JudgeBuilder::new()
    }

    /// Judges one solution against one puzzle.
    ///
    /// Ensures the driver process is healthy (respawning a dead one), runs
    /// the generated evaluation script in a fresh session bounded by the
    /// execution timeout, and decodes the outcome. On a timeout the
    /// in-flight run is abandoned and its late result discarded; the driver
    /// process is left alive for the next call.
    pub async fn judge(&self, puzzle_id: &str, solution: &str) -> JudgeResult<Verdict> {
        let _flight = self.flight.lock().await;

        let started = Instant::now();
        self.browser
            .ensure_running(self.config.startup_timeout)
            .await?;
        log::info!("browser start took {:?}", started.elapsed());

        let puzzle = self
            .catalog
            .get(puzzle_id)
            .ok_or_else(|| JudgeError::PuzzleNotFound(puzzle_id.to_owned()))?;

        let script = build_eval_script(&puzzle.name, &puzzle.source, solution)?;

        let started = Instant::now();
        let raw = match timeout(self.config.execution_timeout, self.browser.run_script(&script))
            .await
        {
            Ok(result) => result?,
            Err(_) => return Err(JudgeError::ExecutionTimeout(self.config.execution_timeout)),
        };
        log::info!("solution run took {:?}", started.elapsed());

        let outcome = Outcome::decode(&raw)?;
        Ok(Verdict::new(outcome, solution))
    }

    /// Tears down the shared driver process. A later call to [`Self::judge`]
    /// respawns it.
    pub async fn close(&self) {
        self.browser.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Puzzle, PuzzleGroup};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubBrowser {
        results: StdMutex<Vec<Value>>,
        delays: StdMutex<Vec<Duration>>,
        scripts: StdMutex<Vec<String>>,
        starts: AtomicUsize,
    }

    impl StubBrowser {
        fn returning(results: Vec<Value>) -> Arc<Self> {
            Arc::new(Self {
                results: StdMutex::new(results.into_iter().rev().collect()),
                delays: StdMutex::new(Vec::new()),
                scripts: StdMutex::new(Vec::new()),
                starts: AtomicUsize::new(0),
            })
        }

        fn with_delays(self: Arc<Self>, delays: Vec<Duration>) -> Arc<Self> {
            *self.delays.lock().unwrap() = delays.into_iter().rev().collect();
            self
        }

        fn scripts(&self) -> Vec<String> {
            self.scripts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Browser for StubBrowser {
        async fn ensure_running(&self, _startup_timeout: Duration) -> Result<(), BrowserError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn run_script(&self, script: &str) -> Result<Value, BrowserError> {
            self.scripts.lock().unwrap().push(script.to_owned());
            let delay = self.delays.lock().unwrap().pop().unwrap_or_default();
            if delay > Duration::ZERO {
                tokio::time::sleep(delay).await;
            }
            Ok(self
                .results
                .lock()
                .unwrap()
                .pop()
                .expect("no more stub results"))
        }

        async fn close(&self) {}
    }

    fn test_catalog() -> Catalog {
        Catalog::from_puzzles(vec![Puzzle::new(
            "p1",
            "simple",
            "function simple(x) {\n  return x;\n}",
            PuzzleGroup::Beginner,
        )])
    }

    fn judge_with(browser: Arc<StubBrowser>) -> Judge {
        Judge::builder()
            .with_browser(browser)
            .with_catalog(test_catalog())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn passing_solution_yields_a_verdict() {
        let browser = StubBrowser::returning(vec![json!({"passed": true, "value": "true"})]);
        let judge = judge_with(browser.clone());

        let verdict = judge.judge("p1", "true").await.unwrap();
        assert!(verdict.passed);
        assert_eq!(verdict.value.as_deref(), Some("true"));
        assert_eq!(verdict.error, None);
        assert_eq!(verdict.num_chars, 4);

        let scripts = browser.scripts();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains("function simple"));
        assert!(scripts[0].contains(r#""solution":"true""#));
    }

    #[tokio::test]
    async fn thrown_user_error_is_a_normal_verdict() {
        let browser = StubBrowser::returning(vec![
            json!({"passed": false, "error": "ReferenceError: nope is not defined"}),
        ]);
        let judge = judge_with(browser);

        let verdict = judge.judge("p1", "nope()").await.unwrap();
        assert!(!verdict.passed);
        assert_eq!(verdict.value, None);
        assert_eq!(
            verdict.error.as_deref(),
            Some("ReferenceError: nope is not defined")
        );
        assert_eq!(verdict.num_chars, 6);
    }

    #[tokio::test]
    async fn failing_value_is_not_an_error() {
        let browser = StubBrowser::returning(vec![json!({"passed": false, "value": "-0"})]);
        let judge = judge_with(browser);

        let verdict = judge.judge("p1", "-0").await.unwrap();
        assert!(!verdict.passed);
        assert_eq!(verdict.value.as_deref(), Some("-0"));
    }

    #[tokio::test]
    async fn unknown_puzzle_fails_before_any_script_runs() {
        let browser = StubBrowser::returning(vec![]);
        let judge = judge_with(browser.clone());

        let err = judge.judge("missing", "1").await.unwrap_err();
        assert!(matches!(err, JudgeError::PuzzleNotFound(id) if id == "missing"));
        assert!(browser.scripts().is_empty());
    }

    #[tokio::test]
    async fn num_chars_counts_unicode_scalars() {
        let browser = StubBrowser::returning(vec![json!({"passed": false, "value": "null"})]);
        let judge = judge_with(browser);

        let verdict = judge.judge("p1", "'héllo'").await.unwrap();
        assert_eq!(verdict.num_chars, 7);
    }

    #[tokio::test]
    async fn outcome_without_branches_is_an_engine_failure() {
        let browser = StubBrowser::returning(vec![json!({"passed": true})]);
        let judge = judge_with(browser);

        let err = judge.judge("p1", "1").await.unwrap_err();
        assert!(matches!(
            err,
            JudgeError::InvalidOutcome(OutcomeError::Empty)
        ));
    }

    #[tokio::test]
    async fn slow_execution_times_out_and_the_engine_recovers() {
        // The first run is abandoned mid-sleep by the timeout, so only the
        // second run ever consumes a stub result.
        let browser = StubBrowser::returning(vec![json!({"passed": true, "value": "true"})])
            .with_delays(vec![Duration::from_millis(200), Duration::ZERO]);

        let judge = Judge::builder()
            .with_browser(browser.clone())
            .with_catalog(test_catalog())
            .with_execution_timeout(Duration::from_millis(20))
            .build()
            .unwrap();

        let err = judge.judge("p1", "1").await.unwrap_err();
        assert!(matches!(err, JudgeError::ExecutionTimeout(_)));

        // The next call reuses the same handle and succeeds.
        let verdict = judge.judge("p1", "true").await.unwrap();
        assert!(verdict.passed);
        assert_eq!(browser.starts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn identical_submissions_yield_identical_verdicts() {
        let result = json!({"passed": true, "value": "true"});
        let browser = StubBrowser::returning(vec![result.clone(), result]);
        let judge = judge_with(browser.clone());

        let first = judge.judge("p1", "true").await.unwrap();
        let second = judge.judge("p1", "true").await.unwrap();
        assert_eq!(first, second);

        let scripts = browser.scripts();
        assert_eq!(scripts[0], scripts[1]);
    }
}
