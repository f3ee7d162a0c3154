//! # puzzlejudge-rs
//!
//! Judge engine for JavaScript puzzles that intentionally probe quirky,
//! engine-specific language behavior. Submissions cannot be trusted to an
//! interpreter embedded in the server process, so the engine evaluates them
//! inside a real, unmodified browser: it supervises a headless geckodriver
//! process, speaks the minimal WebDriver subset needed for synchronous
//! script execution, and wraps untrusted solution code in a tamper-resistant
//! evaluation script generated per submission.
//!
//! A failed puzzle (wrong value, or an exception thrown by the solution) is
//! a normal verdict; engine faults (driver crashes, protocol errors,
//! timeouts) surface as errors the host layer maps to a generic failure.
//!
//! ## Example
//!
//! ```no_run
//! use puzzlejudge_rs::Judge;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let judge = Judge::new()?;
//!     let verdict = judge
//!         .judge("aad5a036-f677-402b-b48f-13393a8cde9a", "true")
//!         .await?;
//!     println!("passed: {} value: {:?}", verdict.passed, verdict.value);
//!     Ok(())
//! }
//! ```

mod judge;

pub mod browser;
pub mod catalog;
pub mod sandbox;
pub mod verdict;

pub use crate::judge::{Judge, JudgeBuilder, JudgeConfig, JudgeError, JudgeResult};

pub use crate::browser::{
    Browser,
    BrowserError,
    DriverClient,
    DriverConfig,
    DriverSupervisor,
    FirefoxBrowser,
    ProtocolError,
    SupervisorError,
};

pub use crate::catalog::{Catalog, Puzzle, PuzzleGroup};

pub use crate::sandbox::{ScriptError, build_eval_script};

pub use crate::verdict::{Outcome, OutcomeError, Verdict};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
