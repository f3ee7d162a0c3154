//! Real-browser smoke test.
//!
//! Needs geckodriver and firefox on the machine; point the environment
//! variables below at the installed binaries and run with
//! `cargo test -- --ignored`.

use std::time::Duration;

use puzzlejudge_rs::{DriverConfig, Judge};

const SIMPLE_PUZZLE_ID: &str = "aad5a036-f677-402b-b48f-13393a8cde9a";

fn driver_config_from_env() -> DriverConfig {
    let mut config = DriverConfig::default();
    if let Ok(path) = std::env::var("GECKODRIVER_PATH") {
        config.driver_path = path.into();
    }
    if let Ok(path) = std::env::var("FIREFOX_BINARY") {
        config.browser_binary = path.into();
    }
    if let Ok(dir) = std::env::var("PROFILE_ROOT") {
        config.profile_root = dir.into();
    }
    config
}

#[tokio::test]
#[ignore = "Requires geckodriver and firefox installations"]
async fn judges_against_a_real_browser() {
    let judge = Judge::builder()
        .with_driver_config(driver_config_from_env())
        .with_startup_timeout(Duration::from_secs(60))
        .with_execution_timeout(Duration::from_secs(60))
        .build()
        .unwrap();

    // A correct solution passes and reports the stringified return value.
    let verdict = judge.judge(SIMPLE_PUZZLE_ID, "true").await.unwrap();
    assert!(verdict.passed);
    assert_eq!(verdict.value.as_deref(), Some("true"));
    assert_eq!(verdict.error, None);
    assert_eq!(verdict.num_chars, 4);

    // Negative zero survives serialization as its own literal.
    let verdict = judge.judge(SIMPLE_PUZZLE_ID, "-0").await.unwrap();
    assert!(!verdict.passed);
    assert_eq!(verdict.value.as_deref(), Some("-0"));

    // A throwing solution is a normal failed verdict, not an engine error.
    let verdict = judge.judge(SIMPLE_PUZZLE_ID, "nope()").await.unwrap();
    assert!(!verdict.passed);
    assert!(verdict.error.is_some());

    // Prototype pollution in user code must not corrupt serialization.
    let verdict = judge
        .judge(
            SIMPLE_PUZZLE_ID,
            "(Object.prototype.toString = function () { return \"pwned\"; }, {a: 1})",
        )
        .await
        .unwrap();
    assert!(!verdict.passed);
    assert!(verdict.value.is_some());

    judge.close().await;
}
