//! Sandboxed evaluation script generation.
//!
//! Builds the literal script text that runs *inside* the browser session:
//! it defines the puzzle predicate, invokes it once with the submitted
//! solution as its argument list, and serializes the result. Generation is a
//! pure function of its inputs; every anti-tamper rule lives in the emitted
//! text itself, so it can be pinned by string tests without executing any
//! JavaScript in this process.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Harness executed inside the browser, embedded verbatim.
///
/// The text must stick to old, universally supported syntax (`var`,
/// `function`, no arrow functions or destructuring) because target browsers
/// may predate ES2015. Constraints encoded here:
///
/// - User code runs inside its own dynamically built `Function`, so none of
///   the harness locals are reachable from its scope.
/// - `JSON.stringify` and `String` are captured before user code runs; the
///   globals may have been reassigned by the time serialization happens.
///   NaN is detected with `value !== value` for the same reason.
/// - The predicate is bound by the first `setPuzzle` call and invoked through
///   the callback handed out by the first `callPuzzle` call; repeated calls
///   are no-ops, keyed off closure flags rather than properties the user
///   could plant on shared prototypes.
/// - `Error`-like thrown values, `-0`, `NaN` and the infinities are rendered
///   through string coercion; everything else goes through JSON, falling
///   back to string coercion when that throws (cyclic structures).
const EVAL_HARNESS: &str = r#"function (opts, puzzleSource) {
  var jsonStringify = JSON.stringify;
  var toString = String;
  function stringify(value) {
    try {
      if (value instanceof Error) return toString(value);
      if (typeof value === "number") {
        if (value === 0 && 1 / value === -Infinity) return "-0";
        if (value !== value || value === Infinity || value === -Infinity)
          return toString(value);
      }

      var maybeString = jsonStringify(value);
      return typeof maybeString !== "string" ? toString(value) : maybeString;
    } catch (err) {
      return toString(value);
    }
  }

  var puzzle;
  function setPuzzle(fn) {
    if (!puzzle) puzzle = fn;
  }

  var value;
  var isCallerReturned = false;
  function callPuzzle() {
    if (isCallerReturned) return undefined;
    isCallerReturned = true;
    return function () {
      value = puzzle.apply(undefined, arguments);
    };
  }

  try {
    var userCode = new Function(
      "setPuzzle",
      "callPuzzle",
      [
        puzzleSource,
        ";setPuzzle(" + opts.puzzleName + ");",
        "callPuzzle()(" + opts.solution + ");"
      ].join("\n")
    );
    userCode(setPuzzle, callPuzzle);
    return { passed: value === true, value: stringify(value) };
  } catch (err) {
    return { passed: false, error: stringify(err) };
  }
}"#;

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap());

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("puzzle name is not a valid identifier: {0:?}")]
    InvalidPredicateName(String),
}

/// Builds the evaluation script for one puzzle/solution pair.
///
/// The puzzle source and the solution travel as JSON data and are spliced
/// together only inside the browser, inside the generated `Function` body.
/// The predicate name is interpolated into that body, which is why it is
/// held to strict identifier syntax here.
pub fn build_eval_script(
    puzzle_name: &str,
    puzzle_source: &str,
    solution: &str,
) -> Result<String, ScriptError> {
    if !IDENTIFIER_RE.is_match(puzzle_name) {
        return Err(ScriptError::InvalidPredicateName(puzzle_name.to_owned()));
    }

    let opts = serde_json::json!({
        "puzzleName": puzzle_name,
        "solution": solution,
    });
    let source = serde_json::Value::String(puzzle_source.to_owned());

    Ok(format!("return ({EVAL_HARNESS})({opts}, {source});"))
}
