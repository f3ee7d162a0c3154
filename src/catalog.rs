//! Immutable puzzle catalogue.
//!
//! Maps opaque puzzle identifiers to the predicate sources the judge
//! evaluates. A built-in set ships with the crate; hosts that manage their
//! own puzzle storage can load a catalogue from any iterator of puzzles.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;

/// Classification tag attached to every puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PuzzleGroup {
    Beginner,
    Bases,
    Math,
    Eval,
    Random,
    Objects,
    Unknown,
}

/// One puzzle: an identifier, the predicate's name, and its source text.
///
/// `name` doubles as the name of the function declared by `source`, so it
/// must be a valid JavaScript identifier. The sandbox rejects anything else
/// before any browser traffic happens.
#[derive(Debug, Clone, Serialize)]
pub struct Puzzle {
    pub id: String,
    pub name: String,
    pub source: String,
    pub group: PuzzleGroup,
}

impl Puzzle {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        source: impl Into<String>,
        group: PuzzleGroup,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source: source.into(),
            group,
        }
    }
}

/// Read-only lookup table from puzzle id to puzzle, loaded once per process.
pub struct Catalog {
    puzzles: HashMap<String, Puzzle>,
}

impl Catalog {
    /// Builds a catalogue from the given puzzles. Later duplicates of an id
    /// replace earlier ones.
    pub fn from_puzzles<I>(puzzles: I) -> Self
    where
        I: IntoIterator<Item = Puzzle>,
    {
        Self {
            puzzles: puzzles
                .into_iter()
                .map(|puzzle| (puzzle.id.clone(), puzzle))
                .collect(),
        }
    }

    /// The catalogue of puzzles bundled with the crate.
    pub fn builtin() -> Self {
        Self::from_puzzles(BUILTIN_PUZZLES.iter().cloned())
    }

    pub fn get(&self, id: &str) -> Option<&Puzzle> {
        self.puzzles.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Puzzle> {
        self.puzzles.values()
    }

    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }
}

static BUILTIN_PUZZLES: Lazy<Vec<Puzzle>> = Lazy::new(|| {
    vec![
        Puzzle::new(
            "aad5a036-f677-402b-b48f-13393a8cde9a",
            "simple",
            "function simple(x) {\n  return x;\n}",
            PuzzleGroup::Beginner,
        ),
        Puzzle::new(
            "531b0815-744a-4e27-b7a6-4fc89d3125bd",
            "identityCrisis",
            "function identityCrisis(x) {\n  return x != x;\n}",
            PuzzleGroup::Beginner,
        ),
        Puzzle::new(
            "582c046c-9937-412e-8742-28516cb08e76",
            "sameSameButDifferent",
            "function sameSameButDifferent(x, y) {\n  return x === y && 1/x < 1/y\n}",
            PuzzleGroup::Beginner,
        ),
        Puzzle::new(
            "c1ee858e-6838-4161-bf62-89be0fca23d0",
            "contradiction",
            "function contradiction(x,y,z) {\n  return x && x == y && y == z && x != z;\n}",
            PuzzleGroup::Beginner,
        ),
        Puzzle::new(
            "333c52ae-d933-44e7-8cd8-95017ee736dd",
            "countingClosures",
            "function countingClosures(f) {\n  var a = f(), b = f();\n  return a() == 1 && a() == 2 && a() == 3\n      && b() == 1 && b() == 2;\n}",
            PuzzleGroup::Beginner,
        ),
        Puzzle::new(
            "cb1de7f3-852b-4558-a691-43931d5caed9",
            "safety",
            "function safety(x) {\n  return (x++ !== x) && (x++ === x);\n}",
            PuzzleGroup::Beginner,
        ),
        Puzzle::new(
            "cea8c90b-a514-4e71-ab82-b4b8b37e08b9",
            "array",
            "function array(x,y) {\n  return Array.isArray(x) && !(x instanceof Array) &&\n        !Array.isArray(y) &&  (y instanceof Array);\n}",
            PuzzleGroup::Objects,
        ),
        Puzzle::new(
            "93320cc6-3235-4a5a-8f71-758d57122559",
            "proto1",
            "function proto1(x) {\n  return x && !(\"__proto__\" in x);\n}",
            PuzzleGroup::Objects,
        ),
        Puzzle::new(
            "52c216a4-5b84-43fc-b193-88ee1caac6a3",
            "undef",
            "function undef(x) {\n  return !{ undefined: { undefined: 1 } }[typeof x][x];\n}",
            PuzzleGroup::Objects,
        ),
        Puzzle::new(
            "85039e43-e140-4d4b-baa5-0621d1d1febd",
            "ouroborobj",
            "function ouroborobj(x) {\n  return x in x;\n}",
            PuzzleGroup::Objects,
        ),
        Puzzle::new(
            "6bea85ae-b82f-4ae6-8584-d38263838c4e",
            "truth",
            "function truth(x) {\n  return x.valueOf() && !x;\n}",
            PuzzleGroup::Unknown,
        ),
        Puzzle::new(
            "ab94fce0-80ef-4cd7-a342-de87e5907ab7",
            "evil1",
            "var eval = window.eval;\nfunction evil1(x) {\n  return eval(x+'(x)') && !eval(x)(x);\n}",
            PuzzleGroup::Eval,
        ),
        Puzzle::new(
            "ad2e7c7d-645b-41e7-aaab-5f5615526d2c",
            "random2",
            "var rand = Math.random();\nfunction random2(x) {\n  return rand in x;\n}",
            PuzzleGroup::Random,
        ),
        Puzzle::new(
            "8d3af47f-def0-4577-8523-bcf57278d444",
            "total",
            "function total(x) {\n  return (x < x) && (x == x) && (x > x);\n}",
            PuzzleGroup::Unknown,
        ),
        Puzzle::new(
            "7ab477e2-a97f-46f1-880a-1acfd1a1f7d9",
            "associative",
            "function associative(x, y, z) {\n  return typeof x === \"number\"\n      && typeof y === \"number\"\n      && typeof z === \"number\"\n      && (x + y) + z !== x + (y + z);\n}",
            PuzzleGroup::Math,
        ),
        Puzzle::new(
            "91d06fc0-43dc-4a14-87d9-0cf9a1db871a",
            "countOnMe",
            "function countOnMe(x) {\n  if (!(x instanceof Array))\n    throw 'x must be an array.';\n\n  for (var i = 0; i < 20; i++) {\n    if (x[i] != i) {\n      throw 'x must contain the numbers 0-19 in order';\n    }\n  }\n\n  return true;\n}",
            PuzzleGroup::Unknown,
        ),
    ]
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookup_by_id() {
        let catalog = Catalog::builtin();
        let puzzle = catalog
            .get("aad5a036-f677-402b-b48f-13393a8cde9a")
            .expect("builtin puzzle missing");
        assert_eq!(puzzle.name, "simple");
        assert!(puzzle.source.starts_with("function simple"));
        assert_eq!(puzzle.group, PuzzleGroup::Beginner);
    }

    #[test]
    fn unknown_id_is_none() {
        assert!(Catalog::builtin().get("not-a-puzzle").is_none());
    }

    #[test]
    fn builtin_ids_are_unique() {
        assert_eq!(Catalog::builtin().len(), BUILTIN_PUZZLES.len());
    }

    #[test]
    fn builtin_sources_declare_their_name() {
        for puzzle in Catalog::builtin().iter() {
            assert!(
                puzzle.source.contains(&format!("function {}(", puzzle.name)),
                "{} does not declare its predicate",
                puzzle.id
            );
        }
    }

    #[test]
    fn later_duplicates_replace_earlier_ones() {
        let catalog = Catalog::from_puzzles(vec![
            Puzzle::new("p", "first", "function first() {}", PuzzleGroup::Unknown),
            Puzzle::new("p", "second", "function second() {}", PuzzleGroup::Unknown),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("p").unwrap().name, "second");
    }
}
