//! Property tests for declaration parsing and merging.

use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;
use quill_css::{DeclarationMap, merge_declarations};

/// A declaration whose name and value survive a parse of their own output.
#[derive(Debug, Clone)]
struct Declaration {
    name: String,
    value: String,
}

impl Arbitrary for Declaration {
    fn arbitrary(g: &mut Gen) -> Self {
        let names = ["color", "margin", "padding", "--main", "--Main", "font-size", "border"];
        let values = ["red", "0", "1px 2px", "var(--main)", "blue !important", "url(a.png)", "#fff"];
        Self {
            name: (*g.choose(&names).unwrap_or(&"color")).to_string(),
            value: (*g.choose(&values).unwrap_or(&"red")).to_string(),
        }
    }
}

fn to_map(declarations: &[Declaration]) -> DeclarationMap {
    declarations
        .iter()
        .map(|d| (d.name.as_str(), d.value.as_str()))
        .collect()
}

#[quickcheck]
fn prop_serialized_map_parses_back(declarations: Vec<Declaration>) -> bool {
    let map = to_map(&declarations);
    DeclarationMap::parse(&map.to_style_string()) == map
}

#[quickcheck]
fn prop_merge_is_idempotent(existing: Vec<Declaration>, new: Vec<Declaration>) -> bool {
    let existing = to_map(&existing);
    let new = to_map(&new);
    let once = merge_declarations(&existing, &new);
    let twice = merge_declarations(&once, &new);
    once == twice
}

#[quickcheck]
fn prop_merge_keeps_every_key(existing: Vec<Declaration>, new: Vec<Declaration>) -> bool {
    let existing = to_map(&existing);
    let new = to_map(&new);
    let merged = merge_declarations(&existing, &new);
    existing.iter().chain(new.iter()).all(|(name, _)| merged.contains(name))
}
