//! Integration tests for the cascade: rule ordering, merging, exclusions,
//! `<style>` harvesting and the residual stylesheet.

use quill_css::{InlineOutcome, Inliner, InlinerConfig, inline_css};
use quill_dom::{DomTree, NodeId};

/// Route `warn_once` and stage logging to the test harness (`RUST_LOG=debug`).
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn style_of(tree: &DomTree, id: NodeId) -> Option<&str> {
    tree.as_element(id).and_then(|e| e.style())
}

/// `<html><body>` with the given children of body, as `(tag, attrs)`.
fn document(children: &[(&str, &[(&str, &str)])]) -> (DomTree, Vec<NodeId>) {
    let mut tree = DomTree::new();
    let html = tree.append_element(NodeId::ROOT, "html", &[]);
    let body = tree.append_element(html, "body", &[]);
    let ids = children
        .iter()
        .map(|(tag, attrs)| tree.append_element(body, tag, attrs))
        .collect();
    (tree, ids)
}

fn inline_one(tag: &str, attrs: &[(&str, &str)], css: &str) -> (Option<String>, InlineOutcome) {
    let (mut tree, ids) = document(&[(tag, attrs)]);
    let outcome = inline_css(&mut tree, css);
    (style_of(&tree, ids[0]).map(str::to_string), outcome)
}

// ========== precedence ==========

#[test]
fn test_equal_specificity_follows_source_order() {
    let (style, _) = inline_one("p", &[], "p{color:red} p{color:blue}");
    assert_eq!(style.as_deref(), Some("color: blue;"));
}

#[test]
fn test_higher_specificity_wins_regardless_of_order() {
    let css = "#x { color: green } .y { color: blue } p { color: red }";
    let (style, _) = inline_one("p", &[("id", "x"), ("class", "y")], css);
    assert_eq!(style.as_deref(), Some("color: green;"));

    let css = "p.y { color: blue } p { color: red; margin: 0 }";
    let (style, _) = inline_one("p", &[("class", "y")], css);
    assert_eq!(style.as_deref(), Some("color: blue; margin: 0;"));
}

#[test]
fn test_multi_selector_rules_sort_per_selector() {
    // `.y` outranks `p` even though both come from one rule written first.
    let css = "p, .y { color: red } p { color: blue }";
    let (style, _) = inline_one("p", &[("class", "y")], css);
    assert_eq!(style.as_deref(), Some("color: red;"));
}

// ========== merging ==========

#[test]
fn test_existing_important_survives() {
    let (style, _) = inline_one("p", &[("style", "color:red!important")], "p { color: blue }");
    assert_eq!(style.as_deref(), Some("color: red!important;"));
}

#[test]
fn test_existing_plain_inline_style_is_overridden() {
    let (style, _) = inline_one("p", &[("style", "color: red; margin: 1px")], "p { color: blue }");
    assert_eq!(style.as_deref(), Some("color: blue; margin: 1px;"));
}

#[test]
fn test_property_names_are_lowercased_on_output() {
    let (style, _) = inline_one("p", &[], "p { COLOR: Red; --Brand: Blue }");
    assert_eq!(style.as_deref(), Some("color: Red; --Brand: Blue;"));
}

#[test]
fn test_applying_twice_is_idempotent() {
    let (mut tree, ids) = document(&[("p", &[("style", "margin: 0")])]);
    let css = "p { color: red; margin: 1px }";
    let mut inliner = Inliner::default();
    let _ = inliner.emogrify(&mut tree, css);
    let once = style_of(&tree, ids[0]).map(str::to_string);
    let _ = inliner.emogrify(&mut tree, css);
    assert_eq!(style_of(&tree, ids[0]).map(str::to_string), once);
    assert_eq!(once.as_deref(), Some("margin: 1px; color: red;"));
}

// ========== degraded input ==========

#[test]
fn test_invalid_selector_drops_only_itself() {
    init_logging();
    let (mut tree, ids) = document(&[("li", &[]), ("p", &[])]);
    let outcome = inline_css(&mut tree, "li:nth-child(bogus), p { color: red }");
    assert_eq!(style_of(&tree, ids[0]), None);
    assert_eq!(style_of(&tree, ids[1]), Some("color: red;"));
    assert_eq!(outcome.inlined_rules, 1);
}

#[test]
fn test_empty_and_garbage_input_leave_tree_unchanged() {
    for css in ["", "   ", "no blocks here", "p { color: red", "{ }"] {
        let (style, outcome) = inline_one("p", &[("style", "margin: 0")], css);
        assert_eq!(style.as_deref(), Some("margin: 0"), "css: {css:?}");
        assert_eq!(outcome, InlineOutcome::default());
    }
}

#[test]
fn test_empty_document() {
    let mut tree = DomTree::new();
    let outcome = inline_css(&mut tree, "p { color: red }");
    assert_eq!(outcome, InlineOutcome::default());
}

// ========== configuration ==========

#[test]
fn test_excluded_selectors() {
    init_logging();
    let (mut tree, ids) = document(&[("p", &[]), ("p", &[("class", "raw")])]);
    let config = InlinerConfig::default().exclude_selector("p.raw");
    let outcome = Inliner::new(config).emogrify(&mut tree, "p { color: red }");
    assert_eq!(style_of(&tree, ids[0]), Some("color: red;"));
    assert_eq!(style_of(&tree, ids[1]), None);
    assert_eq!(outcome.styled_elements, 1);
}

#[test]
fn test_excluded_element_still_keeps_its_media_block() {
    init_logging();
    let (mut tree, ids) = document(&[("p", &[("class", "raw")])]);
    let config = InlinerConfig::default().exclude_selector(".raw");
    let outcome = Inliner::new(config).emogrify(
        &mut tree,
        ".raw { margin: 0 } @media print { .raw { color: red } }",
    );
    assert_eq!(style_of(&tree, ids[0]), None);
    assert_eq!(outcome.residual_css, "@media print{.raw{color: red}}");
}

#[test]
fn test_style_blocks_are_harvested_after_given_css() {
    let mut tree = DomTree::new();
    let html = tree.append_element(NodeId::ROOT, "html", &[]);
    let head = tree.append_element(html, "head", &[]);
    let style = tree.append_element(head, "style", &[]);
    let _ = tree.append_text(style, "p { color: blue }");
    let body = tree.append_element(html, "body", &[]);
    let p = tree.append_element(body, "p", &[]);

    let _ = inline_css(&mut tree, "p { color: red }");

    assert_eq!(style_of(&tree, p), Some("color: blue;"));
    assert!(tree.children(head).is_empty());
}

#[test]
fn test_style_blocks_ignored_when_disabled() {
    let mut tree = DomTree::new();
    let style = tree.append_element(NodeId::ROOT, "style", &[]);
    let _ = tree.append_text(style, "p { color: blue }");
    let p = tree.append_element(NodeId::ROOT, "p", &[]);

    let config = InlinerConfig {
        parse_style_blocks: false,
        ..InlinerConfig::default()
    };
    let _ = Inliner::new(config).emogrify(&mut tree, "");

    assert_eq!(style_of(&tree, p), None);
    assert_eq!(tree.children(NodeId::ROOT), &[style, p]);
}

// ========== residual stylesheet ==========

#[test]
fn test_media_block_kept_when_its_selector_matches() {
    let css = "@media print { .only-print { color:red } }";
    let (mut tree, ids) = document(&[("div", &[("class", "only-print")])]);
    let outcome = inline_css(&mut tree, css);
    assert_eq!(outcome.residual_css, "@media print{.only-print{color:red}}");
    assert_eq!(style_of(&tree, ids[0]), None);
}

#[test]
fn test_media_block_dropped_when_nothing_matches() {
    let css = "@media print { .only-print { color:red } }";
    let (mut tree, _) = document(&[("div", &[("class", "other")])]);
    assert_eq!(inline_css(&mut tree, css).residual_css, "");
}

#[test]
fn test_media_block_is_all_or_nothing() {
    let css = "@media screen { .absent{a:1} .present{b:2} }";
    let (mut tree, _) = document(&[("div", &[("class", "present")])]);
    assert_eq!(
        inline_css(&mut tree, css).residual_css,
        "@media screen{.absent{a:1}.present{b:2}}"
    );
}

#[test]
fn test_media_block_with_disallowed_type_is_dropped() {
    let css = "@media speech { p{volume:loud} } @media screen and (max-width: 600px) { p{x:1} }";
    let (mut tree, _) = document(&[("p", &[])]);
    assert_eq!(
        inline_css(&mut tree, css).residual_css,
        "@media screen and (max-width: 600px){p{x:1}}"
    );

    let (mut tree, _) = document(&[("p", &[])]);
    let config = InlinerConfig::default().allow_media_type("speech");
    assert_eq!(
        Inliner::new(config).emogrify(&mut tree, css).residual_css,
        "@media speech{p{volume:loud}}@media screen and (max-width: 600px){p{x:1}}"
    );
}

#[test]
fn test_adjacent_media_blocks_share_a_wrapper() {
    let css = "@media print { p{a:1} } @media print { div{b:2} }";
    let (mut tree, _) = document(&[("p", &[]), ("div", &[])]);
    assert_eq!(
        inline_css(&mut tree, css).residual_css,
        "@media print{p{a:1}div{b:2}}"
    );
}

#[test]
fn test_uninlinable_rules_kept_for_present_elements() {
    let css = "a { color: blue } a:hover { color: red } p::first-line { x: 1 } @media print { a{y:2} }";
    let (mut tree, ids) = document(&[("a", &[])]);
    let outcome = inline_css(&mut tree, css);
    assert_eq!(style_of(&tree, ids[0]), Some("color: blue;"));
    assert_eq!(outcome.residual_css, "a:hover{color: red}@media print{a{y:2}}");
}

#[test]
fn test_uninlinable_rules_dropped_when_disabled() {
    let config = InlinerConfig {
        keep_uninlinable_rules: false,
        ..InlinerConfig::default()
    };
    let (mut tree, _) = document(&[("a", &[])]);
    let outcome = Inliner::new(config).emogrify(&mut tree, "a:hover { color: red }");
    assert_eq!(outcome.residual_css, "");
}

#[test]
fn test_passthrough_at_rules_lead_the_residual() {
    init_logging();
    let css = "@media print { p{a:1} } @font-face { font-family: X } @import url(a.css); @keyframes k { from { x: 0 } }";
    let (mut tree, _) = document(&[("p", &[])]);
    assert_eq!(
        inline_css(&mut tree, css).residual_css,
        "@import url(a.css);@font-face { font-family: X }@media print{p{a:1}}"
    );
}

#[test]
fn test_media_rules_are_not_inlined() {
    let (style, _) = inline_one("p", &[], "@media screen { p { color: red } }");
    assert_eq!(style, None);
}

// ========== variables ==========

#[test]
fn test_variables_resolve_through_the_cascade() {
    let mut tree = DomTree::new();
    let div = tree.append_element(NodeId::ROOT, "div", &[]);
    let p = tree.append_element(div, "p", &[]);
    let span = tree.append_element(div, "span", &[]);
    let em = tree.append_element(NodeId::ROOT, "em", &[]);

    let css = "div { --x: 5px; } div > p { margin: var(--x); } \
               span { padding: var(--y, 10px); border-width: var(--y, var(--x)) } \
               em { margin: var(--x) }";
    let _ = inline_css(&mut tree, css);

    assert_eq!(style_of(&tree, p), Some("margin: 5px;"));
    assert_eq!(style_of(&tree, span), Some("padding: 10px; border-width: 5px;"));
    assert_eq!(style_of(&tree, em), Some("margin: var(--x);"));
}
