use picker_select::picker::{
    filter::{BlockList, CoordinateWindow},
    model::RawNode,
    reconstruct::{DEFAULT_CLUSTER_THRESHOLD, ListReconstructor, cluster_entries},
};

use crate::common::fake_screen::{FakeScreen, button, hidden_text, text};

mod common;

fn nodes(rows: &[(i32, &str)]) -> Vec<RawNode> {
    rows.iter()
        .map(|(y, label)| RawNode::new(text(label, 20, *y)).unwrap())
        .collect()
}

fn labels(entries: &[picker_select::picker::model::Entry]) -> Vec<&str> {
    entries.iter().map(|e| e.label.as_str()).collect()
}

// =========================================================================
// Clustering
// =========================================================================

#[test]
fn name_and_subtitle_lines_form_one_entry() {
    let entries = cluster_entries(
        nodes(&[(300, "A1"), (327, "electricalPanel"), (364, "A1.1"), (391, "switch")]),
        DEFAULT_CLUSTER_THRESHOLD,
    );

    assert_eq!(labels(&entries), vec!["A1", "A1.1"]);
    assert_eq!(entries[0].index, 0);
    assert_eq!(entries[0].y(), 300);
    assert_eq!(entries[0].details, vec!["electricalPanel"]);
    assert_eq!(entries[1].index, 1);
    assert_eq!(entries[1].y(), 364);
    assert_eq!(entries[1].details, vec!["switch"]);
}

#[test]
fn gap_equal_to_threshold_stays_in_cluster() {
    let entries = cluster_entries(nodes(&[(0, "top"), (32, "under")]), 32);
    assert_eq!(entries.len(), 1);
}

#[test]
fn gap_one_past_threshold_starts_new_entry() {
    let entries = cluster_entries(nodes(&[(0, "top"), (33, "under")]), 32);
    assert_eq!(labels(&entries), vec!["top", "under"]);
}

#[test]
fn gap_is_measured_from_previous_node_not_anchor() {
    // Each step is 30 apart, so the chain never breaks even though the
    // last node is 90 below the anchor.
    let entries = cluster_entries(nodes(&[(0, "a"), (30, "b"), (60, "c"), (90, "d")]), 32);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].details, vec!["b", "c", "d"]);
}

#[test]
fn unsorted_input_is_ordered_top_to_bottom() {
    let entries = cluster_entries(
        nodes(&[(500, "Third"), (100, "First"), (300, "Second")]),
        DEFAULT_CLUSTER_THRESHOLD,
    );

    assert_eq!(labels(&entries), vec!["First", "Second", "Third"]);
    for pair in entries.windows(2) {
        assert!(pair[0].y() < pair[1].y(), "entries must be strictly top to bottom");
        assert_eq!(pair[0].index + 1, pair[1].index);
    }
}

#[test]
fn equal_y_keeps_document_order_and_joins_cluster() {
    let entries = cluster_entries(nodes(&[(100, "left"), (100, "right")]), 32);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].label, "left");
    assert_eq!(entries[0].details, vec!["right"]);
}

#[test]
fn empty_and_single_inputs() {
    assert!(cluster_entries(Vec::new(), 32).is_empty());

    let single = cluster_entries(nodes(&[(42, "only")]), 32);
    assert_eq!(labels(&single), vec!["only"]);
}

#[test]
fn clustering_is_deterministic() {
    let input = nodes(&[(10, "x"), (40, "x-sub"), (90, "y"), (200, "z"), (220, "z-sub")]);
    let first = cluster_entries(input.clone(), 32);
    let second = cluster_entries(input, 32);
    assert_eq!(first, second);
}

#[test]
fn custom_threshold_changes_grouping() {
    let rows = nodes(&[(0, "a"), (27, "b"), (64, "c")]);
    assert_eq!(cluster_entries(rows.clone(), 32).len(), 2);
    assert_eq!(cluster_entries(rows.clone(), 40).len(), 1);
    assert_eq!(cluster_entries(rows, 20).len(), 3);
}

// =========================================================================
// Candidate filtering
// =========================================================================

#[test]
fn window_bounds_are_inclusive_and_y_max_optional() {
    let reconstructor =
        ListReconstructor::new(CoordinateWindow::new(0, 100, 200, None), BlockList::default());

    let elements = vec![
        text("left of window", -5, 300),
        text("on x_min", 0, 300),
        text("on x_max", 100, 400),
        text("right of window", 101, 500),
        text("above window", 50, 199),
        text("far below fold", 50, 5000),
    ];

    let kept: Vec<String> = reconstructor
        .candidate_nodes(&elements)
        .into_iter()
        .map(|n| n.text)
        .collect();
    assert_eq!(kept, vec!["on x_min", "on x_max", "far below fold"]);

    let bounded =
        ListReconstructor::new(CoordinateWindow::new(0, 100, 200, Some(400)), BlockList::default());
    assert_eq!(bounded.candidate_nodes(&elements).len(), 2);
}

#[test]
fn block_list_matches_exact_case_insensitive_and_prefix() {
    let reconstructor = ListReconstructor::new(
        CoordinateWindow::unbounded(),
        BlockList::new(["Source Node", "Cancel"]),
    );

    let elements = vec![
        text("Source Node", 0, 0),
        text("source node", 0, 50),
        text("Source", 0, 100),
        text("CANCEL", 0, 150),
        text("Source Node Extra", 0, 200),
        text("Pump 3", 0, 250),
    ];

    let kept: Vec<String> = reconstructor
        .candidate_nodes(&elements)
        .into_iter()
        .map(|n| n.text)
        .collect();
    assert_eq!(kept, vec!["Source Node Extra", "Pump 3"]);
}

#[test]
fn breadcrumb_and_empty_text_are_discarded() {
    let reconstructor = ListReconstructor::new(CoordinateWindow::unbounded(), BlockList::default());

    let mut no_text = text("", 0, 100);
    no_text.text = None;
    let elements = vec![
        text("Site > Building > Floor 2", 0, 0),
        text("   ", 0, 50),
        no_text,
        text("  Floor 2  ", 0, 150),
    ];

    let kept = reconstructor.candidate_nodes(&elements);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].text, "Floor 2");
}

#[test]
fn custom_path_delimiter() {
    let blocks = BlockList::default().with_path_delimiter("/");
    assert!(blocks.blocks("Site/Building"));
    assert!(!blocks.blocks("Site > Building"));
}

// =========================================================================
// Reconstruction against a screen
// =========================================================================

#[test]
fn reconstruct_queries_static_text_only() {
    let mut screen = FakeScreen::new(vec![
        text("Source Node", 20, 200),
        text("A1", 20, 300),
        text("electricalPanel", 20, 327),
        button("Cancel", 20, 330),
        text("A1.1", 20, 364),
        hidden_text("A1.2", 20, 900),
    ]);

    let reconstructor =
        ListReconstructor::new(CoordinateWindow::unbounded(), BlockList::new(["Source Node"]));
    let entries = reconstructor.reconstruct(&mut screen).unwrap();

    assert_eq!(labels(&entries), vec!["A1", "A1.1", "A1.2"]);
    assert!(!entries[2].anchor.element.visible, "off-screen rows are kept");
    assert_eq!(screen.queries, 1);
    assert!(screen.clicks.is_empty());
}

#[test]
fn reconstruct_with_no_candidates_is_empty_not_error() {
    let mut screen = FakeScreen::new(vec![button("Done", 0, 0)]);
    let reconstructor = ListReconstructor::new(CoordinateWindow::unbounded(), BlockList::default());
    let entries = reconstructor.reconstruct(&mut screen).unwrap();
    assert!(entries.is_empty());
}
