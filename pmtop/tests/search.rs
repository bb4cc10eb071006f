//! Ranked log filtering and highlight spans.

use pmtop::search::{filter, highlight, Chunk};

fn lines(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

#[test]
fn empty_query_is_identity() {
    let logs = lines(&["b", "a", "c", "a"]);
    assert_eq!(filter(&logs, ""), vec!["b", "a", "c", "a"]);

    let empty: Vec<String> = Vec::new();
    assert!(filter(&empty, "").is_empty());
}

#[test]
fn contiguous_matches_rank_above_scattered_ones() {
    let logs = lines(&[
        "nothing relevant",
        "d i s k almost full",
        "error: disk full",
        "DISK pressure warning",
    ]);
    assert_eq!(
        filter(&logs, "disk"),
        vec![
            "error: disk full",
            "DISK pressure warning",
            "d i s k almost full",
        ]
    );
}

#[test]
fn ties_keep_original_order() {
    let logs = lines(&["disk b", "disk a", "disk c"]);
    assert_eq!(filter(&logs, "disk"), vec!["disk b", "disk a", "disk c"]);
}

#[test]
fn query_text_is_literal_not_a_pattern() {
    let logs = lines(&["a.b", "axb", "aXb"]);
    // "." must not act as a wildcard
    assert_eq!(filter(&logs, "a.b"), vec!["a.b"]);
}

#[test]
fn highlight_splits_into_plain_and_matched_chunks() {
    assert_eq!(
        highlight("error: disk full", "disk"),
        vec![
            Chunk {
                text: "error: ",
                matched: false
            },
            Chunk {
                text: "disk",
                matched: true
            },
            Chunk {
                text: " full",
                matched: false
            },
        ]
    );
}

#[test]
fn highlight_with_empty_query_is_one_plain_chunk() {
    assert_eq!(
        highlight("error: disk full", ""),
        vec![Chunk {
            text: "error: disk full",
            matched: false
        }]
    );
}

#[test]
fn highlight_is_case_insensitive_but_keeps_original_text() {
    assert_eq!(
        highlight("Disk DISK disk", "disk"),
        vec![
            Chunk {
                text: "Disk",
                matched: true
            },
            Chunk {
                text: " ",
                matched: false
            },
            Chunk {
                text: "DISK",
                matched: true
            },
            Chunk {
                text: " ",
                matched: false
            },
            Chunk {
                text: "disk",
                matched: true
            },
        ]
    );
}

#[test]
fn highlight_handles_multibyte_text() {
    assert_eq!(
        highlight("naïve CAFÉ story", "café"),
        vec![
            Chunk {
                text: "naïve ",
                matched: false
            },
            Chunk {
                text: "CAFÉ",
                matched: true
            },
            Chunk {
                text: " story",
                matched: false
            },
        ]
    );
}

#[test]
fn unmatched_line_is_a_single_plain_chunk() {
    assert_eq!(
        highlight("all quiet", "disk"),
        vec![Chunk {
            text: "all quiet",
            matched: false
        }]
    );
}
