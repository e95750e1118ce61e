use super::*;

fn config(chunk_size: usize, overlap: usize) -> ChunkingConfig {
    ChunkingConfig {
        chunk_size,
        overlap,
    }
}

fn words(count: usize) -> String {
    (0..count)
        .map(|i| format!("w{}", i))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Expected window count for token count `t`, size `s`, overlap `o`:
/// `ceil((t - s) / (s - o)) + 1` when `t > s`, else one chunk.
fn expected_window_count(t: usize, s: usize, o: usize) -> usize {
    if t <= s {
        1
    } else {
        (t - s).div_ceil(s - o) + 1
    }
}

#[test]
fn empty_and_whitespace_input_yield_no_chunks() {
    let cfg = config(512, 50);
    assert!(chunk_text("", &cfg).is_empty());
    assert!(chunk_text("   \n\t  ", &cfg).is_empty());
}

#[test]
fn short_text_yields_single_chunk() {
    let cfg = config(512, 50);
    let chunks = chunk_text("Policy regarding emissions standards for vehicles.", &cfg);
    assert_eq!(
        chunks,
        vec!["Policy regarding emissions standards for vehicles.".to_string()]
    );
}

#[test]
fn window_count_matches_formula() {
    for (t, s, o) in [
        (1000, 512, 50),
        (513, 512, 50),
        (512, 512, 50),
        (2000, 512, 50),
        (10, 4, 1),
        (100, 10, 3),
        (50, 10, 0),
    ] {
        let cfg = config(s, o);
        let chunks = chunk_text(&words(t), &cfg);
        assert_eq!(
            chunks.len(),
            expected_window_count(t, s, o),
            "token count {} size {} overlap {}",
            t,
            s,
            o
        );
    }
}

#[test]
fn windows_overlap_and_cover_all_tokens() {
    let cfg = config(4, 1);
    let chunks = chunk_text(&words(10), &cfg);

    // First window holds the first chunk_size tokens
    assert_eq!(chunks[0], "w0 w1 w2 w3");
    // Adjacent windows share `overlap` tokens
    assert!(chunks[1].starts_with("w3"));
    // The final window reaches the last token
    assert!(chunks.last().expect("chunks should be non-empty").ends_with("w9"));
}

#[test]
fn separator_mode_ignores_size_parameters() {
    // Tiny chunk size would split this text in window mode; separator mode
    // must return exactly one chunk per delimited segment instead.
    let cfg = config(16, 4);
    let text = format!(
        "Policy: A\nStatus: Active\n\n{}\n\nPolicy: B\nStatus: Repealed\n\n{}\n\nPolicy: C",
        POLICY_SEPARATOR, POLICY_SEPARATOR
    );

    let chunks = chunk_text(&text, &cfg);
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0], "Policy: A\nStatus: Active");
    assert_eq!(chunks[1], "Policy: B\nStatus: Repealed");
    assert_eq!(chunks[2], "Policy: C");
}

#[test]
fn separator_mode_drops_empty_segments() {
    let cfg = config(512, 50);
    let text = format!(
        "{}\n\nPolicy: only record\n\n{}\n   \n{}",
        POLICY_SEPARATOR, POLICY_SEPARATOR, POLICY_SEPARATOR
    );

    let chunks = chunk_text(&text, &cfg);
    assert_eq!(chunks, vec!["Policy: only record".to_string()]);
}

#[test]
fn chunks_are_trimmed_and_non_empty() {
    let cfg = config(8, 2);
    let chunks = chunk_text(&words(30), &cfg);

    for chunk in &chunks {
        assert!(!chunk.is_empty());
        assert_eq!(chunk, chunk.trim());
    }
}

#[test]
fn zero_overlap_produces_disjoint_windows() {
    let cfg = config(5, 0);
    let chunks = chunk_text(&words(15), &cfg);

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0], "w0 w1 w2 w3 w4");
    assert_eq!(chunks[1], "w5 w6 w7 w8 w9");
    assert_eq!(chunks[2], "w10 w11 w12 w13 w14");
}
