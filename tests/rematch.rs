//! Offset rematching through lossy normalization, over the public API.

mod common;

use common::english_tokenizer;

#[test]
fn test_case_and_accent_folding_keep_original_spans() {
    let tok = english_tokenizer();
    let text = "The Quick CAFÉ!";
    assert_eq!(
        tok.tokenize(text),
        vec!["the", "quick", "cafe", "!"]
    );
    assert_eq!(
        tok.rematch(text).unwrap(),
        vec![(0, 3), (4, 9), (10, 14), (14, 15)]
    );
}

#[test]
fn test_unknown_word_spans_the_whole_word() {
    let tok = english_tokenizer();
    let text = "The zzzgrumble dog.";
    assert_eq!(tok.tokenize(text), vec!["the", "<unk>", "dog", "."]);
    assert_eq!(
        tok.rematch(text).unwrap(),
        vec![(0, 3), (4, 14), (15, 18), (18, 19)]
    );
}

#[test]
fn test_deleted_characters_are_skipped() {
    let tok = english_tokenizer();
    // The zero-width space disappears during cleaning; the accent fold
    // keeps "Thé" three characters wide.
    let text = "Thé \u{200B}quick dog";
    assert_eq!(
        tok.rematch(text).unwrap(),
        vec![(0, 3), (5, 10), (11, 14)]
    );
}

#[test]
fn test_subword_spans_partition_their_word() {
    let tok = english_tokenizer();
    let text = "Unaffable jumps";
    assert_eq!(
        tok.tokenize(text),
        vec!["un", "##aff", "##able", "jump", "##s"]
    );
    assert_eq!(
        tok.rematch(text).unwrap(),
        vec![(0, 2), (2, 5), (5, 9), (10, 14), (14, 15)]
    );
}

#[test]
fn test_spans_are_monotonic_and_cover_every_token() {
    let tok = english_tokenizer();
    let text = "The quick brown fox, the LAZY dog!";
    let tokens = tok.tokenize(text);
    let spans = tok.rematch(text).unwrap();
    assert_eq!(tokens.len(), spans.len());
    let mut prev_end = 0;
    for &(start, end) in &spans {
        assert!(start <= end);
        assert!(start >= prev_end);
        prev_end = end;
    }
    assert!(prev_end <= text.chars().count());
}
