// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn single_chunk_single_frame() {
    let mut decoder = FrameDecoder::new();
    let frames = decoder.push(b"{\"type\":\"ping\"}\n").unwrap();
    assert_eq!(frames, vec![b"{\"type\":\"ping\"}".to_vec()]);
    assert_eq!(decoder.pending(), 0);
}

#[test]
fn partial_data_retained_across_pushes() {
    let mut decoder = FrameDecoder::new();
    assert!(decoder.push(b"{\"type\":").unwrap().is_empty());
    assert_eq!(decoder.pending(), 8);
    let frames = decoder.push(b"\"ping\"}\n{\"a\":1}\n{\"b\"").unwrap();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0], b"{\"type\":\"ping\"}");
    assert_eq!(frames[1], b"{\"a\":1}");
    assert_eq!(decoder.pending(), 4);
}

#[test]
fn byte_at_a_time_still_decodes() {
    let mut decoder = FrameDecoder::new();
    let input = b"{\"type\":\"ping\"}\n";
    let mut all = Vec::new();
    for byte in input {
        all.extend(decoder.push(&[*byte]).unwrap());
    }
    assert_eq!(all, vec![b"{\"type\":\"ping\"}".to_vec()]);
}

#[test]
fn crlf_tolerated() {
    let mut decoder = FrameDecoder::new();
    let frames = decoder.push(b"{\"a\":1}\r\n").unwrap();
    assert_eq!(frames, vec![b"{\"a\":1}".to_vec()]);
}

#[test]
fn blank_lines_skipped() {
    let mut decoder = FrameDecoder::new();
    let frames = decoder.push(b"\n\n{\"a\":1}\n\n").unwrap();
    assert_eq!(frames.len(), 1);
}

#[test]
fn oversized_partial_frame_errors() {
    let mut decoder = FrameDecoder::new();
    let big = vec![b'x'; MAX_FRAME_SIZE + 1];
    let err = decoder.push(&big).unwrap_err();
    assert!(matches!(err, FramingError::FrameTooLarge { .. }));
}

#[test]
fn encode_appends_exactly_one_newline() {
    let frame = encode_frame(&serde_json::json!({"type": "pong"})).unwrap();
    assert!(frame.ends_with(b"}\n"));
    assert_eq!(frame.iter().filter(|&&b| b == b'\n').count(), 1);
}
