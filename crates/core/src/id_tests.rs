// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn uuid_gen_produces_lowercase_hex() {
    let gen = UuidIdGen;
    let id = gen.next();
    assert_eq!(id.len(), 32);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn uuid_gen_produces_unique_ids() {
    let gen = UuidIdGen;
    let a = gen.next();
    let b = gen.next();
    assert_ne!(a, b);
}

#[test]
fn sequential_gen_counts_up() {
    let gen = SequentialIdGen::new("msg");
    assert_eq!(gen.next(), "msg-1");
    assert_eq!(gen.next(), "msg-2");
}

#[test]
fn short_truncates_long_strings() {
    assert_eq!("abcdef".short(4), "abcd");
    assert_eq!("ab".short(4), "ab");
}
