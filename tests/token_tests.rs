// tests/token_tests.rs
use std::collections::HashSet;

use encrypted_token_vault::consts::{RANDOM_ALPHABET, TIMESTAMP_ALPHABET, TOKEN_PREFIX};
use encrypted_token_vault::token::TOKEN_LENGTH_FLOOR;
use encrypted_token_vault::{TokenError, TokenGenerator, TokenSource};

const FIXED_MILLIS: u64 = 1_760_000_000_000;

#[test]
fn ten_thousand_tokens_are_unique() {
    let generator = TokenGenerator::default();
    let tokens: HashSet<String> = (0..10_000).map(|_| generator.generate(32).unwrap()).collect();
    assert_eq!(tokens.len(), 10_000);
}

#[test]
fn tokens_have_requested_length_and_prefix() {
    let generator = TokenGenerator::default();
    for len in 15..=40 {
        let token = generator.generate(len).unwrap();
        assert_eq!(token.len(), len);
        assert!(token.starts_with(TOKEN_PREFIX));
    }
}

#[test]
fn tokens_use_only_their_alphabets() {
    let generator = TokenGenerator::default();
    let token = generator.generate_at(32, FIXED_MILLIS).unwrap();
    let body = &token.as_bytes()[TOKEN_PREFIX.len()..];
    let (stamp, suffix) = body.split_at(9);

    assert!(stamp.iter().all(|b| TIMESTAMP_ALPHABET.contains(b)));
    assert!(suffix.iter().all(|b| RANDOM_ALPHABET.contains(b)));
    assert_eq!(suffix.len(), 32 - TOKEN_PREFIX.len() - 9);
}

#[test]
fn out_of_bounds_lengths_are_rejected() {
    let generator = TokenGenerator::default();
    assert_eq!(
        generator.generate(14),
        Err(TokenError::LengthOutOfBounds {
            requested: 14,
            min: 15,
            max: 40
        })
    );
    assert!(generator.generate(41).is_err());
    assert!(generator.generate(0).is_err());
}

#[test]
fn minimum_length_is_clamped_to_the_floor() {
    let generator = TokenGenerator::new(3, 20);
    assert_eq!(generator.bounds(), (TOKEN_LENGTH_FLOOR, 20));
    assert_eq!(TOKEN_LENGTH_FLOOR, 15);
}

#[test]
fn short_tokens_keep_the_low_order_timestamp() {
    let generator = TokenGenerator::default();
    let full = generator.generate_at(40, FIXED_MILLIS).unwrap();
    let short = generator.generate_at(15, FIXED_MILLIS).unwrap();

    let full_stamp = &full[TOKEN_PREFIX.len()..TOKEN_PREFIX.len() + 9];
    let short_stamp = &short[TOKEN_PREFIX.len()..TOKEN_PREFIX.len() + 6];
    assert_eq!(short_stamp, &full_stamp[3..]);
    assert_eq!(short.len() - TOKEN_PREFIX.len() - 6, 6, "random part keeps its minimum");
}

#[test]
fn later_timestamps_sort_after_earlier_ones() {
    let generator = TokenGenerator::default();
    let mut previous = generator.generate_at(24, FIXED_MILLIS).unwrap();
    for step in [1, 31, 32, 1_000, 86_400_000] {
        let next = generator.generate_at(24, FIXED_MILLIS + step).unwrap();
        assert!(next[..12] > previous[..12], "{next} should sort after {previous}");
        previous = next;
    }
}

#[test]
fn same_millisecond_tokens_differ_in_suffix() {
    let generator = TokenGenerator::default();
    let a = generator.generate_at(32, FIXED_MILLIS).unwrap();
    let b = generator.generate_at(32, FIXED_MILLIS).unwrap();
    assert_eq!(a[..12], b[..12]);
    assert_ne!(a, b);
}
