// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Unsubscribe token generation

use rand::Rng;
use rand::rngs::OsRng;

/// Length of a generated token
pub const TOKEN_LEN: usize = 64;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Generates a fresh unsubscribe token from the operating system CSPRNG
///
/// The token is the only credential needed to unsubscribe, so it must never
/// come from a non-cryptographic generator.
#[must_use]
pub fn generate_unsubscribe_token() -> String {
    (0..TOKEN_LEN)
        .map(|_| char::from(ALPHABET[OsRng.gen_range(0..ALPHABET.len())]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_length() {
        assert_eq!(generate_unsubscribe_token().len(), TOKEN_LEN);
    }

    #[test]
    fn test_token_uses_url_safe_alphabet() {
        let token = generate_unsubscribe_token();
        assert!(token.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn test_tokens_are_distinct() {
        let tokens: HashSet<String> = (0..100).map(|_| generate_unsubscribe_token()).collect();
        assert_eq!(tokens.len(), 100);
    }
}
