// -*- coding: utf-8 -*-
//
// Copyright (C) 2024 - 2026 Michael Büsch <m@bues.ch>
//
// Licensed under the Apache License version 2.0
// or the MIT license, at your option.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generation of the random API key tokens.
//!
//! A token is a fixed length string over the alphanumeric
//! alphabet `A-Z`, `a-z`, `0-9`, built from the secure random
//! bytes of the operating system.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Length of a token, in characters.
pub const TOKEN_LEN: usize = 32;

/// The token alphabet. Index 0 is `A`.
pub const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                                  abcdefghijklmnopqrstuvwxyz\
                                  0123456789";

/// Random bytes at or above this value are discarded.
///
/// This is the largest multiple of the alphabet size that fits into a byte.
/// Every accepted byte maps onto the alphabet with equal probability.
const REJECT_THRES: u8 = (256 / ALPHABET.len() * ALPHABET.len()) as u8;

/// Maximum number of entropy requests for a single token.
const MAX_ROUNDS: usize = 64;

/// Token generator and parser errors.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The operating system entropy source failed.
    #[error("Failed to read secure random bytes from the operating system: {0}")]
    EntropyUnavailable(#[from] getrandom::Error),

    /// A string is not a valid token.
    #[error("Invalid API key token: {0}")]
    Invalid(&'static str),
}

/// A random API key token.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Get the token characters.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Don't leak the secret into logs.
        write!(f, "Token(<{} chars>)", self.0.len())
    }
}

impl std::str::FromStr for Token {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != TOKEN_LEN {
            return Err(TokenError::Invalid("wrong length"));
        }
        if !s.bytes().all(|c| ALPHABET.contains(&c)) {
            return Err(TokenError::Invalid("character outside of [A-Za-z0-9]"));
        }
        Ok(Self(s.to_string()))
    }
}

/// Check if the entropy source is a no-op or otherwise trivially broken.
fn entropy_is_sane(buf: &[u8]) -> bool {
    let first = buf[0];
    !buf.iter().all(|x| *x == first)
}

/// Generate a new token from the operating system entropy source.
pub fn generate_token() -> Result<Token, TokenError> {
    generate_token_with(getrandom::fill)
}

/// Generate a new token from the entropy source `fill`.
///
/// `fill` must fill the whole buffer with secure random bytes.
pub fn generate_token_with<F>(mut fill: F) -> Result<Token, TokenError>
where
    F: FnMut(&mut [u8]) -> Result<(), getrandom::Error>,
{
    let mut token = String::with_capacity(TOKEN_LEN);
    let mut rejected = 0_usize;
    let mut buf = [0_u8; TOKEN_LEN];

    for _ in 0..MAX_ROUNDS {
        fill(&mut buf)?;
        if !entropy_is_sane(&buf) {
            return Err(getrandom::Error::UNEXPECTED.into());
        }
        for b in buf {
            if b >= REJECT_THRES {
                rejected += 1;
                continue;
            }
            token.push(ALPHABET[(b as usize) % ALPHABET.len()] as char);
            if token.len() == TOKEN_LEN {
                tracing::debug!("Token generated. {rejected} random bytes rejected.");
                return Ok(Token(token));
            }
        }
    }
    // A working entropy source practically never gets here.
    Err(getrandom::Error::UNEXPECTED.into())
}


// vim: ts=4 sw=4 expandtab
