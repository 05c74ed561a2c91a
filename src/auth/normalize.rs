// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity normalization.
//!
//! Usernames are trimmed and NFKC-normalized; emails additionally
//! lower-cased. Stored identities and lookups go through the same functions
//! so visually identical inputs resolve to one account.

use unicode_normalization::UnicodeNormalization;

pub fn normalize_username(raw: &str) -> String {
    raw.trim().nfkc().collect()
}

pub fn normalize_email(raw: &str) -> String {
    normalize_username(raw).to_lowercase()
}
