// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Natural ordering for display names.
//!
//! Strings are compared run by run: digit runs by numeric value, other
//! runs as text. `file2` sorts before `file10`.
//!
//! | Pair | Result | Rule |
//! |------|--------|------|
//! | `file2` / `file10` | Less | 2 < 10 |
//! | `file1` / `file01` | Less | equal value, shorter run first |
//! | `""` / `a` | Less | empty sorts lowest |
//! | `B` / `a` | Greater | case-insensitive mode |

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

impl<'a> Chunk<'a> {
    const fn as_str(self) -> &'a str {
        match self {
            Self::Digits(s) | Self::Text(s) => s,
        }
    }
}

/// Splits a string into alternating digit / non-digit runs.
struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digits)
            .map_or(self.rest.len(), |(i, _)| i);
        let (run, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(if digits {
            Chunk::Digits(run)
        } else {
            Chunk::Text(run)
        })
    }
}

/// Compares two digit runs by value; on a tie the shorter run is first.
///
/// Works on the digit text directly, so runs of any length are fine.
fn compare_digits(a: &str, b: &str) -> Ordering {
    let a_value = a.trim_start_matches('0');
    let b_value = b.trim_start_matches('0');
    a_value
        .len()
        .cmp(&b_value.len())
        .then_with(|| a_value.cmp(b_value))
        .then_with(|| a.len().cmp(&b.len()))
}

fn compare_text(a: &str, b: &str, case_insensitive: bool) -> Ordering {
    if case_insensitive {
        a.chars()
            .flat_map(char::to_lowercase)
            .cmp(b.chars().flat_map(char::to_lowercase))
    } else {
        a.cmp(b)
    }
}

/// Natural-order comparison of `a` and `b`.
#[must_use]
pub fn natural_cmp(a: &str, b: &str, case_insensitive: bool) -> Ordering {
    let mut left = Chunks { rest: a };
    let mut right = Chunks { rest: b };
    loop {
        let ordering = match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(Chunk::Digits(x)), Some(Chunk::Digits(y))) => compare_digits(x, y),
            (Some(x), Some(y)) => compare_text(x.as_str(), y.as_str(), case_insensitive),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

/// Configured natural-order comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NaturalOrder {
    case_insensitive: bool,
}

impl NaturalOrder {
    /// Creates a comparator.
    #[must_use]
    pub const fn new(case_insensitive: bool) -> Self {
        Self { case_insensitive }
    }

    /// Whether text runs ignore case.
    #[must_use]
    pub const fn is_case_insensitive(self) -> bool {
        self.case_insensitive
    }

    /// Compares two strings.
    #[must_use]
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        natural_cmp(a, b, self.case_insensitive)
    }

    /// Sorts `items` in place (stable).
    pub fn sort<S: AsRef<str>>(self, items: &mut [S]) {
        items.sort_by(|a, b| self.compare(a.as_ref(), b.as_ref()));
    }
}

impl Default for NaturalOrder {
    fn default() -> Self {
        Self::new(true)
    }
}
