// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Task-ID value type.
//!
//! A task ID is the human-readable identifier attached to every automation
//! execution. The textual form is fixed for compatibility with downstream
//! auditing tools:
//!
//! `TASK` + `YY` (2-digit year) + `P` (1-letter pool) + `SSSSSSSSSS`
//! (10-digit zero-padded sequence) + `i`
//!
//! Example: year 2025, pool `B`, sequence 42 -> `TASK25B0000000042i`.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Fixed prefix of every task ID.
pub const TASK_ID_PREFIX: &str = "TASK";

/// Fixed trailing character of every task ID.
pub const TASK_ID_SUFFIX: char = 'i';

/// Width of the zero-padded sequence segment.
pub const SEQUENCE_WIDTH: usize = 10;

/// Total length of a canonical task-ID string.
const TASK_ID_LEN: usize = 4 + 2 + 1 + SEQUENCE_WIDTH + 1;

/// A parsed or freshly allocated task ID.
///
/// The triple (year suffix, pool, sequence) fully determines the textual
/// form; [`fmt::Display`] renders it and [`FromStr`] recovers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    year_suffix: u8,
    pool: char,
    sequence: i64,
}

impl TaskId {
    /// Build a task ID from a four-digit year, pool code, and sequence.
    ///
    /// Only the last two digits of the year are retained, matching the
    /// textual format.
    pub fn new(year: i32, pool: char, sequence: i64) -> Self {
        Self {
            year_suffix: (year.rem_euclid(100)) as u8,
            pool,
            sequence,
        }
    }

    /// Two-digit year suffix (0-99).
    pub fn year_suffix(&self) -> u8 {
        self.year_suffix
    }

    /// Pool code letter.
    pub fn pool(&self) -> char {
        self.pool
    }

    /// Sequence number within the (year, pool) partition.
    pub fn sequence(&self) -> i64 {
        self.sequence
    }

    fn invalid(value: &str, reason: &str) -> CoreError {
        CoreError::InvalidTaskId {
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:02}{}{:0width$}{}",
            TASK_ID_PREFIX,
            self.year_suffix,
            self.pool,
            self.sequence,
            TASK_ID_SUFFIX,
            width = SEQUENCE_WIDTH
        )
    }
}

impl FromStr for TaskId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != TASK_ID_LEN {
            return Err(Self::invalid(
                s,
                &format!("expected {} characters, got {}", TASK_ID_LEN, s.len()),
            ));
        }
        if !s.is_ascii() {
            return Err(Self::invalid(s, "expected ASCII characters only"));
        }
        if !s.starts_with(TASK_ID_PREFIX) {
            return Err(Self::invalid(s, "expected 'TASK' prefix"));
        }
        if !s.ends_with(TASK_ID_SUFFIX) {
            return Err(Self::invalid(s, "expected trailing 'i'"));
        }

        let year_suffix: u8 = s[4..6]
            .parse()
            .map_err(|_| Self::invalid(s, "year suffix is not numeric"))?;

        let pool = s.as_bytes()[6] as char;
        if !pool.is_ascii_uppercase() {
            return Err(Self::invalid(s, "pool code must be an uppercase letter"));
        }

        let sequence: i64 = s[7..7 + SEQUENCE_WIDTH]
            .parse()
            .map_err(|_| Self::invalid(s, "sequence is not numeric"))?;

        Ok(Self {
            year_suffix,
            pool,
            sequence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_exact() {
        let id = TaskId::new(2025, 'B', 42);
        assert_eq!(id.to_string(), "TASK25B0000000042i");
    }

    #[test]
    fn test_format_and_parse_round_trip() {
        let id = TaskId::new(2025, 'C', 7);
        let text = id.to_string();
        assert_eq!(text, "TASK25C0000000007i");

        let parsed: TaskId = text.parse().unwrap();
        assert_eq!(parsed.year_suffix(), 25);
        assert_eq!(parsed.pool(), 'C');
        assert_eq!(parsed.sequence(), 7);
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_year_truncated_to_suffix() {
        let id = TaskId::new(2031, 'A', 1);
        assert_eq!(id.year_suffix(), 31);
        assert_eq!(id.to_string(), "TASK31A0000000001i");
    }

    #[test]
    fn test_large_sequence_fills_width() {
        let id = TaskId::new(2025, 'E', 9_876_543_210);
        assert_eq!(id.to_string(), "TASK25E9876543210i");
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        let err = "TASK25B42i".parse::<TaskId>().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TASK_ID");
    }

    #[test]
    fn test_parse_rejects_wrong_prefix() {
        assert!("WORK25B0000000042i".parse::<TaskId>().is_err());
    }

    #[test]
    fn test_parse_rejects_missing_suffix() {
        assert!("TASK25B0000000042x".parse::<TaskId>().is_err());
    }

    #[test]
    fn test_parse_rejects_lowercase_pool() {
        assert!("TASK25b0000000042i".parse::<TaskId>().is_err());
    }

    #[test]
    fn test_parse_rejects_non_numeric_sequence() {
        assert!("TASK25B00000000x2i".parse::<TaskId>().is_err());
    }
}
