//! Topic name validation
//!
//! A topic name becomes a file name under the data directory, so it is
//! restricted to a portable character set and may not start with a dot.

use std::sync::OnceLock;

use regex::Regex;

use super::errors::{TopicError, TopicResult};

/// Longest file name most filesystems accept
const MAX_FILE_NAME_LEN: usize = 255;

/// Longest accepted name; `<name>.wal` must still fit in one file name
pub const MAX_TOPIC_NAME_LEN: usize = MAX_FILE_NAME_LEN - ".wal".len();

fn name_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            let pattern = format!(r"^[A-Za-z0-9][A-Za-z0-9._-]{{0,{}}}$", MAX_TOPIC_NAME_LEN - 1);
            Regex::new(&pattern).ok()
        })
        .as_ref()
}

/// Checks that `name` can be used as a topic name.
pub fn validate_topic_name(name: &str) -> TopicResult<()> {
    match name_pattern() {
        Some(pattern) if pattern.is_match(name) => Ok(()),
        _ => Err(TopicError::InvalidName(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_names() {
        for name in ["orders", "Orders-2024", "billing.events", "a", "x_y", "9lives"] {
            assert!(validate_topic_name(name).is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_rejects_path_like_names() {
        for name in ["", ".", "..", "../secrets", "a/b", "a\\b", ".hidden", "-flag", "sp ace"] {
            assert!(validate_topic_name(name).is_err(), "{:?}", name);
        }
    }

    #[test]
    fn test_length_limit() {
        assert_eq!(MAX_TOPIC_NAME_LEN, 251);

        let longest = "a".repeat(MAX_TOPIC_NAME_LEN);
        assert!(validate_topic_name(&longest).is_ok());

        let too_long = "a".repeat(MAX_TOPIC_NAME_LEN + 1);
        assert!(validate_topic_name(&too_long).is_err());
        assert!(validate_topic_name(&"a".repeat(255)).is_err());
    }

    #[test]
    fn test_log_file_name_fits() {
        let longest = "a".repeat(MAX_TOPIC_NAME_LEN);
        let file_name = format!("{}.{}", longest, crate::wal::WAL_FILE_EXTENSION);
        assert!(file_name.len() <= MAX_FILE_NAME_LEN);
    }
}
