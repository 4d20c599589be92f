//! Validation of human-entered names (people, places, banks, tariffs).
//!
//! A name is one or more words joined by a single space or hyphen.

use crate::error::{BankError, BankResult};

/// Characters allowed inside a word.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NameCharset {
    /// Letters only (person names, countries, cities).
    Alphabetic,
    /// Letters and digits (bank and tariff names).
    Alphanumeric,
}

impl NameCharset {
    fn accepts(self, c: char) -> bool {
        match self {
            NameCharset::Alphabetic => c.is_alphabetic(),
            NameCharset::Alphanumeric => c.is_alphanumeric(),
        }
    }
}

/// Validate `value` as a word sequence and return an owned copy.
pub fn validate_name(value: &str, what: &str, charset: NameCharset) -> BankResult<String> {
    if is_word_sequence(value, charset) {
        Ok(value.to_string())
    } else {
        Err(BankError::validation(format!("invalid {what}: '{value}'")))
    }
}

pub fn is_word_sequence(value: &str, charset: NameCharset) -> bool {
    let mut previous_was_separator = true;
    let mut seen_word = false;

    for c in value.chars() {
        if charset.accepts(c) {
            previous_was_separator = false;
            seen_word = true;
        } else if c == ' ' || c == '-' {
            if previous_was_separator {
                return false;
            }
            previous_was_separator = true;
        } else {
            return false;
        }
    }

    seen_word && !previous_was_separator
}
