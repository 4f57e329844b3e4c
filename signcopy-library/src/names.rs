//! Entry name rules.

use regex_lite::Regex;
use std::fmt;
use std::sync::LazyLock;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("name pattern compiles"));

/// Names the host filesystem of some platforms refuses as file names.
static DEVICE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i:CON|PRN|AUX|NUL|COM[1-9]|LPT[1-9])$").expect("device pattern compiles")
});

/// Why a name was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameRule {
    Empty,
    TooLong { max: usize },
    Characters,
    Reserved,
    DeviceName,
}

impl fmt::Display for NameRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("name is empty"),
            Self::TooLong { max } => write!(f, "name is longer than {max} characters"),
            Self::Characters => {
                f.write_str("only letters, digits, '-' and '_' are allowed")
            }
            Self::Reserved => f.write_str("name is reserved"),
            Self::DeviceName => f.write_str("name is a reserved device name"),
        }
    }
}

/// Checks `name` against the character class, the length bound, the
/// configured reserved words (case-insensitive), and platform device names.
pub fn check_name(name: &str, max_len: usize, reserved: &[String]) -> Result<(), NameRule> {
    if name.is_empty() {
        return Err(NameRule::Empty);
    }
    if name.chars().count() > max_len {
        return Err(NameRule::TooLong { max: max_len });
    }
    if !NAME_PATTERN.is_match(name) {
        return Err(NameRule::Characters);
    }
    if reserved.iter().any(|r| r.eq_ignore_ascii_case(name)) {
        return Err(NameRule::Reserved);
    }
    if DEVICE_NAME.is_match(name) {
        return Err(NameRule::DeviceName);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reserved() -> Vec<String> {
        vec!["list".to_string(), "help".to_string()]
    }

    #[test]
    fn accepts_plain_names() {
        assert_eq!(check_name("shop_sign-2", 32, &reserved()), Ok(()));
    }

    #[test]
    fn rejects_bad_characters() {
        assert_eq!(check_name("bad name!", 32, &reserved()), Err(NameRule::Characters));
        assert_eq!(check_name("../escape", 32, &reserved()), Err(NameRule::Characters));
        assert_eq!(check_name("ünïcode", 32, &reserved()), Err(NameRule::Characters));
    }

    #[test]
    fn rejects_reserved_case_insensitively() {
        assert_eq!(check_name("LIST", 32, &reserved()), Err(NameRule::Reserved));
    }

    #[test]
    fn rejects_device_names() {
        assert_eq!(check_name("con", 32, &[]), Err(NameRule::DeviceName));
        assert_eq!(check_name("LPT3", 32, &[]), Err(NameRule::DeviceName));
        assert_eq!(check_name("console", 32, &[]), Ok(()));
    }

    #[test]
    fn enforces_length() {
        assert_eq!(check_name("abcdef", 5, &[]), Err(NameRule::TooLong { max: 5 }));
        assert_eq!(check_name("", 5, &[]), Err(NameRule::Empty));
    }
}
