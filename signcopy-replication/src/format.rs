//! Legacy `§` formatting codes and trailing-format propagation.
//!
//! The host renders each sign line independently, so a blank line that
//! follows `§cWarning` shows in the default colour once edited. When
//! pasted lines are staged, every empty line is seeded with the formatting
//! still in effect at the end of the closest preceding line that set any.

/// Marker that introduces a formatting code.
pub const FORMAT_CHAR: char = '§';

const HEX_DIGITS: usize = 6;

/// Returns the colour and style codes in effect at the end of `line`, or
/// `None` if the line contains no formatting code at all. A trailing reset
/// (`§r`) yields `Some("")`.
pub fn trailing_format(line: &str) -> Option<String> {
    let chars: Vec<char> = line.chars().collect();
    let mut color: Option<String> = None;
    let mut styles: Vec<char> = Vec::new();
    let mut seen = false;
    let mut i = 0;

    while i + 1 < chars.len() {
        if chars[i] != FORMAT_CHAR {
            i += 1;
            continue;
        }
        let code = chars[i + 1].to_ascii_lowercase();
        match code {
            '0'..='9' | 'a'..='f' => {
                color = Some(format!("{FORMAT_CHAR}{code}"));
                styles.clear();
                seen = true;
                i += 2;
            }
            'x' => match hex_color(&chars[i..]) {
                Some(hex) => {
                    i += hex.chars().count();
                    color = Some(hex);
                    styles.clear();
                    seen = true;
                }
                None => i += 2,
            },
            'k'..='o' => {
                if !styles.contains(&code) {
                    styles.push(code);
                }
                seen = true;
                i += 2;
            }
            'r' => {
                color = None;
                styles.clear();
                seen = true;
                i += 2;
            }
            _ => i += 1,
        }
    }

    seen.then(|| {
        let mut prefix = color.unwrap_or_default();
        for style in styles {
            prefix.push(FORMAT_CHAR);
            prefix.push(style);
        }
        prefix
    })
}

/// Seeds each empty line with the trailing format of the last preceding
/// line that carried one. Non-empty lines are returned unchanged.
pub fn propagate_trailing_format(lines: &[String]) -> Vec<String> {
    let mut carried = String::new();
    lines
        .iter()
        .map(|line| {
            if line.is_empty() {
                carried.clone()
            } else {
                if let Some(prefix) = trailing_format(line) {
                    carried = prefix;
                }
                line.clone()
            }
        })
        .collect()
}

/// Matches `§x§R§R§G§G§B§B` at the start of `chars`.
fn hex_color(chars: &[char]) -> Option<String> {
    let len = 2 + HEX_DIGITS * 2;
    if chars.len() < len {
        return None;
    }
    let digits_ok = (0..HEX_DIGITS).all(|n| {
        let at = 2 + n * 2;
        chars[at] == FORMAT_CHAR && chars[at + 1].is_ascii_hexdigit()
    });
    digits_ok.then(|| chars[..len].iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_has_no_format() {
        assert_eq!(trailing_format("hello"), None);
        assert_eq!(trailing_format(""), None);
    }

    #[test]
    fn last_color_wins() {
        assert_eq!(trailing_format("§aone §btwo").as_deref(), Some("§b"));
    }

    #[test]
    fn styles_follow_color_and_reset_on_new_color() {
        assert_eq!(trailing_format("§c§lBold red").as_deref(), Some("§c§l"));
        assert_eq!(trailing_format("§lbold §9blue").as_deref(), Some("§9"));
        assert_eq!(trailing_format("§6§l§ngold").as_deref(), Some("§6§l§n"));
    }

    #[test]
    fn reset_clears_everything() {
        assert_eq!(trailing_format("§cred§r").as_deref(), Some(""));
    }

    #[test]
    fn uppercase_codes_are_normalised() {
        assert_eq!(trailing_format("§Cshout").as_deref(), Some("§c"));
    }

    #[test]
    fn hex_color_is_kept_whole() {
        let line = "§x§f§f§0§0§a§aPink";
        assert_eq!(trailing_format(line).as_deref(), Some("§x§f§f§0§0§a§a"));
    }

    #[test]
    fn dangling_marker_is_ignored() {
        assert_eq!(trailing_format("§cred§").as_deref(), Some("§c"));
        assert_eq!(trailing_format("§zweird"), None);
    }
}
