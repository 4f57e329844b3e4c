//! Fingerprint codec: [`SignContent`] to and from a carrier's flat tag map.
//!
//! Lines within a side are joined with `\n`, so a line may never contain a
//! newline itself; content is sanitised before it reaches [`encode`].
//! A side holding a single empty line joins to the same text as an empty
//! side, so its line count is written alongside.

use crate::error::CodecError;
use signcopy_types::{SIGN_LINES, Side, SignColor, SignContent, SignVariant};
use std::collections::BTreeMap;
use tracing::debug;

/// A value stored on a carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    Text(String),
    Flag(bool),
    Int(i32),
}

/// The carrier's persistent tag container.
pub type TagMap = BTreeMap<String, TagValue>;

/// Prefix shared by every key this codec owns.
pub const KEY_PREFIX: &str = "signcopy:";

pub const FRONT: &str = "signcopy:front";
pub const BACK: &str = "signcopy:back";
pub const FRONT_LINES: &str = "signcopy:front-lines";
pub const BACK_LINES: &str = "signcopy:back-lines";
pub const FRONT_COLOR: &str = "signcopy:front-color";
pub const BACK_COLOR: &str = "signcopy:back-color";
/// Single glow flag written for readers that predate per-side glow.
pub const LEGACY_GLOWING: &str = "signcopy:glowing";
pub const FRONT_GLOWING: &str = "signcopy:front-glowing";
pub const BACK_GLOWING: &str = "signcopy:back-glowing";
pub const SIGN_TYPE: &str = "signcopy:sign-type";
pub const LORE: &str = "signcopy:lore";

const LINE_SEPARATOR: char = '\n';

/// Encodes content into a fresh tag map.
///
/// Both line fields are always written; colours, glow, variant and lore
/// only when they differ from their defaults.
pub fn encode(content: &SignContent) -> TagMap {
    let mut tags = TagMap::new();
    write_side(&mut tags, FRONT, FRONT_LINES, &content.front);
    write_side(&mut tags, BACK, BACK_LINES, &content.back);

    if content.front_color != SignColor::FALLBACK {
        tags.insert(
            FRONT_COLOR.to_string(),
            TagValue::Text(content.front_color.as_str().to_string()),
        );
    }
    if content.back_color != SignColor::FALLBACK {
        tags.insert(
            BACK_COLOR.to_string(),
            TagValue::Text(content.back_color.as_str().to_string()),
        );
    }
    if content.front_glowing {
        tags.insert(FRONT_GLOWING.to_string(), TagValue::Flag(true));
    }
    if content.back_glowing {
        tags.insert(BACK_GLOWING.to_string(), TagValue::Flag(true));
    }
    if content.any_glowing() {
        tags.insert(LEGACY_GLOWING.to_string(), TagValue::Flag(true));
    }
    if content.variant != SignVariant::default() {
        tags.insert(
            SIGN_TYPE.to_string(),
            TagValue::Text(content.variant.as_str().to_string()),
        );
    }
    let lore = content.lore_lines();
    if !lore.is_empty() {
        tags.insert(LORE.to_string(), TagValue::Text(lore.join("\n")));
    }
    tags
}

/// Replaces any fingerprint already on `tags` with `content`, leaving
/// unrelated keys untouched.
pub fn write(tags: &mut TagMap, content: &SignContent) {
    clear(tags);
    tags.extend(encode(content));
}

/// Decodes a fingerprint.
///
/// Returns `Ok(None)` when either line field is missing: the carrier simply
/// holds no copied content. Colours that are missing or unrecognised fall
/// back to [`SignColor::FALLBACK`]; missing glow flags are `false`.
pub fn decode(tags: &TagMap) -> Result<Option<SignContent>, CodecError> {
    let (Some(front), Some(back)) = (tags.get(FRONT), tags.get(BACK)) else {
        return Ok(None);
    };

    let front = read_side(tags, Side::Front, FRONT_LINES, expect_text(FRONT, front)?)?;
    let back = read_side(tags, Side::Back, BACK_LINES, expect_text(BACK, back)?)?;

    let variant = match tags.get(SIGN_TYPE) {
        Some(value) => {
            let name = expect_text(SIGN_TYPE, value)?;
            name.parse::<SignVariant>()
                .map_err(|_| CodecError::UnknownVariant(name.to_string()))?
        }
        None => SignVariant::default(),
    };

    let per_side_present = tags.contains_key(FRONT_GLOWING) || tags.contains_key(BACK_GLOWING);
    let (front_glowing, back_glowing) = if per_side_present {
        (flag(tags, FRONT_GLOWING)?, flag(tags, BACK_GLOWING)?)
    } else {
        // Carriers written before per-side glow only ever lit the front.
        (flag(tags, LEGACY_GLOWING)?, false)
    };

    let lore = match tags.get(LORE) {
        Some(value) => Some(
            expect_text(LORE, value)?
                .split(LINE_SEPARATOR)
                .map(str::to_string)
                .collect(),
        ),
        None => None,
    };

    Ok(Some(SignContent {
        front,
        back,
        front_color: color(tags, FRONT_COLOR),
        back_color: color(tags, BACK_COLOR),
        front_glowing,
        back_glowing,
        variant,
        lore,
    }))
}

/// Removes every key owned by this codec.
pub fn clear(tags: &mut TagMap) {
    tags.retain(|key, _| !key.starts_with(KEY_PREFIX));
}

/// Returns true if both mandatory fields are present.
pub fn has_fingerprint(tags: &TagMap) -> bool {
    tags.contains_key(FRONT) && tags.contains_key(BACK)
}

fn write_side(tags: &mut TagMap, key: &str, count_key: &str, lines: &[String]) {
    let text = lines.join("\n");
    if text.is_empty() && !lines.is_empty() {
        tags.insert(count_key.to_string(), TagValue::Int(lines.len() as i32));
    }
    tags.insert(key.to_string(), TagValue::Text(text));
}

fn read_side(
    tags: &TagMap,
    side: Side,
    count_key: &str,
    text: &str,
) -> Result<Vec<String>, CodecError> {
    let count = if text.is_empty() {
        match tags.get(count_key) {
            None => 0,
            Some(TagValue::Int(count)) => usize::try_from(*count).unwrap_or(0),
            Some(_) => {
                return Err(CodecError::WrongType {
                    key: count_key.to_string(),
                    expected: "int",
                });
            }
        }
    } else {
        text.split(LINE_SEPARATOR).count()
    };
    if count > SIGN_LINES {
        return Err(CodecError::TooManyLines { side, count });
    }
    Ok(if text.is_empty() {
        vec![String::new(); count]
    } else {
        text.split(LINE_SEPARATOR).map(str::to_string).collect()
    })
}

fn expect_text<'a>(key: &str, value: &'a TagValue) -> Result<&'a str, CodecError> {
    match value {
        TagValue::Text(text) => Ok(text),
        _ => Err(CodecError::WrongType {
            key: key.to_string(),
            expected: "text",
        }),
    }
}

fn flag(tags: &TagMap, key: &str) -> Result<bool, CodecError> {
    match tags.get(key) {
        None => Ok(false),
        Some(TagValue::Flag(value)) => Ok(*value),
        Some(_) => Err(CodecError::WrongType {
            key: key.to_string(),
            expected: "flag",
        }),
    }
}

fn color(tags: &TagMap, key: &str) -> SignColor {
    match tags.get(key) {
        Some(TagValue::Text(name)) => name.parse::<SignColor>().unwrap_or_else(|_| {
            debug!(key, value = %name, "Unknown colour on carrier, using fallback");
            SignColor::FALLBACK
        }),
        _ => SignColor::FALLBACK,
    }
}
