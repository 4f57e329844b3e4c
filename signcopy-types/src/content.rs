//! The sign content record: the single unit of content that is copied,
//! carried, pasted, and saved.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Number of text lines on one side of a sign.
pub const SIGN_LINES: usize = 4;

/// Maximum number of stored lines across both sides.
pub const MAX_TOTAL_LINES: usize = SIGN_LINES * 2;

/// One face of a double-sided sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Front,
    Back,
}

impl Side {
    /// Both sides, front first.
    pub const BOTH: [Side; 2] = [Side::Front, Side::Back];
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Front => f.write_str("front"),
            Self::Back => f.write_str("back"),
        }
    }
}

/// Dye colour applied to one side of a sign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignColor {
    White,
    Orange,
    Magenta,
    LightBlue,
    Yellow,
    Lime,
    Pink,
    Gray,
    LightGray,
    Cyan,
    Purple,
    Blue,
    Brown,
    Green,
    Red,
    #[default]
    Black,
}

impl SignColor {
    /// Colour used when a stored or carried colour is missing or unparseable.
    /// Matches the host's default dye for freshly placed signs.
    pub const FALLBACK: SignColor = SignColor::Black;

    pub const ALL: [SignColor; 16] = [
        Self::White,
        Self::Orange,
        Self::Magenta,
        Self::LightBlue,
        Self::Yellow,
        Self::Lime,
        Self::Pink,
        Self::Gray,
        Self::LightGray,
        Self::Cyan,
        Self::Purple,
        Self::Blue,
        Self::Brown,
        Self::Green,
        Self::Red,
        Self::Black,
    ];

    /// Returns the canonical upper-case name (`LIGHT_BLUE`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::White => "WHITE",
            Self::Orange => "ORANGE",
            Self::Magenta => "MAGENTA",
            Self::LightBlue => "LIGHT_BLUE",
            Self::Yellow => "YELLOW",
            Self::Lime => "LIME",
            Self::Pink => "PINK",
            Self::Gray => "GRAY",
            Self::LightGray => "LIGHT_GRAY",
            Self::Cyan => "CYAN",
            Self::Purple => "PURPLE",
            Self::Blue => "BLUE",
            Self::Brown => "BROWN",
            Self::Green => "GREEN",
            Self::Red => "RED",
            Self::Black => "BLACK",
        }
    }

    /// Parses a colour name, degrading to [`SignColor::FALLBACK`] for
    /// anything unrecognised. Upstream sources emit sentinel values that
    /// are not real colours, so this never fails.
    pub fn parse_lenient(name: &str) -> Self {
        name.parse().unwrap_or(Self::FALLBACK)
    }
}

impl fmt::Display for SignColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignColor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| Error::UnknownColor(s.to_string()))
    }
}

/// Physical sign class. Content only moves between signs of the same class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignVariant {
    #[default]
    Regular,
    Hanging,
}

impl SignVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "REGULAR",
            Self::Hanging => "HANGING",
        }
    }

    /// Classifies a host block/item type name such as `OAK_SIGN`,
    /// `SPRUCE_WALL_SIGN` or `BAMBOO_HANGING_SIGN`.
    pub fn from_type_name(type_name: &str) -> Self {
        if type_name.to_ascii_uppercase().contains("HANGING_SIGN") {
            Self::Hanging
        } else {
            Self::Regular
        }
    }
}

impl fmt::Display for SignVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignVariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "REGULAR" => Ok(Self::Regular),
            "HANGING" => Ok(Self::Hanging),
            _ => Err(Error::UnknownVariant(s.to_string())),
        }
    }
}

/// A content rule broken by a [`SignContent`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentViolation {
    #[error("{side} side has {count} lines (max {max})", max = SIGN_LINES)]
    TooManyLines { side: Side, count: usize },

    #[error("{count} lines stored in total (max {max})", max = MAX_TOTAL_LINES)]
    TooManyTotalLines { count: usize },

    #[error("{side} line {index} is {length} characters long (max {max})")]
    LineTooLong {
        side: Side,
        index: usize,
        length: usize,
        max: usize,
    },

    #[error("{side} line {index} contains a line break")]
    LineBreak { side: Side, index: usize },
}

/// Everything that is copied from one sign to another.
///
/// Equality treats an empty `lore` the same as no lore.
#[derive(Debug, Clone, Default, Eq, Serialize, Deserialize)]
pub struct SignContent {
    pub front: Vec<String>,
    pub back: Vec<String>,
    pub front_color: SignColor,
    pub back_color: SignColor,
    pub front_glowing: bool,
    pub back_glowing: bool,
    pub variant: SignVariant,
    /// Display-only annotation shown on a carrier.
    pub lore: Option<Vec<String>>,
}

impl PartialEq for SignContent {
    fn eq(&self, other: &Self) -> bool {
        self.front == other.front
            && self.back == other.back
            && self.front_color == other.front_color
            && self.back_color == other.back_color
            && self.front_glowing == other.front_glowing
            && self.back_glowing == other.back_glowing
            && self.variant == other.variant
            && self.lore_lines() == other.lore_lines()
    }
}

impl SignContent {
    /// Creates blank content for the given variant.
    pub fn new(variant: SignVariant) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }

    pub fn with_lines<I, S>(mut self, side: Side, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_lines(side, lines.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_color(mut self, side: Side, color: SignColor) -> Self {
        self.set_color(side, color);
        self
    }

    pub fn with_glowing(mut self, side: Side, glowing: bool) -> Self {
        self.set_glowing(side, glowing);
        self
    }

    pub fn lines(&self, side: Side) -> &[String] {
        match side {
            Side::Front => &self.front,
            Side::Back => &self.back,
        }
    }

    pub fn set_lines(&mut self, side: Side, lines: Vec<String>) {
        match side {
            Side::Front => self.front = lines,
            Side::Back => self.back = lines,
        }
    }

    pub fn color(&self, side: Side) -> SignColor {
        match side {
            Side::Front => self.front_color,
            Side::Back => self.back_color,
        }
    }

    pub fn set_color(&mut self, side: Side, color: SignColor) {
        match side {
            Side::Front => self.front_color = color,
            Side::Back => self.back_color = color,
        }
    }

    pub fn is_glowing(&self, side: Side) -> bool {
        match side {
            Side::Front => self.front_glowing,
            Side::Back => self.back_glowing,
        }
    }

    pub fn set_glowing(&mut self, side: Side, glowing: bool) {
        match side {
            Side::Front => self.front_glowing = glowing,
            Side::Back => self.back_glowing = glowing,
        }
    }

    /// Legacy single glow flag, derived from the per-side pair.
    pub fn any_glowing(&self) -> bool {
        self.front_glowing || self.back_glowing
    }

    /// Lore lines, empty when there is no lore.
    pub fn lore_lines(&self) -> &[String] {
        self.lore.as_deref().unwrap_or_default()
    }

    /// Number of stored lines across both sides.
    pub fn total_lines(&self) -> usize {
        self.front.len() + self.back.len()
    }

    /// Returns true when no side carries any text.
    pub fn is_blank(&self) -> bool {
        Side::BOTH
            .iter()
            .all(|side| self.lines(*side).iter().all(|l| l.is_empty()))
    }

    /// Normalises content collected from a live sign: line breaks are
    /// stripped, over-long lines are cut to `max_line_length` characters and
    /// each side is clipped to [`SIGN_LINES`].
    #[must_use]
    pub fn sanitized(mut self, max_line_length: usize) -> Self {
        for side in Side::BOTH {
            let lines = self
                .lines(side)
                .iter()
                .take(SIGN_LINES)
                .map(|line| {
                    line.chars()
                        .filter(|c| *c != '\n' && *c != '\r')
                        .take(max_line_length)
                        .collect()
                })
                .collect();
            self.set_lines(side, lines);
        }
        self
    }

    /// Checks the record against the line-count and line-length rules.
    pub fn validate(&self, max_line_length: usize) -> Result<(), ContentViolation> {
        for side in Side::BOTH {
            let lines = self.lines(side);
            if lines.len() > SIGN_LINES {
                return Err(ContentViolation::TooManyLines {
                    side,
                    count: lines.len(),
                });
            }
            for (index, line) in lines.iter().enumerate() {
                if line.contains(['\n', '\r']) {
                    return Err(ContentViolation::LineBreak { side, index });
                }
                let length = line.chars().count();
                if length > max_line_length {
                    return Err(ContentViolation::LineTooLong {
                        side,
                        index,
                        length,
                        max: max_line_length,
                    });
                }
            }
        }
        if self.total_lines() > MAX_TOTAL_LINES {
            return Err(ContentViolation::TooManyTotalLines {
                count: self.total_lines(),
            });
        }
        Ok(())
    }
}
