//! Course color resolution.
//!
//! A course name resolves to a color by, in order: a caller override, the
//! curated [`COURSE_COLORS`] table, then an FNV-1a hash of the name into
//! [`PALETTE`]. [`ColorAssignment::build`] runs the same resolution for every
//! course of an export and moves colliding hash colors onto free palette slots.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Uppercase `RRGGBB`, the form both OOXML writers expect.
    pub fn hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn to_u32(self) -> u32 {
        (u32::from(self.r) << 16) | (u32::from(self.g) << 8) | u32::from(self.b)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("expected \"r,g,b\" with three integers in 0..=255, got {0:?}")]
    InvalidFormat(String),
}

impl FromStr for Rgb {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [r, g, b] = parts.as_slice() else {
            return Err(ColorError::InvalidFormat(s.to_string()));
        };
        let channel = |p: &str| {
            p.parse::<u8>()
                .map_err(|_| ColorError::InvalidFormat(s.to_string()))
        };
        Ok(Rgb::new(channel(*r)?, channel(*g)?, channel(*b)?))
    }
}

/// A user-picked color as it arrives over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ColorOverride {
    RawTriple([u8; 3]),
    CommaString(String),
}

impl ColorOverride {
    pub fn resolve(&self) -> Result<Rgb, ColorError> {
        match self {
            ColorOverride::RawTriple(triple) => Ok(Rgb::from(*triple)),
            ColorOverride::CommaString(s) => s.parse(),
        }
    }
}

pub type ColorOverrides = HashMap<String, Rgb>;

/// Resolve every override up front so a bad entry fails the request early.
pub fn resolve_overrides(
    raw: &HashMap<String, ColorOverride>,
) -> Result<ColorOverrides, ColorError> {
    raw.iter()
        .map(|(name, color)| Ok((name.clone(), color.resolve()?)))
        .collect()
}

pub const COURSE_COLORS: [(&str, Rgb); 12] = [
    ("语文", Rgb::new(255, 204, 204)),
    ("数学", Rgb::new(204, 255, 255)),
    ("英语", Rgb::new(204, 255, 204)),
    ("综研", Rgb::new(229, 229, 204)),
    ("趣味体育", Rgb::new(255, 255, 153)),
    ("体育", Rgb::new(153, 204, 255)),
    ("音乐", Rgb::new(221, 170, 221)),
    ("体育与健康", Rgb::new(153, 204, 255)),
    ("道法", Rgb::new(204, 153, 204)),
    ("美术", Rgb::new(255, 179, 136)),
    ("科学", Rgb::new(255, 229, 153)),
    ("劳动", Rgb::new(204, 255, 204)),
];

pub const PALETTE: [Rgb; 10] = [
    Rgb::new(255, 192, 203),
    Rgb::new(173, 216, 230),
    Rgb::new(144, 238, 144),
    Rgb::new(255, 182, 193),
    Rgb::new(221, 160, 221),
    Rgb::new(175, 238, 238),
    Rgb::new(255, 218, 185),
    Rgb::new(240, 230, 140),
    Rgb::new(230, 230, 250),
    Rgb::new(255, 228, 196),
];

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over the UTF-8 bytes of `s`.
pub fn fnv1a(s: &str) -> u32 {
    s.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

pub fn palette_index(name: &str) -> usize {
    fnv1a(name) as usize % PALETTE.len()
}

pub fn table_color(name: &str) -> Option<Rgb> {
    COURSE_COLORS
        .iter()
        .find(|(course, _)| *course == name)
        .map(|(_, color)| *color)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSource {
    Override,
    Table,
    Fallback,
    /// Fallback color moved to a free palette slot after a collision.
    Reassigned,
}

impl ColorSource {
    fn is_authoritative(self) -> bool {
        matches!(self, ColorSource::Override | ColorSource::Table)
    }
}

pub fn resolve(name: &str, overrides: Option<&ColorOverrides>) -> (Rgb, ColorSource) {
    if let Some(color) = overrides.and_then(|o| o.get(name)) {
        return (*color, ColorSource::Override);
    }
    if let Some(color) = table_color(name) {
        return (color, ColorSource::Table);
    }
    (PALETTE[palette_index(name)], ColorSource::Fallback)
}

pub fn color_for(name: &str, overrides: Option<&ColorOverrides>) -> Rgb {
    resolve(name, overrides).0
}

/// Name → color map for one export job.
#[derive(Debug, Clone, Default)]
pub struct ColorAssignment {
    order: Vec<String>,
    colors: HashMap<String, (Rgb, ColorSource)>,
}

impl ColorAssignment {
    /// Resolve `names` (deduplicated in first-appearance order) and spread
    /// colliding fallback colors over unused palette entries. Once every
    /// palette entry is taken collisions are kept.
    pub fn build<'a, I>(names: I, overrides: &ColorOverrides) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = HashSet::new();
        let order: Vec<String> = names
            .into_iter()
            .filter(|name| seen.insert(*name))
            .map(str::to_string)
            .collect();

        let resolved: Vec<(Rgb, ColorSource)> = order
            .iter()
            .map(|name| resolve(name, Some(overrides)))
            .collect();

        let mut used: HashSet<Rgb> = resolved
            .iter()
            .filter(|(_, source)| source.is_authoritative())
            .map(|(color, _)| *color)
            .collect();

        let mut colors = HashMap::with_capacity(order.len());
        for (name, (color, source)) in order.iter().zip(resolved) {
            let assigned = if source == ColorSource::Fallback && used.contains(&color) {
                match PALETTE.iter().find(|c| !used.contains(*c)) {
                    Some(free) => {
                        debug!("course {:?} collides on {}, moved to {}", name, color, free);
                        (*free, ColorSource::Reassigned)
                    }
                    None => (color, source),
                }
            } else {
                (color, source)
            };
            used.insert(assigned.0);
            colors.insert(name.clone(), assigned);
        }

        Self { order, colors }
    }

    pub fn get(&self, name: &str) -> Option<Rgb> {
        self.colors.get(name).map(|(color, _)| *color)
    }

    pub fn source(&self, name: &str) -> Option<ColorSource> {
        self.colors.get(name).map(|(_, source)| *source)
    }

    /// Assigned color, or the plain resolution for a name outside the job.
    pub fn color(&self, name: &str) -> Rgb {
        self.get(name).unwrap_or_else(|| color_for(name, None))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Rgb)> + '_ {
        self.order
            .iter()
            .filter_map(|name| self.get(name).map(|color| (name.as_str(), color)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_overrides() -> ColorOverrides {
        ColorOverrides::new()
    }

    #[test]
    fn test_fnv1a_reference_values() {
        assert_eq!(fnv1a(""), 0x811c_9dc5);
        assert_eq!(fnv1a("a"), 0xe40c_292c);
        assert_eq!(fnv1a("foobar"), 0xbf9c_f968);
    }

    #[test]
    fn test_fallback_is_stable() {
        assert_eq!(palette_index("History"), 1);
        assert_eq!(palette_index("Math"), 5);
        assert_eq!(color_for("Math", None), PALETTE[5]);
        assert_eq!(color_for("Math", None), color_for("Math", None));
    }

    #[test]
    fn test_empty_name_gets_fallback_color() {
        assert_eq!(resolve("", None), (PALETTE[1], ColorSource::Fallback));
    }

    #[test]
    fn test_table_wins_over_fallback() {
        for (name, color) in COURSE_COLORS {
            assert_eq!(resolve(name, None), (color, ColorSource::Table));
        }
    }

    #[test]
    fn test_override_wins_over_table() {
        let mut overrides = no_overrides();
        overrides.insert("语文".to_string(), Rgb::new(1, 2, 3));

        assert_eq!(
            resolve("语文", Some(&overrides)),
            (Rgb::new(1, 2, 3), ColorSource::Override)
        );
    }

    #[test]
    fn test_comma_string_override_round_trip() {
        let raw = ColorOverride::CommaString("10,20,30".to_string());
        assert_eq!(raw.resolve(), Ok(Rgb::new(10, 20, 30)));

        let spaced = ColorOverride::CommaString(" 10 , 20 , 30 ".to_string());
        assert_eq!(spaced.resolve(), Ok(Rgb::new(10, 20, 30)));
    }

    #[test]
    fn test_malformed_override_fails() {
        for bad in ["10,20", "10,20,30,40", "a,b,c", "256,0,0", ""] {
            let raw = ColorOverride::CommaString(bad.to_string());
            assert!(
                matches!(raw.resolve(), Err(ColorError::InvalidFormat(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_override_deserializes_from_triple_or_string() {
        let raw: HashMap<String, ColorOverride> =
            serde_json::from_str(r#"{"a": [1, 2, 3], "b": "4,5,6"}"#).unwrap();
        let resolved = resolve_overrides(&raw).unwrap();

        assert_eq!(resolved["a"], Rgb::new(1, 2, 3));
        assert_eq!(resolved["b"], Rgb::new(4, 5, 6));
    }

    #[test]
    fn test_hex() {
        assert_eq!(Rgb::new(255, 204, 0).hex(), "FFCC00");
        assert_eq!(Rgb::new(255, 204, 0).to_u32(), 0xFFCC00);
    }

    #[test]
    fn test_assignment_moves_colliding_fallback() {
        // both hash to palette slot 1
        assert_eq!(palette_index("History"), palette_index("Chemistry"));

        let names = ["History", "History", "Chemistry"];
        let assignment = ColorAssignment::build(names, &no_overrides());

        assert_eq!(assignment.len(), 2);
        assert_eq!(assignment.get("History"), Some(PALETTE[1]));
        assert_eq!(assignment.get("Chemistry"), Some(PALETTE[0]));
        assert_eq!(assignment.source("Chemistry"), Some(ColorSource::Reassigned));
    }

    #[test]
    fn test_assignment_keeps_non_colliding_names() {
        let assignment = ColorAssignment::build(["Math", "Science"], &no_overrides());

        assert_eq!(assignment.get("Math"), Some(PALETTE[5]));
        assert_eq!(assignment.get("Science"), Some(PALETTE[7]));
        assert_eq!(assignment.source("Science"), Some(ColorSource::Fallback));
    }

    #[test]
    fn test_assignment_never_moves_authoritative_colors() {
        let mut overrides = no_overrides();
        // override takes the slot "Math" hashes to
        overrides.insert("Custom".to_string(), PALETTE[5]);

        let assignment = ColorAssignment::build(["Math", "Custom", "语文"], &overrides);

        assert_eq!(assignment.get("Custom"), Some(PALETTE[5]));
        assert_eq!(assignment.get("语文"), table_color("语文"));
        assert_eq!(assignment.get("Math"), Some(PALETTE[0]));
    }

    #[test]
    fn test_assignment_is_distinct_up_to_palette_size() {
        let names: Vec<String> = (0..PALETTE.len()).map(|i| format!("course-{i}")).collect();
        let assignment = ColorAssignment::build(names.iter().map(String::as_str), &no_overrides());

        let distinct: HashSet<Rgb> = assignment.iter().map(|(_, c)| c).collect();
        assert_eq!(distinct.len(), PALETTE.len());
    }

    #[test]
    fn test_assignment_reuses_palette_once_exhausted() {
        let names: Vec<String> = (0..PALETTE.len() + 3)
            .map(|i| format!("course-{i}"))
            .collect();
        let assignment = ColorAssignment::build(names.iter().map(String::as_str), &no_overrides());

        assert_eq!(assignment.len(), PALETTE.len() + 3);
        let distinct: HashSet<Rgb> = assignment.iter().map(|(_, c)| c).collect();
        assert_eq!(distinct.len(), PALETTE.len());
    }

    #[test]
    fn test_assignment_preserves_first_appearance_order() {
        let assignment = ColorAssignment::build(["b", "a", "b", "c"], &no_overrides());
        let order: Vec<&str> = assignment.iter().map(|(name, _)| name).collect();
        assert_eq!(order, ["b", "a", "c"]);
    }
}
