use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 24-bit colour parsed from `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("expected #rrggbb, got {s:?}"));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("{s:?}: {e}"))
        };
        Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Administrative boundary granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Country,
    District,
    Region,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Country, Level::District, Level::Region];

    /// Semantic class name attached to bound paths
    pub fn class_name(self) -> &'static str {
        match self {
            Level::Country => "country",
            Level::District => "district",
            Level::Region => "region",
        }
    }
}

/// One `[[levels]]` entry of the configuration file
#[derive(Debug, Clone, Deserialize)]
pub struct LevelEntry {
    pub code: i64,
    pub class: Level,
}

/// Translation from the integer level codes in the boundary data to `Level`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Vec<LevelEntry>")]
pub struct LevelTable(BTreeMap<i64, Level>);

impl LevelTable {
    pub fn new(entries: impl IntoIterator<Item = (i64, Level)>) -> Self {
        Self(entries.into_iter().collect())
    }

    pub fn get(&self, code: i64) -> Option<Level> {
        self.0.get(&code).copied()
    }
}

impl From<Vec<LevelEntry>> for LevelTable {
    fn from(entries: Vec<LevelEntry>) -> Self {
        Self::new(entries.into_iter().map(|e| (e.code, e.class)))
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::new([(2, Level::Country), (3, Level::District), (4, Level::Region)])
    }
}

/// Fill colour per city colour group
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Palette(BTreeMap<String, Rgb>);

impl Palette {
    pub fn new<S: Into<String>>(entries: impl IntoIterator<Item = (S, Rgb)>) -> Self {
        Self(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn get(&self, group: &str) -> Option<Rgb> {
        self.0.get(group).copied()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new([("europe", Rgb(0x7f, 0xc9, 0x7f)), ("siberia", Rgb(0xfd, 0xc0, 0x86))])
    }
}

/// Base presentation attributes, all expressed at zoom factor 1
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneStyle {
    /// Gap between a marker's edge and its label
    pub label_gap: f64,
    pub font_size: f64,
    pub stroke_width: f64,
    /// Output range of the radius scale
    pub radius_range: [f64; 2],
}

impl Default for SceneStyle {
    fn default() -> Self {
        Self {
            label_gap: 2.0,
            font_size: 10.0,
            stroke_width: 1.0,
            radius_range: [2.0, 10.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rgb() {
        assert_eq!("#7fc97f".parse::<Rgb>(), Ok(Rgb(0x7f, 0xc9, 0x7f)));
        assert_eq!(Rgb(0xfd, 0xc0, 0x86).to_string(), "#fdc086");
        assert!("#7fc9".parse::<Rgb>().is_err());
        assert!("#zzzzzz".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_default_tables() {
        let levels = LevelTable::default();
        assert_eq!(levels.get(2), Some(Level::Country));
        assert_eq!(levels.get(4).map(Level::class_name), Some("region"));
        assert_eq!(levels.get(5), None);

        let palette = Palette::default();
        assert_eq!(palette.get("siberia"), Some(Rgb(0xfd, 0xc0, 0x86)));
        assert_eq!(palette.get("africa"), None);
    }
}
