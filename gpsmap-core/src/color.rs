use serde::Serialize;
use std::{collections::HashMap, convert::TryFrom, fmt};

/// Marker colors available to the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerColor {
    Blue,
    Red,
    Green,
    Purple,
    Orange,
    Yellow,
    Black,
    Gray,
}

impl MarkerColor {
    /// Color given to users missing from the table.
    pub const DEFAULT: MarkerColor = MarkerColor::Gray;

    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerColor::Blue => "blue",
            MarkerColor::Red => "red",
            MarkerColor::Green => "green",
            MarkerColor::Purple => "purple",
            MarkerColor::Orange => "orange",
            MarkerColor::Yellow => "yellow",
            MarkerColor::Black => "black",
            MarkerColor::Gray => "gray",
        }
    }

    /// Fill used for the pin in rendered maps.
    pub fn hex(&self) -> &'static str {
        match self {
            MarkerColor::Blue => "#2a81cb",
            MarkerColor::Red => "#cb2b3e",
            MarkerColor::Green => "#2aad27",
            MarkerColor::Purple => "#9c2bcb",
            MarkerColor::Orange => "#cb8427",
            MarkerColor::Yellow => "#cac428",
            MarkerColor::Black => "#3d3d3d",
            MarkerColor::Gray => "#7b7b7b",
        }
    }

    pub const fn all() -> &'static [MarkerColor] {
        &[
            MarkerColor::Blue,
            MarkerColor::Red,
            MarkerColor::Green,
            MarkerColor::Purple,
            MarkerColor::Orange,
            MarkerColor::Yellow,
            MarkerColor::Black,
            MarkerColor::Gray,
        ]
    }
}

impl fmt::Display for MarkerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for MarkerColor {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase();

        MarkerColor::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == lower || (lower == "grey" && *c == MarkerColor::Gray))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown color '{value}'. Supported colors: blue, red, green, purple, orange, yellow, black, gray."
                )
            })
    }
}

/// Known users and their colors. Keys are lowercase.
pub const KNOWN_USERS: &[(&str, MarkerColor)] = &[
    ("riktam test2", MarkerColor::Blue),
    ("ramchandra rotte", MarkerColor::Red),
    ("maula shaikh", MarkerColor::Green),
    ("abdul shaikh", MarkerColor::Purple),
    ("test test", MarkerColor::Orange),
    ("pratibha finance", MarkerColor::Orange),
    ("sohail shaikh", MarkerColor::Yellow),
    ("shingshetty shingshetty", MarkerColor::Black),
];

/// Username to color lookup.
///
/// Matching is exact after lowercasing both sides. Anything not in the table
/// gets [`MarkerColor::DEFAULT`], so two unknown users look the same.
#[derive(Debug, Clone)]
pub struct ColorTable {
    entries: HashMap<String, MarkerColor>,
}

impl Default for ColorTable {
    fn default() -> Self {
        let entries = KNOWN_USERS
            .iter()
            .map(|(name, color)| ((*name).to_string(), *color))
            .collect();
        Self { entries }
    }
}

impl ColorTable {
    /// Add or replace the color for `username`.
    pub fn assign(&mut self, username: &str, color: MarkerColor) {
        self.entries.insert(username.to_lowercase(), color);
    }

    pub fn color_for(&self, username: &str) -> MarkerColor {
        self.entries
            .get(&username.to_lowercase())
            .copied()
            .unwrap_or(MarkerColor::DEFAULT)
    }

    /// Entries sorted by username, for display.
    pub fn entries(&self) -> Vec<(&str, MarkerColor)> {
        let mut entries: Vec<_> = self.entries.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let table = ColorTable::default();
        assert_eq!(table.color_for("Test Test"), table.color_for("test test"));
        assert_eq!(table.color_for("TEST TEST"), MarkerColor::Orange);
        assert_eq!(table.color_for("Abdul Shaikh"), MarkerColor::Purple);
    }

    #[test]
    fn unknown_names_get_default() {
        let table = ColorTable::default();
        assert_eq!(table.color_for("nobody"), MarkerColor::Gray);
        assert_eq!(table.color_for(""), MarkerColor::Gray);
        // Exact match only, no prefix matching.
        assert_eq!(table.color_for("test test2"), MarkerColor::Gray);
        assert_eq!(table.color_for(" test test"), MarkerColor::Gray);
    }

    #[test]
    fn default_table_holds_every_builtin_user() {
        let table = ColorTable::default();
        assert_eq!(table.entries().len(), KNOWN_USERS.len());
        for (name, color) in KNOWN_USERS {
            assert_eq!(table.color_for(name), *color);
            assert_eq!(table.color_for(&name.to_uppercase()), *color);
        }
        assert_eq!(table.color_for("someone else"), MarkerColor::DEFAULT);
    }

    #[test]
    fn overrides_replace_and_extend() {
        let mut table = ColorTable::default();
        table.assign("Test Test", MarkerColor::Blue);
        table.assign("Jane Doe", MarkerColor::Green);

        assert_eq!(table.color_for("test test"), MarkerColor::Blue);
        assert_eq!(table.color_for("JANE DOE"), MarkerColor::Green);
        assert_eq!(table.color_for("pratibha finance"), MarkerColor::Orange);
    }

    #[test]
    fn color_names_parse() {
        for color in MarkerColor::all() {
            let parsed = MarkerColor::try_from(color.as_str()).expect("roundtrip should succeed");
            assert_eq!(*color, parsed);
        }
        assert_eq!(MarkerColor::try_from("Grey").ok(), Some(MarkerColor::Gray));

        let err = MarkerColor::try_from("magenta").unwrap_err();
        assert!(err.to_string().contains("Unknown color"));
    }
}
