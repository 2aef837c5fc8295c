//! The quest data model: loaded games, locations, and list entries.

use serde::{Deserialize, Serialize};

/// An entry in an action or object list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    /// Display name of the entry.
    pub name: String,
    /// Path of the entry's image, empty when the entry has none.
    pub image: String,
}

impl ListItem {
    /// Create an entry with the given name and no image.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: String::new(),
        }
    }
}

/// A single menu entry: the label shown to the player and the location
/// executed when the entry is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuEntry {
    /// Label shown in the menu.
    pub label: String,
    /// Location executed on selection.
    pub location: String,
}

/// A game location: a name and the code lines executed when the location
/// runs. Lines are parsed into statements at execution time, so malformed
/// code surfaces as a runtime error, not a load error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLocation {
    /// Location name. Lookups are ASCII case-insensitive.
    pub name: String,
    /// Raw code lines of the location body.
    pub lines: Vec<String>,
}

/// A loaded game: an ordered list of locations. The first location is the
/// one a restart executes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameData {
    /// Locations in source order.
    pub locations: Vec<GameLocation>,
}

impl GameData {
    /// Look up a location by name, ignoring ASCII case.
    pub fn find(&self, name: &str) -> Option<&GameLocation> {
        self.locations
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(name))
    }

    /// Whether the game has no locations at all.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Merge another game into this one, used when a script includes a
    /// library. Locations whose names already exist are skipped; the
    /// original definition wins.
    pub fn merge(&mut self, other: GameData) {
        for loc in other.locations {
            if self.find(&loc.name).is_none() {
                self.locations.push(loc);
            }
        }
    }
}
