// Persisted shell state: per-section panel layouts and setup records.
//
// Decoding is lenient. A field with the wrong shape is treated as absent,
// and a snapshot entry missing its id or geometry is dropped, so a damaged
// state file degrades to template defaults instead of failing startup.
// Keys this module does not own (project and character data) are carried
// through untouched.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::geometry::Rect;

/// Geometry of one panel as captured by a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelSnapshot {
    pub id: String,
    pub title: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PanelSnapshot {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Lenient decode of a single entry. Returns `None` when the entry
    /// cannot describe a panel.
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let id = obj.get("id")?.as_str()?.to_string();
        if id.is_empty() {
            return None;
        }
        let title = obj
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| id.clone());
        Some(PanelSnapshot {
            x: coord(obj.get("x")?)?,
            y: coord(obj.get("y")?)?,
            width: coord(obj.get("width")?)?,
            height: coord(obj.get("height")?)?,
            id,
            title,
        })
    }
}

/// Ordered panel geometry for one section.
pub type SectionLayoutState = Vec<PanelSnapshot>;

/// Everything the shell persists between sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedState {
    pub panel_layouts: BTreeMap<String, SectionLayoutState>,
    pub setup_sections: BTreeMap<String, bool>,
    pub section_panel_selections: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    /// Keys owned by other parts of the application.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

const KEY_PANEL_LAYOUTS: &str = "panelLayouts";
const KEY_SETUP_SECTIONS: &str = "setupSections";
const KEY_SELECTIONS: &str = "sectionPanelSelections";
const KEY_SAVED_AT: &str = "savedAt";

impl SavedState {
    /// Parse a state file's contents. Text that is not JSON at all yields
    /// an empty state.
    pub fn from_json_str(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => SavedState::from_value(value),
            Err(e) => {
                warn!("Saved state is not valid JSON, starting fresh: {}", e);
                SavedState::default()
            }
        }
    }

    /// Build a state from an arbitrary JSON value, keeping whatever parts
    /// are well-formed.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut obj) = value else {
            warn!("Saved state root is not an object, starting fresh");
            return SavedState::default();
        };

        let panel_layouts = obj
            .remove(KEY_PANEL_LAYOUTS)
            .map(decode_layouts)
            .unwrap_or_default();
        let setup_sections = obj
            .remove(KEY_SETUP_SECTIONS)
            .map(decode_flags)
            .unwrap_or_default();
        let section_panel_selections = obj
            .remove(KEY_SELECTIONS)
            .map(decode_selections)
            .unwrap_or_default();
        let saved_at = obj
            .remove(KEY_SAVED_AT)
            .and_then(|v| v.as_str().and_then(|s| s.parse::<DateTime<Utc>>().ok()));

        SavedState {
            panel_layouts,
            setup_sections,
            section_panel_selections,
            saved_at,
            other: obj,
        }
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Saved layout for a section, if one exists and has at least one panel.
    pub fn layout(&self, section: &str) -> Option<&SectionLayoutState> {
        self.panel_layouts.get(section).filter(|l| !l.is_empty())
    }

    pub fn is_setup_complete(&self, section: &str) -> bool {
        self.setup_sections.get(section).copied().unwrap_or(false)
    }

    pub fn selection(&self, section: &str) -> Option<&[String]> {
        self.section_panel_selections.get(section).map(Vec::as_slice)
    }

    /// Record a completed setup together with the resulting layout.
    pub fn record_setup(&mut self, section: &str, selected: Vec<String>, layout: SectionLayoutState) {
        self.setup_sections.insert(section.to_string(), true);
        self.section_panel_selections
            .insert(section.to_string(), selected);
        self.panel_layouts.insert(section.to_string(), layout);
    }

    pub fn set_layout(&mut self, section: &str, layout: SectionLayoutState) {
        self.panel_layouts.insert(section.to_string(), layout);
    }

    /// Stamp the save time.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.saved_at = Some(now);
    }
}

impl<'de> Deserialize<'de> for SavedState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(SavedState::from_value(value))
    }
}

// ---------------------------------------------------------------------------
// Lenient field decoders
// ---------------------------------------------------------------------------

fn decode_layouts(value: Value) -> BTreeMap<String, SectionLayoutState> {
    let Value::Object(sections) = value else {
        warn!("`{}` is not an object, ignoring", KEY_PANEL_LAYOUTS);
        return BTreeMap::new();
    };
    let mut layouts = BTreeMap::new();
    for (section, entries) in sections {
        let Some(entries) = entries.as_array() else {
            debug!("Layout for section '{}' is not a list, ignoring", section);
            continue;
        };
        let mut layout: SectionLayoutState = Vec::with_capacity(entries.len());
        for entry in entries {
            match PanelSnapshot::from_value(entry) {
                // First occurrence wins; a duplicate id could never be
                // materialised anyway.
                Some(s) if layout.iter().any(|p| p.id == s.id) => {
                    debug!("Dropping duplicate panel '{}' in section '{}'", s.id, section);
                }
                Some(s) => layout.push(s),
                None => debug!("Dropping malformed panel entry in section '{}'", section),
            }
        }
        layouts.insert(section, layout);
    }
    layouts
}

fn decode_flags(value: Value) -> BTreeMap<String, bool> {
    let Value::Object(sections) = value else {
        warn!("`{}` is not an object, ignoring", KEY_SETUP_SECTIONS);
        return BTreeMap::new();
    };
    sections
        .into_iter()
        .filter_map(|(section, v)| v.as_bool().map(|b| (section, b)))
        .collect()
}

fn decode_selections(value: Value) -> BTreeMap<String, Vec<String>> {
    let Value::Object(sections) = value else {
        warn!("`{}` is not an object, ignoring", KEY_SELECTIONS);
        return BTreeMap::new();
    };
    sections
        .into_iter()
        .filter_map(|(section, v)| {
            let ids = v.as_array()?;
            let ids = ids
                .iter()
                .filter_map(|id| id.as_str().map(str::to_string))
                .collect();
            Some((section, ids))
        })
        .collect()
}

/// Numbers only; fractional values are rounded and negatives become 0.
fn coord(value: &Value) -> Option<i32> {
    let n = value.as_f64()?;
    if !n.is_finite() {
        return None;
    }
    Some(n.round().clamp(0.0, i32::MAX as f64) as i32)
}
