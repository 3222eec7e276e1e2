// Built-in default panel sets per section.
//
// Geometry is in terminal cells, sized for a roughly 120x36 container.
// Smaller windows are handled by clamping when panels are created.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

pub const SECTION_WRITING: &str = "writing";
pub const SECTION_CHARACTERS: &str = "characters";
pub const SECTION_PLOTTING: &str = "plotting";
pub const SECTION_WORLDBUILDING: &str = "worldbuilding";
pub const SECTION_RESEARCH: &str = "research";

pub const CHARACTER_LIST_PANEL: &str = "characterList";
pub const CHARACTER_EDITOR_PANEL: &str = "characterEditor";

/// Identity and default placement of a panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelConfig {
    pub id: String,
    pub title: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub hidden: bool,
}

impl PanelConfig {
    pub fn new(id: &str, title: &str, rect: Rect) -> Self {
        PanelConfig {
            id: id.to_string(),
            title: title.to_string(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            hidden: false,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// The two panels an adaptive split manages within a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPanels {
    pub list: String,
    pub editor: String,
}

/// Default panel set for one section.
#[derive(Debug, Clone)]
pub struct SectionTemplate {
    /// Stable section id, used as the key in saved state.
    pub section: String,
    /// Display name for tabs and the setup modal.
    pub title: String,
    pub panels: Vec<PanelConfig>,
    /// Present for sections laid out by the adaptive list/editor split.
    pub split: Option<SplitPanels>,
}

impl SectionTemplate {
    pub fn new(section: &str, title: &str, panels: Vec<PanelConfig>) -> Self {
        SectionTemplate {
            section: section.to_string(),
            title: title.to_string(),
            panels,
            split: None,
        }
    }

    pub fn with_split(mut self, list: &str, editor: &str) -> Self {
        self.split = Some(SplitPanels {
            list: list.to_string(),
            editor: editor.to_string(),
        });
        self
    }

    pub fn panel(&self, id: &str) -> Option<&PanelConfig> {
        self.panels.iter().find(|p| p.id == id)
    }
}

/// Static mapping from section id to its template. Sections keep their
/// registration order, which is also tab order in the shell.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    sections: Vec<SectionTemplate>,
}

impl TemplateRegistry {
    pub fn new(sections: Vec<SectionTemplate>) -> Self {
        TemplateRegistry { sections }
    }

    /// The shell's built-in sections.
    pub fn builtin() -> Self {
        TemplateRegistry::new(vec![
            SectionTemplate::new(
                SECTION_WRITING,
                "Writing",
                vec![
                    PanelConfig::new("chapterList", "Chapters", Rect::new(0, 0, 28, 34)),
                    PanelConfig::new("manuscript", "Manuscript", Rect::new(29, 0, 62, 34)),
                    PanelConfig::new("sceneNotes", "Scene Notes", Rect::new(92, 0, 28, 20)),
                    PanelConfig::new("wordCount", "Progress", Rect::new(92, 21, 28, 8)).hidden(),
                ],
            ),
            SectionTemplate::new(
                SECTION_CHARACTERS,
                "Characters",
                vec![
                    PanelConfig::new(CHARACTER_LIST_PANEL, "Characters", Rect::new(0, 0, 120, 34)),
                    PanelConfig::new(
                        CHARACTER_EDITOR_PANEL,
                        "Character Editor",
                        Rect::new(37, 0, 83, 34),
                    )
                    .hidden(),
                ],
            )
            .with_split(CHARACTER_LIST_PANEL, CHARACTER_EDITOR_PANEL),
            SectionTemplate::new(
                SECTION_PLOTTING,
                "Plotting",
                vec![
                    PanelConfig::new("plotOutline", "Outline", Rect::new(0, 0, 40, 34)),
                    PanelConfig::new("timeline", "Timeline", Rect::new(41, 0, 79, 16)),
                    PanelConfig::new("plotThreads", "Plot Threads", Rect::new(41, 17, 79, 17)),
                ],
            ),
            SectionTemplate::new(
                SECTION_WORLDBUILDING,
                "World",
                vec![
                    PanelConfig::new("locations", "Locations", Rect::new(0, 0, 40, 17)),
                    PanelConfig::new("cultures", "Cultures", Rect::new(0, 18, 40, 16)),
                    PanelConfig::new("lore", "Lore", Rect::new(41, 0, 79, 34)),
                ],
            ),
            SectionTemplate::new(
                SECTION_RESEARCH,
                "Research",
                vec![
                    PanelConfig::new("sources", "Sources", Rect::new(0, 0, 50, 34)),
                    PanelConfig::new("researchNotes", "Notes", Rect::new(51, 0, 69, 24)),
                    PanelConfig::new("links", "Links", Rect::new(51, 25, 69, 9)),
                ],
            ),
        ])
    }

    pub fn get(&self, section: &str) -> Option<&SectionTemplate> {
        self.sections.iter().find(|t| t.section == section)
    }

    pub fn sections(&self) -> impl Iterator<Item = &SectionTemplate> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
