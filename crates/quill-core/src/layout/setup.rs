// Section setup and reconciliation.
//
// Per section: Unconfigured -> Configuring -> Configured, and never back.
// The first visit asks the user which template panels to keep. Later visits
// use the saved layout verbatim, or fall back to template geometry for the
// recorded selection when the saved layout never made it to disk.

use thiserror::Error;
use tracing::debug;

use super::template::{PanelConfig, SectionTemplate};
use crate::state::SavedState;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("section `{section}` is not awaiting setup")]
    NotConfiguring { section: String },

    #[error("unknown section `{section}`")]
    UnknownSection { section: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionPhase {
    Unconfigured,
    /// The setup prompt is open and activation waits on the user.
    Configuring,
    Configured,
}

/// Phase recorded in saved state. `Configuring` only exists in memory
/// while a prompt is open, so it is never returned here.
pub fn recorded_phase(section: &str, saved: &SavedState) -> SectionPhase {
    // A non-empty layout without a setup flag comes from an older state
    // file and counts as configured.
    if saved.is_setup_complete(section) || saved.layout(section).is_some() {
        SectionPhase::Configured
    } else {
        SectionPhase::Unconfigured
    }
}

/// One row of the setup prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupChoice {
    pub id: String,
    pub title: String,
    pub selected: bool,
}

/// The one-time panel selection offered on a section's first visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupPrompt {
    pub section: String,
    pub section_title: String,
    pub choices: Vec<SetupChoice>,
}

impl SetupPrompt {
    /// Every template panel, pre-selected.
    pub fn for_template(template: &SectionTemplate) -> Self {
        SetupPrompt {
            section: template.section.clone(),
            section_title: template.title.clone(),
            choices: template
                .panels
                .iter()
                .map(|p| SetupChoice {
                    id: p.id.clone(),
                    title: p.title.clone(),
                    selected: true,
                })
                .collect(),
        }
    }

    /// Flip one choice. Out-of-range indexes are ignored.
    pub fn toggle(&mut self, index: usize) {
        if let Some(choice) = self.choices.get_mut(index) {
            choice.selected = !choice.selected;
        }
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.choices
            .iter()
            .filter(|c| c.selected)
            .map(|c| c.id.clone())
            .collect()
    }
}

/// What entering a section should mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionPlan {
    /// Mount these panels now.
    Panels(Vec<PanelConfig>),
    /// Ask the user first.
    NeedsSetup(SetupPrompt),
}

/// Decide which panels a section gets on entry.
pub fn plan_section(template: &SectionTemplate, saved: &SavedState) -> SectionPlan {
    let section = template.section.as_str();

    if let Some(layout) = saved.layout(section) {
        debug!("Section '{}': using saved layout ({} panels)", section, layout.len());
        let panels = layout
            .iter()
            .map(|s| PanelConfig {
                id: s.id.clone(),
                title: s.title.clone(),
                x: s.x,
                y: s.y,
                width: s.width,
                height: s.height,
                // Snapshots carry no visibility, so a kept panel that the
                // template starts hidden comes back visible.
                hidden: false,
            })
            .collect();
        return SectionPlan::Panels(panels);
    }

    if saved.is_setup_complete(section) {
        let selected = saved.selection(section).unwrap_or_default();
        debug!(
            "Section '{}': configured without a saved layout, using template for {:?}",
            section, selected
        );
        return SectionPlan::Panels(template_selection(template, selected));
    }

    debug!("Section '{}': first visit, setup required", section);
    SectionPlan::NeedsSetup(SetupPrompt::for_template(template))
}

/// Template panels whose ids are in `selected`, in template order and at
/// template geometry. Ids the template does not know are ignored.
pub fn template_selection(template: &SectionTemplate, selected: &[String]) -> Vec<PanelConfig> {
    template
        .panels
        .iter()
        .filter(|p| selected.iter().any(|id| *id == p.id))
        .cloned()
        .collect()
}
