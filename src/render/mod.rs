//! Plan rendering — turns a [`PlanDocument`] into downloadable artifacts.
//!
//! Two artifacts per plan: the weekly schedule and the scientific analysis.
//! Renderers are pure functions of the document; writing to disk is a
//! separate step on the artifact.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::coach_core::types::{PlanDocument, Session};
use crate::coach_core::CoachError;

/// A rendered file, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub file_name: String,
    pub content: String,
}

impl RenderedArtifact {
    /// Write into `dir` (created if missing). Returns the full path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, CoachError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.content)?;
        tracing::info!(path = %path.display(), bytes = self.content.len(), "artifact written");
        Ok(path)
    }
}

/// Produces the schedule and analysis artifacts for a plan.
pub trait PlanRenderer {
    fn render_schedule(&self, plan: &PlanDocument) -> RenderedArtifact;
    fn render_analysis(&self, plan: &PlanDocument) -> RenderedArtifact;
}

/// Markdown output. Session order and every list item are kept as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl PlanRenderer for MarkdownRenderer {
    fn render_schedule(&self, plan: &PlanDocument) -> RenderedArtifact {
        let mut out = String::new();
        let _ = writeln!(out, "# {}", plan.title);
        let _ = writeln!(out);
        let _ = writeln!(out, "**Goal:** {}  ", plan.goal);
        let _ = writeln!(out, "**Duration:** {} weeks", plan.duration_weeks);

        for session in &plan.sessions {
            render_session(&mut out, session);
        }

        RenderedArtifact {
            file_name: format!("{}_schedule.md", slugify(&plan.title)),
            content: out,
        }
    }

    fn render_analysis(&self, plan: &PlanDocument) -> RenderedArtifact {
        let mut out = String::new();
        let _ = writeln!(out, "# {}: Program Analysis", plan.title);
        let _ = writeln!(out);
        let _ = writeln!(out, "**Goal:** {}", plan.goal);
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", plan.analysis.trim_end());

        RenderedArtifact {
            file_name: format!("{}_analysis.md", slugify(&plan.title)),
            content: out,
        }
    }
}

fn render_session(out: &mut String, session: &Session) {
    let _ = writeln!(out);
    let _ = writeln!(out, "## {}: {}", session.day, session.focus);

    for (heading, items) in [
        ("Warm-up", &session.warmup),
        ("Main Work", &session.main_work),
        ("Accessory", &session.accessory),
    ] {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "### {heading}");
        for item in items {
            let _ = writeln!(out, "- {item}");
        }
    }

    if let Some(notes) = session.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        let _ = writeln!(out);
        let _ = writeln!(out, "> {notes}");
    }
}

/// Lowercase ASCII slug; runs of anything else collapse to one `-`.
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = false;
    for c in title.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "plan".to_string()
    } else {
        slug.to_string()
    }
}
