//! Replay scripts: one JSON event per line, driving a [`Stage`].
//!
//! ```text
//! {"event":"resize","width":300,"height":400}
//! {"event":"add","selection":{"kind":"preset","asset_id":"cat"}}
//! {"event":"down","x":150,"y":200}
//! {"event":"move","x":220,"y":200,"shift":true}
//! {"event":"up","x":220,"y":200}
//! {"event":"text","target":1,"content":"hello","bold":true}
//! {"event":"background"}
//! {"event":"undo"}
//! ```
//!
//! Sticker targets are either a UUID or the 0-based index of a sticker added
//! earlier in the same script; an omitted target means the focused sticker.

#[cfg(test)]
#[path = "script_test.rs"]
mod script_test;

use cover_decor::geometry::Point;
use cover_decor::input::Modifiers;
use cover_decor::sticker::{StickerId, TextEdit};
use cover_decor::{Action, Selection, Stage, StageError};
use serde::Deserialize;
use uuid::Uuid;

/// A reference to a sticker from inside a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Target {
    Added(usize),
    Id(Uuid),
}

/// One scripted input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum Event {
    Resize { width: f64, height: f64 },
    Cover { asset_id: String },
    Add { selection: Selection },
    Down { x: f64, y: f64, #[serde(default)] shift: bool },
    Move { x: f64, y: f64, #[serde(default)] shift: bool },
    Up { x: f64, y: f64, #[serde(default)] shift: bool },
    Cancel,
    /// Click on an empty part of the canvas. Drops focus without a hit test;
    /// the host decides what counts as background.
    Background,
    Delete { target: Option<Target> },
    Text {
        target: Option<Target>,
        #[serde(flatten)]
        edit: TextEdit,
    },
    Undo,
    Redo,
}

/// Errors while running a script.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("line {line}: invalid event: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: no sticker matches {target}")]
    UnknownTarget { line: usize, target: String },
    #[error("line {line}: {source}")]
    Refused {
        line: usize,
        #[source]
        source: StageError,
    },
}

/// Parse one script line. Blank lines and `#` comments yield `None`.
///
/// # Errors
///
/// Returns [`ScriptError::Parse`] when the line is not a known event.
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<Event>, ScriptError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed).map(Some).map_err(|source| ScriptError::Parse { line: line_no, source })
}

/// Feeds events into a stage and tallies what came back.
#[derive(Debug)]
pub struct Replay {
    stage: Stage,
    added: Vec<StickerId>,
    events: usize,
    actions: usize,
    commits: usize,
}

impl Replay {
    #[must_use]
    pub fn new(stage: Stage) -> Self {
        Self { stage, added: Vec::new(), events: 0, actions: 0, commits: 0 }
    }

    #[must_use]
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    #[must_use]
    pub fn into_stage(self) -> Stage {
        self.stage
    }

    /// `(events, actions, history commits)` seen so far.
    #[must_use]
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.events, self.actions, self.commits)
    }

    /// Apply one event.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::UnknownTarget`] when a target names no sticker,
    /// and [`ScriptError::Refused`] when the stage rejects an add mid-gesture.
    pub fn apply(&mut self, line: usize, event: Event) -> Result<(), ScriptError> {
        let mods = |shift: bool| Modifiers { shift, ..Modifiers::default() };
        let actions = match event {
            Event::Resize { width, height } => self.stage.set_canvas_size(width, height),
            Event::Cover { asset_id } => self.stage.set_cover(&asset_id),
            Event::Add { selection } => {
                let (id, actions) =
                    self.stage.add_sticker(selection).map_err(|source| ScriptError::Refused { line, source })?;
                self.added.push(id);
                actions
            }
            Event::Down { x, y, shift } => self.stage.on_pointer_down(Point::new(x, y), mods(shift)),
            Event::Move { x, y, shift } => self.stage.on_pointer_move(Point::new(x, y), mods(shift)),
            Event::Up { x, y, shift } => self.stage.on_pointer_up(Point::new(x, y), mods(shift)),
            Event::Cancel => self.stage.on_pointer_cancel(),
            Event::Background => self.stage.clear_focus(),
            Event::Delete { target } => {
                let id = self.resolve(line, target)?;
                self.stage.delete_sticker(&id)
            }
            Event::Text { target, edit } => {
                let id = self.resolve(line, target)?;
                self.stage.update_text(&id, &edit)
            }
            Event::Undo => self.stage.undo(),
            Event::Redo => self.stage.redo(),
        };
        self.events += 1;
        self.actions += actions.len();
        self.commits += actions.iter().filter(|a| matches!(a, Action::HistoryCommitted { .. })).count();
        tracing::debug!(line, actions = actions.len(), "event applied");
        Ok(())
    }

    fn resolve(&self, line: usize, target: Option<Target>) -> Result<StickerId, ScriptError> {
        let id = match target {
            None => self.stage.focused(),
            Some(Target::Added(index)) => self.added.get(index).copied(),
            Some(Target::Id(id)) => Some(id),
        };
        id.ok_or_else(|| ScriptError::UnknownTarget {
            line,
            target: target.map_or_else(|| "focused sticker".to_owned(), |t| format!("{t:?}")),
        })
    }
}
