//! Folio commands - all operations that modify a document.
//!
//! Commands are intent-based: they describe what the user wants, not how to
//! achieve it. They serialize to JSON so they can be recorded, scripted, or
//! generated by other tools.

use crate::Target;
use canvas::ShapeTool;
use glam::DVec2;
use node::NodeId;
use serde::{Deserialize, Serialize};

/// A command that modifies editor state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    // === Creation ===
    /// Add a default-sized shape centered on the page.
    AddShape { shape: ShapeTool },

    /// Add a line of text centered on the page.
    AddText { content: String },

    /// Import vector markup, fitted and centered on the page.
    ImportMarkup { markup: String },

    // === Selection ===
    Select { id: NodeId },

    ClearSelection,

    // === Pointer ===
    PointerDown { point: DVec2 },

    PointerMove { point: DVec2 },

    PointerUp,

    // === Editing ===
    /// Move nodes by a delta in document units.
    Move {
        #[serde(default)]
        target: Target,
        delta: DVec2,
    },

    /// Set the fill color. Colors are CSS color strings; `none` clears.
    SetFill {
        #[serde(default)]
        target: Target,
        fill: String,
    },

    /// Set the stroke color and, optionally, its width.
    SetStroke {
        #[serde(default)]
        target: Target,
        stroke: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
    },

    /// Remove nodes with their subtrees.
    Delete {
        #[serde(default)]
        target: Target,
    },

    DeleteSelected,

    // === Batch ===
    /// Execute multiple commands in sequence, stopping at the first error.
    Batch { commands: Vec<Command> },
}

/// Result of executing a command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommandResult {
    Success {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        created: Vec<NodeId>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        modified: Vec<NodeId>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        deleted: Vec<NodeId>,
    },
    Error {
        message: String,
    },
}

impl CommandResult {
    pub fn success() -> Self {
        Self::Success {
            created: vec![],
            modified: vec![],
            deleted: vec![],
        }
    }

    pub fn created(ids: Vec<NodeId>) -> Self {
        Self::Success {
            created: ids,
            modified: vec![],
            deleted: vec![],
        }
    }

    pub fn modified(ids: Vec<NodeId>) -> Self {
        Self::Success {
            created: vec![],
            modified: ids,
            deleted: vec![],
        }
    }

    pub fn deleted(ids: Vec<NodeId>) -> Self {
        Self::Success {
            created: vec![],
            modified: vec![],
            deleted: ids,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Folds another result into this one. The first error wins.
    pub fn merge(self, other: CommandResult) -> CommandResult {
        match (self, other) {
            (error @ Self::Error { .. }, _) | (_, error @ Self::Error { .. }) => error,
            (
                Self::Success {
                    mut created,
                    mut modified,
                    mut deleted,
                },
                Self::Success {
                    created: more_created,
                    modified: more_modified,
                    deleted: more_deleted,
                },
            ) => {
                created.extend(more_created);
                modified.extend(more_modified);
                deleted.extend(more_deleted);
                Self::Success {
                    created,
                    modified,
                    deleted,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_shape_serializes_with_type_field() {
        let cmd = Command::AddShape {
            shape: ShapeTool::Circle,
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "add_shape");
        assert_eq!(json["shape"], "circle");
    }

    #[test]
    fn move_command_defaults_to_selection() {
        let cmd: Command = serde_json::from_str(r#"{ "type": "move", "delta": [10, 20] }"#).unwrap();
        assert_eq!(
            cmd,
            Command::Move {
                target: Target::Selection,
                delta: DVec2::new(10.0, 20.0),
            }
        );
    }

    #[test]
    fn set_stroke_omits_missing_width() {
        let cmd = Command::SetStroke {
            target: Target::All,
            stroke: "#000".into(),
            width: None,
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["target"], "all");
        assert!(json.get("width").is_none());
    }

    #[test]
    fn batch_command_contains_nested_commands() {
        let json = r#"{
            "type": "batch",
            "commands": [
                { "type": "add_text", "content": "Hello" },
                { "type": "pointer_down", "point": [400, 500] },
                { "type": "pointer_up" }
            ]
        }"#;
        let Command::Batch { commands } = serde_json::from_str(json).unwrap() else {
            panic!("expected batch");
        };
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[2], Command::PointerUp);
    }

    #[test]
    fn merge_collects_ids_and_keeps_first_error() {
        let merged = CommandResult::created(vec!["a".into()])
            .merge(CommandResult::modified(vec!["b".into()]))
            .merge(CommandResult::deleted(vec!["c".into()]));
        assert_eq!(
            merged,
            CommandResult::Success {
                created: vec!["a".into()],
                modified: vec!["b".into()],
                deleted: vec!["c".into()],
            }
        );

        let failed = CommandResult::success()
            .merge(CommandResult::error("first"))
            .merge(CommandResult::error("second"));
        assert_eq!(failed, CommandResult::error("first"));
    }

    #[test]
    fn result_serializes_status_tag() {
        let json = serde_json::to_value(CommandResult::error("nope")).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "nope");
    }
}
