//! Command and query execution against an [`Editor`].
//!
//! This module connects the serializable Command/Query types to the editor,
//! executing operations and returning results. Failures come back as
//! [`CommandResult::Error`] rather than as Rust errors so they can be
//! reported alongside the results of a batch.

use crate::{Command, CommandResult, NodeInfo, Query, QueryResult, Target};
use canvas::{Editor, EditorError};
use folio_core::{color::parse_color, Color};
use node::NodeId;

/// Execute a command against an editor.
///
/// A single command either applies fully or leaves the document unchanged.
/// A batch stops at its first failing command; earlier commands stay applied.
pub fn execute_command(editor: &mut Editor, command: Command) -> CommandResult {
    log::debug!("executing {:?}", command);
    match command {
        Command::AddShape { shape } => report(editor.add_shape(shape).map(created)),

        Command::AddText { content } => report(editor.add_text(&content).map(created)),

        Command::ImportMarkup { markup } => report(editor.import_markup(&markup).map(created)),

        Command::Select { id } => report(editor.select(&id).map(|_| CommandResult::success())),

        Command::ClearSelection => {
            editor.clear_selection();
            CommandResult::success()
        }

        Command::PointerDown { point } => {
            editor.pointer_down(point);
            CommandResult::success()
        }

        Command::PointerMove { point } => {
            if editor.pointer_move(point) {
                CommandResult::modified(editor.selection().cloned().into_iter().collect())
            } else {
                CommandResult::success()
            }
        }

        Command::PointerUp => {
            editor.pointer_up();
            CommandResult::success()
        }

        Command::Move { target, delta } => {
            let ids = match resolve_existing(editor, &target) {
                Ok(ids) => ids,
                Err(result) => return result,
            };
            for id in &ids {
                if let Err(err) = editor.move_node(id, delta) {
                    return CommandResult::error(err.to_string());
                }
            }
            CommandResult::modified(ids)
        }

        Command::SetFill { target, fill } => {
            let Some(color) = parse_paint(&fill) else {
                return CommandResult::error(format!("invalid color `{fill}`"));
            };
            restyle(editor, &target, |style| style.fill = color)
        }

        Command::SetStroke {
            target,
            stroke,
            width,
        } => {
            let Some(color) = parse_paint(&stroke) else {
                return CommandResult::error(format!("invalid color `{stroke}`"));
            };
            restyle(editor, &target, |style| {
                style.stroke = color;
                if let Some(width) = width {
                    style.stroke_width = width.max(0.0);
                }
            })
        }

        Command::Delete { target } => {
            let ids = match resolve_existing(editor, &target) {
                Ok(ids) => ids,
                Err(result) => return result,
            };
            let mut deleted = Vec::new();
            for id in ids {
                // Already gone with an ancestor removed earlier in this loop.
                if !editor.graph().contains(&id) {
                    continue;
                }
                if let Err(err) = editor.remove_node(&id) {
                    return CommandResult::error(err.to_string());
                }
                deleted.push(id);
            }
            CommandResult::deleted(deleted)
        }

        Command::DeleteSelected => report(
            editor
                .delete_selected()
                .map(|id| CommandResult::deleted(vec![id])),
        ),

        Command::Batch { commands } => {
            let mut result = CommandResult::success();
            for command in commands {
                result = result.merge(execute_command(editor, command));
                if result.is_error() {
                    break;
                }
            }
            result
        }
    }
}

/// Execute a query against an editor.
pub fn execute_query(editor: &Editor, query: Query) -> QueryResult {
    match query {
        Query::GetSelection => QueryResult::Selection {
            id: editor.selection().cloned(),
        },

        Query::GetNodes { target } => QueryResult::Nodes {
            nodes: target
                .resolve(editor)
                .iter()
                .filter_map(|id| editor.graph().find_node(id))
                .map(NodeInfo::from)
                .collect(),
        },

        Query::GetNode { id } => QueryResult::Node {
            node: editor.graph().find_node(&id).map(NodeInfo::from),
        },

        Query::GetBounds { id: Some(id) } => {
            if !editor.graph().contains(&id) {
                return QueryResult::Error {
                    message: format!("no node with id {id}"),
                };
            }
            QueryResult::bounds(editor.graph().bounding_box(&id))
        }

        Query::GetBounds { id: None } => QueryResult::bounds(editor.content_bounds()),

        Query::GetNodeCount => QueryResult::Count {
            count: editor.graph().len(),
        },
    }
}

fn created(id: NodeId) -> CommandResult {
    CommandResult::created(vec![id])
}

fn report(result: Result<CommandResult, EditorError>) -> CommandResult {
    result.unwrap_or_else(|err| {
        log::warn!("command failed: {err}");
        CommandResult::error(err.to_string())
    })
}

/// Resolves a target, failing if any id is not in the document.
fn resolve_existing(editor: &Editor, target: &Target) -> Result<Vec<NodeId>, CommandResult> {
    let ids = target.resolve(editor);
    match ids.iter().find(|id| !editor.graph().contains(id)) {
        Some(missing) => Err(CommandResult::error(format!("no node with id {missing}"))),
        None => Ok(ids),
    }
}

fn restyle(
    editor: &mut Editor,
    target: &Target,
    update: impl Fn(&mut node::Style),
) -> CommandResult {
    let ids = match resolve_existing(editor, target) {
        Ok(ids) => ids,
        Err(result) => return result,
    };
    for id in &ids {
        if let Err(err) = editor.update_style(id, &update) {
            return CommandResult::error(err.to_string());
        }
    }
    CommandResult::modified(ids)
}

fn parse_paint(value: &str) -> Option<Color> {
    if value.trim().eq_ignore_ascii_case("none") {
        return Some(Color::TRANSPARENT);
    }
    parse_color(value)
}
