//! Folio CLI - import vector markup, inspect and convert documents, and run
//! scripted commands against them.

mod logger;

use anyhow::{bail, Context, Result};
use api::{execute_command, execute_query, Command, CommandResult, Query};
use canvas::{Editor, EditorConfig, FileFetcher};
use clap::{Parser, Subcommand};
use interchange::StructuredDocument;
use log::LevelFilter;
use logger::{log_section, FolioLogger};
use std::path::{Path, PathBuf};

/// Folio CLI - work with Folio documents from the command line
#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Command-line interface for Folio documents")]
struct Cli {
    /// Editor settings (JSON). Missing fields use defaults.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// off, error, warn, info, debug, or trace
    #[arg(long, global = true, default_value = "warn")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import an SVG file into a new document, fitted to the page
    Import {
        svg: PathBuf,
        /// Page width (overrides the config)
        #[arg(long)]
        width: Option<f64>,
        /// Page height (overrides the config)
        #[arg(long)]
        height: Option<f64>,
        /// Output document (.kdl or .json)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Print the node tree of a document
    Inspect {
        document: PathBuf,
        /// Print node details as JSON instead of a tree
        #[arg(long)]
        json: bool,
    },

    /// Run a JSON command (or array of commands) against a document
    Apply {
        document: PathBuf,
        commands: PathBuf,
        /// Where to write the result (defaults to overwriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert a document between KDL and JSON
    Convert {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// On-disk document encodings, picked by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DocumentFormat {
    Kdl,
    Json,
}

impl DocumentFormat {
    fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("kdl") => Ok(Self::Kdl),
            Some("json") => Ok(Self::Json),
            _ => bail!(
                "cannot tell the format of {} (expected .kdl or .json)",
                path.display()
            ),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    FolioLogger::init(cli.log_level, config.log_file.as_deref())?;

    match cli.command {
        Commands::Import {
            svg,
            width,
            height,
            output,
        } => import(config, &svg, width, height, &output),
        Commands::Inspect { document, json } => inspect(config, &document, json),
        Commands::Apply {
            document,
            commands,
            output,
        } => apply(config, &document, &commands, output.as_deref()),
        Commands::Convert { input, output } => {
            let document = read_document(&input)?;
            write_document(&document, &output)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    let Some(path) = path else {
        return Ok(EditorConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    EditorConfig::from_json(&text).with_context(|| format!("Invalid config {}", path.display()))
}

fn read_document(path: &Path) -> Result<StructuredDocument> {
    let format = DocumentFormat::from_path(path)?;
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let document = match format {
        DocumentFormat::Kdl => StructuredDocument::from_kdl(&text)?,
        DocumentFormat::Json => StructuredDocument::from_json(&text)?,
    };
    Ok(document)
}

fn write_document(document: &StructuredDocument, path: &Path) -> Result<()> {
    let text = match DocumentFormat::from_path(path)? {
        DocumentFormat::Kdl => document.to_kdl(),
        DocumentFormat::Json => document.to_json()?,
    };
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("wrote {}", path.display());
    Ok(())
}

fn open_editor(config: EditorConfig, path: &Path) -> Result<Editor> {
    let document = read_document(path)?;
    let mut editor = Editor::new(config);
    editor
        .load(&document)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    Ok(editor)
}

fn import(
    mut config: EditorConfig,
    svg: &Path,
    width: Option<f64>,
    height: Option<f64>,
    output: &Path,
) -> Result<()> {
    log_section("import");
    if let Some(width) = width {
        config.canvas_width = width;
    }
    if let Some(height) = height {
        config.canvas_height = height;
    }
    if config.canvas_width <= 0.0 || config.canvas_height <= 0.0 {
        bail!("page size must be positive");
    }

    let Some(file_name) = svg.file_name().and_then(|name| name.to_str()) else {
        bail!("{} does not name a file", svg.display());
    };
    let fetcher = FileFetcher::new(svg.parent().unwrap_or(Path::new(".")));
    let mut editor = Editor::new(config);
    let id = editor
        .import_markup_from(&fetcher, file_name)
        .with_context(|| format!("Failed to import {}", svg.display()))?;
    println!("imported {} node(s) as {}", editor.graph().len(), id);

    write_document(&editor.save(), output)
}

fn inspect(config: EditorConfig, path: &Path, json: bool) -> Result<()> {
    let editor = open_editor(config, path)?;

    if json {
        let result = execute_query(&editor, Query::GetNodes {
            target: api::Target::All,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    for node in editor.graph().to_flat_list() {
        let indent = "  ".repeat(node.depth());
        let bounds = node
            .bounds()
            .map(|b| {
                format!(
                    "({:.1}, {:.1}) {:.1}x{:.1}",
                    b.min.x,
                    b.min.y,
                    b.width(),
                    b.height()
                )
            })
            .unwrap_or_else(|| "empty".to_string());
        let locked = if node.flags().locked { " locked" } else { "" };
        println!(
            "{indent}{} {} {} fill={}{locked}",
            node.variant(),
            node.id().short(),
            bounds,
            node.style().fill.to_hex(),
        );
    }
    println!("{} node(s)", editor.graph().len());
    Ok(())
}

fn apply(
    config: EditorConfig,
    path: &Path,
    commands_path: &Path,
    output: Option<&Path>,
) -> Result<()> {
    log_section("apply");
    let mut editor = open_editor(config, path)?;
    let commands = read_commands(commands_path)?;

    let mut failed = false;
    for command in commands {
        let result = execute_command(&mut editor, command);
        println!("{}", serde_json::to_string(&result)?);
        if let CommandResult::Error { message } = result {
            log::error!("{message}");
            failed = true;
            break;
        }
    }
    if failed {
        bail!("not all commands applied; document left unchanged on disk");
    }

    write_document(&editor.save(), output.unwrap_or(path))
}

/// Accepts a single command object or an array of them.
fn read_commands(path: &Path) -> Result<Vec<Command>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))?;
    let commands = if value.is_array() {
        serde_json::from_value(value)
    } else {
        serde_json::from_value(value).map(|command| vec![command])
    };
    commands.with_context(|| format!("Invalid command in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a/b.kdl")).unwrap(),
            DocumentFormat::Kdl
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("doc.json")).unwrap(),
            DocumentFormat::Json
        );
        assert!(DocumentFormat::from_path(Path::new("doc.svg")).is_err());
        assert!(DocumentFormat::from_path(Path::new("doc")).is_err());
    }

    #[test]
    fn test_cli_parses_global_flags() {
        let cli = Cli::try_parse_from([
            "folio",
            "convert",
            "in.kdl",
            "-o",
            "out.json",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level, LevelFilter::Debug);
        assert!(matches!(cli.command, Commands::Convert { .. }));
    }

    #[test]
    fn test_import_reads_markup_through_fetcher() {
        let dir = std::env::temp_dir().join(format!("folio-cli-import-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let svg = dir.join("logo.svg");
        let out = dir.join("logo.kdl");
        std::fs::write(
            &svg,
            r#"<svg width="40" height="20"><rect width="40" height="20"/></svg>"#,
        )
        .unwrap();

        import(EditorConfig::default(), &svg, None, None, &out).unwrap();
        let editor = open_editor(EditorConfig::default(), &out).unwrap();
        assert_eq!(editor.graph().len(), 2);

        let missing = dir.join("missing.svg");
        let err = import(EditorConfig::default(), &missing, None, None, &out).unwrap_err();
        assert!(err.to_string().contains("missing.svg"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_apply_round_trip_through_files() {
        let dir = std::env::temp_dir().join(format!("folio-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let doc = dir.join("doc.kdl");
        let commands = dir.join("commands.json");
        let out = dir.join("out.json");

        write_document(&Editor::default().save(), &doc).unwrap();
        std::fs::write(
            &commands,
            r#"[{ "type": "add_shape", "shape": "rect" },
                { "type": "add_text", "content": "Hi" }]"#,
        )
        .unwrap();
        apply(EditorConfig::default(), &doc, &commands, Some(&out)).unwrap();

        let editor = open_editor(EditorConfig::default(), &out).unwrap();
        assert_eq!(editor.graph().len(), 2);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
