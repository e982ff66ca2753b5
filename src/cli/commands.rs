//! Command dispatch: each subcommand drives one canvas session.

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::services::CanvasService;
use crate::cli::args::{Cli, Commands, ConfigCommands, StateCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::{ContainerSize, DocumentId, Position, Viewport};
use crate::infrastructure::di::ServiceContainer;

/// Load settings and apply command-line overrides.
pub fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(user) = &cli.user {
        if user.trim().is_empty() {
            return Err(CliError::InvalidArgs("user must not be empty".into()));
        }
        settings.user = user.clone();
    }
    if let Some(dir) = &cli.state_dir {
        settings.state_dir = dir.clone();
    }
    if let Some(width) = cli.width {
        settings.container.width = width;
    }
    if let Some(height) = cli.height {
        settings.container.height = height;
    }
    Ok(settings)
}

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage("no command given, see --help".into()));
    };

    // Commands that need no settings
    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }
    if let Commands::Config {
        command: ConfigCommands::Template,
    } = command
    {
        output::info(&Settings::template());
        return Ok(());
    }

    let settings = load_settings(cli)?;
    debug!("settings: {:?}", settings);
    let container = ServiceContainer::new(settings);

    match command {
        Commands::Tree { documents } => cmd_tree(&container, documents, cli.json),
        Commands::Layout { documents } => cmd_layout(&container, documents, cli.json),
        Commands::Toggle { documents, id } => cmd_toggle(&container, documents, id, cli.json),
        Commands::Drag {
            documents,
            id,
            dx,
            dy,
        } => cmd_drag(&container, documents, id, *dx, *dy, cli.json),
        Commands::Fit { documents } => cmd_fit(&container, documents, cli.json),
        Commands::Connections { documents } => cmd_connections(&container, documents, cli.json),
        Commands::ResetLayout { documents } => cmd_reset_layout(&container, documents),
        Commands::State { command } => cmd_state(&container, command, cli.json),
        Commands::Config { command } => cmd_config(&container, command),
        Commands::Completion { .. } => Ok(()),
    }
}

fn open(container: &ServiceContainer, documents: &Path) -> CliResult<CanvasService> {
    Ok(container.canvas_from_file(documents)?)
}

#[instrument(skip(container))]
fn cmd_tree(container: &ServiceContainer, documents: &Path, json: bool) -> CliResult<()> {
    let canvas = open(container, documents)?;
    if json {
        return output::json(&canvas.visible_nodes());
    }
    output::info(&canvas.forest().to_tree_string(canvas.expanded()));
    Ok(())
}

#[derive(Serialize)]
struct PlacedNode {
    id: DocumentId,
    title: String,
    level: usize,
    position: Position,
    custom: bool,
}

fn placed_nodes(canvas: &CanvasService) -> Vec<PlacedNode> {
    canvas
        .visible_nodes()
        .into_iter()
        .filter_map(|node| {
            let position = canvas.effective_position(&node.id)?;
            Some(PlacedNode {
                custom: canvas.custom_positions().contains_key(&node.id),
                id: node.id,
                title: node.title,
                level: node.level,
                position,
            })
        })
        .collect()
}

fn print_placed(nodes: &[PlacedNode]) {
    if nodes.is_empty() {
        output::info("No documents to display");
        return;
    }
    for n in nodes {
        output::node(n.level, &n.title, &n.id, n.position, n.custom);
    }
}

#[instrument(skip(container))]
fn cmd_layout(container: &ServiceContainer, documents: &Path, json: bool) -> CliResult<()> {
    let canvas = open(container, documents)?;
    let nodes = placed_nodes(&canvas);
    if json {
        return output::json(&nodes);
    }
    print_placed(&nodes);
    Ok(())
}

#[instrument(skip(container))]
fn cmd_toggle(container: &ServiceContainer, documents: &Path, id: &str, json: bool) -> CliResult<()> {
    let mut canvas = open(container, documents)?;
    let id = DocumentId::from(id);
    canvas.toggle(&id)?;
    if json {
        return output::json(&canvas.drain_events());
    }
    let state = if canvas.expanded().contains(&id) {
        "expanded"
    } else {
        "collapsed"
    };
    output::action(state, &id);
    output::detail(&format!(
        "expanded: [{}]",
        canvas.expanded().iter().join(", ")
    ));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_drag(container: &ServiceContainer, documents: &Path, id: &str, dx: f64, dy: f64, json: bool) -> CliResult<()> {
    if !(dx.is_finite() && dy.is_finite()) {
        return Err(CliError::InvalidArgs(format!("offset must be finite, got ({dx}, {dy})")));
    }
    let mut canvas = open(container, documents)?;
    let id = DocumentId::from(id);
    canvas.drag_node_by(&id, dx, dy)?;
    let moved: Vec<PlacedNode> = placed_nodes(&canvas)
        .into_iter()
        .filter(|n| n.custom)
        .collect();
    if json {
        return output::json(&moved);
    }
    output::action("moved", &format!("{} by ({dx}, {dy})", id));
    print_placed(&moved);
    Ok(())
}

#[derive(Serialize)]
struct FitReport {
    container: ContainerSize,
    viewport: Viewport,
}

#[instrument(skip(container))]
fn cmd_fit(container: &ServiceContainer, documents: &Path, json: bool) -> CliResult<()> {
    let mut canvas = open(container, documents)?;
    canvas.reset_view();
    let report = FitReport {
        container: canvas.container(),
        viewport: canvas.viewport(),
    };
    if json {
        return output::json(&report);
    }
    output::viewport(&report.viewport, &report.container);
    Ok(())
}

#[instrument(skip(container))]
fn cmd_connections(container: &ServiceContainer, documents: &Path, json: bool) -> CliResult<()> {
    let canvas = open(container, documents)?;
    let paths: Vec<String> = canvas.connections().iter().map(|c| c.path()).collect();
    if json {
        return output::json(&paths);
    }
    for path in paths {
        output::info(&path);
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_reset_layout(container: &ServiceContainer, documents: &Path) -> CliResult<()> {
    let mut canvas = open(container, documents)?;
    canvas.reset_layout();
    output::success("layout reset");
    Ok(())
}

fn cmd_state(container: &ServiceContainer, command: &StateCommands, json: bool) -> CliResult<()> {
    let persistence = container.persistence();
    match command {
        StateCommands::Show => {
            let snapshot = persistence.load();
            if json {
                return output::json(&snapshot);
            }
            output::header(&format!("state of {}", persistence.user()));
            output::detail(&format!(
                "expanded: [{}]",
                snapshot.expanded.iter().join(", ")
            ));
            for (id, pos) in &snapshot.custom_positions {
                output::detail(&format!("{id}: {pos}"));
            }
            Ok(())
        }
        StateCommands::Clear => {
            persistence.clear()?;
            output::success(&format!("cleared state of {}", persistence.user()));
            Ok(())
        }
    }
}

fn cmd_config(container: &ServiceContainer, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Template => {
            output::info(&Settings::template());
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => {
                    let status = if path.exists() { "exists" } else { "not found" };
                    output::info(&format!("{} ({status})", path.display()));
                }
                None => output::warning("cannot determine config directory"),
            }
            output::info(&format!("state: {}", container.settings.state_dir.display()));
            Ok(())
        }
    }
}
