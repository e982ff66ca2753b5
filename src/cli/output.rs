//! Terminal output. Status and errors are colored (colored honors NO_COLOR
//! and CLICOLOR); data lines stay plain so they can be piped.

use std::fmt::Display;

use colored::Colorize;
use serde::Serialize;

use crate::cli::error::CliResult;
use crate::domain::{ContainerSize, DocumentId, Position, Viewport};
use crate::infrastructure::InfraError;

pub fn error(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

pub fn warning(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

pub fn success(msg: &(impl Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Green label, then the message
pub fn action(label: &str, msg: &(impl Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

pub fn header(msg: &(impl Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

pub fn detail(msg: &(impl Display + ?Sized)) {
    println!("  {}", msg);
}

pub fn info(msg: &(impl Display + ?Sized)) {
    println!("{}", msg);
}

/// One laid-out node, indented by depth. Dragged nodes carry a yellow `*`.
pub fn node(level: usize, title: &str, id: &DocumentId, position: Position, custom: bool) {
    let marker = if custom { "*".yellow() } else { " ".normal() };
    println!(
        "{}{:indent$}{} {} {}",
        marker,
        "",
        title,
        format!("[{id}]").dimmed(),
        position,
        indent = level * 2
    );
}

pub fn viewport(viewport: &Viewport, container: &ContainerSize) {
    println!(
        "x={:.2} y={:.2} scale={:.4} ({}x{})",
        viewport.x, viewport.y, viewport.scale, container.width, container.height
    );
}

pub fn json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| InfraError::json("serialize output", e))?;
    println!("{}", text);
    Ok(())
}
