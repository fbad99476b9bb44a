//! xtask - Build tasks for ascbids
//!
//! Run with: cargo xtask <command>
//!
//! Commands:
//! - gen-docs: Generate documentation (man pages, COMMANDS.md)

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Arg, Command, CommandFactory, Parser, Subcommand};

use ascbids::cli::Cli;

const BIN: &str = "ascbids";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build tasks for ascbids")]
struct Xtask {
    #[command(subcommand)]
    command: XtaskCommand,
}

#[derive(Subcommand)]
enum XtaskCommand {
    /// Generate documentation from CLI definitions
    #[command(name = "gen-docs")]
    GenDocs {
        /// Output directory (default: docs/)
        #[arg(long, short, default_value = "docs")]
        output: PathBuf,

        /// Generate man pages only
        #[arg(long, conflicts_with = "markdown")]
        man: bool,

        /// Generate COMMANDS.md only
        #[arg(long)]
        markdown: bool,
    },
}

fn main() -> Result<()> {
    let args = Xtask::parse();

    match args.command {
        XtaskCommand::GenDocs {
            output,
            man,
            markdown,
        } => {
            if !markdown {
                generate_man_pages(&output)?;
            }
            if !man {
                generate_markdown(&output)?;
            }
        }
    }

    Ok(())
}

/// Visible subcommands.
fn visible(cmd: &Command) -> impl Iterator<Item = &Command> {
    cmd.get_subcommands().filter(|c| !c.is_hide_set())
}

fn render_man(cmd: &Command, path: &Path) -> Result<()> {
    let mut buffer = Vec::new();
    clap_mangen::Man::new(cmd.clone()).render(&mut buffer)?;
    fs::write(path, buffer).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Generated: {}", path.display());
    Ok(())
}

/// Generate man pages using clap_mangen
fn generate_man_pages(output: &Path) -> Result<()> {
    let man_dir = output.join("man");
    fs::create_dir_all(&man_dir).context("Failed to create man directory")?;

    let cmd = Cli::command();
    render_man(&cmd, &man_dir.join(format!("{}.1", BIN)))?;

    for subcommand in visible(&cmd) {
        let name = subcommand.get_name();
        render_man(subcommand, &man_dir.join(format!("{}-{}.1", BIN, name)))?;

        for nested in visible(subcommand) {
            let file = format!("{}-{}-{}.1", BIN, name, nested.get_name());
            render_man(nested, &man_dir.join(file))?;
        }
    }

    println!("Man pages generated in {}", man_dir.display());
    Ok(())
}

fn is_builtin(arg: &Arg) -> bool {
    matches!(arg.get_id().as_str(), "help" | "version")
}

/// Bullet list of the arguments and options of a command.
fn argument_list(cmd: &Command) -> String {
    let mut out = String::new();
    for arg in cmd.get_arguments().filter(|a| !is_builtin(a)) {
        let name = if arg.is_positional() {
            format!("<{}>", arg.get_id().as_str().to_uppercase())
        } else {
            let long = arg.get_long().map(|l| format!("--{}", l));
            let short = arg.get_short().map(|s| format!("-{}", s));
            match (short, long) {
                (Some(s), Some(l)) => format!("{}, {}", s, l),
                (None, Some(l)) => l,
                (Some(s), None) => s,
                (None, None) => continue,
            }
        };
        let help = arg.get_help().map(|h| h.to_string()).unwrap_or_default();
        out.push_str(&format!("- `{}`: {}\n", name, help));
    }
    out
}

fn push_block(markdown: &mut String, text: impl std::fmt::Display) {
    markdown.push_str(&format!("```\n{}\n```\n\n", text));
}

/// Generate COMMANDS.md markdown documentation
fn generate_markdown(output: &Path) -> Result<()> {
    fs::create_dir_all(output).context("Failed to create output directory")?;

    let cmd = Cli::command();
    let mut markdown = String::new();

    markdown.push_str("# ascbids Command Reference\n\n");
    markdown.push_str("This document is auto-generated from the CLI definitions.\n\n");
    markdown.push_str("## Table of Contents\n\n");
    for subcommand in visible(&cmd) {
        let name = subcommand.get_name();
        markdown.push_str(&format!("- [{}](#{}-{})\n", name, BIN, name));
    }
    markdown.push_str("\n---\n\n");

    markdown.push_str(&format!("## {}\n\n", BIN));
    if let Some(about) = cmd.get_about() {
        markdown.push_str(&format!("{}\n\n", about));
    }
    if let Some(long_about) = cmd.get_long_about() {
        push_block(&mut markdown, long_about);
    }
    let global = argument_list(&cmd);
    if !global.is_empty() {
        markdown.push_str("### Global Options\n\n");
        markdown.push_str(&global);
        markdown.push('\n');
    }

    for subcommand in visible(&cmd) {
        let name = subcommand.get_name();
        markdown.push_str(&format!("## {} {}\n\n", BIN, name));
        if let Some(about) = subcommand.get_about() {
            markdown.push_str(&format!("{}\n\n", about));
        }

        let args = argument_list(subcommand);
        if !args.is_empty() {
            markdown.push_str("### Arguments and Options\n\n");
            markdown.push_str(&args);
            markdown.push('\n');
        }

        if let Some(long_about) = subcommand.get_long_about() {
            markdown.push_str("### Description\n\n");
            push_block(&mut markdown, long_about);
        }

        let nested: Vec<_> = visible(subcommand).collect();
        if !nested.is_empty() {
            markdown.push_str("### Subcommands\n\n");
            for nested_cmd in nested {
                markdown.push_str(&format!("#### {} {} {}\n\n", BIN, name, nested_cmd.get_name()));
                if let Some(about) = nested_cmd.get_about() {
                    markdown.push_str(&format!("{}\n\n", about));
                }
                let nested_args = argument_list(nested_cmd);
                if !nested_args.is_empty() {
                    markdown.push_str(&nested_args);
                    markdown.push('\n');
                }
                if let Some(long_about) = nested_cmd.get_long_about() {
                    push_block(&mut markdown, long_about);
                }
            }
        }

        markdown.push_str("---\n\n");
    }

    markdown.push_str("\n*Generated by `cargo xtask gen-docs`*\n");

    let output_path = output.join("COMMANDS.md");
    fs::write(&output_path, markdown)?;
    println!("Generated: {}", output_path.display());

    Ok(())
}
