//! Command-line interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Draw in the air with hand gestures
#[derive(Parser, Debug)]
#[command(name = "airbrush")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the drawing window
    Run {
        /// Record detector frames to a JSON-lines file
        #[arg(long)]
        record: Option<PathBuf>,

        /// Drive the window from a recording instead of the mouse
        #[arg(long, conflicts_with = "record")]
        replay: Option<PathBuf>,

        /// Start from a saved document
        #[arg(long)]
        load: Option<PathBuf>,

        /// Save the document here on exit
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Feed a recording through the engine without a window
    Replay {
        /// JSON-lines frame recording
        frames: PathBuf,

        /// Write the flattened drawing as PNG
        #[arg(long)]
        png: Option<PathBuf>,

        /// Write the segment list as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Write the full document (segments and undo/redo stacks)
        #[arg(long)]
        doc: Option<PathBuf>,
    },

    /// Print or write the default configuration
    Config {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_has_no_subcommand() {
        let cli = Cli::try_parse_from(["airbrush"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn replay_takes_outputs() {
        let cli = Cli::try_parse_from([
            "airbrush", "-v", "replay", "session.jsonl", "--png", "out.png",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Replay { frames, png, json, doc }) => {
                assert_eq!(frames, PathBuf::from("session.jsonl"));
                assert_eq!(png, Some(PathBuf::from("out.png")));
                assert!(json.is_none() && doc.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn run_cannot_record_while_replaying() {
        let res = Cli::try_parse_from([
            "airbrush", "run", "--record", "a.jsonl", "--replay", "b.jsonl",
        ]);
        assert!(res.is_err());
    }
}
