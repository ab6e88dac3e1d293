//! CLI (CommandLine Interface) utilities for the party runner binary.
//!
//! Here, you can know the options for the runner through the enum types and
//! the [`Args`] struct. See [runner](crate::runner) for what the modes do.

use crate::channel_utils::tcp_channel::DEFAULT_PORT;
use crate::party::PartyId;
use clap::{Parser, ValueEnum};
use std::fmt::Display;
use std::path::PathBuf;

/// What the runner binary does once the session is up.
#[derive(Clone, Copy, ValueEnum, Debug)]
pub enum Mode {
    /// Run the protocol checks (all of them, or the one given by `--name`).
    Test,
    /// Time the vector multiplication protocol and report throughput.
    Bench,
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Test => write!(f, "test"),
            Mode::Bench => write!(f, "bench"),
        }
    }
}

/// Arguments for the two-party sharing runner.
/// This struct implements [clap::Parser] to make that this binary has
/// CommandLine Arguments.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, next_line_help = true)]
pub struct Args {
    /// Party id. 0 listens, 1 connects.
    pub party: PartyId,

    /// What to run.
    #[arg(value_enum)]
    pub mode: Mode,

    /// Port of the listening party.
    #[arg(short = 'p', long = "port", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Host of the listening party (used by party 1 only).
    #[arg(short = 's', long = "server", default_value = "127.0.0.1")]
    pub server: String,

    /// Run only the named check instead of the whole registry.
    #[arg(short = 'n', long = "name")]
    pub name: Option<String>,

    /// Append the bench report line to this file.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Bench iterations.
    #[arg(short = 'i', long = "iteration", default_value_t = 100)]
    pub iteration: usize,
}
