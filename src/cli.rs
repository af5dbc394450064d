/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::{Move, Position, FEN_STARTPOS};

/// Command-line arguments to the engine binary.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Maximum level of log messages written to stderr.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: tracing::Level,

    /// The command to execute.
    #[command(subcommand)]
    pub command: EngineCommand,
}

/// A command to be sent to the engine.
#[derive(Debug, Clone, Subcommand)]
#[command(rename_all = "lower")]
pub enum EngineCommand {
    /// Run a benchmark of fixed-depth searches over a set of positions.
    Bench {
        /// If set, the benchmarking results will be printed in a well-formatted table.
        #[arg(short, long, default_value = "false")]
        pretty: bool,

        /// Override the default benchmark depth.
        #[arg(short, long, required = false)]
        depth: Option<usize>,
    },

    /// Print a visual representation of a position.
    #[command(alias = "d")]
    Display {
        #[command(flatten)]
        position: PositionArgs,
    },

    /// Print the material evaluation of a position, from the side-to-move's perspective.
    Eval {
        #[command(flatten)]
        position: PositionArgs,

        /// If set, the contribution of every piece will also be printed.
        #[arg(short, long, default_value = "false")]
        pretty: bool,
    },

    /// Shows all moves available in a position.
    Moves {
        #[command(flatten)]
        position: PositionArgs,

        /// If set, moves that leave the King attacked are removed.
        #[arg(short, long, default_value = "false")]
        legal: bool,

        /// If set, moves will be printed using their debug formatter, which displays what kind of move it is (capture, en passant, etc.).
        #[arg(short, long, default_value = "false")]
        debug: bool,

        /// If set, moves will be sorted in alphabetical order.
        ///
        /// By default, moves are printed in the order they are generated.
        #[arg(short, long, default_value = "false")]
        sort: bool,
    },

    /// Performs a perft on a position at the supplied depth, printing total node count.
    Perft {
        depth: usize,

        #[command(flatten)]
        position: PositionArgs,

        /// If set, print the node count below each root move.
        #[arg(short, long, default_value = "false")]
        split: bool,
    },

    /// Search a position for the best move.
    #[command(alias = "go")]
    Search {
        #[command(flatten)]
        position: PositionArgs,

        /// Seconds of wall-clock time to spend.
        #[arg(short, long, default_value = "1.0", allow_negative_numbers = true)]
        movetime: f64,

        /// Override the maximum search depth.
        #[arg(short, long, required = false)]
        depth: Option<usize>,
    },
}

/// The position a command operates on.
#[derive(Debug, Clone, Args)]
pub struct PositionArgs {
    /// FEN string of the starting position.
    #[arg(short, long, default_value = FEN_STARTPOS)]
    pub fen: Position,

    /// Moves, in long algebraic notation, to play from the starting position.
    #[arg(short = 'M', long, num_args = 1.., value_delimiter = ' ')]
    pub moves: Vec<String>,
}

impl PositionArgs {
    /// Builds the position described by these arguments, playing each move in turn.
    pub fn resolve(&self) -> Result<Position> {
        let mut position = self.fen;

        for (i, mv_str) in self.moves.iter().enumerate() {
            let mv = Move::from_uci(&position, mv_str)
                .with_context(|| format!("Failed to play move #{} of {:?}", i + 1, self.moves))?;
            position.make_move(&mv);
        }

        Ok(position)
    }
}
