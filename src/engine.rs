/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{io::Write, time::Instant};

use anyhow::Result;
use tracing::info;

use crate::{
    perft, splitperft, EngineCommand, Evaluator, Position, Search, SearchConfig, BENCHMARK_FENS,
};

/// Default depth at which to run the benchmark searches.
const BENCH_DEPTH: usize = 4;

/// The Tadpole chess engine.
///
/// Executes one [`EngineCommand`] at a time, writing its output to `W`.
#[derive(Debug)]
pub struct Engine<W: Write> {
    /// Destination of everything the engine prints.
    out: W,
}

impl<W: Write> Engine<W> {
    /// Constructs a new [`Engine`] that prints to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns a string of the engine's name and current version.
    pub fn name(&self) -> String {
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    /// Consumes the engine, returning its output.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Execute a single [`EngineCommand`].
    pub fn execute(&mut self, command: EngineCommand) -> Result<()> {
        match command {
            EngineCommand::Bench { depth, pretty } => self.bench(depth, pretty),

            EngineCommand::Display { position } => self.display(&position.resolve()?),

            EngineCommand::Eval { position, pretty } => self.eval(&position.resolve()?, pretty),

            EngineCommand::Moves {
                position,
                legal,
                debug,
                sort,
            } => self.moves(&position.resolve()?, legal, debug, sort),

            EngineCommand::Perft {
                depth,
                position,
                split,
            } => self.perft(position.resolve()?, depth, split),

            EngineCommand::Search {
                position,
                movetime,
                depth,
            } => self.search(&position.resolve()?, movetime, depth),
        }
    }

    /// Execute the `bench` command, running a benchmark of a fixed search on a series of positions and displaying the results.
    fn bench(&mut self, depth: Option<usize>, pretty: bool) -> Result<()> {
        // Set up the benchmarking config
        let config = SearchConfig {
            max_depth: depth.unwrap_or(BENCH_DEPTH),
            ..Default::default()
        };

        let benches = BENCHMARK_FENS;
        let num_tests = benches.len();
        let mut nodes = 0;

        // Padding for printing FENs
        let width = benches.iter().map(|fen| fen.len()).max().unwrap_or_default();

        // Run a fixed search on each position
        for (i, fen) in benches.into_iter().enumerate() {
            let position = Position::from_fen(fen)?;
            let res = Search::new(&position, config).start();
            nodes += res.nodes;

            if pretty {
                writeln!(
                    self.out,
                    "{:>2}/{num_tests} {fen:<width$} {:>10} nodes",
                    i + 1,
                    res.nodes
                )?;
            }
        }

        // Compute results
        let elapsed = config.starttime.elapsed();
        let nps = (nodes as f32 / elapsed.as_secs_f32()) as u64;
        let m_nps = nodes as f32 / elapsed.as_secs_f32() / 1_000_000.0;
        let ms = elapsed.as_millis();

        if pretty {
            // Display the results in a nice table
            writeln!(self.out)?;
            writeln!(self.out, "+--- Benchmark Complete ---+")?;
            writeln!(self.out, "| time (ms)  : {ms:<12}|")?;
            writeln!(self.out, "| nodes      : {nodes:<12}|")?;
            writeln!(self.out, "| nps        : {nps:<12}|")?;
            writeln!(self.out, "| Mnps       : {m_nps:<12.2}|")?;
            writeln!(self.out, "+--------------------------+")?;
        } else {
            writeln!(self.out, "{nodes} nodes {nps} nps")?;
        }

        Ok(())
    }

    /// Executes the `display` command, printing the position.
    fn display(&mut self, position: &Position) -> Result<()> {
        writeln!(self.out, "{position:#}")?;
        Ok(())
    }

    /// Executes the `eval` command, printing an evaluation of the position.
    fn eval(&mut self, position: &Position, pretty: bool) -> Result<()> {
        let evaluator = Evaluator::new(position);
        if pretty {
            writeln!(self.out, "{evaluator}")?;
        } else {
            writeln!(self.out, "{}", evaluator.eval())?;
        }
        Ok(())
    }

    /// Executes the `moves` command, printing every available move separated by comma-space.
    fn moves(&mut self, position: &Position, legal: bool, debug: bool, sort: bool) -> Result<()> {
        let moves = if legal {
            position.legal_moves()
        } else {
            position.pseudo_legal_moves()
        };

        let mut strings = moves
            .into_iter()
            .map(|mv| {
                if debug {
                    format!("{mv:?}")
                } else {
                    mv.to_string()
                }
            })
            .collect::<Vec<_>>();

        if sort {
            strings.sort();
        }

        // If there are none, print "(none)"
        if strings.is_empty() {
            writeln!(self.out, "(none)")?;
        } else {
            writeln!(self.out, "{}", strings.join(", "))?;
        }

        Ok(())
    }

    /// Executes the `perft` command, printing the node count (and the count below each root move, if `split`).
    fn perft(&mut self, position: Position, depth: usize, split: bool) -> Result<()> {
        let now = Instant::now();

        let nodes = if split && depth > 0 {
            let total = splitperft(&position, depth, &mut self.out)?;
            writeln!(self.out)?;
            total
        } else {
            perft(&position, depth)
        };

        let elapsed = now.elapsed();
        info!("perft({depth}) took {elapsed:?}");
        writeln!(self.out, "{nodes}")?;

        Ok(())
    }

    /// Executes the `search` command, printing the search statistics and the best move.
    fn search(&mut self, position: &Position, movetime: f64, depth: Option<usize>) -> Result<()> {
        let mut config = SearchConfig::with_movetime(movetime);
        if let Some(depth) = depth {
            config.max_depth = depth;
        }

        let res = Search::new(position, config).start();
        let elapsed = config.starttime.elapsed();

        writeln!(
            self.out,
            "info depth {} score cp {} nodes {} time {}",
            res.depth,
            res.score,
            res.nodes,
            elapsed.as_millis()
        )?;

        match res.bestmove {
            Some(mv) => writeln!(self.out, "bestmove {mv}")?,
            None => writeln!(self.out, "bestmove (none)")?,
        }

        Ok(())
    }
}
