/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Board representation, move generation, and making/unmaking moves.
mod board;

/// Command-line interface to the engine.
mod cli;

/// Code related to the engine's functionality, such as command handling.
mod engine;

/// Evaluation of chess positions.
mod eval;

/// Heuristic ordering of moves before they are searched.
mod movepicker;

/// Centipawn scores.
mod score;

/// Main engine logic; all search related code.
mod search;

/// Misc utility functions, constants, and types.
mod utils;

pub use board::*;
pub use cli::*;
pub use engine::*;
pub use eval::*;
pub use movepicker::*;
pub use score::*;
pub use search::*;
pub use utils::*;
