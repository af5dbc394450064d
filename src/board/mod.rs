/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Pseudo-legal move generation and attack detection.
mod movegen;

/// The [`Move`] record and the [`MoveList`] container.
mod moves;

/// Move path enumeration, for validating move generation.
mod perft;

/// Colors, piece kinds and colored pieces.
mod piece;

/// The mailbox [`Position`] and castling rights.
mod position;

/// Squares and their geometry.
mod square;

/// Commonly used FEN strings.
mod utils;

pub use moves::*;
pub use perft::*;
pub use piece::*;
pub use position::*;
pub use square::*;
pub use utils::*;
