/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::{Color, Piece, Position, Score, Square};

/// Encapsulates the logic of scoring a chess position.
///
/// Evaluation is purely material: every piece is worth its [`PieceKind::value`](crate::PieceKind::value),
/// counted positively for its owner and negatively for the opponent.
/// During a negamax search, positions must be evaluated from the side-to-move's perspective.
/// That is, if it is Black's turn, a "good" evaluation for Black will be a positive number.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    /// The position to evaluate.
    position: &'a Position,
}

impl<'a> Evaluator<'a> {
    /// Construct a new [`Evaluator`] for `position`.
    #[inline(always)]
    pub const fn new(position: &'a Position) -> Self {
        Self { position }
    }

    /// Evaluate this position from the side-to-move's perspective.
    ///
    /// A positive/high number is good for the side-to-move, while a negative number is better for the opponent.
    /// A score of 0 is considered equal.
    ///
    /// # Example
    /// ```
    /// # use tadpole::{Evaluator, Position};
    /// let pos: Position = "4k3/8/8/8/8/8/8/3QK3 b - - 0 1".parse().unwrap();
    /// assert_eq!(Evaluator::new(&pos).eval(), -900);
    /// ```
    #[inline(always)]
    pub fn eval(self) -> Score {
        self.eval_for(self.position.side_to_move())
    }

    /// Evaluate this position from `color`'s perspective.
    #[inline(always)]
    pub fn eval_for(&self, color: Color) -> Score {
        // White-positive sum, then flipped for Black
        let white_relative = self
            .position
            .pieces()
            .map(|(_, piece)| signed_value(piece))
            .sum::<Score>();

        white_relative * color.negation_multiplier() as i32
    }
}

/// Value of `piece`, positive if White owns it and negative otherwise.
#[inline(always)]
fn signed_value(piece: Piece) -> Score {
    Score(piece.value() * piece.color().negation_multiplier() as i32)
}

impl fmt::Display for Evaluator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let color = self.position.side_to_move();
        let divider = format!("  +{}", "-----+".repeat(8));

        writeln!(f, "{divider}")?;
        for rank in (0..8).rev() {
            write!(f, "{} |", rank + 1)?;

            // Step 1: Write the piece char
            for file in 0..8 {
                let piece = self.position.piece_at(Square::new(file, rank));
                let piece_char = piece.map(|p| p.to_uci()).unwrap_or(' ');
                write!(f, "  {piece_char}  |")?;
            }
            writeln!(f)?;
            write!(f, "  |")?;

            // Step 2: Write the contribution of that piece
            for file in 0..8 {
                let score = match self.position.piece_at(Square::new(file, rank)) {
                    Some(piece) => {
                        let val = signed_value(piece);
                        let s = if val > Score::DRAW {
                            format!("+{}", val.normalize())
                        } else {
                            format!("{}", val.normalize())
                        };
                        format!("{s:^5}")
                    }
                    None => String::from("     "),
                };
                write!(f, "{score}|")?;
            }
            writeln!(f)?;
            writeln!(f, "{divider}")?;
        }
        for file in 'a'..='h' {
            write!(f, "     {file}")?;
        }

        let score = self.eval_for(color);

        let winning_side = if score > Score::DRAW {
            Some(color)
        } else if score < Score::DRAW {
            Some(color.opponent())
        } else {
            None
        };

        writeln!(f, "\n\nSide to move: {}", color.name())?;
        writeln!(
            f,
            "Winning side: {}",
            winning_side.map(|c| c.name()).unwrap_or("N/A")
        )?;
        writeln!(f, "Score: {score}")?;

        Ok(())
    }
}
