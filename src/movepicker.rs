/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::cmp::Reverse;

use crate::{Move, MoveList};

/// Weight applied to the material swing of a capture.
const CAPTURE_WEIGHT: i32 = 10;

/// Heuristic priority of `mv`. Higher scores are searched first.
///
/// Captures are scored by how much the victim outweighs the attacker, so trading a Pawn
/// for a Queen is tried early and trading a Queen for a Pawn is tried late.
/// Promotions earn the value of the new piece. Everything else scores `0`.
///
/// # Example
/// ```
/// # use tadpole::{score_move, Move, Position};
/// let pos: Position = "4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1".parse().unwrap();
/// let mv = Move::from_uci(&pos, "e4d5").unwrap();
/// assert_eq!(score_move(&mv), 10 * (900 - 100));
/// ```
#[inline(always)]
pub fn score_move(mv: &Move) -> i32 {
    let mut score = 0;

    if let Some(victim) = mv.captured() {
        score += CAPTURE_WEIGHT * (victim.value() - mv.piece().value());
    }

    if let Some(promotion) = mv.promotion() {
        score += promotion.value();
    }

    score
}

/// Sorts `moves` in place by [`score_move`], best first.
///
/// The sort is stable: moves with equal scores keep the order they were generated in.
/// Sorting an already-ordered list leaves it unchanged.
#[inline(always)]
pub fn order_moves(moves: &mut MoveList) {
    moves.sort_by_key(|mv| Reverse(score_move(mv)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Position, FEN_KIWIPETE};

    fn ordered(fen: &str) -> MoveList {
        let pos: Position = fen.parse().unwrap();
        let mut moves = pos.pseudo_legal_moves();
        order_moves(&mut moves);
        moves
    }

    #[test]
    fn test_scores_are_descending() {
        let moves = ordered(FEN_KIWIPETE);
        assert!(moves
            .windows(2)
            .all(|pair| score_move(&pair[0]) >= score_move(&pair[1])));
    }

    #[test]
    fn test_profitable_capture_first_and_losing_capture_last() {
        // The pawn can take the queen; the queen can take a defended pawn
        let moves = ordered("4k3/2p5/3p4/3q4/4P3/8/8/3QK3 w - - 0 1");
        assert_eq!(moves[0], "e4d5");

        let pos: Position = "4k3/8/3p4/8/8/8/8/3QK3 w - - 0 1".parse().unwrap();
        let queen_takes_pawn = Move::from_uci(&pos, "d1d6").unwrap();
        assert_eq!(score_move(&queen_takes_pawn), 10 * (100 - 900));
    }

    #[test]
    fn test_promotions_ranked_by_new_piece() {
        let moves = ordered("4k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(moves[0], "a7a8q");
        assert_eq!(moves[1], "a7a8r");
        assert_eq!(moves[2], "a7a8b");
        assert_eq!(moves[3], "a7a8n");
    }

    #[test]
    fn test_quiet_moves_keep_generation_order() {
        let pos = Position::default();
        let generated = pos.pseudo_legal_moves();
        let mut moves = generated.clone();
        order_moves(&mut moves);
        assert_eq!(moves, generated);
    }

    #[test]
    fn test_ordering_is_idempotent() {
        let once = ordered(FEN_KIWIPETE);
        let mut twice = once.clone();
        order_moves(&mut twice);
        assert_eq!(once, twice);
    }
}
