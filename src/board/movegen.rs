/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{Color, Move, MoveList, Piece, PieceKind, Position, Square};

/// `(file, rank)` offsets of a Knight's jumps.
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

/// `(file, rank)` steps along diagonals.
const DIAGONAL_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

/// `(file, rank)` steps along ranks and files.
const ORTHOGONAL_DIRECTIONS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// `(file, rank)` steps in every direction. Used by Queens and Kings.
const ALL_DIRECTIONS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// What a [`MoveGen`] is asked to produce.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum GenMode {
    /// Every pseudo-legal move, including castling.
    PseudoLegal,

    /// Every square a piece attacks.
    ///
    /// Pawns emit their capture diagonals whether or not anything stands there, and never push.
    /// Castling is skipped, which keeps attack detection from recursing into itself.
    Attacks,
}

/// Walks a [`Position`] square by square, collecting moves for one side.
struct MoveGen<'a> {
    position: &'a Position,
    side: Color,
    mode: GenMode,
    moves: MoveList,
}

impl<'a> MoveGen<'a> {
    #[inline(always)]
    fn new(position: &'a Position, side: Color, mode: GenMode) -> Self {
        Self {
            position,
            side,
            mode,
            moves: MoveList::new(),
        }
    }

    /// Generate moves for every piece belonging to `self.side`.
    fn run(mut self) -> MoveList {
        let position = self.position;

        for (from, piece) in position.pieces() {
            if piece.color() != self.side {
                continue;
            }

            match piece.kind() {
                PieceKind::Pawn => self.pawn_moves(from, piece),
                PieceKind::Knight => self.jump_moves(from, piece, &KNIGHT_OFFSETS),
                PieceKind::Bishop => self.slider_moves(from, piece, &DIAGONAL_DIRECTIONS),
                PieceKind::Rook => self.slider_moves(from, piece, &ORTHOGONAL_DIRECTIONS),
                PieceKind::Queen => self.slider_moves(from, piece, &ALL_DIRECTIONS),
                PieceKind::King => {
                    self.jump_moves(from, piece, &ALL_DIRECTIONS);
                    if self.mode == GenMode::PseudoLegal {
                        self.castling_moves(from, piece);
                    }
                }
            }
        }

        self.moves
    }

    /// Returns the enemy piece on `square`, or `Err(())` if a friendly piece blocks it.
    #[inline(always)]
    fn victim_at(&self, square: Square) -> Result<Option<Piece>, ()> {
        match self.position.piece_at(square) {
            Some(piece) if piece.color() == self.side => Err(()),
            other => Ok(other),
        }
    }

    #[inline(always)]
    fn push(&mut self, mv: Move) {
        self.moves.push(mv);
    }

    /// Pushes a Pawn move, expanding it into one move per promotion piece if it reaches the last rank.
    #[inline(always)]
    fn push_pawn_move(&mut self, from: Square, to: Square, piece: Piece, captured: Option<Piece>) {
        let mv = Move::new(self.position, from, to, piece, captured);

        if to.forward_by(self.side, 1).is_none() {
            for kind in PieceKind::promotions() {
                self.push(Move {
                    promotion: Some(piece.promoted(kind)),
                    ..mv
                });
            }
        } else {
            self.push(mv);
        }
    }

    fn pawn_moves(&mut self, from: Square, piece: Piece) {
        let forward = self.side.negation_multiplier();

        // Capture diagonals. `offset` returns `None` instead of wrapping around the board.
        for file_delta in [-1, 1] {
            let Some(to) = from.offset(file_delta, forward) else {
                continue;
            };

            if self.mode == GenMode::Attacks {
                self.push(Move::new(self.position, from, to, piece, None));
                continue;
            }

            match self.position.piece_at(to) {
                Some(victim) if victim.color() != self.side => {
                    self.push_pawn_move(from, to, piece, Some(victim));
                }

                None if self.position.ep_square() == Some(to) => {
                    // The victim is the pawn that just double-pushed past `to`
                    let victim = to
                        .backward_by(self.side, 1)
                        .and_then(|sq| self.position.piece_at(sq))
                        .filter(|p| p.is_pawn() && p.color() != self.side);

                    if victim.is_some() {
                        self.push(Move {
                            is_en_passant: true,
                            ..Move::new(self.position, from, to, piece, victim)
                        });
                    }
                }

                _ => {}
            }
        }

        if self.mode == GenMode::Attacks {
            return;
        }

        // Pushes
        let Some(single) = from.forward_by(self.side, 1) else {
            return;
        };
        if !self.position.is_empty(single) {
            return;
        }
        self.push_pawn_move(from, single, piece, None);

        let start_rank = match self.side {
            Color::White => 1,
            Color::Black => 6,
        };
        if from.rank() == start_rank {
            if let Some(double) = single.forward_by(self.side, 1) {
                if self.position.is_empty(double) {
                    self.push(Move::new(self.position, from, double, piece, None));
                }
            }
        }
    }

    /// Single-step moves to each offset. Used by Knights and Kings.
    fn jump_moves(&mut self, from: Square, piece: Piece, offsets: &[(i8, i8)]) {
        for &(df, dr) in offsets {
            let Some(to) = from.offset(df, dr) else {
                continue;
            };

            if let Ok(captured) = self.victim_at(to) {
                self.push(Move::new(self.position, from, to, piece, captured));
            }
        }
    }

    /// Rays in each direction, stopping at the edge of the board or the first occupied square.
    ///
    /// The occupied square is included only if it holds an enemy piece.
    fn slider_moves(&mut self, from: Square, piece: Piece, directions: &[(i8, i8)]) {
        for &(df, dr) in directions {
            let mut current = from;

            while let Some(to) = current.offset(df, dr) {
                let Ok(captured) = self.victim_at(to) else {
                    break;
                };

                self.push(Move::new(self.position, from, to, piece, captured));

                if captured.is_some() {
                    break;
                }
                current = to;
            }
        }
    }

    /// Castling, when the right remains, a friendly Rook waits in its corner, every square between
    /// the King and the Rook is empty, and the King neither starts, passes through, nor lands on
    /// an attacked square.
    fn castling_moves(&mut self, from: Square, piece: Piece) {
        let rights = self.position.castling_rights();
        if from != Square::king_home(self.side) || !rights.any(self.side) {
            return;
        }

        let rook = Piece::new(self.side, PieceKind::Rook);
        let rank = from.rank();
        let square = |file: u8| Square::new(file, rank);

        let is_attacked = |sq: Square| self.position.is_square_attacked(sq, self.side);

        // Only computed once a castle is otherwise possible
        let mut origin_attacked = None;
        let mut king_safe_on = |path: &[Square]| -> bool {
            !*origin_attacked.get_or_insert_with(|| is_attacked(from))
                && path.iter().all(|&sq| !is_attacked(sq))
        };

        let mut castles = [None, None];

        if rights.short(self.side)
            && self.position.piece_at(square(7)) == Some(rook)
            && (5..=6).all(|f| self.position.is_empty(square(f)))
            && king_safe_on(&[square(5), square(6)])
        {
            castles[0] = Some(square(6));
        }

        if rights.long(self.side)
            && self.position.piece_at(square(0)) == Some(rook)
            && (1..=3).all(|f| self.position.is_empty(square(f)))
            && king_safe_on(&[square(3), square(2)])
        {
            castles[1] = Some(square(2));
        }

        for to in castles.into_iter().flatten() {
            self.push(Move {
                is_castle: true,
                ..Move::new(self.position, from, to, piece, None)
            });
        }
    }
}

impl Position {
    /// Generate all pseudo-legal moves for the side to move.
    ///
    /// Pseudo-legal moves are consistent with how each piece moves and with the occupancy of the board,
    /// but may leave the side-to-move's King attacked after being made.
    /// Castling is the exception: it is only generated if the King is safe on every square it touches.
    ///
    /// # Example
    /// ```
    /// # use tadpole::Position;
    /// assert_eq!(Position::default().pseudo_legal_moves().len(), 20);
    /// ```
    #[inline(always)]
    pub fn pseudo_legal_moves(&self) -> crate::MoveList {
        MoveGen::new(self, self.side_to_move(), GenMode::PseudoLegal).run()
    }

    /// Generate all legal moves for the side to move.
    ///
    /// This filters [`Position::pseudo_legal_moves`] by making each move and discarding those that
    /// leave the mover's King attacked. The search does not use this; it exists for perft and for display.
    pub fn legal_moves(&self) -> crate::MoveList {
        let side = self.side_to_move();
        let mut scratch = *self;

        self.pseudo_legal_moves()
            .into_iter()
            .filter(|&mv| !scratch.scoped(mv).is_in_check(side))
            .collect()
    }

    /// Returns `true` if any of `defender`'s opponent's pieces attack `square`.
    ///
    /// This generates every attack of the opponent, so it costs about as much as a full move generation.
    pub fn is_square_attacked(&self, square: Square, defender: Color) -> bool {
        MoveGen::new(self, defender.opponent(), GenMode::Attacks)
            .run()
            .iter()
            .any(|mv| mv.to() == square)
    }

    /// Returns `true` if `color`'s King is attacked. A side without a King is never in check.
    #[inline(always)]
    pub fn is_in_check(&self, color: Color) -> bool {
        self.king_square(color)
            .is_some_and(|king| self.is_square_attacked(king, color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FEN_ENDGAME_PINS, FEN_KIWIPETE, FEN_PROMOTIONS, FEN_STARTPOS};

    fn moves_from(pos: &Position, square: &str) -> Vec<String> {
        let from = Square::from_uci(square).unwrap();
        let mut moves = pos
            .pseudo_legal_moves()
            .into_iter()
            .filter(|mv| mv.from() == from)
            .map(|mv| mv.to_uci())
            .collect::<Vec<_>>();
        moves.sort();
        moves
    }

    #[test]
    fn test_startpos_has_twenty_moves() {
        let pos = Position::from_fen(FEN_STARTPOS).unwrap();
        assert_eq!(pos.pseudo_legal_moves().len(), 20);
        assert_eq!(pos.mirrored().pseudo_legal_moves().len(), 20);
    }

    #[test]
    fn test_knight_does_not_wrap() {
        let pos = Position::from_fen("k7/8/8/8/8/8/8/K6N w - - 0 1").unwrap();
        assert_eq!(moves_from(&pos, "h1"), ["h1f2", "h1g3"]);

        let pos = Position::from_fen("k7/8/8/N7/8/8/8/7K w - - 0 1").unwrap();
        assert_eq!(moves_from(&pos, "a5"), ["a5b3", "a5b7", "a5c4", "a5c6"]);
    }

    #[test]
    fn test_pawn_captures_do_not_wrap() {
        // A pawn on the H-file must not "capture" onto the A-file of the next rank
        let pos = Position::from_fen("k7/8/8/8/8/p7/7P/K7 w - - 0 1").unwrap();
        assert_eq!(moves_from(&pos, "h2"), ["h2h3", "h2h4"]);
    }

    #[test]
    fn test_sliders_stop_at_blockers() {
        let pos = Position::from_fen("k7/8/8/8/1p6/8/1R1P4/K7 w - - 0 1").unwrap();
        assert_eq!(
            moves_from(&pos, "b2"),
            ["b2a2", "b2b1", "b2b3", "b2b4", "b2c2"]
        );
    }

    #[test]
    fn test_queen_on_edge_does_not_wrap() {
        let pos = Position::from_fen("8/8/8/8/8/8/8/k2K3Q w - - 0 1").unwrap();
        let moves = moves_from(&pos, "h1");
        // 7 up the H-file, 7 along the diagonal, 3 along the first rank
        assert_eq!(moves.len(), 17);
        assert!(!moves.iter().any(|mv| mv == "h1a2"));
    }

    #[test]
    fn test_en_passant_generation() {
        let pos = Position::from_fen("k7/8/8/3pP3/8/8/8/K7 w - d6 0 2").unwrap();
        let eps = pos
            .pseudo_legal_moves()
            .into_iter()
            .filter(|mv| mv.is_en_passant())
            .collect::<Vec<_>>();

        assert_eq!(eps.len(), 1);
        assert_eq!(eps[0], "e5d6");
        assert_eq!(eps[0].captured(), Some(Piece::BLACK_PAWN));
    }

    #[test]
    fn test_promotions_offer_every_piece() {
        let pos = Position::from_fen("k7/4P3/8/8/8/8/8/K7 w - - 0 1").unwrap();
        assert_eq!(
            moves_from(&pos, "e7"),
            ["e7e8b", "e7e8n", "e7e8q", "e7e8r"]
        );

        // Queen is generated first
        let first = pos
            .pseudo_legal_moves()
            .into_iter()
            .find(|mv| mv.is_promotion())
            .unwrap();
        assert_eq!(first.promotion(), Some(Piece::WHITE_QUEEN));
    }

    #[test]
    fn test_castling_requires_empty_path() {
        let pos = Position::from_fen("r3k2r/8/8/8/8/8/8/RN2K1NR w KQkq - 0 1").unwrap();
        let castles = pos
            .pseudo_legal_moves()
            .into_iter()
            .filter(|mv| mv.is_castle())
            .count();
        assert_eq!(castles, 0);

        let pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        assert!(moves_from(&pos, "e1").contains(&String::from("e1g1")));
        assert!(moves_from(&pos, "e1").contains(&String::from("e1c1")));
    }

    #[test]
    fn test_castling_requires_rights_and_rook() {
        let pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w - - 0 1").unwrap();
        assert!(!pos.pseudo_legal_moves().iter().any(|mv| mv.is_castle()));

        let pos = Position::from_fen("r3k2r/8/8/8/8/8/8/4K3 w KQ - 0 1").unwrap();
        assert!(!pos.pseudo_legal_moves().iter().any(|mv| mv.is_castle()));
    }

    #[test]
    fn test_castling_blocked_by_attacks() {
        // Black rook covers f1: no short castle, long castle still fine
        let pos = Position::from_fen("k4r2/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        assert_eq!(
            moves_from(&pos, "e1")
                .into_iter()
                .filter(|mv| mv == "e1g1" || mv == "e1c1")
                .collect::<Vec<_>>(),
            ["e1c1"]
        );

        // In check: no castling at all
        let pos = Position::from_fen("k3r3/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        assert!(!pos.pseudo_legal_moves().iter().any(|mv| mv.is_castle()));

        // The b-file square may be attacked for long castling
        let pos = Position::from_fen("kr6/8/8/8/8/8/8/R3K3 w Q - 0 1").unwrap();
        assert!(moves_from(&pos, "e1").contains(&String::from("e1c1")));

        // A pawn covering an empty transit square counts as an attack
        let pos = Position::from_fen("k7/8/8/8/8/8/4p3/R3K3 w Q - 0 1").unwrap();
        assert!(!moves_from(&pos, "e1").contains(&String::from("e1c1")));
    }

    #[test]
    fn test_square_attacks() {
        let pos = Position::from_fen(FEN_STARTPOS).unwrap();
        // Pawns attack the third rank
        assert!(pos.is_square_attacked(Square::from_uci("e3").unwrap(), Color::Black));
        assert!(!pos.is_square_attacked(Square::from_uci("e4").unwrap(), Color::Black));
        // Pushing a pawn onto a square is not an attack on it
        assert!(!pos.is_square_attacked(Square::from_uci("a5").unwrap(), Color::White));
        assert!(!pos.is_in_check(Color::White));
    }

    #[test]
    fn test_move_count_symmetry() {
        for fen in [
            FEN_STARTPOS,
            FEN_KIWIPETE,
            FEN_ENDGAME_PINS,
            FEN_PROMOTIONS,
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
            "k7/8/8/3pP3/8/8/8/K7 w - d6 0 2",
        ] {
            let pos = Position::from_fen(fen).unwrap();
            let mirrored = pos.mirrored();
            assert_eq!(
                pos.pseudo_legal_moves().len(),
                mirrored.pseudo_legal_moves().len(),
                "Move counts differ between {fen} and {mirrored}"
            );
        }
    }

    #[test]
    fn test_legal_moves_filter_pins() {
        // The e2 knight is pinned to the King by the rook on e8
        let pos = Position::from_fen("k3r3/8/8/8/8/8/4N3/4K3 w - - 0 1").unwrap();
        let knight = Square::from_uci("e2").unwrap();
        assert!(pos.pseudo_legal_moves().iter().any(|mv| mv.from() == knight));
        assert!(!pos.legal_moves().iter().any(|mv| mv.from() == knight));
    }
}
