/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt::{self, Write},
    ops::{Deref, DerefMut},
    str::FromStr,
};

use anyhow::{anyhow, bail, Context, Result};

use super::{Color, Move, Piece, PieceKind, Square, FEN_STARTPOS};

/// Castling rights for both players, stored as four independent flags.
///
/// ```text
///     0000 1111
///          ||||
///          |||+- White may castle short (kingside)
///          ||+- White may castle long (queenside)
///          |+- Black may castle short (kingside)
///          +- Black may castle long (queenside)
/// ```
///
/// Rights are only ever cleared while playing moves. Undoing a move restores the previous set wholesale.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: Self = Self(0);

    const SHORT: u8 = 0b01;
    const LONG: u8 = 0b10;

    #[inline(always)]
    const fn shift(color: Color) -> u8 {
        color.index() as u8 * 2
    }

    /// Returns `true` if `color` may still castle short (toward the H-file).
    #[inline(always)]
    pub const fn short(&self, color: Color) -> bool {
        self.0 & (Self::SHORT << Self::shift(color)) != 0
    }

    /// Returns `true` if `color` may still castle long (toward the A-file).
    #[inline(always)]
    pub const fn long(&self, color: Color) -> bool {
        self.0 & (Self::LONG << Self::shift(color)) != 0
    }

    /// Returns `true` if `color` has any castling rights remaining.
    #[inline(always)]
    pub const fn any(&self, color: Color) -> bool {
        self.short(color) || self.long(color)
    }

    #[inline(always)]
    pub fn set_short(&mut self, color: Color) {
        self.0 |= Self::SHORT << Self::shift(color);
    }

    #[inline(always)]
    pub fn set_long(&mut self, color: Color) {
        self.0 |= Self::LONG << Self::shift(color);
    }

    /// Removes both of `color`'s rights.
    #[inline(always)]
    pub fn clear(&mut self, color: Color) {
        self.0 &= !((Self::SHORT | Self::LONG) << Self::shift(color));
    }

    #[inline(always)]
    pub fn clear_short(&mut self, color: Color) {
        self.0 &= !(Self::SHORT << Self::shift(color));
    }

    #[inline(always)]
    pub fn clear_long(&mut self, color: Color) {
        self.0 &= !(Self::LONG << Self::shift(color));
    }

    /// Clears whichever right belongs to a Rook standing on `square` at the start of the game.
    #[inline(always)]
    pub(crate) fn clear_for_rook_on(&mut self, color: Color, square: Square) {
        if square == Square::rook_short_home(color) {
            self.clear_short(color);
        } else if square == Square::rook_long_home(color) {
            self.clear_long(color);
        }
    }

    /// Returns these rights with White's and Black's swapped.
    #[inline(always)]
    pub const fn mirrored(self) -> Self {
        Self((self.0 & 0b0011) << 2 | (self.0 & 0b1100) >> 2)
    }

    /// Parses the castling field of a FEN string, such as `KQkq` or `-`.
    pub fn from_uci(castling: &str) -> Result<Self> {
        let mut rights = Self::NONE;
        if castling == "-" {
            return Ok(rights);
        }

        for c in castling.chars() {
            match c {
                'K' => rights.set_short(Color::White),
                'Q' => rights.set_long(Color::White),
                'k' => rights.set_short(Color::Black),
                'q' => rights.set_long(Color::Black),
                _ => bail!("Invalid char {c:?} in castling rights {castling:?}"),
            }
        }

        Ok(rights)
    }

    /// Formats these rights as the castling field of a FEN string.
    pub fn to_uci(&self) -> String {
        let mut s = String::with_capacity(4);
        if self.short(Color::White) {
            s.push('K');
        }
        if self.long(Color::White) {
            s.push('Q');
        }
        if self.short(Color::Black) {
            s.push('k');
        }
        if self.long(Color::Black) {
            s.push('q');
        }

        if s.is_empty() {
            s.push('-');
        }
        s
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_uci().fmt(f)
    }
}

impl fmt::Debug for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#06b})", self.to_uci(), self.0)
    }
}

impl Square {
    /// Where `color`'s King starts the game.
    #[inline(always)]
    pub const fn king_home(color: Color) -> Self {
        match color {
            Color::White => Self::E1,
            Color::Black => Self::E8,
        }
    }

    /// Where `color`'s short-side Rook starts the game.
    #[inline(always)]
    pub const fn rook_short_home(color: Color) -> Self {
        match color {
            Color::White => Self::H1,
            Color::Black => Self::H8,
        }
    }

    /// Where `color`'s long-side Rook starts the game.
    #[inline(always)]
    pub const fn rook_long_home(color: Color) -> Self {
        match color {
            Color::White => Self::A1,
            Color::Black => Self::A8,
        }
    }
}

/// The full state of a game: piece placement, side to move, castling rights,
/// en passant target and move counters.
///
/// The board is a mailbox of 64 cells indexed by [`Square`].
/// Moves are applied and undone in place with [`Position::make_move`] and [`Position::unmake_move`],
/// which must always be paired in last-in, first-out order. [`Position::scoped`] enforces that pairing.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Contents of every square, `None` if empty.
    squares: [Option<Piece>; Square::COUNT],

    /// The [`Color`] of the current player.
    side_to_move: Color,

    /// Castling rights for both players.
    castling_rights: CastlingRights,

    /// Square a Pawn may capture onto via en passant, only for the ply following a double push.
    ep_square: Option<Square>,

    /// Used to enforce the fifty-move rule.
    ///
    /// - Incremented after each move.
    /// - Reset after a capture or a pawn moves.
    halfmove: usize,

    /// Number of moves since the beginning of the game.
    ///
    /// A fullmove is a complete turn by white and then by black.
    fullmove: usize,
}

impl Position {
    /// Creates a new, empty [`Position`] with the following properties:
    /// * No pieces on the board
    /// * White moves first
    /// * No castling rights
    /// * No en passant square available
    /// * Halfmove counter set to 0
    /// * Fullmove counter set to 1
    ///
    /// # Example
    /// ```
    /// # use tadpole::Position;
    /// let pos = Position::new();
    /// assert_eq!(pos.to_fen(), "8/8/8/8/8/8/8/8 w - - 0 1");
    /// ```
    #[inline(always)]
    pub const fn new() -> Self {
        Self {
            squares: [None; Square::COUNT],
            side_to_move: Color::White,
            castling_rights: CastlingRights::NONE,
            ep_square: None,
            halfmove: 0,
            fullmove: 1,
        }
    }

    /// Creates a new [`Position`] from the provided FEN string.
    ///
    /// Only the piece placements are required. Missing trailing fields default to `w - - 0 1`.
    ///
    /// # Example
    /// ```
    /// # use tadpole::{Position, Square, Piece};
    /// let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 3 40").unwrap();
    /// assert_eq!(pos.piece_at(Square::E1), Some(Piece::WHITE_KING));
    /// assert_eq!(pos.halfmove(), 3);
    /// assert_eq!(pos.fullmove(), 40);
    /// ```
    pub fn from_fen(fen: &str) -> Result<Self> {
        let mut pos = Self::new();
        let mut split = fen.split_ascii_whitespace();

        let placements = split
            .next()
            .ok_or(anyhow!("FEN string must have piece placements."))?;
        pos.parse_placements(placements)
            .with_context(|| format!("Invalid piece placements in FEN {fen:?}"))?;

        let active_color = split.next().unwrap_or("w");
        pos.side_to_move = active_color.parse()?;

        let castling = split.next().unwrap_or("-");
        pos.castling_rights = CastlingRights::from_uci(castling)?;

        let en_passant_target = split.next().unwrap_or("-");
        pos.ep_square = match en_passant_target {
            "-" => None,
            square => Some(Square::from_uci(square)?),
        };

        let halfmove = split.next().unwrap_or("0");
        pos.halfmove = halfmove.parse().or(Err(anyhow!(
            "FEN string must have valid halfmove counter. Got {halfmove:?}"
        )))?;

        let fullmove = split.next().unwrap_or("1");
        pos.fullmove = fullmove.parse().or(Err(anyhow!(
            "FEN string must have valid fullmove counter. Got {fullmove:?}"
        )))?;

        Ok(pos)
    }

    /// Fills the board from the first field of a FEN string.
    fn parse_placements(&mut self, placements: &str) -> Result<()> {
        let ranks = placements.split('/').collect::<Vec<_>>();
        if ranks.len() != 8 {
            bail!("Expected 8 ranks, got {}", ranks.len());
        }

        // FEN lists the eighth rank first
        for (i, rank_str) in ranks.into_iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file = 0u8;

            for c in rank_str.chars() {
                if let Some(empty) = c.to_digit(10) {
                    if file as u32 + empty > 8 {
                        bail!("Rank {rank_str:?} describes more than 8 files");
                    }
                    file += empty as u8;
                } else {
                    if file >= 8 {
                        bail!("Rank {rank_str:?} describes more than 8 files");
                    }
                    self.place(Piece::from_uci(c)?, Square::new(file, rank));
                    file += 1;
                }
            }

            if file != 8 {
                bail!("Rank {rank_str:?} describes {file} files instead of 8");
            }
        }

        Ok(())
    }

    /// Generates a FEN string from this [`Position`].
    ///
    /// # Example
    /// ```
    /// # use tadpole::Position;
    /// let pos = Position::default();
    /// assert_eq!(pos.to_fen(), "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
    /// ```
    pub fn to_fen(&self) -> String {
        format!("{self}")
    }

    /// Returns the colour-swapped, vertically flipped copy of this position.
    ///
    /// Every piece is moved to the mirrored square and handed to the other player,
    /// and the side to move, castling rights and en passant target are mirrored with it.
    /// The mirrored position is the same game seen from the other side of the board.
    ///
    /// # Example
    /// ```
    /// # use tadpole::Position;
    /// let pos: Position = "4k3/8/8/8/3P4/8/8/4K2R w K - 0 1".parse().unwrap();
    /// assert_eq!(pos.mirrored().to_fen(), "4k2r/8/8/3p4/8/8/8/4K3 b k - 0 1");
    /// ```
    pub fn mirrored(&self) -> Self {
        let mut squares = [None; Square::COUNT];
        for square in Square::iter() {
            squares[square.flipped_rank()] = self.squares[square].map(Piece::inverted);
        }

        Self {
            squares,
            side_to_move: self.side_to_move.opponent(),
            castling_rights: self.castling_rights.mirrored(),
            ep_square: self.ep_square.map(Square::flipped_rank),
            halfmove: self.halfmove,
            fullmove: self.fullmove,
        }
    }

    /// Returns the current player as a [`Color`].
    #[inline(always)]
    pub const fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// Returns the en passant target square, if one exists.
    #[inline(always)]
    pub const fn ep_square(&self) -> Option<Square> {
        self.ep_square
    }

    /// Returns the castling rights of both players.
    #[inline(always)]
    pub const fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    /// Returns the halfmove counter of this position.
    #[inline(always)]
    pub const fn halfmove(&self) -> usize {
        self.halfmove
    }

    /// Returns the fullmove counter of this position.
    #[inline(always)]
    pub const fn fullmove(&self) -> usize {
        self.fullmove
    }

    /// Fetches the [`Piece`] on `square`, if there is one.
    #[inline(always)]
    pub const fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square.index()]
    }

    /// Returns `true` if `square` is empty.
    #[inline(always)]
    pub const fn is_empty(&self, square: Square) -> bool {
        self.piece_at(square).is_none()
    }

    /// Iterates over every occupied square and the piece standing on it.
    #[inline(always)]
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::iter().filter_map(|sq| self.piece_at(sq).map(|piece| (sq, piece)))
    }

    /// Locates `color`'s King. If there is more than one, the lowest square is returned.
    #[inline(always)]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        let king = Piece::new(color, PieceKind::King);
        self.pieces()
            .find_map(|(sq, piece)| (piece == king).then_some(sq))
    }

    /// Toggles the current player from White to Black (or vice versa).
    ///
    /// This is equivalent to passing the turn, and leaves every other field untouched.
    #[inline(always)]
    pub fn toggle_side_to_move(&mut self) {
        self.side_to_move = self.side_to_move.opponent();
    }

    /// Places `piece` on `square`, replacing whatever was there.
    #[inline(always)]
    pub fn place(&mut self, piece: Piece, square: Square) {
        self.squares[square] = Some(piece);
    }

    /// Removes and returns the piece on `square`, if any.
    #[inline(always)]
    pub fn take(&mut self, square: Square) -> Option<Piece> {
        self.squares[square].take()
    }

    /// Applies the move in place. No enforcement of legality.
    ///
    /// `mv` must have been generated from this exact position, since it carries
    /// the state snapshot that [`Position::unmake_move`] restores.
    pub fn make_move(&mut self, mv: &Move) {
        debug_assert_eq!(
            (mv.prev_ep_square, mv.prev_castling_rights, mv.prev_halfmove),
            (self.ep_square, self.castling_rights, self.halfmove),
            "Attempted to make {mv:?}, which was generated from a different position"
        );

        let piece = mv.piece;
        let color = piece.color();
        let (from, to) = (mv.from, mv.to);

        // The EP square only lives for one ply
        self.ep_square = None;

        self.squares[from] = None;

        // An en passant victim stands beside `from`, behind `to`; any other victim is simply overwritten
        if mv.is_en_passant {
            if let Some(victim_square) = to.backward_by(color, 1) {
                self.squares[victim_square] = None;
            }
        }

        self.place(mv.promotion.unwrap_or(piece), to);

        if mv.is_castle {
            let (rook_from, rook_to) = castling_rook_squares(from, to);
            if let Some(rook) = self.take(rook_from) {
                self.place(rook, rook_to);
            }
        }

        // Rights are only ever cleared here
        match piece.kind() {
            PieceKind::King => self.castling_rights.clear(color),
            PieceKind::Rook => self.castling_rights.clear_for_rook_on(color, from),
            _ => {}
        }

        if let Some(victim) = mv.captured.filter(|victim| victim.is_rook()) {
            self.castling_rights.clear_for_rook_on(victim.color(), to);
        }

        if piece.is_pawn() && from.distance_ranks(to) == 2 {
            self.ep_square = Some(Square::from_index_unchecked((from.index() + to.index()) / 2));
        }

        if piece.is_pawn() || mv.is_capture() {
            self.halfmove = 0;
        } else {
            self.halfmove += 1;
        }

        self.toggle_side_to_move();
        if self.side_to_move.is_white() {
            self.fullmove += 1;
        }
    }

    /// Reverts `mv`, which must be the most recent move applied with [`Position::make_move`].
    pub fn unmake_move(&mut self, mv: &Move) {
        // Undoing Black's move steps back into the previous fullmove
        if self.side_to_move.is_white() {
            self.fullmove -= 1;
        }
        self.toggle_side_to_move();

        self.ep_square = mv.prev_ep_square;
        self.castling_rights = mv.prev_castling_rights;
        self.halfmove = mv.prev_halfmove;

        if mv.is_castle {
            let (rook_from, rook_to) = castling_rook_squares(mv.from, mv.to);
            if let Some(rook) = self.take(rook_to) {
                self.place(rook, rook_from);
            }
        }

        if mv.is_en_passant {
            self.squares[mv.to] = None;
            if let Some(victim_square) = mv.to.backward_by(mv.piece.color(), 1) {
                self.squares[victim_square] = mv.captured;
            }
        } else {
            self.squares[mv.to] = mv.captured;
        }

        self.place(mv.piece, mv.from);
    }

    /// Applies `mv` and returns a guard that undoes it when dropped.
    ///
    /// The guard dereferences to the position after the move, so a search can recurse through it.
    /// Because the guard holds the only borrow of `self`, moves are necessarily undone in
    /// last-in, first-out order, on every exit path.
    ///
    /// # Example
    /// ```
    /// # use tadpole::Position;
    /// let mut pos = Position::default();
    /// let mv = pos.pseudo_legal_moves()[0];
    /// {
    ///     let child = pos.scoped(mv);
    ///     assert_ne!(*child, Position::default());
    /// }
    /// assert_eq!(pos, Position::default());
    /// ```
    #[inline(always)]
    pub fn scoped(&mut self, mv: Move) -> ScopedMove<'_> {
        self.make_move(&mv);
        ScopedMove { position: self, mv }
    }
}

/// Source and destination of the Rook when the King travels from `king_from` to `king_to`.
#[inline(always)]
fn castling_rook_squares(king_from: Square, king_to: Square) -> (Square, Square) {
    let rank = king_from.rank();
    if king_to.file() > king_from.file() {
        (Square::new(7, rank), Square::new(king_to.file() - 1, rank))
    } else {
        (Square::new(0, rank), Square::new(king_to.file() + 1, rank))
    }
}

/// A move applied to a [`Position`] that is undone when this guard is dropped.
///
/// Created by [`Position::scoped`].
pub struct ScopedMove<'a> {
    position: &'a mut Position,
    mv: Move,
}

impl ScopedMove<'_> {
    /// The move this guard applied.
    #[inline(always)]
    pub const fn applied(&self) -> &Move {
        &self.mv
    }
}

impl Deref for ScopedMove<'_> {
    type Target = Position;
    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        self.position
    }
}

impl DerefMut for ScopedMove<'_> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.position
    }
}

impl Drop for ScopedMove<'_> {
    #[inline(always)]
    fn drop(&mut self) {
        self.position.unmake_move(&self.mv);
    }
}

impl FromStr for Position {
    type Err = anyhow::Error;
    /// Wrapper for [`Position::from_fen`].
    #[inline(always)]
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}

impl Default for Position {
    /// The standard starting position.
    #[inline(always)]
    fn default() -> Self {
        // Safe unwrap: the starting FEN is a valid constant
        Self::from_fen(FEN_STARTPOS).unwrap()
    }
}

impl fmt::Display for Position {
    /// By default, a [`Position`] displays as its FEN string.
    ///
    /// The alternate format (`{:#}`) draws the board instead.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            return self.fmt_diagram(f);
        }

        let mut placements = String::with_capacity(72);
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                if let Some(piece) = self.piece_at(Square::new(file, rank)) {
                    if empty != 0 {
                        write!(placements, "{empty}")?;
                        empty = 0;
                    }
                    placements.push(piece.to_uci());
                } else {
                    empty += 1;
                }
            }
            if empty != 0 {
                write!(placements, "{empty}")?;
            }
            if rank != 0 {
                placements.push('/');
            }
        }

        let ep = self
            .ep_square
            .map(|sq| sq.to_uci())
            .unwrap_or_else(|| String::from("-"));

        write!(
            f,
            "{placements} {} {} {ep} {} {}",
            self.side_to_move.to_uci(),
            self.castling_rights,
            self.halfmove,
            self.fullmove
        )
    }
}

impl Position {
    fn fmt_diagram(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            write!(f, "{}|", rank + 1)?;
            for file in 0..8 {
                let c = self
                    .piece_at(Square::new(file, rank))
                    .map(|p| p.to_uci())
                    .unwrap_or('.');
                write!(f, " {c}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, " +----------------")?;
        writeln!(f, "   a b c d e f g h")?;
        writeln!(f)?;
        write!(f, "FEN: {self}")
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:#}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FEN_KIWIPETE;

    fn make(pos: &mut Position, uci: &str) -> Move {
        let mv = Move::from_uci(pos, uci).unwrap();
        pos.make_move(&mv);
        mv
    }

    #[test]
    fn test_fen_round_trip() {
        for fen in [
            FEN_STARTPOS,
            FEN_KIWIPETE,
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
        ] {
            let pos = Position::from_fen(fen).unwrap();
            assert_eq!(pos.to_fen(), fen);
        }
    }

    #[test]
    fn test_invalid_fens() {
        assert!(Position::from_fen("").is_err());
        assert!(Position::from_fen("8/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(Position::from_fen("9/8/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(Position::from_fen("8/8/8/8/8/8/8/8 x - - 0 1").is_err());
        assert!(Position::from_fen("8/8/8/8/8/8/8/8 w X - 0 1").is_err());
        assert!(Position::from_fen("8/8/8/8/8/8/8/8 w - z9 0 1").is_err());
        assert!(Position::from_fen("8/8/8/8/8/8/8/8 w - - a 1").is_err());
        assert!(Position::from_fen("ppppppppp/8/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(Position::from_fen("44p/8/8/8/8/8/8/8 w - - 0 1").is_err());

        // Long runs of digits must not overflow the file counter
        let digits = format!("{}/8/8/8/8/8/8/8 w - - 0 1", "9".repeat(40));
        assert!(Position::from_fen(&digits).is_err());
    }

    #[test]
    fn test_counters_and_ep_after_double_push() {
        let mut pos = Position::default();

        make(&mut pos, "e2e4");
        assert_eq!(pos.ep_square(), Some(Square::from_uci("e3").unwrap()));
        assert_eq!(pos.halfmove(), 0);
        assert_eq!(pos.fullmove(), 1);
        assert_eq!(pos.side_to_move(), Color::Black);

        make(&mut pos, "g8f6");
        assert_eq!(pos.ep_square(), None);
        assert_eq!(pos.halfmove(), 1);
        assert_eq!(pos.fullmove(), 2);
        assert_eq!(pos.side_to_move(), Color::White);
    }

    #[test]
    fn test_unmake_restores_every_field() {
        let original = Position::from_fen(FEN_KIWIPETE).unwrap();
        let mut pos = original;

        for mv in original.pseudo_legal_moves() {
            pos.make_move(&mv);
            pos.unmake_move(&mv);
            assert_eq!(pos, original, "Unmaking {mv:?} did not restore the position");
        }
    }

    #[test]
    fn test_castling_moves_rook() {
        let mut pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let original = pos;

        let short = make(&mut pos, "e1g1");
        assert!(short.is_castle());
        assert_eq!(pos.piece_at(Square::G1), Some(Piece::WHITE_KING));
        assert_eq!(pos.piece_at(Square::F1), Some(Piece::WHITE_ROOK));
        assert_eq!(pos.piece_at(Square::H1), None);
        assert_eq!(pos.castling_rights().to_uci(), "kq");

        let long = make(&mut pos, "e8c8");
        assert!(long.is_castle());
        assert_eq!(pos.piece_at(Square::C8), Some(Piece::BLACK_KING));
        assert_eq!(pos.piece_at(Square::D8), Some(Piece::BLACK_ROOK));
        assert_eq!(pos.piece_at(Square::A8), None);
        assert_eq!(pos.castling_rights().to_uci(), "-");

        pos.unmake_move(&long);
        pos.unmake_move(&short);
        assert_eq!(pos, original);
    }

    // Castling rights are lost when:
    //  1. The King was moved
    //  2. A Rook was moved off its starting square
    //  3. A Rook was captured on its starting square

    #[test]
    fn test_castling_rights_update_on_king_move() {
        let mut pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();

        make(&mut pos, "e1d1");
        assert_eq!(pos.castling_rights().to_uci(), "kq");

        make(&mut pos, "e8f8");
        assert_eq!(pos.castling_rights().to_uci(), "-");

        // Moving the King back should NOT restore castling rights
        make(&mut pos, "d1e1");
        make(&mut pos, "f8e8");
        assert_eq!(pos.castling_rights().to_uci(), "-");
    }

    #[test]
    fn test_castling_rights_update_on_rook_move() {
        let mut pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();

        make(&mut pos, "a1b1");
        assert_eq!(pos.castling_rights().to_uci(), "Kkq");

        make(&mut pos, "h8g8");
        assert_eq!(pos.castling_rights().to_uci(), "Kq");

        // Moving the Rook back should NOT re-enable castling for that side
        make(&mut pos, "b1a1");
        make(&mut pos, "g8h8");
        assert_eq!(pos.castling_rights().to_uci(), "Kq");
    }

    #[test]
    fn test_castling_rights_update_on_rook_captured() {
        let mut pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();

        // White used its A1 Rook to capture, so both sides lose their long rights
        let capture = make(&mut pos, "a1a8");
        assert_eq!(capture.captured(), Some(Piece::BLACK_ROOK));
        assert_eq!(pos.castling_rights().to_uci(), "Kk");

        pos.unmake_move(&capture);
        assert_eq!(pos.castling_rights().to_uci(), "KQkq");
    }

    #[test]
    fn test_promotion_and_unmake() {
        let mut pos = Position::from_fen("1n2k3/P7/8/8/8/8/8/4K3 w - - 5 30").unwrap();
        let original = pos;

        let mv = make(&mut pos, "a7b8n");
        assert_eq!(pos.piece_at(Square::B8), Some(Piece::WHITE_KNIGHT));
        assert_eq!(pos.halfmove(), 0);

        pos.unmake_move(&mv);
        assert_eq!(pos, original);
        assert_eq!(pos.piece_at(Square::A8.offset(0, -1).unwrap()), Some(Piece::WHITE_PAWN));
    }

    #[test]
    fn test_scoped_move_undoes_on_drop() {
        let mut pos = Position::from_fen(FEN_KIWIPETE).unwrap();
        let original = pos;

        for mv in original.pseudo_legal_moves() {
            let mut child = pos.scoped(mv);
            assert_eq!(child.applied(), &mv);
            assert_ne!(*child, original);

            // Nested scopes unwind in order
            for reply in child.pseudo_legal_moves().into_iter().take(3) {
                let grandchild = child.scoped(reply);
                assert_eq!(grandchild.side_to_move(), original.side_to_move());
            }
        }

        assert_eq!(pos, original);
    }

    #[test]
    fn test_mirrored_is_an_involution() {
        for fen in [FEN_STARTPOS, FEN_KIWIPETE, "8/8/8/3pP3/8/8/8/k6K w - d6 0 1"] {
            let pos = Position::from_fen(fen).unwrap();
            assert_eq!(pos.mirrored().mirrored(), pos);
        }
    }

    #[test]
    fn test_mirrored_ep_and_rights() {
        let pos = Position::from_fen("8/8/8/3pP3/8/8/8/R3K2k w Q d6 0 1").unwrap();
        let mirrored = pos.mirrored();
        assert_eq!(mirrored.ep_square(), Some(Square::from_uci("d3").unwrap()));
        assert_eq!(mirrored.castling_rights().to_uci(), "q");
        assert_eq!(mirrored.side_to_move(), Color::Black);
    }

    #[test]
    fn test_king_square() {
        let pos = Position::default();
        assert_eq!(pos.king_square(Color::White), Some(Square::E1));
        assert_eq!(pos.king_square(Color::Black), Some(Square::E8));
        assert_eq!(Position::new().king_square(Color::White), None);
    }
}
