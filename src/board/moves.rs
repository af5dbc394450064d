/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{anyhow, bail, Result};

use super::{CastlingRights, Piece, PieceKind, Position, Square};

/// Capacity of a [`MoveList`].
///
/// The most pseudo-legal moves known in a reachable position is 218,
/// found [here](<https://www.chessprogramming.org/Chess_Position#cite_note-4>).
pub const MAX_NUM_MOVES: usize = 256;

/// An alias for an [`arrayvec::ArrayVec`] containing at most [`MAX_NUM_MOVES`] moves.
///
/// Exceeding the capacity panics, since it can only happen on a corrupt position.
pub type MoveList = arrayvec::ArrayVec<Move, MAX_NUM_MOVES>;

/// A self-describing move record.
///
/// Besides the squares involved, a [`Move`] remembers the piece that moved, the piece it captured,
/// and the parts of the [`Position`] that cannot be recomputed from the squares alone
/// (en passant target, castling rights and halfmove counter) as they were *before* the move.
/// That snapshot is what lets [`Position::unmake_move`] restore a position exactly.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub(crate) from: Square,
    pub(crate) to: Square,

    /// The piece standing on `from` before the move.
    pub(crate) piece: Piece,

    /// The piece removed by this move. For en passant, this pawn is not on `to`.
    pub(crate) captured: Option<Piece>,

    /// The piece a Pawn becomes on reaching the last rank.
    pub(crate) promotion: Option<Piece>,

    pub(crate) is_castle: bool,
    pub(crate) is_en_passant: bool,

    pub(crate) prev_ep_square: Option<Square>,
    pub(crate) prev_castling_rights: CastlingRights,
    pub(crate) prev_halfmove: usize,
}

impl Move {
    /// Creates a plain move of `piece` from `from` to `to` in `position`, capturing `captured`.
    ///
    /// The position's en passant target, castling rights and halfmove counter are copied into the move.
    #[inline(always)]
    pub(crate) const fn new(
        position: &Position,
        from: Square,
        to: Square,
        piece: Piece,
        captured: Option<Piece>,
    ) -> Self {
        Self {
            from,
            to,
            piece,
            captured,
            promotion: None,
            is_castle: false,
            is_en_passant: false,
            prev_ep_square: position.ep_square(),
            prev_castling_rights: position.castling_rights(),
            prev_halfmove: position.halfmove(),
        }
    }

    /// Fetches the source (or "from") part of this [`Move`], as a [`Square`].
    #[inline(always)]
    pub const fn from(&self) -> Square {
        self.from
    }

    /// Fetches the destination (or "to") part of this [`Move`], as a [`Square`].
    #[inline(always)]
    pub const fn to(&self) -> Square {
        self.to
    }

    /// The piece that made this move.
    #[inline(always)]
    pub const fn piece(&self) -> Piece {
        self.piece
    }

    /// The piece this move removes from the board, if any.
    #[inline(always)]
    pub const fn captured(&self) -> Option<Piece> {
        self.captured
    }

    /// The piece the moving Pawn becomes, if this is a promotion.
    #[inline(always)]
    pub const fn promotion(&self) -> Option<Piece> {
        self.promotion
    }

    #[inline(always)]
    pub const fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    #[inline(always)]
    pub const fn is_promotion(&self) -> bool {
        self.promotion.is_some()
    }

    #[inline(always)]
    pub const fn is_castle(&self) -> bool {
        self.is_castle
    }

    #[inline(always)]
    pub const fn is_en_passant(&self) -> bool {
        self.is_en_passant
    }

    /// Creates a [`Move`] from a string in long algebraic notation, such as `e2e4` or `e7e8q`,
    /// by finding the matching pseudo-legal move in `position`.
    ///
    /// A promoting move without a promotion character promotes to a Queen.
    ///
    /// # Example
    /// ```
    /// # use tadpole::{Move, Position};
    /// let pos = Position::default();
    /// let mv = Move::from_uci(&pos, "b1c3").unwrap();
    /// assert_eq!(mv.to_string(), "b1c3");
    /// assert!(Move::from_uci(&pos, "e2e5").is_err());
    /// ```
    pub fn from_uci(position: &Position, uci: &str) -> Result<Self> {
        let from = uci
            .get(0..2)
            .ok_or(anyhow!("Move str must contain a `from` square. Got {uci:?}"))?
            .parse::<Square>()?;

        let to = uci
            .get(2..4)
            .ok_or(anyhow!("Move str must contain a `to` square. Got {uci:?}"))?
            .parse::<Square>()?;

        let promotion = match uci.get(4..) {
            None | Some("") => None,
            Some(p) => {
                let kind = p.parse::<PieceKind>()?;
                if !PieceKind::promotions().contains(&kind) {
                    bail!("Cannot promote to a {}. Got {uci:?}", kind.name());
                }
                Some(kind)
            }
        };

        position
            .pseudo_legal_moves()
            .into_iter()
            .find(|mv| {
                mv.from == from
                    && mv.to == to
                    && mv.promotion.map(|p| p.kind())
                        == promotion.or(mv.is_promotion().then_some(PieceKind::Queen))
            })
            .ok_or(anyhow!(
                "{uci:?} is not a pseudo-legal move in position {position}"
            ))
    }

    /// Converts this [`Move`] to a string in long algebraic notation: source square,
    /// destination square and, for promotions only, a lowercase letter naming the new piece.
    ///
    /// # Example
    /// ```
    /// # use tadpole::{Move, Position};
    /// let pos: Position = "8/4P3/8/8/8/8/8/k6K w - - 0 1".parse().unwrap();
    /// let mv = Move::from_uci(&pos, "e7e8").unwrap();
    /// assert_eq!(mv.to_uci(), "e7e8q");
    /// ```
    pub fn to_uci(&self) -> String {
        match self.promotion {
            Some(promotion) => format!("{}{}{}", self.from, self.to, promotion.kind()),
            None => format!("{}{}", self.from, self.to),
        }
    }
}

impl fmt::Display for Move {
    /// Calls [`Move::to_uci`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_uci().fmt(f)
    }
}

impl fmt::Debug for Move {
    /// Displays the move along with its flags and snapshot.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self} ({}", self.piece.name())?;
        if let Some(victim) = self.captured {
            write!(f, " takes {}", victim.name())?;
        }
        if self.is_castle {
            write!(f, ", castle")?;
        }
        if self.is_en_passant {
            write!(f, ", en passant")?;
        }
        write!(
            f,
            "; prev ep {:?}, rights {}, halfmove {})",
            self.prev_ep_square.map(|sq| sq.to_uci()),
            self.prev_castling_rights,
            self.prev_halfmove
        )
    }
}

impl<T: AsRef<str>> PartialEq<T> for Move {
    /// Compares a [`Move`] with its long algebraic notation.
    fn eq(&self, other: &T) -> bool {
        self.to_uci() == other.as_ref()
    }
}
