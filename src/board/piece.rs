/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::{Index, IndexMut, Not},
    str::FromStr,
};

use anyhow::{bail, Result};

/// Represents the color of a player or a piece.
///
/// White always moves first, and therefore [`Color`] defaults to [`Color::White`].
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Color {
    #[default]
    White,
    Black,
}

impl Color {
    /// Number of color variants.
    pub const COUNT: usize = 2;

    /// An array of both colors, starting with White.
    #[inline(always)]
    pub const fn all() -> [Self; Self::COUNT] {
        [Self::White, Self::Black]
    }

    /// Returns `true` if this [`Color`] is White.
    #[inline(always)]
    pub const fn is_white(&self) -> bool {
        matches!(self, Self::White)
    }

    /// Returns a multiplier for negating numbers relative to this color.
    ///
    /// # Example
    /// ```
    /// # use tadpole::Color;
    /// assert_eq!(Color::White.negation_multiplier(), 1);
    /// assert_eq!(Color::Black.negation_multiplier(), -1);
    /// ```
    #[inline(always)]
    pub const fn negation_multiplier(&self) -> i8 {
        match self {
            Self::White => 1,
            Self::Black => -1,
        }
    }

    /// Returns this [`Color`]'s opponent.
    ///
    /// # Example
    /// ```
    /// # use tadpole::Color;
    /// assert_eq!(Color::White.opponent(), Color::Black);
    /// assert_eq!(Color::Black.opponent(), Color::White);
    /// ```
    #[inline(always)]
    pub const fn opponent(&self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// Returns this [`Color`] as a `usize`: `0` for White, `1` for Black.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Creates a [`Color`] from a `char`, as found in the side-to-move field of a FEN string.
    ///
    /// # Example
    /// ```
    /// # use tadpole::Color;
    /// assert_eq!(Color::from_uci('b').unwrap(), Color::Black);
    /// assert!(Color::from_uci('x').is_err());
    /// ```
    #[inline(always)]
    pub fn from_uci(color: char) -> Result<Self> {
        match color {
            'w' | 'W' => Ok(Self::White),
            'b' | 'B' => Ok(Self::Black),
            _ => bail!("Invalid char for Color: Must be 'w' or 'b'. Got {color:?}."),
        }
    }

    /// Returns the [`Color`] that owns a piece char, based on its case.
    ///
    /// Uppercase is White, lowercase is Black.
    #[inline(always)]
    pub const fn from_case(c: char) -> Self {
        if c.is_ascii_uppercase() {
            Self::White
        } else {
            Self::Black
        }
    }

    /// Converts this [`Color`] to its FEN character.
    #[inline(always)]
    pub const fn to_uci(&self) -> char {
        match self {
            Self::White => 'w',
            Self::Black => 'b',
        }
    }

    /// Fetches a human-readable name for this [`Color`].
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }
}

impl Not for Color {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self::Output {
        self.opponent()
    }
}

/// The kind (or "role") of a chess piece, without a [`Color`]. See [`Piece`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Number of piece variants.
    pub const COUNT: usize = 6;

    /// An array of all 6 [`PieceKind`]s.
    #[inline(always)]
    pub const fn all() -> [Self; Self::COUNT] {
        [
            Self::Pawn,
            Self::Knight,
            Self::Bishop,
            Self::Rook,
            Self::Queen,
            Self::King,
        ]
    }

    /// The pieces a Pawn may become, from most to least valuable.
    #[inline(always)]
    pub const fn promotions() -> [Self; 4] {
        [Self::Queen, Self::Rook, Self::Bishop, Self::Knight]
    }

    /// Returns this [`PieceKind`] as a `usize`, for indexing into lists.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Material value of this [`PieceKind`].
    ///
    /// The King carries a large value so that losing it dominates any other material swing,
    /// while staying far below the search's infinity bound.
    ///
    /// # Example
    /// ```
    /// # use tadpole::PieceKind;
    /// assert_eq!(PieceKind::Pawn.value(), 100);
    /// assert_eq!(PieceKind::King.value(), 2000);
    /// ```
    #[inline(always)]
    pub const fn value(&self) -> i32 {
        match self {
            Self::Pawn => 100,
            Self::Knight => 200,
            Self::Bishop => 300,
            Self::Rook => 500,
            Self::Queen => 900,
            Self::King => 2000,
        }
    }

    /// Creates a new [`PieceKind`] from a character. Case is ignored.
    ///
    /// # Example
    /// ```
    /// # use tadpole::PieceKind;
    /// assert_eq!(PieceKind::from_uci('Q').unwrap(), PieceKind::Queen);
    /// assert!(PieceKind::from_uci('x').is_err());
    /// ```
    #[inline(always)]
    pub fn from_uci(kind: char) -> Result<Self> {
        match kind {
            'P' | 'p' => Ok(Self::Pawn),
            'N' | 'n' => Ok(Self::Knight),
            'B' | 'b' => Ok(Self::Bishop),
            'R' | 'r' => Ok(Self::Rook),
            'Q' | 'q' => Ok(Self::Queen),
            'K' | 'k' => Ok(Self::King),
            _ => bail!("Invalid char for PieceKind: Got {kind:?}."),
        }
    }

    /// Fetches a human-readable name for this [`PieceKind`].
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pawn => "pawn",
            Self::Knight => "knight",
            Self::Bishop => "bishop",
            Self::Rook => "rook",
            Self::Queen => "queen",
            Self::King => "king",
        }
    }

    /// Converts this [`PieceKind`] to a lowercase character.
    #[inline(always)]
    pub const fn to_uci(&self) -> char {
        match self {
            Self::Pawn => 'p',
            Self::Knight => 'n',
            Self::Bishop => 'b',
            Self::Rook => 'r',
            Self::Queen => 'q',
            Self::King => 'k',
        }
    }
}

/// A chess piece: a [`PieceKind`] owned by a [`Color`].
///
/// Internally, this is represented as a `u8` with the following bit pattern:
///
/// ```text
///     0000 0 000
///      |   |  |
///      |   |  +- Represents the PieceKind.
///      |   +- Represents the Color. `0` for White, `1` for Black.
///      +- Unused.
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Piece(u8);

impl Piece {
    pub const WHITE_PAWN: Self = Self::new(Color::White, PieceKind::Pawn);
    pub const WHITE_KNIGHT: Self = Self::new(Color::White, PieceKind::Knight);
    pub const WHITE_BISHOP: Self = Self::new(Color::White, PieceKind::Bishop);
    pub const WHITE_ROOK: Self = Self::new(Color::White, PieceKind::Rook);
    pub const WHITE_QUEEN: Self = Self::new(Color::White, PieceKind::Queen);
    pub const WHITE_KING: Self = Self::new(Color::White, PieceKind::King);

    pub const BLACK_PAWN: Self = Self::new(Color::Black, PieceKind::Pawn);
    pub const BLACK_KNIGHT: Self = Self::new(Color::Black, PieceKind::Knight);
    pub const BLACK_BISHOP: Self = Self::new(Color::Black, PieceKind::Bishop);
    pub const BLACK_ROOK: Self = Self::new(Color::Black, PieceKind::Rook);
    pub const BLACK_QUEEN: Self = Self::new(Color::Black, PieceKind::Queen);
    pub const BLACK_KING: Self = Self::new(Color::Black, PieceKind::King);

    /// Number of (color, kind) combinations.
    pub const COUNT: usize = Color::COUNT * PieceKind::COUNT;

    const COLOR_BITS: u8 = 3;
    const KIND_MASK: u8 = 0b0000_0111;

    /// Creates a new [`Piece`] from the given [`Color`] and [`PieceKind`].
    ///
    /// # Example
    /// ```
    /// # use tadpole::{Piece, Color, PieceKind};
    /// let white_knight = Piece::new(Color::White, PieceKind::Knight);
    /// assert_eq!(white_knight.to_string(), "N");
    /// ```
    #[inline(always)]
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self((color as u8) << Self::COLOR_BITS | kind as u8)
    }

    /// Fetches the [`Color`] of this [`Piece`].
    #[inline(always)]
    pub const fn color(&self) -> Color {
        if self.0 >> Self::COLOR_BITS == 0 {
            Color::White
        } else {
            Color::Black
        }
    }

    /// Fetches the [`PieceKind`] of this [`Piece`].
    #[inline(always)]
    pub const fn kind(&self) -> PieceKind {
        match self.0 & Self::KIND_MASK {
            0 => PieceKind::Pawn,
            1 => PieceKind::Knight,
            2 => PieceKind::Bishop,
            3 => PieceKind::Rook,
            4 => PieceKind::Queen,
            _ => PieceKind::King,
        }
    }

    #[inline(always)]
    pub const fn is_pawn(&self) -> bool {
        matches!(self.kind(), PieceKind::Pawn)
    }

    #[inline(always)]
    pub const fn is_rook(&self) -> bool {
        matches!(self.kind(), PieceKind::Rook)
    }

    /// Material value of this piece, regardless of color. See [`PieceKind::value`].
    #[inline(always)]
    pub const fn value(&self) -> i32 {
        self.kind().value()
    }

    /// Returns this [`Piece`] as a `usize` in `[0, 12)`, for indexing into lists.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.color().index() * PieceKind::COUNT + self.kind().index()
    }

    /// Creates a [`Piece`] from a FEN character. Uppercase is White, lowercase is Black.
    ///
    /// # Example
    /// ```
    /// # use tadpole::{Piece, Color, PieceKind};
    /// let piece = Piece::from_uci('n').unwrap();
    /// assert_eq!(piece, Piece::new(Color::Black, PieceKind::Knight));
    /// ```
    #[inline(always)]
    pub fn from_uci(piece: char) -> Result<Self> {
        let kind = PieceKind::from_uci(piece)?;
        Ok(Self::new(Color::from_case(piece), kind))
    }

    /// Converts this [`Piece`] to its FEN character.
    #[inline(always)]
    pub const fn to_uci(&self) -> char {
        let c = self.kind().to_uci();
        if self.color().is_white() {
            c.to_ascii_uppercase()
        } else {
            c
        }
    }

    /// Returns this piece with its kind replaced by `promotion`, keeping its color.
    #[inline(always)]
    pub const fn promoted(self, promotion: PieceKind) -> Self {
        Self::new(self.color(), promotion)
    }

    /// Returns this piece owned by the opponent.
    #[inline(always)]
    pub const fn inverted(self) -> Self {
        Self::new(self.color().opponent(), self.kind())
    }

    /// Fetches a human-readable name, such as `"white queen"`.
    #[inline(always)]
    pub fn name(&self) -> String {
        format!("{} {}", self.color().name(), self.kind().name())
    }
}

macro_rules! impl_common_traits {
    ($type:ty) => {
        impl<T> Index<$type> for [T; <$type>::COUNT] {
            type Output = T;
            #[inline(always)]
            fn index(&self, index: $type) -> &Self::Output {
                &self[index.index()]
            }
        }

        impl<T> IndexMut<$type> for [T; <$type>::COUNT] {
            #[inline(always)]
            fn index_mut(&mut self, index: $type) -> &mut Self::Output {
                &mut self[index.index()]
            }
        }

        impl FromStr for $type {
            type Err = anyhow::Error;
            /// Does the same as [`Self::from_uci`], but only if `s` is one character in length.
            #[inline(always)]
            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::from_uci(c),
                    _ => bail!(
                        "Invalid str for {}: Must be a str of len 1. Got {s:?}",
                        stringify!($type)
                    ),
                }
            }
        }

        impl fmt::Display for $type {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_uci())
            }
        }

        impl fmt::Debug for $type {
            /// Debug formatting displays the human-readable name and index value.
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "\"{}\" ({})", self.name(), self.index())
            }
        }
    };
}

impl_common_traits!(Piece);
impl_common_traits!(PieceKind);
impl_common_traits!(Color);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_parts_round_trip() {
        for color in Color::all() {
            for kind in PieceKind::all() {
                let piece = Piece::new(color, kind);
                assert_eq!(piece.color(), color);
                assert_eq!(piece.kind(), kind);
                assert_eq!(Piece::from_uci(piece.to_uci()).unwrap(), piece);
            }
        }
    }

    #[test]
    fn test_piece_indices_are_unique() {
        let mut seen = [false; Piece::COUNT];
        for color in Color::all() {
            for kind in PieceKind::all() {
                let idx = Piece::new(color, kind).index();
                assert!(!seen[idx], "Index {idx} used twice");
                seen[idx] = true;
            }
        }
    }

    #[test]
    fn test_piece_values_are_distinct() {
        let values = PieceKind::all().map(|k| k.value());
        for (i, a) in values.iter().enumerate() {
            for b in &values[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_invalid_piece_strings() {
        assert!("".parse::<Piece>().is_err());
        assert!("QQ".parse::<Piece>().is_err());
        assert!("x".parse::<Piece>().is_err());
        assert_eq!("Q".parse::<Piece>().unwrap(), Piece::WHITE_QUEEN);
    }
}
