/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::{Index, IndexMut},
    str::FromStr,
};

use anyhow::{bail, Result};

use super::Color;

/// Represents a single square on an `8x8` chess board.
///
/// Internally this is the mailbox index `rank * 8 + file`, with rank `0` being White's back rank:
///
/// ```text
/// 8| 56 57 58 59 60 61 62 63
/// 7| 48 49 50 51 52 53 54 55
/// 6| 40 41 42 43 44 45 46 47
/// 5| 32 33 34 35 36 37 38 39
/// 4| 24 25 26 27 28 29 30 31
/// 3| 16 17 18 19 20 21 22 23
/// 2|  8  9 10 11 12 13 14 15
/// 1|  0  1  2  3  4  5  6  7
///  +------------------------
///    a  b  c  d  e  f  g  h
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct Square(pub(crate) u8);

impl Square {
    pub const A1: Self = Self(0);
    pub const B1: Self = Self(1);
    pub const C1: Self = Self(2);
    pub const D1: Self = Self(3);
    pub const E1: Self = Self(4);
    pub const F1: Self = Self(5);
    pub const G1: Self = Self(6);
    pub const H1: Self = Self(7);

    pub const A8: Self = Self(56);
    pub const B8: Self = Self(57);
    pub const C8: Self = Self(58);
    pub const D8: Self = Self(59);
    pub const E8: Self = Self(60);
    pub const F8: Self = Self(61);
    pub const G8: Self = Self(62);
    pub const H8: Self = Self(63);

    pub const MIN: u8 = 0;
    pub const MAX: u8 = 63;
    pub const COUNT: usize = 64;

    /// Returns an iterator over all squares, from A1 to H8.
    ///
    /// # Example
    /// ```
    /// # use tadpole::Square;
    /// let mut iter = Square::iter();
    /// assert_eq!(iter.len(), 64);
    /// assert_eq!(iter.next().unwrap(), Square::A1);
    /// assert_eq!(iter.last().unwrap(), Square::H8);
    /// ```
    #[inline(always)]
    pub fn iter() -> impl ExactSizeIterator<Item = Self> + DoubleEndedIterator<Item = Self> {
        (Self::MIN..=Self::MAX).map(Self)
    }

    /// Creates a new [`Square`] from a file and rank, both in `[0, 7]`.
    ///
    /// # Panics
    /// If either coordinate is out of bounds and debug assertions are enabled.
    #[inline(always)]
    pub const fn new(file: u8, rank: u8) -> Self {
        debug_assert!(file < 8 && rank < 8, "File and rank must be between [0,8)");
        Self(rank << 3 | file)
    }

    /// Creates a new [`Square`] from the provided index, without error checking.
    #[inline(always)]
    pub const fn from_index_unchecked(index: usize) -> Self {
        debug_assert!(index < 64, "Index must be between [0,64)");
        Self(index as u8)
    }

    /// The file of this square, `0` for the A-file through `7` for the H-file.
    #[inline(always)]
    pub const fn file(&self) -> u8 {
        self.0 & 7
    }

    /// The rank of this square, `0` for the first rank through `7` for the eighth.
    #[inline(always)]
    pub const fn rank(&self) -> u8 {
        self.0 >> 3
    }

    /// The mailbox index of this square.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Attempt to offset this [`Square`] by the file and rank deltas.
    ///
    /// Returns [`None`] if the result would leave the board, so moves can never wrap around an edge.
    ///
    /// # Example
    /// ```
    /// # use tadpole::Square;
    /// assert_eq!(Square::A1.offset(1, 1).unwrap().to_uci(), "b2");
    /// assert_eq!(Square::A1.offset(-1, 0), None);
    /// assert_eq!(Square::H1.offset(1, 0), None);
    /// ```
    #[inline(always)]
    pub const fn offset(&self, file_delta: i8, rank_delta: i8) -> Option<Self> {
        let file = self.file() as i8 + file_delta;
        let rank = self.rank() as i8 + rank_delta;

        if file < 0 || file > 7 || rank < 0 || rank > 7 {
            None
        } else {
            Some(Self::new(file as u8, rank as u8))
        }
    }

    /// Moves this square `n` ranks toward the opponent of `color`.
    ///
    /// # Example
    /// ```
    /// # use tadpole::{Square, Color};
    /// assert_eq!(Square::E1.forward_by(Color::White, 1).unwrap().to_uci(), "e2");
    /// assert_eq!(Square::E8.forward_by(Color::Black, 2).unwrap().to_uci(), "e6");
    /// ```
    #[inline(always)]
    pub const fn forward_by(&self, color: Color, n: u8) -> Option<Self> {
        self.offset(0, n as i8 * color.negation_multiplier())
    }

    /// Moves this square `n` ranks toward `color`'s own back rank.
    #[inline(always)]
    pub const fn backward_by(&self, color: Color, n: u8) -> Option<Self> {
        self.offset(0, n as i8 * color.opponent().negation_multiplier())
    }

    /// Mirrors this square vertically, so A1 becomes A8.
    #[inline(always)]
    pub const fn flipped_rank(self) -> Self {
        Self(self.0 ^ 56)
    }

    /// Returns the number of ranks between `self` and `other`.
    #[inline(always)]
    pub const fn distance_ranks(&self, other: Self) -> u8 {
        self.rank().abs_diff(other.rank())
    }

    /// Creates a [`Square`] from a string such as `"e4"`.
    ///
    /// # Example
    /// ```
    /// # use tadpole::Square;
    /// assert_eq!(Square::from_uci("a8").unwrap(), Square::A8);
    /// assert!(Square::from_uci("z0").is_err());
    /// ```
    #[inline(always)]
    pub fn from_uci(square: &str) -> Result<Self> {
        let bytes = square.as_bytes();
        if bytes.len() != 2 {
            bail!("Invalid Square string: String must contain exactly 2 characters. Got {square:?}")
        }

        let (file, rank) = (bytes[0], bytes[1]);
        if !(b'a'..=b'h').contains(&file) {
            bail!("Invalid file in Square string {square:?}: Must be between [a, h]");
        }
        if !(b'1'..=b'8').contains(&rank) {
            bail!("Invalid rank in Square string {square:?}: Must be between [1, 8]");
        }

        Ok(Self::new(file - b'a', rank - b'1'))
    }

    /// Converts this [`Square`] to its algebraic name, such as `"e4"`.
    #[inline(always)]
    pub fn to_uci(self) -> String {
        let file = (b'a' + self.file()) as char;
        let rank = (b'1' + self.rank()) as char;
        format!("{file}{rank}")
    }
}

impl FromStr for Square {
    type Err = anyhow::Error;
    /// Wrapper for [`Square::from_uci`].
    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_uci(s)
    }
}

impl<T> Index<Square> for [T; Square::COUNT] {
    type Output = T;
    #[inline(always)]
    fn index(&self, index: Square) -> &Self::Output {
        &self[index.index()]
    }
}

impl<T> IndexMut<Square> for [T; Square::COUNT] {
    #[inline(always)]
    fn index_mut(&mut self, index: Square) -> &mut Self::Output {
        &mut self[index.index()]
    }
}

impl fmt::Display for Square {
    /// Calls [`Square::to_uci`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_uci().fmt(f)
    }
}

impl fmt::Debug for Square {
    /// Displays the algebraic name and the internal index.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.to_uci(), self.0)
    }
}
