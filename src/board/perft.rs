/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::io::{self, Write};

use super::Position;

/// Perform a perft at the specified depth, collecting only data about the number of possible positions (nodes).
///
/// This performs bulk counting, meaning that, at depth 1, it returns the number of available moves,
/// rather than making them, recursing again, and returning 1 for each terminal case.
/// If you do *not* want to use bulk counting, use [`perft_generic`].
///
/// # Example
/// ```
/// # use tadpole::{perft, Position};
/// assert_eq!(perft(&Position::default(), 3), 8_902);
/// ```
#[inline(always)]
pub fn perft(position: &Position, depth: usize) -> u64 {
    perft_generic::<true>(&mut { *position }, depth)
}

/// Perform a splitperft at the specified depth, writing the number of nodes reachable
/// after each legal move at the root to `out`, one `<move>\t<nodes>` line per move.
///
/// Returns the total number of nodes. At depth 0 nothing is written.
pub fn splitperft<W: Write>(position: &Position, depth: usize, out: &mut W) -> io::Result<u64> {
    if depth == 0 {
        return Ok(1);
    }

    let mut position = *position;
    let mut total = 0;
    for mv in position.legal_moves() {
        let nodes = perft_generic::<true>(&mut position.scoped(mv), depth - 1);
        writeln!(out, "{mv}\t{nodes}")?;
        total += nodes;
    }

    Ok(total)
}

/// Generic version of [`perft`] that allows you to specify whether to perform bulk counting.
///
/// If `BULK` is set to `true`, this will perform bulk counting.
///
/// Every move is applied to `position` and undone before returning, so `position` is left as it was found.
pub fn perft_generic<const BULK: bool>(position: &mut Position, depth: usize) -> u64 {
    // Bulk counting; no need to recurse again just to apply a singular move and return 1.
    if BULK && depth == 1 {
        return position.legal_moves().len() as u64;
    }
    // Recursion limit; return 1, since we're fathoming this node.
    else if depth == 0 {
        return 1;
    }

    position.legal_moves().into_iter().fold(0, |nodes, mv| {
        nodes + perft_generic::<BULK>(&mut position.scoped(mv), depth - 1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FEN_KIWIPETE;

    #[test]
    fn test_perft_leaves_position_untouched() {
        let mut pos = Position::from_fen(FEN_KIWIPETE).unwrap();
        let before = pos;
        assert_eq!(perft_generic::<false>(&mut pos, 2), 2_039);
        assert_eq!(pos, before);
    }

    #[test]
    fn test_splitperft_totals() {
        let pos = Position::from_fen(FEN_KIWIPETE).unwrap();
        let mut out = Vec::new();
        assert_eq!(splitperft(&pos, 1, &mut out).unwrap(), 48);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 48);

        let mut out = Vec::new();
        assert_eq!(splitperft(&pos, 2, &mut out).unwrap(), perft(&pos, 2));
    }

    #[test]
    fn test_splitperft_writes_each_root_move() {
        let pos = Position::default();
        let mut out = Vec::new();
        assert_eq!(splitperft(&pos, 2, &mut out).unwrap(), 400);

        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.lines().count(), 20);
        assert!(out.contains("g1f3\t20\n"));

        let mut out = Vec::new();
        assert_eq!(splitperft(&pos, 0, &mut out).unwrap(), 1);
        assert!(out.is_empty());
    }

    #[test]
    fn test_bulk_counting_agrees() {
        let pos = Position::default();
        for depth in 0..=3 {
            assert_eq!(
                perft(&pos, depth),
                perft_generic::<false>(&mut { pos }, depth)
            );
        }
    }
}
