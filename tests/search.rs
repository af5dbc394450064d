/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use tadpole::{
    best_move, order_moves, score_move, Evaluator, Move, Piece, Position, Search, SearchConfig,
    FEN_KIWIPETE, FEN_STARTPOS,
};

fn ensure_round_trip(fen: &str) {
    let mut position: Position = fen.parse().unwrap();
    let original = position;

    for mv in position.pseudo_legal_moves() {
        position.make_move(&mv);
        assert_ne!(position, original, "{mv:?} did not change {fen}");
        position.unmake_move(&mv);
        assert_eq!(position, original, "Undoing {mv:?} did not restore {fen}");
    }
}

#[test]
fn test_apply_undo_round_trip() {
    for fen in [
        FEN_STARTPOS,
        FEN_KIWIPETE,
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        "n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1",
        "rnbqkb1r/ppp1pppp/5n2/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3",
        "r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 12 40",
    ] {
        ensure_round_trip(fen);
    }
}

#[test]
fn test_startpos_scenario() {
    let position = Position::default();
    assert_eq!(position.pseudo_legal_moves().len(), 20);
}

#[test]
fn test_en_passant_scenario() {
    // Black answers e2e4 with a pawn that can take en passant
    let mut position: Position = "4k3/8/8/8/3p4/8/4P3/4K3 w - - 0 1".parse().unwrap();
    let push = Move::from_uci(&position, "e2e4").unwrap();
    position.make_move(&push);
    let before = position;

    let ep_moves = position
        .pseudo_legal_moves()
        .into_iter()
        .filter(|mv| mv.is_en_passant())
        .collect::<Vec<_>>();
    assert_eq!(ep_moves.len(), 1);

    let ep = ep_moves[0];
    assert_eq!(ep, "d4e3");
    assert_eq!(ep.captured(), Some(Piece::WHITE_PAWN));

    {
        let after = position.scoped(ep);
        assert_eq!(after.piece_at("e4".parse().unwrap()), None);
        assert_eq!(after.piece_at("e3".parse().unwrap()), Some(Piece::BLACK_PAWN));
    }

    assert_eq!(position, before);
    assert_eq!(position.piece_at("e4".parse().unwrap()), Some(Piece::WHITE_PAWN));
}

#[test]
fn test_promotion_scenario() {
    let position: Position = "4k3/1P6/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
    let queen = position
        .pseudo_legal_moves()
        .into_iter()
        .find(|mv| mv.promotion() == Some(Piece::WHITE_QUEEN));
    assert_eq!(queen.unwrap(), "b7b8q");
}

#[test]
fn test_time_budget_scenario() {
    for fen in [FEN_STARTPOS, FEN_KIWIPETE, "4k3/8/8/8/8/8/8/4K3 b - - 0 1"] {
        let position: Position = fen.parse().unwrap();
        let mv = best_move(&position, 1e-9).unwrap();
        assert!(
            position.pseudo_legal_moves().contains(&mv),
            "{mv} is not a move in {fen}"
        );
    }
}

#[test]
fn test_no_moves_scenario() {
    let position: Position = "8/8/8/8/8/8/8/k7 w - - 0 1".parse().unwrap();
    assert_eq!(best_move(&position, 1.0), None);
}

#[test]
fn test_evaluator_zero_sum() {
    let mut position: Position = FEN_KIWIPETE.parse().unwrap();
    position.make_move(&Move::from_uci(&position, "e5f7").unwrap());

    let stm = Evaluator::new(&position).eval();
    position.toggle_side_to_move();
    assert_eq!(Evaluator::new(&position).eval(), -stm);
}

#[test]
fn test_ordering_idempotent() {
    let position: Position = FEN_KIWIPETE.parse().unwrap();
    let mut moves = position.pseudo_legal_moves();
    order_moves(&mut moves);
    let once = moves.clone();
    order_moves(&mut moves);
    assert_eq!(moves, once);
    assert!(score_move(&moves[0]) >= score_move(&moves[moves.len() - 1]));
}

#[test]
fn test_search_avoids_hanging_queen() {
    // The queen is attacked by a pawn and must step away or trade up
    let position: Position = "4k3/8/8/3p4/4Q3/8/8/4K3 w - - 0 1".parse().unwrap();
    let config = SearchConfig {
        max_depth: 3,
        ..Default::default()
    };
    let res = Search::new(&position, config).start();
    assert_eq!(res.depth, 3);
    assert!(res.score >= 900, "Search lost material: {res:?}");
}
