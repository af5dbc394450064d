/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::{Duration, Instant};

use tracing::{debug, trace_span};

use crate::{order_moves, Evaluator, Move, MoveList, Position, Score};

/// Maximum depth that can be searched
pub const MAX_DEPTH: usize = 5;

/// The result of a search, containing the best move found, score, and total nodes searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchResult {
    /// Number of nodes searched.
    pub nodes: u64,

    /// Best move found during the search.
    ///
    /// Only `None` if the root position has no moves at all.
    pub bestmove: Option<Move>,

    /// Evaluation of the position after `bestmove` is made, from the root side-to-move's perspective.
    pub score: Score,

    /// The deepest iteration that ran to completion.
    pub depth: usize,
}

impl Default for SearchResult {
    /// A default search result should initialize to a *very bad* value,
    /// since there isn't a move to play.
    #[inline(always)]
    fn default() -> Self {
        Self {
            nodes: 0,
            bestmove: None,
            score: -Score::INF,
            depth: 0,
        }
    }
}

/// Configuration variables for executing a [`Search`].
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    /// Maximum depth to execute the search.
    ///
    /// Depth 1 is always searched, even if this is `0`.
    pub max_depth: usize,

    /// Node allowance.
    ///
    /// If the search exceeds this many nodes, it will exit as quickly as possible.
    pub max_nodes: u64,

    /// Start time of the search.
    pub starttime: Instant,

    /// Limit on search time.
    ///
    /// Checked on entry to every node and before every sibling. Once exceeded, the search unwinds
    /// and reports the best result found so far.
    pub timeout: Duration,
}

impl SearchConfig {
    /// Constructs a [`SearchConfig`] that searches for `secs` seconds, starting now.
    ///
    /// Negative and NaN budgets are treated as zero, and an infinite budget never times out.
    /// A zero budget still completes a depth 1 search, so a move is always found if one exists.
    ///
    /// # Example
    /// ```
    /// # use std::time::Duration;
    /// # use tadpole::SearchConfig;
    /// assert_eq!(SearchConfig::with_movetime(0.25).timeout, Duration::from_millis(250));
    /// assert_eq!(SearchConfig::with_movetime(-1.0).timeout, Duration::ZERO);
    /// assert_eq!(SearchConfig::with_movetime(f64::INFINITY).timeout, Duration::MAX);
    /// ```
    pub fn with_movetime(secs: f64) -> Self {
        let timeout = if secs.is_nan() || secs <= 0.0 {
            Duration::ZERO
        } else {
            Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
        };

        Self {
            timeout,
            ..Default::default()
        }
    }
}

impl Default for SearchConfig {
    /// A default [`SearchConfig`] will permit an "infinite" search, up to [`MAX_DEPTH`].
    ///
    /// The word "infinite" is quoted here because the actual defaults are the `::MAX` values for each field.
    #[inline(always)]
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            max_nodes: u64::MAX,
            starttime: Instant::now(),
            timeout: Duration::MAX,
        }
    }
}

/// Executes an iterative deepening alpha-beta search on a position.
///
/// The search works on its own copy of the position, applying and undoing moves in place.
/// Moves are pseudo-legal: a line that leaves a King en prise is simply refuted by the King's capture,
/// which the material evaluation values highly.
pub struct Search {
    /// The position to search on. Restored to its original state between iterations.
    position: Position,

    /// Configuration variables for this instance of the search.
    config: SearchConfig,

    /// Number of nodes visited so far.
    nodes: u64,

    /// Set once any limit in `config` is exceeded. Never cleared.
    stopped: bool,
}

impl Search {
    /// Construct a new [`Search`] instance to execute on the provided [`Position`].
    #[inline(always)]
    pub fn new(position: &Position, config: SearchConfig) -> Self {
        Self {
            position: *position,
            config,
            nodes: 0,
            stopped: false,
        }
    }

    /// Start the search, returning its results.
    ///
    /// This is the entrypoint of the search. It never prints anything; progress is reported through [`tracing`].
    pub fn start(mut self) -> SearchResult {
        let span = trace_span!("search_root");
        let _guard = span.enter();

        debug!(
            "Searching {:?} with max_depth: {}, max_nodes: {}, timeout: {:?}",
            self.position.to_fen(),
            self.config.max_depth,
            self.config.max_nodes,
            self.config.timeout
        );

        let mut res = self.iterative_deepening();
        res.nodes = self.nodes;

        debug!(
            "Search concluded after {:?}: bestmove {:?}, score {}, depth {}, nodes {}",
            self.config.starttime.elapsed(),
            res.bestmove.map(|mv| mv.to_uci()),
            res.score,
            res.depth,
            res.nodes
        );

        res
    }

    /// Performs [iterative deepening](https://www.chessprogramming.org/Iterative_Deepening) (ID) on the Search's position.
    ///
    /// The same root move list is re-used across every depth. After each iteration, the best root move is
    /// moved to the front of that list, so a later iteration that runs out of time has always re-examined it.
    fn iterative_deepening(&mut self) -> SearchResult {
        let mut position = self.position;
        let mut result = SearchResult::default();

        let mut root_moves = position.pseudo_legal_moves();
        if root_moves.is_empty() {
            debug!("No moves available at the root");
            result.score = Evaluator::new(&position).eval();
            return result;
        }
        order_moves(&mut root_moves);

        // A root with moves always gets at least one iteration
        for depth in 1..=self.config.max_depth.max(1) {
            // Depth 1 always runs to completion, so there is a move to fall back on
            if result.bestmove.is_some() && self.should_stop() {
                break;
            }

            let (best, completed) =
                self.search_root(&mut position, &root_moves, depth, result.bestmove.is_some());

            // Even a partial iteration examined the previous best move first, so its best is usable
            if let Some((index, score)) = best {
                result.bestmove = Some(root_moves[index]);
                result.score = score;
                root_moves[..=index].rotate_right(1);
            }

            if !completed {
                debug!(
                    "Deadline reached during depth {depth}; keeping {:?} with score {}",
                    result.bestmove.map(|mv| mv.to_uci()),
                    result.score
                );
                break;
            }

            result.depth = depth;
            debug!(
                "depth {depth} score {} bestmove {:?} nodes {} time {:?}",
                result.score,
                result.bestmove.map(|mv| mv.to_uci()),
                self.nodes,
                self.config.starttime.elapsed()
            );
        }

        debug_assert_eq!(
            position, self.position,
            "Search failed to restore the root position"
        );

        result
    }

    /// Searches every root move to `depth`, returning the index and score of the best one,
    /// and whether all root moves were searched.
    ///
    /// If `can_stop` is `false`, limits are ignored at the root so that the iteration completes.
    fn search_root(
        &mut self,
        position: &mut Position,
        root_moves: &MoveList,
        depth: usize,
        can_stop: bool,
    ) -> (Option<(usize, Score)>, bool) {
        let mut alpha = -Score::INF;
        let beta = Score::INF;
        let mut best = None;

        for (i, &mv) in root_moves.iter().enumerate() {
            if can_stop && self.should_stop() {
                return (best, false);
            }

            let score = -self.negamax(&mut position.scoped(mv), depth - 1, -beta, -alpha);

            // The subtree was cut short, so its score cannot be trusted
            if can_stop && self.stopped {
                return (best, false);
            }

            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((i, score));
            }
            alpha = alpha.max(score);
        }

        (best, true)
    }

    /// Primary location of search logic.
    ///
    /// Uses the [negamax](https://www.chessprogramming.org/Negamax) algorithm with alpha-beta pruning.
    /// Scores are relative to the side to move in `position`.
    fn negamax(
        &mut self,
        position: &mut Position,
        depth: usize,
        mut alpha: Score,
        beta: Score,
    ) -> Score {
        self.nodes += 1;

        // If we've reached a terminal node, or run out of resources, evaluate the position
        if depth == 0 || self.should_stop() {
            return Evaluator::new(position).eval();
        }

        let mut moves = position.pseudo_legal_moves();

        // Mate and stalemate are not distinguished from any other leaf
        if moves.is_empty() {
            return Evaluator::new(position).eval();
        }

        order_moves(&mut moves);

        // Start with a *really bad* initial score
        let mut best = -Score::INF;

        for mv in moves {
            if self.should_stop() {
                break;
            }

            // The move is undone when the guard is dropped at the end of this statement
            let score = -self.negamax(&mut position.scoped(mv), depth - 1, -beta, -alpha);

            best = best.max(score);
            alpha = alpha.max(score);

            if alpha >= beta {
                break;
            }
        }

        // Stopped before any child could be searched
        if best == -Score::INF {
            return Evaluator::new(position).eval();
        }

        best
    }

    /// Checks if we've exceeded any conditions that would warrant the search to end.
    ///
    /// Once this returns `true`, it always will.
    #[inline(always)]
    fn should_stop(&mut self) -> bool {
        if !self.stopped {
            let out_of_time = self.config.starttime.elapsed() >= self.config.timeout;
            let out_of_nodes = self.nodes >= self.config.max_nodes;
            self.stopped = out_of_time || out_of_nodes;
        }

        self.stopped
    }
}

/// Finds the best move in `position` within `movetime_secs` seconds of wall-clock time.
///
/// Returns `None` only if `position` has no pseudo-legal moves.
///
/// # Example
/// ```
/// # use tadpole::{best_move, Position};
/// let pos: Position = "4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1".parse().unwrap();
/// assert_eq!(best_move(&pos, 1.0).unwrap(), "e4d5");
/// ```
pub fn best_move(position: &Position, movetime_secs: f64) -> Option<Move> {
    Search::new(position, SearchConfig::with_movetime(movetime_secs))
        .start()
        .bestmove
}
