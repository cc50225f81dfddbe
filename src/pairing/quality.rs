//! Edge weighting for the pairing graph.
//!
//! Each edge weighs `BASE - penalty`. The penalty is a sum of tiered terms;
//! every tier is shifted far enough that the whole-matching total of all
//! lower tiers stays below one unit of it, so the matcher optimises the
//! criteria lexicographically. In priority order:
//!
//! 1. bye allocation: lowest score group, then lowest rank
//! 2. number of floaters
//! 3. score differences (doubled around topscorers)
//! 4. repeat floats in the same direction as last round
//! 5. colour preference violations and resulting imbalance
//! 6. rank fit: top half against bottom half inside a score group

use crate::config::rules::{HALF_POINT, TOPSCORER_THRESHOLD, WIN_HALF_POINTS};
use crate::models::{Colour, Float, Player, PreferenceStrength};

use super::graph::CompatibilityGraph;

/// Edge weight. Wide enough for every tier at the maximum field size.
pub type Weight = i128;

const RANK_FIT_SHIFT: u32 = 0;
const COLOUR_SHIFT: u32 = 22;
const REPEAT_FLOAT_SHIFT: u32 = 40;
const SCORE_DIFF_SHIFT: u32 = 52;
const FLOATER_SHIFT: u32 = 72;
const BYE_SHIFT: u32 = 82;

/// Every edge weight is positive: no single penalty reaches this.
pub const BASE_WEIGHT: Weight = 1 << 104;

/// Cap on the imbalance term so it stays inside its tier.
const MAX_IMBALANCE_PENALTY: u32 = 15;

/// Room reserved for the rank term of a bye penalty.
const BYE_RANK_SPAN: u32 = 2048;

/// Whether `player` is a topscorer going into `round`.
///
/// A topscorer has more than half of the points that were available in the
/// rounds already played.
pub fn is_topscorer(player: &Player, round: u32) -> bool {
    let max_possible = (round.saturating_sub(1) * WIN_HALF_POINTS) as f64 * HALF_POINT;
    player.score.points() > max_possible * TOPSCORER_THRESHOLD
}

/// Chosen colours for a candidate pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColourAllocation {
    /// Colour for the higher-ranked player; the other gets the opposite
    pub higher: Colour,
    /// Largest absolute colour index either player ends up with
    pub max_abs_index: i32,
    /// Weighted count of unmet preferences
    pub violations: u32,
}

impl ColourAllocation {
    fn penalty(&self) -> u32 {
        self.violations + (self.max_abs_index.unsigned_abs()).min(MAX_IMBALANCE_PENALTY)
    }
}

fn violation_cost(player: &Player, colour: Colour) -> u32 {
    match player.colour_preference() {
        Some(pref) if pref.colour != colour => match pref.strength {
            PreferenceStrength::Absolute => 4,
            PreferenceStrength::Strong => 2,
            PreferenceStrength::Mild => 1,
        },
        _ => 0,
    }
}

fn evaluate(higher: &Player, lower: &Player, colour: Colour) -> ColourAllocation {
    let h = higher.colour_index + colour.delta();
    let l = lower.colour_index + colour.opposite().delta();
    ColourAllocation {
        higher: colour,
        max_abs_index: h.abs().max(l.abs()),
        violations: violation_cost(higher, colour) + violation_cost(lower, colour.opposite()),
    }
}

/// Decide who gets white between `higher` (the better-ranked) and `lower`.
///
/// Minimises the larger resulting absolute colour index first, then unmet
/// preferences. Remaining ties go to the higher-ranked player's preference,
/// then the lower-ranked player's, then white for an odd pairing number.
pub fn allocate_colours(higher: &Player, lower: &Player) -> ColourAllocation {
    let white = evaluate(higher, lower, Colour::White);
    let black = evaluate(higher, lower, Colour::Black);

    let white_key = (white.max_abs_index, white.violations);
    let black_key = (black.max_abs_index, black.violations);
    if white_key < black_key {
        return white;
    }
    if black_key < white_key {
        return black;
    }

    let colour = if let Some(pref) = higher.colour_preference() {
        pref.colour
    } else if let Some(pref) = lower.colour_preference() {
        pref.colour.opposite()
    } else if higher.pairing_number % 2 == 1 {
        Colour::White
    } else {
        Colour::Black
    };

    if colour == Colour::White {
        white
    } else {
        black
    }
}

/// Position of a player inside its score group.
#[derive(Debug, Clone, Copy)]
struct GroupSlot {
    position: u32,
    size: u32,
}

/// Weighs the edges of one compatibility graph.
pub struct QualityEvaluator<'a> {
    graph: &'a CompatibilityGraph,
    slots: Vec<GroupSlot>,
}

impl<'a> QualityEvaluator<'a> {
    pub fn new(graph: &'a CompatibilityGraph) -> Self {
        let players = graph.players();
        let mut slots = Vec::with_capacity(players.len());
        let mut start = 0;
        while start < players.len() {
            let score = players[start].score;
            let end = players[start..]
                .iter()
                .position(|p| p.score != score)
                .map_or(players.len(), |offset| start + offset);
            for i in start..end {
                slots.push(GroupSlot {
                    position: (i - start) as u32,
                    size: (end - start) as u32,
                });
            }
            start = end;
        }
        Self { graph, slots }
    }

    /// Every graph edge with its weight, in graph edge order.
    pub fn weighted_edges(&self) -> Vec<(usize, usize, Weight)> {
        self.graph
            .edges()
            .iter()
            .map(|&(i, j)| (i, j, self.weight(i, j)))
            .collect()
    }

    /// Weight of the edge between vertices `i < j`.
    pub fn weight(&self, i: usize, j: usize) -> Weight {
        BASE_WEIGHT - self.penalty(i, j)
    }

    fn penalty(&self, i: usize, j: usize) -> Weight {
        if Some(j) == self.graph.bye_index() {
            return self.bye_penalty(i);
        }

        let round = self.graph.round();
        let (higher, lower) = (&self.graph.players()[i], &self.graph.players()[j]);
        let mut diff = higher.score.abs_diff(lower.score);
        let floated = diff > 0;
        if is_topscorer(higher, round) || is_topscorer(lower, round) {
            diff *= 2;
        }

        let mut repeat_floats: u32 = 0;
        if floated {
            if higher.last_float == Some(Float::Down) {
                repeat_floats += 1;
            }
            if lower.last_float == Some(Float::Up) {
                repeat_floats += 1;
            }
        }

        let colour = allocate_colours(higher, lower).penalty();

        let (a, b) = (self.slots[i], self.slots[j]);
        let rank_fit = if floated {
            (a.size - 1 - a.position) + b.position
        } else {
            let offset = b.position - a.position;
            offset.abs_diff(a.size / 2)
        };

        (Weight::from(floated as u32) << FLOATER_SHIFT)
            + (Weight::from(diff) << SCORE_DIFF_SHIFT)
            + (Weight::from(repeat_floats) << REPEAT_FLOAT_SHIFT)
            + (Weight::from(colour) << COLOUR_SHIFT)
            + (Weight::from(rank_fit) << RANK_FIT_SHIFT)
    }

    fn bye_penalty(&self, i: usize) -> Weight {
        let player = &self.graph.players()[i];
        let from_bottom = (self.graph.players().len() - 1 - i) as u32;
        let term = player.score.half_points() * BYE_RANK_SPAN + from_bottom;
        Weight::from(term) << BYE_SHIFT
    }

    /// Colours for a matched pair of player vertices `i < j`.
    pub fn colours(&self, i: usize, j: usize) -> ColourAllocation {
        allocate_colours(&self.graph.players()[i], &self.graph.players()[j])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PairingConfig;
    use crate::models::Score;

    fn scored(pn: u32, half_points: u32) -> Player {
        Player::new(pn).with_score(Score::from_half_points(half_points))
    }

    fn graph(players: &[Player], round: u32) -> CompatibilityGraph {
        CompatibilityGraph::build(players, round, &PairingConfig::default()).unwrap()
    }

    #[test]
    fn test_topscorer_threshold() {
        // before round 5, four points were available
        assert!(is_topscorer(&scored(1, 5), 5));
        assert!(!is_topscorer(&scored(1, 4), 5));
        assert!(!is_topscorer(&scored(1, 0), 1));
    }

    #[test]
    fn test_colour_allocation_balances_index() {
        let higher = Player::new(1).with_colours(&[Colour::White]);
        let lower = Player::new(2).with_colours(&[Colour::Black]);

        let alloc = allocate_colours(&higher, &lower);
        assert_eq!(alloc.higher, Colour::Black);
        assert_eq!(alloc.max_abs_index, 0);
        assert_eq!(alloc.violations, 0);
    }

    #[test]
    fn test_colour_allocation_minimises_max_index() {
        // higher at +2, lower at +1: giving higher black yields max |2|, white yields |3|
        let higher = Player::new(1).with_colours(&[Colour::White, Colour::White]);
        let lower = Player::new(2).with_colours(&[Colour::White]);

        let alloc = allocate_colours(&higher, &lower);
        assert_eq!(alloc.higher, Colour::Black);
        assert_eq!(alloc.max_abs_index, 2);
    }

    #[test]
    fn test_colour_allocation_higher_preference_wins_ties() {
        // both at +1: either assignment leaves max |2| and one violation
        let higher = Player::new(2).with_colours(&[Colour::White]);
        let lower = Player::new(3).with_colours(&[Colour::White]);

        let alloc = allocate_colours(&higher, &lower);
        assert_eq!(alloc.higher, Colour::Black);
        assert_eq!(alloc.violations, 2);
    }

    #[test]
    fn test_colour_allocation_without_history() {
        assert_eq!(
            allocate_colours(&Player::new(1), &Player::new(2)).higher,
            Colour::White
        );
        assert_eq!(
            allocate_colours(&Player::new(2), &Player::new(3)).higher,
            Colour::Black
        );
    }

    #[test]
    fn test_weights_are_positive_and_deterministic() {
        let players: Vec<Player> = (1..=7).map(|pn| scored(pn, pn % 3)).collect();
        let g = graph(&players, 2);

        let first = QualityEvaluator::new(&g).weighted_edges();
        let second = QualityEvaluator::new(&g).weighted_edges();
        assert_eq!(first, second);
        assert!(first.iter().all(|&(_, _, w)| w > 0 && w <= BASE_WEIGHT));
    }

    #[test]
    fn test_same_score_preferred_over_float() {
        let players = vec![scored(1, 2), scored(2, 2), scored(3, 0), scored(4, 0)];
        let g = graph(&players, 2);
        let eval = QualityEvaluator::new(&g);

        assert!(eval.weight(0, 1) > eval.weight(0, 2));
        assert!(eval.weight(2, 3) > eval.weight(1, 2));
    }

    #[test]
    fn test_smaller_score_gap_preferred() {
        let players = vec![scored(1, 4), scored(2, 2), scored(3, 0), scored(4, 0)];
        let g = graph(&players, 3);
        let eval = QualityEvaluator::new(&g);

        assert!(eval.weight(0, 1) > eval.weight(0, 2));
    }

    #[test]
    fn test_repeat_float_penalised() {
        let mut floated = scored(1, 2);
        floated.last_float = Some(Float::Down);
        let players = vec![floated, scored(2, 2), scored(3, 0), scored(4, 0)];
        let g = graph(&players, 2);
        let eval = QualityEvaluator::new(&g);

        // same float and score gap either way; the repeat float decides
        assert!(eval.weight(1, 2) > eval.weight(0, 2));
    }

    #[test]
    fn test_bye_prefers_lowest_ranked() {
        let players = vec![scored(1, 2), scored(2, 0), scored(3, 0)];
        let g = graph(&players, 2);
        let eval = QualityEvaluator::new(&g);
        let bye = g.bye_index().unwrap();

        assert!(eval.weight(2, bye) > eval.weight(1, bye));
        assert!(eval.weight(1, bye) > eval.weight(0, bye));
    }

    #[test]
    fn test_rank_fit_top_half_against_bottom_half() {
        let players: Vec<Player> = (1..=4).map(Player::new).collect();
        let g = graph(&players, 1);
        let eval = QualityEvaluator::new(&g);

        // 1v3 and 2v4 beat 1v2 and 3v4
        assert!(eval.weight(0, 2) + eval.weight(1, 3) > eval.weight(0, 1) + eval.weight(2, 3));
    }
}
