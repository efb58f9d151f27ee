use crate::arrangement::{Arrangement, Lane, check_hand, is_ordered};
use crate::card::Card;
use crate::combo::{Combinations, split_cards};
use crate::config::{Rules, SuitOrder};
use crate::error::{RuleError, RuleResult};
use crate::hand::{Strength, classify};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, warn};

/// 搜索的节点上限。每个 (尾道, 中道) 组合算一个节点，完整搜索共 1287 × 56 个。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchBudget {
    pub max_nodes: Option<usize>,
}

impl SearchBudget {
    pub fn unlimited() -> Self {
        SearchBudget { max_nodes: None }
    }

    pub fn nodes(max_nodes: usize) -> Self {
        SearchBudget { max_nodes: Some(max_nodes) }
    }

    fn exhausted(&self, nodes: usize) -> bool {
        self.max_nodes.is_some_and(|max| nodes > max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub arrangement: Arrangement,
    /// 三道 (牌型等级 + 基础分) 之和
    pub self_score: i32,
    /// 实际检查过的节点数
    pub nodes: usize,
    /// 是否搜完了所有组合
    pub exhaustive: bool,
}

/// 搜索过程中的候选摆法，牌和强度都是定长数组，不分配
#[derive(Clone, Copy)]
struct Candidate {
    score: i32,
    top: ([Card; 3], Strength),
    middle: ([Card; 5], Strength),
    bottom: ([Card; 5], Strength),
}

impl Candidate {
    /// 先比分数，再依次比尾道、中道、头道。完全相同时保留先找到的
    fn beats(&self, other: &Candidate, rules: &Rules) -> bool {
        let suits = &rules.suit_order;
        self.score
            .cmp(&other.score)
            .then_with(|| self.bottom.1.compare(&other.bottom.1, suits))
            .then_with(|| self.middle.1.compare(&other.middle.1, suits))
            .then_with(|| self.top.1.compare(&other.top.1, suits))
            == Ordering::Greater
    }

    fn into_arrangement(self) -> Arrangement {
        Arrangement::new(self.top.0.to_vec(), self.middle.0.to_vec(), self.bottom.0.to_vec())
    }
}

/// 最优摆法搜索
pub struct ArrangementSearch<'r> {
    rules: &'r Rules,
    budget: SearchBudget,
}

impl<'r> ArrangementSearch<'r> {
    pub fn new(rules: &'r Rules) -> Self {
        Self::with_budget(rules, SearchBudget::unlimited())
    }

    pub fn with_budget(rules: &'r Rules, budget: SearchBudget) -> Self {
        ArrangementSearch { rules, budget }
    }

    /// 找到自评分最高的合法摆法。
    ///
    /// 枚举所有 5 张作尾道、剩下 8 张中所有 5 张作中道，其余作头道，跳过倒水的。
    /// 超出节点上限时，在已找到的最好结果和贪心结果之间取分数高的。
    pub fn best(&self, hand: &[Card]) -> RuleResult<SearchOutcome> {
        check_hand(hand)?;
        let mut cards = hand.to_vec();
        cards.sort_by(|a, b| b.cmp(a));

        let mut best: Option<Candidate> = None;
        let mut nodes = 0;
        let mut exhaustive = true;

        'outer: for bottom_idx in Combinations::<5>::new(cards.len()) {
            let (bottom, rest) = split_cards::<5, 8>(&cards, &bottom_idx);
            let bottom_strength = classify(&bottom);
            for middle_idx in Combinations::<5>::new(rest.len()) {
                nodes += 1;
                if self.budget.exhausted(nodes) {
                    exhaustive = false;
                    break 'outer;
                }
                let (middle, top) = split_cards::<5, 3>(&rest, &middle_idx);
                let Some(candidate) = self.candidate(top, middle, (bottom, bottom_strength)) else {
                    continue;
                };
                if best.as_ref().is_none_or(|b| candidate.beats(b, self.rules)) {
                    best = Some(candidate);
                }
            }
        }

        if !exhaustive {
            warn!("搜索超出节点上限 {:?}, 改用目前最好的结果或贪心结果", self.budget.max_nodes);
            let greedy = self.greedy_candidate(&cards);
            best = match (best, greedy) {
                (Some(found), Some(g)) if g.score > found.score => Some(g),
                (None, g) => g,
                (found, _) => found,
            };
        } else if best.is_none() {
            warn!("完整搜索没有找到合法摆法, 改用贪心结果");
            best = self.greedy_candidate(&cards);
        }

        let Some(best) = best else {
            warn!("没有任何合法摆法");
            return Err(RuleError::NoLegalArrangement);
        };
        debug!("搜索完成: {} 个节点, 自评分 {}", nodes, best.score);
        Ok(SearchOutcome { arrangement: best.into_arrangement(), self_score: best.score, nodes, exhaustive })
    }

    /// 贪心：13 张里最好的 5 张作尾道，剩下 8 张里最好的 5 张作中道，其余作头道。
    ///
    /// 同样强的组合取先出现的，所以输入顺序会影响结果。倒水时返回 `None`。
    pub fn greedy(&self, hand: &[Card]) -> RuleResult<Option<Arrangement>> {
        check_hand(hand)?;
        Ok(self.greedy_candidate(hand).map(Candidate::into_arrangement))
    }

    fn greedy_candidate(&self, hand: &[Card]) -> Option<Candidate> {
        let suits = &self.rules.suit_order;
        let (bottom, rest) = strongest::<8>(hand, suits)?;
        let (middle, top) = strongest::<3>(&rest, suits)?;
        self.candidate(top, middle.0, bottom)
    }

    /// 三道不倒水时算出候选
    fn candidate(&self, top: [Card; 3], middle: [Card; 5], bottom: ([Card; 5], Strength)) -> Option<Candidate> {
        let top_strength = classify(&top);
        let middle_strength = classify(&middle);
        if !is_ordered(&top_strength, &middle_strength, &bottom.1, &self.rules.suit_order) {
            return None;
        }
        let score = self.lane_score(Lane::Top, &top_strength)
            + self.lane_score(Lane::Middle, &middle_strength)
            + self.lane_score(Lane::Bottom, &bottom.1);
        Some(Candidate { score, top: (top, top_strength), middle: (middle, middle_strength), bottom })
    }

    fn lane_score(&self, lane: Lane, strength: &Strength) -> i32 {
        strength.category.rank() + self.rules.base_values.value(lane, strength.category)
    }
}

/// 选出最强的 5 张 (同样强取先出现的)，返回它们和剩下的 `R` 张
fn strongest<const R: usize>(
    cards: &[Card],
    suits: &SuitOrder,
) -> Option<(([Card; 5], Strength), [Card; R])> {
    let mut best: Option<(([Card; 5], Strength), [Card; R])> = None;
    for idx in Combinations::<5>::new(cards.len()) {
        let (picked, rest) = split_cards::<5, R>(cards, &idx);
        let strength = classify(&picked);
        if best.as_ref().is_none_or(|((_, b), _)| strength.compare(b, suits) == Ordering::Greater) {
            best = Some(((picked, strength), rest));
        }
    }
    best
}

/// 最笨的摆法：从小到大切成 3/5/5。只在别的办法都不行时使用，结果仍需校验。
pub(crate) fn naive_cut(hand: &[Card]) -> Arrangement {
    let mut cards = hand.to_vec();
    cards.sort();
    let (top, rest) = cards.split_at(cards.len().min(3));
    let (middle, bottom) = rest.split_at(rest.len().min(5));
    Arrangement::new(top.to_vec(), middle.to_vec(), bottom.to_vec())
}

// --- 单元测试 ---
