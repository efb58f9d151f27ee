//! 八张玩法：头道 2 张、中道 3 张、尾道 3 张，没有特殊牌型。
//!
//! 牌道位置沿用 [`Lane`]，计分结果沿用 [`MatchResult`]。

use crate::arrangement::{Lane, Reason};
use crate::card::Card;
use crate::combo::{Combinations, split_cards};
use crate::config::{Rules, SuitOrder};
use crate::error::{RuleError, RuleResult};
use crate::hand::ensure_distinct;
use crate::scoring::{LaneResult, MatchResult, Outcome, Settlement};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use tracing::{debug, warn};

/// 一手八张牌的张数
pub const HAND_SIZE: usize = 8;

/// 八张玩法的牌型，从小到大。注意三条比顺子大。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum EightCategory {
    HighCard,
    OnePair,
    Straight,
    ThreeOfAKind,
    StraightFlush,
}

impl EightCategory {
    /// 牌型等级 1..=5
    pub const fn rank(self) -> i32 {
        self as i32 + 1
    }
}

impl fmt::Display for EightCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            EightCategory::HighCard => "高牌",
            EightCategory::OnePair => "对子",
            EightCategory::Straight => "顺子",
            EightCategory::ThreeOfAKind => "三条",
            EightCategory::StraightFlush => "同花顺",
        })
    }
}

const fn lane_width(lane: Lane) -> usize {
    match lane {
        Lane::Top => 2,
        Lane::Middle | Lane::Bottom => 3,
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct EightEvaluation {
    pub category: EightCategory,
    key: Vec<u8>,
    lead: Card,
    /// 从大到小排好的原始牌
    pub cards: Vec<Card>,
}

impl EightEvaluation {
    pub fn tiebreak_key(&self) -> &[u8] {
        &self.key
    }

    /// 牌型、点数序列 (只比公共前缀)，同花顺再比最大牌的花色
    pub fn compare(&self, other: &EightEvaluation, suits: &SuitOrder) -> Ordering {
        let common = self.key.len().min(other.key.len());
        self.category
            .cmp(&other.category)
            .then_with(|| self.key[..common].cmp(&other.key[..common]))
            .then_with(|| match self.category {
                EightCategory::StraightFlush => suits.tiebreak(self.lead.suit).cmp(&suits.tiebreak(other.lead.suit)),
                _ => Ordering::Equal,
            })
    }
}

/// 评估 2 张 (头道) 或 3 张 (中道、尾道)
pub fn evaluate(cards: &[Card]) -> RuleResult<EightEvaluation> {
    if cards.len() != 2 && cards.len() != 3 {
        return Err(RuleError::InvalidLaneSize { expected: "2 或 3", found: cards.len() });
    }
    ensure_distinct(cards)?;

    let mut sorted = cards.to_vec();
    sorted.sort_by(|a, b| b.cmp(a));
    let lead = sorted[0];
    let ranks: Vec<u8> = sorted.iter().map(|c| c.rank_strength()).collect();

    let (category, key) = if ranks.len() == 2 {
        if ranks[0] == ranks[1] {
            (EightCategory::OnePair, vec![ranks[0]])
        } else {
            (EightCategory::HighCard, ranks)
        }
    } else if ranks[0] == ranks[2] {
        (EightCategory::ThreeOfAKind, vec![ranks[0]])
    } else if let Some(high) = straight_key(&ranks) {
        let flush = sorted.windows(2).all(|w| w[0].suit == w[1].suit);
        let category = if flush { EightCategory::StraightFlush } else { EightCategory::Straight };
        (category, vec![high])
    } else if ranks[0] == ranks[1] {
        (EightCategory::OnePair, vec![ranks[0], ranks[2]])
    } else if ranks[1] == ranks[2] {
        (EightCategory::OnePair, vec![ranks[1], ranks[0]])
    } else {
        (EightCategory::HighCard, ranks)
    };

    Ok(EightEvaluation { category, key, lead, cards: sorted })
}

/// 三张顺子的比较值。`ranks` 从大到小。
///
/// A-K-Q 最大 (15)，A-2-3 第二 (14)，其余按最大的牌 (K-Q-J 为 13)。
fn straight_key(ranks: &[u8]) -> Option<u8> {
    match ranks {
        [14, 13, 12] => Some(15),
        [14, 3, 2] => Some(14),
        [a, b, c] if a - 1 == *b && b - 1 == *c => Some(*a),
        _ => None,
    }
}

/// 八张的摆法
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct EightArrangement {
    pub head: Vec<Card>,
    pub middle: Vec<Card>,
    pub tail: Vec<Card>,
}

impl EightArrangement {
    pub fn new(head: Vec<Card>, middle: Vec<Card>, tail: Vec<Card>) -> Self {
        EightArrangement { head, middle, tail }
    }

    pub fn lane(&self, lane: Lane) -> &[Card] {
        match lane {
            Lane::Top => &self.head,
            Lane::Middle => &self.middle,
            Lane::Bottom => &self.tail,
        }
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.head.iter().chain(self.middle.iter()).chain(self.tail.iter())
    }
}

impl fmt::Display for EightArrangement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for lane in Lane::ALL {
            write!(f, "{}:", lane)?;
            for card in self.lane(lane) {
                write!(f, " {}", card)?;
            }
            if lane != Lane::Bottom {
                write!(f, " | ")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct EightVerdict {
    pub legal: bool,
    pub reason: Option<Reason>,
    pub lanes: [EightEvaluation; 3],
}

impl EightVerdict {
    pub fn lane(&self, lane: Lane) -> &EightEvaluation {
        &self.lanes[lane.index()]
    }
}

pub fn check_hand(hand: &[Card]) -> RuleResult<()> {
    if hand.len() != HAND_SIZE {
        return Err(RuleError::MalformedArrangement(format!("手牌必须是 8 张, 实际 {} 张", hand.len())));
    }
    ensure_distinct(hand)
}

/// 校验八张摆法：张数 2/3/3，三道恰好是手牌，且不倒水
pub fn validate(arrangement: &EightArrangement, hand: &[Card], suits: &SuitOrder) -> RuleResult<EightVerdict> {
    for lane in Lane::ALL {
        let found = arrangement.lane(lane).len();
        if found != lane_width(lane) {
            return Err(RuleError::MalformedArrangement(format!(
                "{}需要 {} 张, 实际 {} 张",
                lane,
                lane_width(lane),
                found
            )));
        }
    }

    let mut used: Vec<Card> = arrangement.cards().copied().collect();
    let mut source = hand.to_vec();
    used.sort();
    source.sort();
    if used != source {
        return Err(RuleError::MalformedArrangement("三道的牌与手牌不一致".to_string()));
    }
    if let Some(w) = source.windows(2).find(|w| w[0] == w[1]) {
        return Err(RuleError::MalformedArrangement(format!("手牌中有重复的 {}", w[0])));
    }

    let lanes = [
        evaluate(&arrangement.head)?,
        evaluate(&arrangement.middle)?,
        evaluate(&arrangement.tail)?,
    ];
    let legal = lanes[0].compare(&lanes[1], suits) != Ordering::Greater
        && lanes[1].compare(&lanes[2], suits) != Ordering::Greater;
    Ok(EightVerdict { legal, reason: if legal { None } else { Some(Reason::Foul) }, lanes })
}

/// 赢下这一道得到的分：头道对子按对子点数，中道、尾道查表
pub fn lane_value(rules: &Rules, lane: Lane, evaluation: &EightEvaluation) -> i32 {
    let table = &rules.eight;
    let found = match lane {
        Lane::Top if evaluation.category == EightCategory::OnePair => Some(evaluation.key[0] as i32),
        Lane::Top => None,
        Lane::Middle => table.middle.get(&evaluation.category).copied(),
        Lane::Bottom => table.tail.get(&evaluation.category).copied(),
    };
    found.unwrap_or(table.fallback)
}

/// 两名玩家的八张比较，分数站在 `a` 的角度。
///
/// 一方倒水时固定输 `foul_penalty`，双方都倒水为平局。不打枪。
pub fn score(rules: &Rules, a: &EightVerdict, b: &EightVerdict) -> MatchResult {
    let skipped = Lane::ALL.map(|lane| LaneResult { lane, outcome: Outcome::Skipped, delta: 0 });
    let penalty = rules.eight.foul_penalty;
    let fouled = |score: i32, settlement: Settlement| MatchResult {
        score,
        per_lane: skipped,
        special: None,
        settlement,
        swept: false,
    };
    match (a.legal, b.legal) {
        (false, false) => return fouled(0, Settlement::BothFouled),
        (false, true) => return fouled(-penalty, Settlement::Foul),
        (true, false) => return fouled(penalty, Settlement::Foul),
        (true, true) => {}
    }

    let per_lane = Lane::ALL.map(|lane| {
        let (mine, theirs) = (a.lane(lane), b.lane(lane));
        match mine.compare(theirs, &rules.suit_order) {
            Ordering::Greater => LaneResult { lane, outcome: Outcome::Won, delta: lane_value(rules, lane, mine) },
            Ordering::Less => LaneResult { lane, outcome: Outcome::Lost, delta: -lane_value(rules, lane, theirs) },
            Ordering::Equal => LaneResult { lane, outcome: Outcome::Tied, delta: 0 },
        }
    });
    let swept = per_lane.iter().all(|r| r.outcome == Outcome::Won)
        || per_lane.iter().all(|r| r.outcome == Outcome::Lost);
    MatchResult {
        score: per_lane.iter().map(|r| r.delta).sum(),
        per_lane,
        special: None,
        settlement: Settlement::Lanes,
        swept,
    }
}

/// 一桌两两比较后的总分，总和为 0
pub fn settle_table(rules: &Rules, verdicts: &[EightVerdict]) -> Vec<i32> {
    let mut totals = vec![0; verdicts.len()];
    for i in 0..verdicts.len() {
        for j in i + 1..verdicts.len() {
            let pair = score(rules, &verdicts[i], &verdicts[j]).score;
            totals[i] += pair;
            totals[j] -= pair;
        }
    }
    totals
}

/// 完整搜索 C(8,3)·C(5,3) = 560 种分法，取自评分 (牌型等级 + 基础分) 最高的合法摆法。
///
/// 同分时依次比尾道、中道、头道，完全相同保留先找到的。
pub fn best(rules: &Rules, hand: &[Card]) -> RuleResult<(EightArrangement, i32)> {
    check_hand(hand)?;
    let suits = &rules.suit_order;
    let mut cards = hand.to_vec();
    cards.sort_by(|a, b| b.cmp(a));

    let mut best: Option<(i32, [EightEvaluation; 3])> = None;
    let mut nodes = 0;
    for tail_idx in Combinations::<3>::new(cards.len()) {
        let (tail, rest) = split_cards::<3, 5>(&cards, &tail_idx);
        let tail = evaluate(&tail)?;
        for middle_idx in Combinations::<3>::new(rest.len()) {
            nodes += 1;
            let (middle, head) = split_cards::<3, 2>(&rest, &middle_idx);
            let (middle, head) = (evaluate(&middle)?, evaluate(&head)?);
            if head.compare(&middle, suits) == Ordering::Greater || middle.compare(&tail, suits) == Ordering::Greater {
                continue;
            }

            let lanes = [head, middle, tail.clone()];
            let self_score: i32 = Lane::ALL
                .iter()
                .map(|&lane| lanes[lane.index()].category.rank() + lane_value(rules, lane, &lanes[lane.index()]))
                .sum();
            let better = match &best {
                None => true,
                Some((top_score, top)) => {
                    let order = self_score
                        .cmp(top_score)
                        .then_with(|| lanes[2].compare(&top[2], suits))
                        .then_with(|| lanes[1].compare(&top[1], suits))
                        .then_with(|| lanes[0].compare(&top[0], suits));
                    order == Ordering::Greater
                }
            };
            if better {
                best = Some((self_score, lanes));
            }
        }
    }

    let Some((self_score, [head, middle, tail])) = best else {
        warn!("八张没有找到合法摆法");
        return Err(RuleError::NoLegalArrangement);
    };
    debug!("八张搜索完成: {} 个节点, 自评分 {}", nodes, self_score);
    Ok((EightArrangement::new(head.cards, middle.cards, tail.cards), self_score))
}

/// 推荐一个不倒水的八张摆法
pub fn suggest(rules: &Rules, hand: &[Card]) -> RuleResult<EightArrangement> {
    let (arrangement, _) = best(rules, hand)?;
    if !validate(&arrangement, hand, &rules.suit_order)?.legal {
        warn!("八张搜索结果倒水: {}", arrangement);
        return Err(RuleError::NoLegalArrangement);
    }
    Ok(arrangement)
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{deal, parse_cards};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn eval(text: &str) -> EightEvaluation {
        evaluate(&parse_cards(text).unwrap()).unwrap()
    }

    fn cmp(a: &str, b: &str) -> Ordering {
        eval(a).compare(&eval(b), &SuitOrder::default())
    }

    fn verdict(head: &str, middle: &str, tail: &str) -> EightVerdict {
        let arrangement = EightArrangement::new(
            parse_cards(head).unwrap(),
            parse_cards(middle).unwrap(),
            parse_cards(tail).unwrap(),
        );
        let hand: Vec<Card> = arrangement.cards().copied().collect();
        validate(&arrangement, &hand, &SuitOrder::default()).unwrap()
    }

    #[test]
    fn test_categories() {
        assert_eq!(eval("5s 6s 7s").category, EightCategory::StraightFlush);
        assert_eq!(eval("5s 5h 5d").category, EightCategory::ThreeOfAKind);
        assert_eq!(eval("5s 6h 7s").category, EightCategory::Straight);
        assert_eq!(eval("5s 5h 7s").category, EightCategory::OnePair);
        assert_eq!(eval("2s 5s 9s").category, EightCategory::HighCard);
        // 头道两张只有对子和高牌
        assert_eq!(eval("9s 9h").category, EightCategory::OnePair);
        assert_eq!(eval("9s Ts").category, EightCategory::HighCard);
        assert!(matches!(evaluate(&parse_cards("9s").unwrap()), Err(RuleError::InvalidLaneSize { .. })));
    }

    #[test]
    fn test_three_of_a_kind_beats_straight() {
        assert_eq!(cmp("2s 2h 2d", "Qs Kh Ad"), Ordering::Greater);
        assert_eq!(cmp("2s 2h 2d", "Qs Ks As"), Ordering::Less);
    }

    #[test]
    fn test_straight_order() {
        assert_eq!(cmp("As Kh Qd", "As 2h 3d"), Ordering::Greater);
        assert_eq!(cmp("Ah 2h 3d", "Ks Qh Jd"), Ordering::Greater);
        assert_eq!(cmp("Ks Qh Jd", "2s 3h 4d"), Ordering::Greater);
        assert_eq!(cmp("Ks Qh Jd", "Kh Qd Js"), Ordering::Equal);
        // 同花顺点数相同再比花色
        assert_eq!(cmp("9s Ts Js", "9h Th Jh"), Ordering::Greater);
    }

    #[test]
    fn test_pair_key() {
        assert_eq!(eval("5s 7h 7d").tiebreak_key(), &[7, 5]);
        assert_eq!(cmp("7s 7h Ad", "7c 7d Kd"), Ordering::Greater);
        // 头道对子和中道同点数对子只比对子
        assert_eq!(cmp("As Ah", "Ac Ad 2c"), Ordering::Equal);
    }

    #[test]
    fn test_foul() {
        assert!(verdict("2s 5h", "9s 9h 3d", "Js Jh Jd").legal);
        let fouled = verdict("As Ah", "Ks Kh 3d", "Js Jh Jd");
        assert!(!fouled.legal);
        assert_eq!(fouled.reason, Some(Reason::Foul));
    }

    #[test]
    fn test_validate_rejects_bad_shapes() {
        let arrangement = EightArrangement::new(
            parse_cards("2s 5h 6h").unwrap(),
            parse_cards("9s 9h").unwrap(),
            parse_cards("Js Jh Jd").unwrap(),
        );
        let hand: Vec<Card> = arrangement.cards().copied().collect();
        assert!(matches!(
            validate(&arrangement, &hand, &SuitOrder::default()),
            Err(RuleError::MalformedArrangement(_))
        ));
    }

    #[test]
    fn test_score() {
        let rules = Rules::default();
        // 头道 99 赢 9 分，中道三条赢 6 分，尾道同花顺输 5 分
        let a = verdict("9s 9h", "5s 5h 5d", "6c 7c 8c");
        let b = verdict("2s 4h", "Qs Qh 3d", "Td Jd Qd");
        assert!(a.legal && b.legal);
        let result = score(&rules, &a, &b);
        assert_eq!(result.per_lane.map(|r| r.delta), [9, 6, -5]);
        assert_eq!(result.score, 10);
        assert!(!result.swept);
        assert_eq!(score(&rules, &b, &a), result.reversed());

        let fouled = verdict("As Ah", "Ks Kh 3d", "Js Jh Jd");
        assert_eq!(score(&rules, &fouled, &a).score, -3);
        assert_eq!(score(&rules, &a, &fouled).score, 3);
        assert_eq!(score(&rules, &fouled, &fouled.clone()).settlement, Settlement::BothFouled);

        let totals = settle_table(&rules, &[a, b, fouled]);
        assert_eq!(totals.iter().sum::<i32>(), 0);
    }

    #[test]
    fn test_suggest_is_legal() {
        let rules = Rules::default();
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..20 {
            for hand in deal(6, HAND_SIZE, &mut rng).unwrap() {
                let arrangement = suggest(&rules, &hand).unwrap();
                assert!(validate(&arrangement, &hand, &rules.suit_order).unwrap().legal);
            }
        }
    }

    #[test]
    fn test_best_prefers_strong_tail() {
        let rules = Rules::default();
        let hand = parse_cards("5s 6s 7s 9h 9d 9c 2h 3c").unwrap();
        let (arrangement, self_score) = best(&rules, &hand).unwrap();
        assert_eq!(eval_lane(&arrangement.tail), EightCategory::StraightFlush);
        assert_eq!(eval_lane(&arrangement.middle), EightCategory::ThreeOfAKind);
        // 尾道 5 + 5，中道 4 + 6，头道 1 + 1
        assert_eq!(self_score, 22);
    }

    fn eval_lane(cards: &[Card]) -> EightCategory {
        evaluate(cards).unwrap().category
    }

    #[test]
    fn test_malformed_hand() {
        let rules = Rules::default();
        let hand = parse_cards("5s 6s 7s 9h 9d 9c 2h").unwrap();
        assert!(matches!(suggest(&rules, &hand), Err(RuleError::MalformedArrangement(_))));
    }
}
