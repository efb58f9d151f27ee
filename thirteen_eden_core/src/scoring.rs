use crate::arrangement::{Arrangement, Lane, Verdict, validate};
use crate::card::Card;
use crate::config::Rules;
use crate::error::RuleResult;
use crate::hand::Category;
use crate::special::{SpecialDetector, SpecialHand};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// 一名玩家在本局的摆法，附带校验和特殊牌型检测的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub arrangement: Arrangement,
    pub verdict: Verdict,
    pub special: Option<SpecialHand>,
}

impl Entry {
    /// 校验摆法并检测特殊牌型。摆法本身会作为三同花/三顺子的候选。
    ///
    /// 打开 `strong_lanes_void_special` 时，中道或尾道有铁支、同花顺的摆法不算特殊牌型。
    pub fn new(rules: &Rules, arrangement: Arrangement, hand: &[Card]) -> RuleResult<Entry> {
        let verdict = validate(&arrangement, hand, &rules.suit_order)?;
        let special = if rules.strong_lanes_void_special && has_strong_back_lane(&verdict) {
            None
        } else {
            SpecialDetector::new(rules).detect_with_hint(hand, Some(&arrangement))?
        };
        Ok(Entry { arrangement, verdict, special })
    }

    pub fn is_foul(&self) -> bool {
        !self.verdict.legal
    }

    /// 三道基础分之和，对手倒水时按这个数赢
    fn lane_value_sum(&self, rules: &Rules) -> i32 {
        Lane::ALL
            .iter()
            .map(|&lane| rules.base_values.value(lane, self.verdict.lane(lane).category()))
            .sum()
    }
}

/// 单道的胜负
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Won,
    Lost,
    Tied,
    /// 这一道没有比 (特殊牌型或双方倒水)
    Skipped,
}

impl Outcome {
    fn flip(self) -> Outcome {
        match self {
            Outcome::Won => Outcome::Lost,
            Outcome::Lost => Outcome::Won,
            other => other,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct LaneResult {
    pub lane: Lane,
    pub outcome: Outcome,
    /// 这一道的得失分，不含打枪倍数
    pub delta: i32,
}

/// 决定这场比较的规则
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Settlement {
    /// 逐道比较
    Lanes,
    /// 有一方倒水
    Foul,
    /// 双方都倒水，平局
    BothFouled,
    /// 有一方是特殊牌型
    Special,
    /// 双方都是特殊牌型，平局
    BothSpecial,
}

/// 两名玩家一局的比较结果，分数站在第一名玩家的角度
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub score: i32,
    pub per_lane: [LaneResult; 3],
    /// 决定胜负的特殊牌型
    pub special: Option<SpecialHand>,
    pub settlement: Settlement,
    /// 一方三道全胜
    pub swept: bool,
}

impl MatchResult {
    /// 对手视角的结果
    pub fn reversed(&self) -> MatchResult {
        MatchResult {
            score: -self.score,
            per_lane: self.per_lane.map(|r| LaneResult { lane: r.lane, outcome: r.outcome.flip(), delta: -r.delta }),
            special: self.special,
            settlement: self.settlement,
            swept: self.swept,
        }
    }

    fn settled(settlement: Settlement, score: i32, per_lane: [LaneResult; 3], special: Option<SpecialHand>) -> Self {
        MatchResult { score, per_lane, special, settlement, swept: false }
    }
}

/// 计分引擎。
///
/// 规则的先后：先看倒水，再看特殊牌型，最后逐道比较。
/// 任何两名玩家之间 `score(a, b) == -score(b, a)`。
pub struct ScoringEngine<'r> {
    rules: &'r Rules,
}

impl<'r> ScoringEngine<'r> {
    pub fn new(rules: &'r Rules) -> Self {
        ScoringEngine { rules }
    }

    pub fn score(&self, a: &Entry, b: &Entry) -> MatchResult {
        match (a.is_foul(), b.is_foul()) {
            (true, true) => return MatchResult::settled(Settlement::BothFouled, 0, skipped(), None),
            (true, false) => return self.foul(b).reversed(),
            (false, true) => return self.foul(a),
            (false, false) => {}
        }

        match (a.special, b.special) {
            (Some(_), Some(_)) => MatchResult::settled(Settlement::BothSpecial, 0, skipped(), None),
            (Some(special), None) => self.special(special),
            (None, Some(special)) => self.special(special).reversed(),
            (None, None) => self.lanes(a, b),
        }
    }

    /// 直接用摆法和手牌计分
    pub fn score_arrangements(
        &self,
        a: (&Arrangement, &[Card]),
        b: (&Arrangement, &[Card]),
    ) -> RuleResult<MatchResult> {
        let a = Entry::new(self.rules, a.0.clone(), a.1)?;
        let b = Entry::new(self.rules, b.0.clone(), b.1)?;
        Ok(self.score(&a, &b))
    }

    /// 一桌所有玩家两两比较后的总分，顺序与 `entries` 相同，总和为 0
    pub fn settle_table(&self, entries: &[Entry]) -> Vec<i32> {
        let mut totals = vec![0; entries.len()];
        for i in 0..entries.len() {
            for j in i + 1..entries.len() {
                let result = self.score(&entries[i], &entries[j]);
                debug!("座位 {} 对 {}: {} ({:?})", i, j, result.score, result.settlement);
                totals[i] += result.score;
                totals[j] -= result.score;
            }
        }
        totals
    }

    /// `winner` 没倒水，对手倒水
    fn foul(&self, winner: &Entry) -> MatchResult {
        let per_lane = Lane::ALL.map(|lane| LaneResult {
            lane,
            outcome: Outcome::Won,
            delta: self.rules.base_values.value(lane, winner.verdict.lane(lane).category()),
        });
        MatchResult::settled(Settlement::Foul, winner.lane_value_sum(self.rules), per_lane, None)
    }

    fn special(&self, special: SpecialHand) -> MatchResult {
        let bonus = self.rules.special_bonuses.bonus(special);
        MatchResult::settled(Settlement::Special, bonus, skipped(), Some(special))
    }

    fn lanes(&self, a: &Entry, b: &Entry) -> MatchResult {
        let values = &self.rules.base_values;
        let per_lane = Lane::ALL.map(|lane| {
            let (mine, theirs) = (a.verdict.lane(lane), b.verdict.lane(lane));
            match mine.strength().compare(theirs.strength(), &self.rules.suit_order) {
                Ordering::Greater => LaneResult { lane, outcome: Outcome::Won, delta: values.value(lane, mine.category()) },
                Ordering::Less => LaneResult { lane, outcome: Outcome::Lost, delta: -values.value(lane, theirs.category()) },
                Ordering::Equal => LaneResult { lane, outcome: Outcome::Tied, delta: 0 },
            }
        });

        let swept = per_lane.iter().all(|r| r.outcome == Outcome::Won)
            || per_lane.iter().all(|r| r.outcome == Outcome::Lost);
        let mut score: i32 = per_lane.iter().map(|r| r.delta).sum();
        if let (true, Some(multiplier)) = (swept, self.rules.sweep_multiplier) {
            score *= multiplier;
        }

        MatchResult { score, per_lane, special: None, settlement: Settlement::Lanes, swept }
    }
}

fn has_strong_back_lane(verdict: &Verdict) -> bool {
    [Lane::Middle, Lane::Bottom].iter().any(|&lane| {
        matches!(verdict.lane(lane).category(), Category::FourOfAKind | Category::StraightFlush)
    })
}

fn skipped() -> [LaneResult; 3] {
    Lane::ALL.map(|lane| LaneResult { lane, outcome: Outcome::Skipped, delta: 0 })
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{deal, parse_cards};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;

    fn entry(rules: &Rules, top: &str, middle: &str, bottom: &str) -> Entry {
        let arrangement = Arrangement::new(
            parse_cards(top).unwrap(),
            parse_cards(middle).unwrap(),
            parse_cards(bottom).unwrap(),
        );
        let hand: Vec<Card> = arrangement.cards().copied().collect();
        Entry::new(rules, arrangement, &hand).unwrap()
    }

    // 高牌 / 一对 / 葫芦
    fn plain_a(rules: &Rules) -> Entry {
        entry(rules, "2s 7h 9d", "Qs Qh 4d 6c 8s", "Ks Kh Kd 3c 3s")
    }

    // 一对 / 三条 / 葫芦
    fn plain_b(rules: &Rules) -> Entry {
        entry(rules, "Ac Ad 5d", "Jc Jd Jh 2h 4s", "Tc Td Th 5c 5h")
    }

    #[test]
    fn test_lane_by_lane() {
        let rules = Rules::default();
        let engine = ScoringEngine::new(&rules);
        let (a, b) = (plain_a(&rules), plain_b(&rules));
        assert_eq!(a.special, None);
        assert_eq!(b.special, None);

        let result = engine.score(&a, &b);
        assert_eq!(result.settlement, Settlement::Lanes);
        assert_eq!(result.per_lane[0].outcome, Outcome::Lost);
        assert_eq!(result.per_lane[1].outcome, Outcome::Lost);
        assert_eq!(result.per_lane[2].outcome, Outcome::Won);
        assert_eq!(result.score, -1);
        assert!(!result.swept);
        assert_eq!(engine.score(&b, &a), result.reversed());
    }

    #[test]
    fn test_base_values_by_lane() {
        let rules = Rules::default();
        let engine = ScoringEngine::new(&rules);
        // 一对 / 三条 / 铁支，三道全胜
        let strong = entry(&rules, "Qs Qh 2d", "9s 9h 9d 3c 4h", "8c 8d 8h 8s 6c");
        let weak = entry(&rules, "2s 3h 5c", "Js Jh 4d 6s 7d", "Ks Kh Kd Tc Ts");

        let result = engine.score(&strong, &weak);
        assert_eq!(result.per_lane.map(|r| r.delta), [1, 1, 4]);
        assert_eq!(result.score, 6);
        assert!(result.swept);

        // 打枪默认关闭；打开后整道分数翻倍
        let doubled = Rules { sweep_multiplier: Some(2), ..Rules::default() };
        let result = ScoringEngine::new(&doubled).score(&strong, &weak);
        assert_eq!(result.score, 12);
        assert_eq!(result.per_lane.map(|r| r.delta), [1, 1, 4]);
        assert_eq!(ScoringEngine::new(&doubled).score(&weak, &strong).score, -12);
    }

    #[test]
    fn test_foul_loses_opponent_lane_values() {
        let rules = Rules::default();
        let engine = ScoringEngine::new(&rules);
        // 头道三条比中道一对大，倒水
        let fouled = entry(&rules, "Ks Kh Kd", "Qs Qh 4d 6c 8s", "2s 7h 9d 3c 3s");
        assert!(fouled.is_foul());

        let result = engine.score(&fouled, &plain_b(&rules));
        assert_eq!(result.settlement, Settlement::Foul);
        assert_eq!(result.score, -3);
        assert!(result.per_lane.iter().all(|r| r.outcome == Outcome::Lost));
        assert_eq!(engine.score(&plain_b(&rules), &fouled), result.reversed());

        let both = engine.score(&fouled, &fouled.clone());
        assert_eq!(both.settlement, Settlement::BothFouled);
        assert_eq!(both.score, 0);
    }

    #[test]
    fn test_dragon_wins_outright() {
        let rules = Rules::default();
        let engine = ScoringEngine::new(&rules);
        let dragon = entry(&rules, "2s 3h 5c", "4d 6s 7h 8d 9c", "Ts Jh Qd Kc Ah");
        assert!(!dragon.is_foul());
        assert_eq!(dragon.special, Some(SpecialHand::Dragon));

        let result = engine.score(&dragon, &plain_a(&rules));
        assert_eq!(result.settlement, Settlement::Special);
        assert_eq!(result.special, Some(SpecialHand::Dragon));
        assert_eq!(result.score, 13);
        assert!(result.per_lane.iter().all(|r| r.outcome == Outcome::Skipped));
        assert_eq!(engine.score(&plain_a(&rules), &dragon).score, -13);

        let both = engine.score(&dragon, &dragon.clone());
        assert_eq!(both.settlement, Settlement::BothSpecial);
        assert_eq!(both.score, 0);
    }

    #[test]
    fn test_strong_lanes_void_special_when_enabled() {
        // 三同花，但尾道摆成了同花顺
        let layout = ("2h 5h 9h", "2s 6s 8s Js Ks", "9c Tc Jc Qc Kc");
        let default_rules = Rules::default();
        let with_special = entry(&default_rules, layout.0, layout.1, layout.2);
        assert_eq!(with_special.special, Some(SpecialHand::ThreeFlushes));

        let rules = Rules { strong_lanes_void_special: true, ..Rules::default() };
        let engine = ScoringEngine::new(&rules);
        let plain = entry(&rules, layout.0, layout.1, layout.2);
        assert!(!plain.is_foul());
        assert_eq!(plain.special, None);

        // 按三道比：头道 9-5-2 输给 9-7-2，中道同花、尾道同花顺都赢
        let result = engine.score(&plain, &plain_a(&rules));
        assert_eq!(result.settlement, Settlement::Lanes);
        assert_eq!(result.per_lane.map(|r| r.outcome), [Outcome::Lost, Outcome::Won, Outcome::Won]);

        // 没有铁支、同花顺的特殊牌型不受影响
        let dragon = entry(&rules, "2s 3h 5c", "4d 6s 7h 8d 9c", "Ts Jh Qd Kc Ah");
        assert_eq!(dragon.special, Some(SpecialHand::Dragon));
    }

    #[test]
    fn test_score_arrangements() {
        let rules = Rules::default();
        let engine = ScoringEngine::new(&rules);
        let (a, b) = (plain_a(&rules), plain_b(&rules));
        let hand_a: Vec<Card> = a.arrangement.cards().copied().collect();
        let hand_b: Vec<Card> = b.arrangement.cards().copied().collect();
        let result = engine
            .score_arrangements((&a.arrangement, &hand_a), (&b.arrangement, &hand_b))
            .unwrap();
        assert_eq!(result, engine.score(&a, &b));
        assert!(engine.score_arrangements((&a.arrangement, &hand_b), (&b.arrangement, &hand_b)).is_err());
    }

    #[test]
    fn test_score_is_antisymmetric() {
        let rules = Rules { sweep_multiplier: Some(3), ..Rules::default() };
        let engine = ScoringEngine::new(&rules);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..20 {
            let hands = deal(2, 13, &mut rng).unwrap();
            // 随便切成 3/5/5，倒水和不倒水的都会有
            let entries: Vec<Entry> = hands
                .iter()
                .map(|hand| {
                    let mut cut = hand.clone();
                    cut.shuffle(&mut rng);
                    let arrangement = Arrangement::new(cut[..3].to_vec(), cut[3..8].to_vec(), cut[8..].to_vec());
                    Entry::new(&rules, arrangement, hand).unwrap()
                })
                .collect();

            let ab = engine.score(&entries[0], &entries[1]);
            let ba = engine.score(&entries[1], &entries[0]);
            assert_eq!(ab.score, -ba.score);
            assert_eq!(ab.reversed(), ba);
        }
    }

    #[test]
    fn test_settle_table_sums_to_zero() {
        let rules = Rules::default();
        let engine = ScoringEngine::new(&rules);
        let fouled = entry(&rules, "Ks Kh Kd", "Qs Qh 4d 6c 8s", "2s 7h 9d 3c 3s");
        let entries = vec![plain_a(&rules), plain_b(&rules), fouled];

        let totals = engine.settle_table(&entries);
        assert_eq!(totals.iter().sum::<i32>(), 0);
        assert_eq!(
            totals[0],
            engine.score(&entries[0], &entries[1]).score + engine.score(&entries[0], &entries[2]).score
        );
        assert!(engine.settle_table(&[]).is_empty());
    }
}
