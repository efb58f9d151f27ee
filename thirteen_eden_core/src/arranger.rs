use crate::arrangement::{Arrangement, check_hand, validate};
use crate::card::Card;
use crate::config::Rules;
use crate::error::{RuleError, RuleResult};
use crate::search::{ArrangementSearch, SearchBudget, naive_cut};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

/// 给玩家 (或机器人座位) 推荐摆法。
///
/// 先做搜索；搜索失败时用固定种子打乱手牌再跑贪心，最多重试 `max_retries` 次；
/// 最后试一次从小到大切牌。每个候选都重新校验，绝不返回倒水的摆法。
pub struct AiArranger<'r> {
    rules: &'r Rules,
    budget: SearchBudget,
    max_retries: usize,
    seed: u64,
}

impl<'r> AiArranger<'r> {
    pub fn new(rules: &'r Rules) -> Self {
        AiArranger { rules, budget: SearchBudget::unlimited(), max_retries: 8, seed: 0 }
    }

    pub fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// 手牌不是 13 张或有重复时直接返回错误，不重试
    pub fn suggest(&self, hand: &[Card]) -> RuleResult<Arrangement> {
        check_hand(hand)?;
        let search = ArrangementSearch::with_budget(self.rules, self.budget);

        match search.best(hand) {
            Ok(outcome) if self.is_legal(&outcome.arrangement, hand)? => return Ok(outcome.arrangement),
            Ok(outcome) => warn!("搜索结果倒水: {}", outcome.arrangement),
            Err(RuleError::NoLegalArrangement) => warn!("搜索没有找到合法摆法"),
            Err(e) => return Err(e),
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut cards = hand.to_vec();
        for attempt in 1..=self.max_retries {
            cards.shuffle(&mut rng);
            match search.greedy(&cards)? {
                Some(arrangement) if self.is_legal(&arrangement, hand)? => {
                    debug!("第 {} 次重试得到合法摆法", attempt);
                    return Ok(arrangement);
                }
                _ => warn!("第 {} 次重试失败", attempt),
            }
        }

        let cut = naive_cut(hand);
        if self.is_legal(&cut, hand)? {
            return Ok(cut);
        }
        warn!("重试 {} 次后仍没有合法摆法", self.max_retries);
        Err(RuleError::NoLegalArrangement)
    }

    fn is_legal(&self, arrangement: &Arrangement, hand: &[Card]) -> RuleResult<bool> {
        Ok(validate(arrangement, hand, &self.rules.suit_order)?.legal)
    }
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{deal, parse_cards};

    fn assert_suggestion_ok(arranger: &AiArranger, hand: &[Card], rules: &Rules) {
        let arrangement = arranger.suggest(hand).unwrap();
        let verdict = validate(&arrangement, hand, &rules.suit_order).unwrap();
        assert!(verdict.legal, "倒水: {}", arrangement);

        let mut used: Vec<Card> = arrangement.cards().copied().collect();
        let mut expected = hand.to_vec();
        used.sort();
        expected.sort();
        assert_eq!(used, expected);
    }

    #[test]
    fn test_suggestions_are_legal() {
        let rules = Rules::default();
        // 限制节点数，让大量随机手牌也能很快跑完
        let arranger = AiArranger::new(&rules).with_budget(SearchBudget::nodes(2000));
        let mut rng = StdRng::seed_from_u64(2025);
        for _ in 0..50 {
            for hand in deal(4, 13, &mut rng).unwrap() {
                assert_suggestion_ok(&arranger, &hand, &rules);
            }
        }
    }

    #[test]
    fn test_full_search_suggestions_are_legal() {
        let rules = Rules { sweep_multiplier: Some(2), ..Rules::default() };
        let arranger = AiArranger::new(&rules);
        let mut rng = StdRng::seed_from_u64(99);
        for hand in deal(4, 13, &mut rng).unwrap() {
            assert_suggestion_ok(&arranger, &hand, &rules);
        }
    }

    #[test]
    fn test_special_hands_get_legal_suggestions() {
        let rules = Rules::default();
        let arranger = AiArranger::new(&rules).with_budget(SearchBudget::nodes(0));
        for text in [
            "2s 3h 4d 5c 6s 7h 8d 9c Ts Jh Qd Kc Ah",
            "2s 2h 3d 3c 4s 4h 5d 5c 6s 6h 7d 7c As",
            "As Ah Ad Ac Ks Kh Kd Kc Qs Qh Qd Qc Js",
        ] {
            assert_suggestion_ok(&arranger, &parse_cards(text).unwrap(), &rules);
        }
    }

    #[test]
    fn test_same_seed_same_suggestion() {
        let rules = Rules::default();
        let hand = parse_cards("2s 2h 9d Tc Js Qh Kd Kc As Ah 4d 6c 8s").unwrap();
        let a = AiArranger::new(&rules).with_seed(5).with_budget(SearchBudget::nodes(100));
        let b = AiArranger::new(&rules).with_seed(5).with_budget(SearchBudget::nodes(100));
        assert_eq!(a.suggest(&hand).unwrap(), b.suggest(&hand).unwrap());
    }

    #[test]
    fn test_malformed_hand_propagates() {
        let rules = Rules::default();
        let arranger = AiArranger::new(&rules).with_retries(3);
        let short = parse_cards("2s 2h 9d Tc Js Qh Kd Kc As Ah 4d 6c").unwrap();
        assert!(matches!(arranger.suggest(&short), Err(RuleError::MalformedArrangement(_))));

        let mut dup = parse_cards("2s 2h 9d Tc Js Qh Kd Kc As Ah 4d 6c 8s").unwrap();
        dup[12] = dup[0];
        assert!(matches!(arranger.suggest(&dup), Err(RuleError::DuplicateCard(_))));
    }
}
