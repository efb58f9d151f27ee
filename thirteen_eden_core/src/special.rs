use crate::arrangement::{Arrangement, Lane, check_hand, is_ordered, validate};
use crate::card::Card;
use crate::combo::{Combinations, split_cards};
use crate::config::Rules;
use crate::error::RuleResult;
use crate::hand::classify;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 特殊牌型。变体顺序即检测的优先级。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum SpecialHand {
    /// 一条龙：A 到 2 各一张
    Dragon,
    /// 六对半：六个对子加一张单牌
    SixPairsHalf,
    /// 三同花：三道各自同花
    ThreeFlushes,
    /// 三顺子：三道各自是顺子
    ThreeStraights,
}

impl fmt::Display for SpecialHand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            SpecialHand::Dragon => "一条龙",
            SpecialHand::SixPairsHalf => "六对半",
            SpecialHand::ThreeFlushes => "三同花",
            SpecialHand::ThreeStraights => "三顺子",
        })
    }
}

/// 特殊牌型检测，规则在构造时注入
pub struct SpecialDetector<'r> {
    rules: &'r Rules,
}

impl<'r> SpecialDetector<'r> {
    pub fn new(rules: &'r Rules) -> Self {
        SpecialDetector { rules }
    }

    pub fn detect(&self, hand: &[Card]) -> RuleResult<Option<SpecialHand>> {
        self.detect_with_hint(hand, None)
    }

    /// 和 `detect` 相同，但三同花/三顺子先用 `hint` (通常是搜索出的摆法) 试一下，
    /// 不满足再完整搜索一遍。
    pub fn detect_with_hint(&self, hand: &[Card], hint: Option<&Arrangement>) -> RuleResult<Option<SpecialHand>> {
        check_hand(hand)?;

        let mut counts = [0u8; 15];
        for card in hand {
            counts[card.rank_strength() as usize] += 1;
        }
        let distinct = counts.iter().filter(|&&c| c > 0).count();
        let pairs = counts.iter().filter(|&&c| c == 2).count();

        if distinct == 13 {
            return Ok(Some(SpecialHand::Dragon));
        }
        if pairs == 6 && distinct == 7 {
            return Ok(Some(SpecialHand::SixPairsHalf));
        }

        if self.hint_matches(hand, hint, is_single_suit)? || self.split_exists(hand, is_single_suit) {
            return Ok(Some(SpecialHand::ThreeFlushes));
        }
        if self.hint_matches(hand, hint, is_run)? || self.split_exists(hand, is_run) {
            return Ok(Some(SpecialHand::ThreeStraights));
        }
        Ok(None)
    }

    fn hint_matches(&self, hand: &[Card], hint: Option<&Arrangement>, lane_ok: fn(&[Card]) -> bool) -> RuleResult<bool> {
        let Some(arrangement) = hint else {
            return Ok(false);
        };
        if !Lane::ALL.iter().all(|&lane| lane_ok(arrangement.lane(lane))) {
            return Ok(false);
        }
        Ok(validate(arrangement, hand, &self.rules.suit_order)?.legal)
    }

    /// 是否存在一种不倒水的摆法，三道都满足 `lane_ok`
    fn split_exists(&self, hand: &[Card], lane_ok: fn(&[Card]) -> bool) -> bool {
        let suits = &self.rules.suit_order;
        for bottom_idx in Combinations::<5>::new(hand.len()) {
            let (bottom, rest) = split_cards::<5, 8>(hand, &bottom_idx);
            if !lane_ok(&bottom) {
                continue;
            }
            let bottom_strength = classify(&bottom);
            for middle_idx in Combinations::<5>::new(rest.len()) {
                let (middle, top) = split_cards::<5, 3>(&rest, &middle_idx);
                if !lane_ok(&middle) || !lane_ok(&top) {
                    continue;
                }
                if is_ordered(&classify(&top), &classify(&middle), &bottom_strength, suits) {
                    return true;
                }
            }
        }
        false
    }
}

fn is_single_suit(cards: &[Card]) -> bool {
    cards.windows(2).all(|w| w[0].suit == w[1].suit)
}

/// 点数连续且不重复。A 在 K 之上；只有五张的 A-2-3-4-5 里 A 才算在 2 之下
fn is_run(cards: &[Card]) -> bool {
    let mut buf = [0u8; 5];
    let ranks = &mut buf[..cards.len()];
    for (slot, card) in ranks.iter_mut().zip(cards) {
        *slot = card.rank_strength();
    }
    ranks.sort_unstable();
    let ranks: &[u8] = ranks;

    let consecutive = |r: &[u8]| r.windows(2).all(|w| w[1] == w[0] + 1);
    // A 当 1 用: A-2-3-4-5
    let wheel = ranks == [2u8, 3, 4, 5, 14];
    consecutive(ranks) || wheel
}

// --- 单元测试 ---
