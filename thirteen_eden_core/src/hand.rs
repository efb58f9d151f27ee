use crate::card::Card;
use crate::config::SuitOrder;
use crate::error::{RuleError, RuleResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// 牌型 (Category)
///
/// 变体从小到大排列，可以直接用 `Ord` 比较。
/// 三张的牌道只会出现 三条 / 一对 / 高牌，和五张共用同一个刻度，
/// 所以头道可以直接和中道比较。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[repr(u8)]
pub enum Category {
    HighCard = 1,      // 高牌 (乌龙)
    OnePair = 2,       // 一对
    TwoPair = 3,       // 两对
    ThreeOfAKind = 4,  // 三条
    Straight = 5,      // 顺子
    Flush = 6,         // 同花
    FullHouse = 7,     // 葫芦
    FourOfAKind = 8,   // 铁支
    StraightFlush = 9, // 同花顺
}

impl Category {
    /// 牌型等级 1..=9
    pub const fn rank(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Category::HighCard => "高牌",
            Category::OnePair => "一对",
            Category::TwoPair => "两对",
            Category::ThreeOfAKind => "三条",
            Category::Straight => "顺子",
            Category::Flush => "同花",
            Category::FullHouse => "葫芦",
            Category::FourOfAKind => "铁支",
            Category::StraightFlush => "同花顺",
        })
    }
}

/// 牌道宽度
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum LaneWidth {
    Three,
    Five,
}

impl LaneWidth {
    pub const fn len(self) -> usize {
        match self {
            LaneWidth::Three => 3,
            LaneWidth::Five => 5,
        }
    }

    fn from_len(len: usize) -> RuleResult<LaneWidth> {
        match len {
            3 => Ok(LaneWidth::Three),
            5 => Ok(LaneWidth::Five),
            found => Err(RuleError::InvalidLaneSize { expected: "3 或 5", found }),
        }
    }
}

/// 一手牌的强度：牌型 + 比较用的点数序列 + 最大的那张牌。
///
/// 不持有牌本身，可以 `Copy`，搜索时大量使用。
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub struct Strength {
    pub category: Category,
    key: [u8; 5],
    key_len: u8,
    /// 点数最大的牌，同花/同花顺完全相同时比它的花色
    pub lead: Card,
}

impl Strength {
    pub fn key(&self) -> &[u8] {
        &self.key[..self.key_len as usize]
    }

    /// 比较两手牌的强度。
    ///
    /// 1. 牌型；2. 点数序列从左到右；3. 同花/同花顺仍然相同时比最大牌的花色；
    /// 4. 否则打平。点数序列长度不同 (头道对中道) 时只比公共前缀。
    pub fn compare(&self, other: &Strength, suits: &SuitOrder) -> Ordering {
        let common = self.key().len().min(other.key().len());
        self.category
            .cmp(&other.category)
            .then_with(|| self.key()[..common].cmp(&other.key()[..common]))
            .then_with(|| match self.category {
                Category::Flush | Category::StraightFlush => {
                    suits.tiebreak(self.lead.suit).cmp(&suits.tiebreak(other.lead.suit))
                }
                _ => Ordering::Equal,
            })
    }
}

/// 牌型评估结果，评估后不再修改
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct HandEvaluation {
    width: LaneWidth,
    strength: Strength,
    /// 从大到小排好的原始牌
    cards: Vec<Card>,
}

impl HandEvaluation {
    pub fn width(&self) -> LaneWidth {
        self.width
    }

    pub fn category(&self) -> Category {
        self.strength.category
    }

    pub fn tiebreak_key(&self) -> &[u8] {
        self.strength.key()
    }

    pub fn strength(&self) -> &Strength {
        &self.strength
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

impl fmt::Display for HandEvaluation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} [", self.category())?;
        for (i, card) in self.cards.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", card)?;
        }
        write!(f, "]")
    }
}

// --- 牌型评估逻辑 ---

/// 评估一手 3 张或 5 张牌
pub fn evaluate(cards: &[Card]) -> RuleResult<HandEvaluation> {
    let width = LaneWidth::from_len(cards.len())?;
    ensure_distinct(cards)?;

    let mut sorted = cards.to_vec();
    // 从大到小排序，方便处理
    sorted.sort_by(|a, b| b.cmp(a));

    Ok(HandEvaluation { width, strength: classify(cards), cards: sorted })
}

/// 比较两个评估结果，花色表用默认的 黑桃 > 红桃 > 梅花 > 方块
pub fn compare(a: &HandEvaluation, b: &HandEvaluation) -> Ordering {
    compare_with(a, b, &SuitOrder::default())
}

pub fn compare_with(a: &HandEvaluation, b: &HandEvaluation, suits: &SuitOrder) -> Ordering {
    a.strength.compare(&b.strength, suits)
}

pub(crate) fn ensure_distinct(cards: &[Card]) -> RuleResult<()> {
    for (i, card) in cards.iter().enumerate() {
        if cards[..i].contains(card) {
            return Err(RuleError::DuplicateCard(*card));
        }
    }
    Ok(())
}

/// 计算强度，不做参数检查。调用方保证 3 或 5 张且没有重复。
pub(crate) fn classify(cards: &[Card]) -> Strength {
    let mut counts = [0u8; 15];
    for card in cards {
        counts[card.rank_strength() as usize] += 1;
    }

    // 统计结果转成 (出现次数, 点数)，先按次数再按点数从大到小
    let mut groups = [(0u8, 0u8); 5];
    let mut n = 0;
    for rank in (2..=14u8).rev() {
        if counts[rank as usize] > 0 {
            groups[n] = (counts[rank as usize], rank);
            n += 1;
        }
    }
    groups[..n].sort_by(|a, b| b.cmp(a));

    let lead = cards.iter().copied().max().unwrap_or(cards[0]);
    let mut key = [0u8; 5];
    for (slot, &(_, rank)) in key.iter_mut().zip(&groups[..n]) {
        *slot = rank;
    }
    let grouped = Strength { category: Category::HighCard, key, key_len: n as u8, lead };

    if cards.len() == 3 {
        let category = match groups[0].0 {
            3 => Category::ThreeOfAKind,
            2 => Category::OnePair,
            _ => Category::HighCard,
        };
        return Strength { category, ..grouped };
    }

    // 五张: 同花、顺子
    let is_flush = cards.windows(2).all(|w| w[0].suit == w[1].suit);
    let straight_high = if n == 5 {
        if groups[0].1 - groups[4].1 == 4 {
            Some(groups[0].1)
        } else if groups[0].1 == 14 && groups[1].1 == 5 {
            // A-2-3-4-5，以 5 为最大的牌，是最小的顺子
            Some(5)
        } else {
            None
        }
    } else {
        None
    };

    let single = |category: Category, high: u8| Strength {
        category,
        key: [high, 0, 0, 0, 0],
        key_len: 1,
        lead,
    };

    match (straight_high, is_flush) {
        (Some(high), true) => return single(Category::StraightFlush, high),
        (Some(high), false) => return single(Category::Straight, high),
        (None, true) => return Strength { category: Category::Flush, ..grouped },
        (None, false) => {}
    }

    let category = match (groups[0].0, groups[1].0) {
        (4, _) => Category::FourOfAKind,
        (3, 2) => Category::FullHouse,
        (3, _) => Category::ThreeOfAKind,
        (2, 2) => Category::TwoPair,
        (2, _) => Category::OnePair,
        _ => Category::HighCard,
    };
    Strength { category, ..grouped }
}

// --- 单元测试 ---
