use crate::arrangement::Lane;
use crate::card::Suit;
use crate::eight::EightCategory;
use crate::error::{RuleError, RuleResult};
use crate::hand::Category;
use crate::special::SpecialHand;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// 比花色用的花色表，从大到小排列。
///
/// 反序列化时会检查四种花色恰好各出现一次。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[Suit; 4]", into = "[Suit; 4]")]
pub struct SuitOrder([Suit; 4]);

impl SuitOrder {
    pub fn new(order: [Suit; 4]) -> RuleResult<SuitOrder> {
        for suit in Suit::ALL {
            if !order.contains(&suit) {
                return Err(RuleError::Config(format!("花色表缺少 {}", suit)));
            }
        }
        Ok(SuitOrder(order))
    }

    /// 花色在表中的大小，最大的为 4
    pub fn tiebreak(&self, suit: Suit) -> u8 {
        let pos = self.0.iter().position(|&s| s == suit).unwrap_or(3);
        4 - pos as u8
    }
}

impl Default for SuitOrder {
    fn default() -> Self {
        SuitOrder([Suit::Spade, Suit::Heart, Suit::Club, Suit::Diamond])
    }
}

impl TryFrom<[Suit; 4]> for SuitOrder {
    type Error = RuleError;

    fn try_from(order: [Suit; 4]) -> Result<Self, Self::Error> {
        SuitOrder::new(order)
    }
}

impl From<SuitOrder> for [Suit; 4] {
    fn from(order: SuitOrder) -> Self {
        order.0
    }
}

/// 各道赢牌的基础分 (水数)，按牌道和牌型查表，表里没有的取 `fallback`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseValues {
    pub top: BTreeMap<Category, i32>,
    pub middle: BTreeMap<Category, i32>,
    pub bottom: BTreeMap<Category, i32>,
    pub fallback: i32,
}

impl BaseValues {
    pub fn value(&self, lane: Lane, category: Category) -> i32 {
        let table = match lane {
            Lane::Top => &self.top,
            Lane::Middle => &self.middle,
            Lane::Bottom => &self.bottom,
        };
        table.get(&category).copied().unwrap_or(self.fallback)
    }

    fn tables(&self) -> impl Iterator<Item = (&Category, &i32)> {
        self.top.iter().chain(self.middle.iter()).chain(self.bottom.iter())
    }
}

impl Default for BaseValues {
    fn default() -> Self {
        BaseValues {
            // 头道冲三
            top: BTreeMap::from([(Category::ThreeOfAKind, 3)]),
            // 中道同花顺、铁支、葫芦
            middle: BTreeMap::from([
                (Category::StraightFlush, 10),
                (Category::FourOfAKind, 8),
                (Category::FullHouse, 2),
            ]),
            // 尾道同花顺、铁支
            bottom: BTreeMap::from([
                (Category::StraightFlush, 5),
                (Category::FourOfAKind, 4),
            ]),
            fallback: 1,
        }
    }
}

/// 特殊牌型的奖励分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialBonuses {
    pub dragon: i32,
    pub six_pairs_half: i32,
    pub three_flushes: i32,
    pub three_straights: i32,
}

impl SpecialBonuses {
    pub fn bonus(&self, special: SpecialHand) -> i32 {
        match special {
            SpecialHand::Dragon => self.dragon,
            SpecialHand::SixPairsHalf => self.six_pairs_half,
            SpecialHand::ThreeFlushes => self.three_flushes,
            SpecialHand::ThreeStraights => self.three_straights,
        }
    }
}

impl Default for SpecialBonuses {
    fn default() -> Self {
        SpecialBonuses {
            dragon: 13,
            six_pairs_half: 3,
            three_flushes: 4,
            three_straights: 4,
        }
    }
}

/// 八张玩法的计分表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EightTable {
    /// 倒水的一方固定输的分
    pub foul_penalty: i32,
    pub middle: BTreeMap<EightCategory, i32>,
    pub tail: BTreeMap<EightCategory, i32>,
    pub fallback: i32,
}

impl Default for EightTable {
    fn default() -> Self {
        EightTable {
            foul_penalty: 3,
            middle: BTreeMap::from([(EightCategory::StraightFlush, 10), (EightCategory::ThreeOfAKind, 6)]),
            tail: BTreeMap::from([(EightCategory::StraightFlush, 5), (EightCategory::ThreeOfAKind, 3)]),
            fallback: 1,
        }
    }
}

/// 规则配置。
///
/// 由调用方构造后注入到校验、特殊牌型检测、计分和搜索中，
/// 引擎内部不读取任何全局设置。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub base_values: BaseValues,
    pub special_bonuses: SpecialBonuses,
    pub suit_order: SuitOrder,
    /// 打枪倍数。`None` 表示不打枪
    pub sweep_multiplier: Option<i32>,
    /// 中道或尾道摆出铁支、同花顺时不再报特殊牌型，按三道正常比较
    pub strong_lanes_void_special: bool,
    pub eight: EightTable,
}

impl Rules {
    pub fn from_json_str(json: &str) -> RuleResult<Rules> {
        let rules: Rules = serde_json::from_str(json).map_err(|e| RuleError::Config(e.to_string()))?;
        rules.check()?;
        Ok(rules)
    }

    pub fn load(path: impl AsRef<Path>) -> RuleResult<Rules> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| RuleError::Config(format!("{}: {}", path.display(), e)))?;
        Rules::from_json_str(&json)
    }

    /// 分值不能为负，打枪倍数至少为 1
    pub fn check(&self) -> RuleResult<()> {
        if let Some((category, value)) = self.base_values.tables().find(|(_, v)| **v < 0) {
            return Err(RuleError::Config(format!("{} 的基础分为负: {}", category, value)));
        }
        if self.base_values.fallback < 0 || self.eight.fallback < 0 || self.eight.foul_penalty < 0 {
            return Err(RuleError::Config("分值不能为负".to_string()));
        }
        let bonuses = self.special_bonuses;
        if [bonuses.dragon, bonuses.six_pairs_half, bonuses.three_flushes, bonuses.three_straights]
            .iter()
            .any(|&b| b < 0)
        {
            return Err(RuleError::Config("特殊牌型奖励不能为负".to_string()));
        }
        match self.sweep_multiplier {
            Some(m) if m < 1 => Err(RuleError::Config(format!("打枪倍数必须至少为 1: {}", m))),
            _ => Ok(()),
        }
    }
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_values() {
        let values = BaseValues::default();
        assert_eq!(values.value(Lane::Top, Category::ThreeOfAKind), 3);
        assert_eq!(values.value(Lane::Top, Category::OnePair), 1);
        assert_eq!(values.value(Lane::Middle, Category::StraightFlush), 10);
        assert_eq!(values.value(Lane::Middle, Category::FullHouse), 2);
        assert_eq!(values.value(Lane::Bottom, Category::FourOfAKind), 4);
        assert_eq!(values.value(Lane::Bottom, Category::FullHouse), 1);
    }

    #[test]
    fn test_suit_order_tiebreak() {
        let order = SuitOrder::default();
        assert_eq!(order.tiebreak(Suit::Spade), 4);
        assert_eq!(order.tiebreak(Suit::Diamond), 1);

        let custom = SuitOrder::new([Suit::Spade, Suit::Heart, Suit::Diamond, Suit::Club]).unwrap();
        assert!(custom.tiebreak(Suit::Diamond) > custom.tiebreak(Suit::Club));
    }

    #[test]
    fn test_suit_order_rejects_repeats() {
        assert!(SuitOrder::new([Suit::Spade, Suit::Spade, Suit::Club, Suit::Diamond]).is_err());
        let json = r#"{ "suit_order": ["Spade", "Spade", "Club", "Diamond"] }"#;
        assert!(matches!(Rules::from_json_str(json), Err(RuleError::Config(_))));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            "sweep_multiplier": 2,
            "special_bonuses": { "dragon": 26 },
            "base_values": { "top": { "ThreeOfAKind": 5 } }
        }"#;
        let rules = Rules::from_json_str(json).unwrap();
        assert_eq!(rules.sweep_multiplier, Some(2));
        assert_eq!(rules.special_bonuses.dragon, 26);
        assert_eq!(rules.special_bonuses.three_flushes, 4);
        assert_eq!(rules.base_values.value(Lane::Top, Category::ThreeOfAKind), 5);
        // 没写的表保持默认
        assert_eq!(rules.base_values.value(Lane::Middle, Category::FourOfAKind), 8);
        assert_eq!(rules.suit_order, SuitOrder::default());
        assert!(!rules.strong_lanes_void_special);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Rules::from_json_str(r#"{ "sweep_multiplier": 0 }"#).is_err());
        assert!(Rules::from_json_str(r#"{ "special_bonuses": { "dragon": -1 } }"#).is_err());
        assert!(Rules::from_json_str("not json").is_err());
    }

    #[test]
    fn test_round_trip_through_json() {
        let rules = Rules { sweep_multiplier: Some(2), strong_lanes_void_special: true, ..Rules::default() };
        let json = serde_json::to_string(&rules).unwrap();
        assert_eq!(Rules::from_json_str(&json).unwrap(), rules);
    }
}
