use crate::card::Card;
use crate::config::SuitOrder;
use crate::error::{RuleError, RuleResult};
use crate::hand::{HandEvaluation, Strength, compare_with, evaluate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// 牌道：头道 3 张、中道 5 张、尾道 5 张
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Lane {
    Top,
    Middle,
    Bottom,
}

impl Lane {
    pub const ALL: [Lane; 3] = [Lane::Top, Lane::Middle, Lane::Bottom];

    pub const fn width(self) -> usize {
        match self {
            Lane::Top => 3,
            Lane::Middle | Lane::Bottom => 5,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Lane::Top => "头道",
            Lane::Middle => "中道",
            Lane::Bottom => "尾道",
        })
    }
}

/// 一种摆法。只在一局内有效，计分后丢弃。
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Arrangement {
    pub top: Vec<Card>,
    pub middle: Vec<Card>,
    pub bottom: Vec<Card>,
}

impl Arrangement {
    pub fn new(top: Vec<Card>, middle: Vec<Card>, bottom: Vec<Card>) -> Arrangement {
        Arrangement { top, middle, bottom }
    }

    pub fn lane(&self, lane: Lane) -> &[Card] {
        match lane {
            Lane::Top => &self.top,
            Lane::Middle => &self.middle,
            Lane::Bottom => &self.bottom,
        }
    }

    /// 三道所有的牌，按 头-中-尾 的顺序
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.top.iter().chain(self.middle.iter()).chain(self.bottom.iter())
    }
}

impl fmt::Display for Arrangement {
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

/// 不合法的原因
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// 倒水：前面的牌道比后面的大
    Foul,
}

/// 校验结果。倒水是正常结果，不是错误。
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub legal: bool,
    pub reason: Option<Reason>,
    /// 头、中、尾三道的评估结果
    pub lanes: [HandEvaluation; 3],
}

impl Verdict {
    pub fn is_foul(&self) -> bool {
        self.reason == Some(Reason::Foul)
    }

    pub fn lane(&self, lane: Lane) -> &HandEvaluation {
        &self.lanes[lane.index()]
    }
}

/// 检查一手 13 张牌：张数正确且没有重复
pub fn check_hand(hand: &[Card]) -> RuleResult<()> {
    if hand.len() != 13 {
        return Err(RuleError::MalformedArrangement(format!("手牌必须是 13 张, 实际 {} 张", hand.len())));
    }
    crate::hand::ensure_distinct(hand)
}

/// 校验摆法。
///
/// 依次检查：牌道张数 3/5/5；三道的牌恰好就是原来的手牌；头道不大于中道；中道不大于尾道。
/// 前两项不满足是调用方的错误，返回 `MalformedArrangement`；后两项不满足是倒水。
pub fn validate(arrangement: &Arrangement, hand: &[Card], suits: &SuitOrder) -> RuleResult<Verdict> {
    for lane in Lane::ALL {
        let found = arrangement.lane(lane).len();
        if found != lane.width() {
            return Err(RuleError::MalformedArrangement(format!(
                "{}需要 {} 张, 实际 {} 张",
                lane,
                lane.width(),
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
        evaluate(&arrangement.top)?,
        evaluate(&arrangement.middle)?,
        evaluate(&arrangement.bottom)?,
    ];
    let legal = compare_with(&lanes[0], &lanes[1], suits) != Ordering::Greater
        && compare_with(&lanes[1], &lanes[2], suits) != Ordering::Greater;

    Ok(Verdict { legal, reason: if legal { None } else { Some(Reason::Foul) }, lanes })
}

/// 三道强度是否不递减
pub(crate) fn is_ordered(top: &Strength, middle: &Strength, bottom: &Strength, suits: &SuitOrder) -> bool {
    top.compare(middle, suits) != Ordering::Greater && middle.compare(bottom, suits) != Ordering::Greater
}

// --- 单元测试 ---
