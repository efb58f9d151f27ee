use crate::card::Card;
use thiserror::Error;

/// 调用方违反约定时返回的错误。
///
/// 倒水、平局、没有特殊牌型都是正常的游戏结果，不走这里。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("牌道张数不合法: 需要 {expected}, 实际 {found}")]
    InvalidLaneSize { expected: &'static str, found: usize },

    #[error("重复的牌: {0}")]
    DuplicateCard(Card),

    #[error("摆牌不完整或与手牌不符: {0}")]
    MalformedArrangement(String),

    #[error("找不到任何合法的摆法")]
    NoLegalArrangement,

    #[error("无法解析的牌: {0:?}")]
    ParseCard(String),

    #[error("牌堆不够发: 需要 {needed} 张")]
    DeckExhausted { needed: usize },

    #[error("配置错误: {0}")]
    Config(String),
}

pub type RuleResult<T> = Result<T, RuleError>;
