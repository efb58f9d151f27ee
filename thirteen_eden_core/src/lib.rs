//! # 十三水核心规则库
//!
//! 这个 `core` crate 包含了十三水 (以及八张玩法) 的全部规则：
//! 牌型评估、摆牌校验、特殊牌型检测、计分，以及自动摆牌搜索。
//! 所有计算都是纯函数，不做 I/O，也不持有全局状态；
//! 规则通过 [`Rules`] 在构造时注入，方便服务器、机器人或测试复用。

mod arrangement;
mod arranger;
mod card;
mod combo;
mod config;
pub mod eight;
mod error;
mod hand;
mod scoring;
mod search;
mod special;

pub use arrangement::*;

pub use arranger::AiArranger;

pub use card::*;

pub use combo::Combinations;

pub use config::*;

pub use error::{RuleError, RuleResult};

pub use hand::{Category, HandEvaluation, LaneWidth, Strength, compare, compare_with, evaluate};

pub use scoring::*;

pub use search::{ArrangementSearch, SearchBudget, SearchOutcome};

pub use special::{SpecialDetector, SpecialHand};
