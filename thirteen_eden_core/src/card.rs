use crate::error::{RuleError, RuleResult};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// --- 核心数据结构定义 ---

/// 花色 (Suit)
///
/// 变体顺序即默认的比花色顺序：黑桃 > 红桃 > 梅花 > 方块。
/// 花色只在两手牌完全相同的时候才用来分胜负。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[repr(u8)]
pub enum Suit {
    Diamond = 1, // 方块 ♦️
    Club = 2,    // 梅花 ♣️
    Heart = 3,   // 红心 ♥️
    Spade = 4,   // 黑桃 ♠️
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spade, Suit::Heart, Suit::Club, Suit::Diamond];

    /// 默认花色表下的大小 (1..=4)
    pub const fn tiebreak(self) -> u8 {
        self as u8
    }

    fn from_char(c: char) -> Option<Suit> {
        match c.to_ascii_uppercase() {
            'S' | '♠' => Some(Suit::Spade),
            'H' | '♥' => Some(Suit::Heart),
            'C' | '♣' => Some(Suit::Club),
            'D' | '♦' => Some(Suit::Diamond),
            _ => None,
        }
    }
}

/// 点数 (Rank)
/// Ace 默认是最大的，A-2-3-4-5 顺子的特殊情况由牌型评估处理
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[repr(u8)]
pub enum Rank {
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
    Ace = 14,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two, Rank::Three, Rank::Four, Rank::Five, Rank::Six, Rank::Seven,
        Rank::Eight, Rank::Nine, Rank::Ten, Rank::Jack, Rank::Queen, Rank::King, Rank::Ace,
    ];

    /// 点数大小 2..=14
    pub const fn strength(self) -> u8 {
        self as u8
    }

    pub const fn from_strength(value: u8) -> Option<Rank> {
        match value {
            2 => Some(Rank::Two),
            3 => Some(Rank::Three),
            4 => Some(Rank::Four),
            5 => Some(Rank::Five),
            6 => Some(Rank::Six),
            7 => Some(Rank::Seven),
            8 => Some(Rank::Eight),
            9 => Some(Rank::Nine),
            10 => Some(Rank::Ten),
            11 => Some(Rank::Jack),
            12 => Some(Rank::Queen),
            13 => Some(Rank::King),
            14 => Some(Rank::Ace),
            _ => None,
        }
    }

    fn from_text(text: &str) -> Option<Rank> {
        match text.to_ascii_uppercase().as_str() {
            "A" => Some(Rank::Ace),
            "K" => Some(Rank::King),
            "Q" => Some(Rank::Queen),
            "J" => Some(Rank::Jack),
            "T" | "10" => Some(Rank::Ten),
            digit => digit.parse::<u8>().ok().and_then(Rank::from_strength),
        }
    }
}

/// 单张扑克牌 (Card)
///
/// 派生的 `Ord` 先比点数再比花色。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Card {
        Card { rank, suit }
    }

    pub const fn rank_strength(self) -> u8 {
        self.rank.strength()
    }

    pub const fn suit_tiebreak(self) -> u8 {
        self.suit.tiebreak()
    }
}

// --- 实现辅助功能 ---

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Suit::Spade => "♠",
            Suit::Heart => "♥",
            Suit::Club => "♣",
            Suit::Diamond => "♦",
        })
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "T",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        })
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.suit, self.rank)
    }
}

/// 解析 "AS"、"10h"、"Td" 或 "♠A" 形式的牌
impl FromStr for Card {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let err = || RuleError::ParseCard(s.to_string());
        let first = text.chars().next().ok_or_else(err)?;
        let last = text.chars().last().ok_or_else(err)?;

        // 花色在后 ("AS")，否则花色在前 ("♠A")
        let (rank_text, suit) = match Suit::from_char(last) {
            Some(suit) if text.len() > last.len_utf8() => (&text[..text.len() - last.len_utf8()], suit),
            _ => {
                let suit = Suit::from_char(first).ok_or_else(err)?;
                (&text[first.len_utf8()..], suit)
            }
        };
        let rank = Rank::from_text(rank_text).ok_or_else(err)?;
        Ok(Card::new(rank, suit))
    }
}

/// 解析以空白或逗号分隔的一串牌
pub fn parse_cards(text: &str) -> RuleResult<Vec<Card>> {
    text.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(str::parse)
        .collect()
}

// --- 牌组生成 ---

/// 创建一副完整的 52 张扑克牌
pub fn new_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(52);
    for &suit in &Suit::ALL {
        for &rank in &Rank::ALL {
            deck.push(Card { rank, suit });
        }
    }
    deck
}

/// 原地洗牌 (Fisher-Yates)
pub fn shuffle<R: Rng + ?Sized>(deck: &mut [Card], rng: &mut R) {
    deck.shuffle(rng);
}

/// 从一副新洗的牌中给 `players` 个玩家各发 `cards_each` 张
pub fn deal<R: Rng + ?Sized>(players: usize, cards_each: usize, rng: &mut R) -> RuleResult<Vec<Vec<Card>>> {
    let needed = players * cards_each;
    if needed > 52 {
        return Err(RuleError::DeckExhausted { needed });
    }
    if cards_each == 0 {
        return Ok(vec![Vec::new(); players]);
    }

    let mut deck = new_deck();
    shuffle(&mut deck, rng);

    Ok(deck
        .chunks(cards_each)
        .take(players)
        .map(|chunk| {
            let mut hand = chunk.to_vec();
            hand.sort_by(|a, b| b.cmp(a));
            hand
        })
        .collect())
}

// --- 单元测试 ---
