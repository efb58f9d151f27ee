use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use thirteen_eden_core::eight::{self, EightVerdict};
use thirteen_eden_core::{
    AiArranger, Card, Entry, Lane, MatchResult, RuleResult, Rules, ScoringEngine, SearchBudget, SpecialHand, deal,
};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 一局的完整记录，打印到标准输出
#[derive(Debug, Serialize)]
pub struct RoundReport {
    pub round_id: Uuid,
    pub variant: &'static str,
    pub seed: u64,
    pub seats: Vec<SeatReport>,
    pub pairs: Vec<PairReport>,
}

#[derive(Debug, Serialize)]
pub struct SeatReport {
    pub seat: usize,
    pub hand: Vec<String>,
    /// 头、中、尾
    pub lanes: [Vec<String>; 3],
    pub categories: [String; 3],
    pub legal: bool,
    pub special: Option<SpecialHand>,
    pub total: i32,
}

#[derive(Debug, Serialize)]
pub struct PairReport {
    pub seats: (usize, usize),
    pub result: MatchResult,
}

/// 一局的参数
#[derive(Debug, Clone, Copy)]
pub struct RoundSetup {
    pub round_id: Uuid,
    pub players: usize,
    pub seed: u64,
    pub budget: SearchBudget,
}

fn names(cards: &[Card]) -> Vec<String> {
    cards.iter().map(|c| c.to_string()).collect()
}

/// 每个座位在阻塞线程池上独立摆牌，按座位顺序收集结果
async fn arrange_all<T, F>(hands: &[Vec<Card>], arrange: F) -> Result<Vec<T>, BoxError>
where
    T: Send + 'static,
    F: Fn(usize, Vec<Card>) -> RuleResult<T> + Clone + Send + 'static,
{
    let handles: Vec<JoinHandle<RuleResult<T>>> = hands
        .iter()
        .enumerate()
        .map(|(seat, hand)| {
            let arrange = arrange.clone();
            let hand = hand.clone();
            tokio::task::spawn_blocking(move || arrange(seat, hand))
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await??);
    }
    Ok(results)
}

/// 十三水：发牌、自动摆牌、检测特殊牌型、两两结算
pub async fn play_thirteen(rules: Arc<Rules>, setup: RoundSetup) -> Result<RoundReport, BoxError> {
    let mut rng = StdRng::seed_from_u64(setup.seed);
    let hands = deal(setup.players, 13, &mut rng)?;
    info!("[{}] 发牌完成: {} 名玩家", setup.round_id, setup.players);

    let shared = Arc::clone(&rules);
    let entries = arrange_all(&hands, move |seat, hand| {
        let arranger = AiArranger::new(&shared).with_budget(setup.budget).with_seed(setup.seed ^ seat as u64);
        let arrangement = arranger.suggest(&hand)?;
        Entry::new(&shared, arrangement, &hand)
    })
    .await?;

    let engine = ScoringEngine::new(&rules);
    let totals = engine.settle_table(&entries);
    let mut pairs = Vec::new();
    for i in 0..entries.len() {
        for j in i + 1..entries.len() {
            pairs.push(PairReport { seats: (i, j), result: engine.score(&entries[i], &entries[j]) });
        }
    }

    let seats = entries
        .iter()
        .zip(&hands)
        .enumerate()
        .map(|(seat, (entry, hand))| {
            info!("[{}] 座位 {}: {} 得分 {}", setup.round_id, seat, entry.arrangement, totals[seat]);
            if let Some(special) = entry.special {
                info!("[{}] 座位 {} 是特殊牌型 {}", setup.round_id, seat, special);
            }
            SeatReport {
                seat,
                hand: names(hand),
                lanes: Lane::ALL.map(|lane| names(entry.arrangement.lane(lane))),
                categories: Lane::ALL.map(|lane| entry.verdict.lane(lane).category().to_string()),
                legal: entry.verdict.legal,
                special: entry.special,
                total: totals[seat],
            }
        })
        .collect();

    Ok(RoundReport { round_id: setup.round_id, variant: "thirteen", seed: setup.seed, seats, pairs })
}

/// 八张：每人 8 张，没有特殊牌型
pub async fn play_eight(rules: Arc<Rules>, setup: RoundSetup) -> Result<RoundReport, BoxError> {
    let mut rng = StdRng::seed_from_u64(setup.seed);
    let hands = deal(setup.players, eight::HAND_SIZE, &mut rng)?;
    info!("[{}] 八张发牌完成: {} 名玩家", setup.round_id, setup.players);

    let shared = Arc::clone(&rules);
    let arranged: Vec<(eight::EightArrangement, EightVerdict)> = arrange_all(&hands, move |_, hand| {
        let arrangement = eight::suggest(&shared, &hand)?;
        let verdict = eight::validate(&arrangement, &hand, &shared.suit_order)?;
        Ok((arrangement, verdict))
    })
    .await?;

    let verdicts: Vec<EightVerdict> = arranged.iter().map(|(_, v)| v.clone()).collect();
    let totals = eight::settle_table(&rules, &verdicts);
    let mut pairs = Vec::new();
    for i in 0..verdicts.len() {
        for j in i + 1..verdicts.len() {
            pairs.push(PairReport { seats: (i, j), result: eight::score(&rules, &verdicts[i], &verdicts[j]) });
        }
    }

    let seats = arranged
        .iter()
        .zip(&hands)
        .enumerate()
        .map(|(seat, ((arrangement, verdict), hand))| {
            info!("[{}] 座位 {}: {} 得分 {}", setup.round_id, seat, arrangement, totals[seat]);
            SeatReport {
                seat,
                hand: names(hand),
                lanes: Lane::ALL.map(|lane| names(arrangement.lane(lane))),
                categories: Lane::ALL.map(|lane| verdict.lane(lane).category.to_string()),
                legal: verdict.legal,
                special: None,
                total: totals[seat],
            }
        })
        .collect();

    Ok(RoundReport { round_id: setup.round_id, variant: "eight", seed: setup.seed, seats, pairs })
}

// --- 单元测试 ---
