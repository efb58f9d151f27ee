use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use thirteen_eden_core::{Rules, SearchBudget};

mod round;

use round::{BoxError, RoundSetup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Variant {
    /// 十三张
    Thirteen,
    /// 八张
    Eight,
}

/// 发一局牌，所有座位自动摆牌后结算，结果以 JSON 打印到标准输出
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// 玩家人数
    #[arg(short, long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(2..=4))]
    players: u8,

    /// 发牌用的随机种子，不填则随机
    #[arg(short, long)]
    seed: Option<u64>,

    /// 规则配置文件 (JSON)，不填用默认规则
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Variant::Thirteen)]
    variant: Variant,

    /// 每个座位搜索的节点上限
    #[arg(short, long)]
    budget: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // 日志写到标准错误，标准输出只留给 JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let rules = match &cli.config {
        Some(path) => {
            info!("读取规则配置 {}", path.display());
            Rules::load(path)?
        }
        None => Rules::default(),
    };

    let setup = RoundSetup {
        round_id: Uuid::new_v4(),
        players: cli.players as usize,
        seed: cli.seed.unwrap_or_else(rand::random),
        budget: SearchBudget { max_nodes: cli.budget },
    };
    info!("[{}] 新的一局: {:?}, 种子 {}", setup.round_id, cli.variant, setup.seed);

    let rules = Arc::new(rules);
    let report = match cli.variant {
        Variant::Thirteen => round::play_thirteen(rules, setup).await?,
        Variant::Eight => round::play_eight(rules, setup).await?,
    };

    info!("[{}] 结算完成", setup.round_id);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
