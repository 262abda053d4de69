use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use block_template_proof::mempool::load_mempool;
use block_template_proof::{
    BlockBuilder, BlockOutput, MiningConfig, MiningControl, MiningResult, SystemClock,
};

#[derive(Parser)]
#[command(author, version, about = "Assemble and mine a block from a directory of mempool transactions")]
struct Cli {
    /// Directory of JSON transaction files
    #[arg(short, long, default_value = "mempool")]
    mempool: PathBuf,

    /// File the mined block is written to
    #[arg(short, long, default_value = "output.txt")]
    output: PathBuf,

    /// JSON configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Give up after this many nonce attempts
    #[arg(long)]
    max_attempts: Option<u64>,

    /// Give up after this many seconds of mining
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => MiningConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => MiningConfig::default(),
    };
    let builder = BlockBuilder::new(config)?;

    let mempool = load_mempool(&cli.mempool)
        .with_context(|| format!("reading mempool {}", cli.mempool.display()))?;

    let template = builder.build_template(&mempool, &SystemClock)?;
    info!(
        transactions = template.transactions.len(),
        weight = template.total_weight,
        fees = template.total_fees,
        "mining block"
    );

    let mut control = MiningControl::new();
    if let Some(max_attempts) = cli.max_attempts {
        control = control.with_max_attempts(max_attempts);
    }
    if let Some(secs) = cli.timeout_secs {
        control = control.with_deadline(Instant::now() + Duration::from_secs(secs));
    }

    let (block, result) = builder.mine(template, &control, &SystemClock)?;
    if let MiningResult::Found { .. } = result {
        BlockOutput::from_block(&block)?.write_to(&cli.output)?;
        Ok(())
    } else {
        bail!("mining stopped without a valid block: {:?}", result)
    }
}
