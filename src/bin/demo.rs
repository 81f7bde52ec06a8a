//! Voltage CrossCheck Demo
//!
//! Runs a cross-check pass against an in-process mirror device:
//! - Loads a tag table (TSV export) or uses a built-in one
//! - Seeds a `MirrorDevice` with one value per tag
//! - Optionally makes some tags diverge on the OPC UA side
//! - Prints each sampled tag and the final summary
//!
//! Usage: cargo run --bin demo -- [--tags tags.tsv] [--diverge NAME]...
//! Example: cargo run --bin demo -- --samples 5 --diverge Flow_Rate --word-swap

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use voltage_crosscheck::{
    tag_file, CrossCheckConfig, CrossCheckResult, CrossChecker, MirrorDevice, TagDescriptor,
    WordOrder,
};

const BUILTIN_TAGS: &str = "\
Name\tType\tAddress\tModbusAddress\tSize\tRange
Tank_Level\tHoldingRegister\t1\t40001\t1\t1..1
Flow_Rate\tHoldingRegister\t2\t40002\t2\t2..3
Batch_Counter\tHoldingRegister\t4\t40004\t2\t4..5
Pump_Running\tCoil\t1\t00001\t1\t1..1
Valve_Open\tCoil\t2\t00002\t1\t2..2
Door_Closed\tDiscreteInput\t1\t10001\t1\t1..1
Motor_Current\tInputRegister\t1\t30001\t2\t1..2
Line_Pressure\tInputRegister\t3\t30003\t1\t3..3
";

#[derive(Parser)]
#[command(name = "demo")]
#[command(about = "Cross-check Modbus and OPC UA readings of the same PLC tags")]
#[command(version)]
struct Cli {
    /// Tag table (tab-separated export)
    #[arg(short, long)]
    tags: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of tags to compare
    #[arg(short, long)]
    samples: Option<usize>,

    /// Make a tag's OPC UA value drift from its Modbus value
    #[arg(long)]
    diverge: Vec<String>,

    /// Register pairs carry the low word first
    #[arg(long)]
    word_swap: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> CrossCheckResult<bool> {
    let mut config = match &cli.config {
        Some(path) => CrossCheckConfig::load_from_file(path)?,
        None => CrossCheckConfig::default(),
    };
    if let Some(samples) = cli.samples {
        config = config.with_sample_count(samples);
    }
    if cli.word_swap {
        config = config.with_word_order(WordOrder::WordSwap);
    }

    let tags: Vec<TagDescriptor> = match &cli.tags {
        Some(path) => tag_file::load_tags(path)?,
        None => tag_file::parse_tags(BUILTIN_TAGS.as_bytes())?,
    };

    println!("🚀 Voltage CrossCheck v{} Demo", voltage_crosscheck::VERSION);
    println!("=================================");
    println!("  Tags loaded: {}", tags.len());
    println!("  Node prefix: ns={};s={}", config.namespace_index, config.node_prefix);
    println!("  Word order: {}", config.word_order);
    println!();

    let device = MirrorDevice::from_tags(&tags, &config);
    for name in &cli.diverge {
        device.diverge(name.as_str(), 1.0);
    }

    let mut checker = CrossChecker::new(device.clone(), device, config)?;
    let report = checker.run(&tags).await?;

    for outcome in &report.outcomes {
        println!("{}\n", outcome);
    }
    println!("📊 {}", report.summary);

    Ok(report.summary.passed())
}
