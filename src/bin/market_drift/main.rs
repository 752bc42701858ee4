// Market Drift Runner: Monte Carlo validation of the pricing engine
// Seeded ChaCha8Rng per run, Poisson trades, manual clock, per-step audit trail
//
// Usage:
//   cargo run --release --bin market_drift                       # All scenarios, 30 runs each
//   cargo run --release --bin market_drift -- --runs 5           # Quick mode
//   cargo run --release --bin market_drift -- glut               # Filter by name/label/category
//   cargo run --release --bin market_drift -- --time-series      # Per-step JSONL output
//   cargo run --release --bin market_drift -- --config cfg.json  # Engine config override

mod monte_carlo;
mod report;
mod scenarios;
mod time_series;
mod traffic;

use std::path::PathBuf;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use clap::Parser;
use market_engine::MarketConfig;
use tracing::info;

use report::*;
use scenarios::*;

#[derive(Parser)]
#[command(name = "market_drift")]
#[command(about = "Monte Carlo drift runs over the market pricing engine")]
struct Cli {
    /// Runs per scenario
    #[arg(long, default_value_t = 30)]
    runs: usize,

    /// Base seed; run i uses seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Write per-step JSONL under <out>/time-series
    #[arg(long)]
    time_series: bool,

    /// Engine config JSON (camelCase keys, missing keys use defaults)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output directory for the JSON report
    #[arg(long, default_value = "drift-results")]
    out: PathBuf,

    /// Only run scenarios whose name, label or category contains this
    #[arg(value_name = "FILTER")]
    filter: Option<String>,
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<MarketConfig> {
    let Some(path) = path else {
        return Ok(MarketConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    MarketConfig::from_json_str(&json).with_context(|| format!("invalid config {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let base_config = load_config(cli.config.as_deref())?;
    let all_scenarios = scenarios();

    let to_run: Vec<&Scenario> = match &cli.filter {
        Some(f) => {
            let f_lower = f.to_lowercase();
            all_scenarios.iter()
                .filter(|s| s.name.to_lowercase().contains(&f_lower)
                          || s.label.to_lowercase().contains(&f_lower)
                          || s.category.to_lowercase().contains(&f_lower))
                .collect()
        }
        None => all_scenarios.iter().collect(),
    };

    if to_run.is_empty() {
        anyhow::bail!("no scenarios match filter: {:?}", cli.filter);
    }

    let ts_dir = cli.time_series.then(|| cli.out.join("time-series"));

    info!(runs = cli.runs, seed = cli.seed, scenarios = to_run.len(), "starting drift suite");
    println!("\n  Market Drift Runner v{}", env!("CARGO_PKG_VERSION"));
    println!("  PRNG: ChaCha8Rng | Runs/scenario: {} | Base seed: {}", cli.runs, cli.seed);
    println!("  Running {} scenario(s)...\n", to_run.len());
    println!("  {:<28} {:>5} {:>12} {:>10} {:>10} {:>5} {:>7}",
        "Scenario", "Pass%", "Trades", "Crossings", "Price/base", "News", "Time");
    println!("  {}", "-".repeat(84));

    let suite_start = Instant::now();
    let mut mc_reports = Vec::new();

    for scenario in &to_run {
        let report = monte_carlo::run_monte_carlo(
            scenario,
            &base_config,
            cli.runs,
            cli.seed,
            ts_dir.as_deref(),
        )?;

        let pass_pct = report.pass_rate * 100.0;
        let status = if report.pass_rate >= 1.0 { "PASS" } else { "FAIL" };

        println!("  {:<28} {:>4}% {:>7.1}±{:<4.1} {:>10.1} {:>10.3} {:>5.0} {:>5.0}ms  {}",
            report.label,
            pass_pct as u32,
            report.trades.mean, report.trades.half_width(),
            report.crossings.mean,
            report.final_mean_price_ratio.mean,
            report.max_news_lines.max,
            report.elapsed_ms.mean,
            status,
        );

        mc_reports.push(report);
    }

    let suite_elapsed = suite_start.elapsed();

    // ─── Summary ────────────────────────────────────────────────────────

    let total = mc_reports.len();
    let passed = mc_reports.iter().filter(|r| r.pass_rate >= 1.0).count();
    let failed = total - passed;

    println!("  {}", "-".repeat(84));
    println!("  Total: {}  Passed: {}  Failed: {}  Suite time: {:.1}s\n",
        total, passed, failed, suite_elapsed.as_secs_f64());

    // ─── Write JSON Report ──────────────────────────────────────────────

    let ts = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis();
    let timestamp = format!("{}", ts);

    let report = DriftReport {
        timestamp: timestamp.clone(),
        version: env!("CARGO_PKG_VERSION"),
        prng: "ChaCha8Rng",
        n_runs_per_scenario: cli.runs,
        base_seed: cli.seed,
        summary: Summary {
            total,
            passed,
            failed,
            pass_rate: passed as f64 / total as f64,
        },
        scenarios: mc_reports,
    };

    std::fs::create_dir_all(&cli.out)
        .with_context(|| format!("creating {}", cli.out.display()))?;
    let path = cli.out.join(format!("drift-{}.json", timestamp));
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&path, &json).with_context(|| format!("writing {}", path.display()))?;
    println!("  Results saved to: {}\n", path.display());

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
