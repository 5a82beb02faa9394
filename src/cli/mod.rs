//! archsearch CLI Module
//!
//! Command-line driver for random, NSGA-II and hybrid architecture search
//! against the synthetic evaluator.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use colored::*;

use crate::cache::{CacheStats, EvaluationCache};
use crate::monitoring::ResultStatistics;
use crate::nas::{DeadlineEvaluator, SyntheticEvaluator};
use crate::optimizer::{HallOfFame, HybridCombiner, Nsga2Engine, RandomSampler, SearchConfig};
use crate::tracking::SearchReport;

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{:<14} {}", muted(key), val.white())
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn step_finish<T>(status: &crate::Result<T>, start: Instant) {
    match status {
        Ok(_) => step_done(&format!("{:?}", start.elapsed())),
        Err(e) => println!("{} {}", "stopped".red(), dim(&e.to_string())),
    }
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "archsearch")]
#[command(author = "KolosalAI")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Multi-objective neural architecture search")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sample architectures at random
    Random(SearchArgs),

    /// Evolve architectures with NSGA-II
    Nsga2(SearchArgs),

    /// Split the budget between random sampling and NSGA-II
    Hybrid(SearchArgs),
}

/// Options shared by every search command
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// JSON configuration file; flags below override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Population size (total budget for hybrid runs)
    #[arg(long)]
    pub pop_size: Option<usize>,

    /// Number of NSGA-II generations
    #[arg(short, long)]
    pub generations: Option<usize>,

    /// Number of random samples
    #[arg(long)]
    pub num_random: Option<usize>,

    /// Random seed
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Evaluation worker threads
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Per-evaluation deadline in seconds
    #[arg(long)]
    pub timeout_secs: Option<f64>,

    /// Input feature dimension seen by the first layer
    #[arg(long, default_value = "2048")]
    pub input_dim: usize,

    /// Number of output classes
    #[arg(long, default_value = "10")]
    pub num_classes: usize,

    /// Write a JSON report here
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl SearchArgs {
    /// Configuration file (or defaults) with command-line overrides applied
    pub fn resolve_config(&self) -> anyhow::Result<SearchConfig> {
        let mut config = match &self.config {
            Some(path) => SearchConfig::load_json(path)?,
            None => SearchConfig::default(),
        };

        if let Some(n) = self.pop_size {
            config.pop_size = n;
        }
        if let Some(n) = self.generations {
            config.num_generations = n;
        }
        if let Some(n) = self.num_random {
            config.num_random = n;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(n) = self.workers {
            config.n_workers = Some(n);
        }
        if let Some(t) = self.timeout_secs {
            config.evaluation_timeout_secs = Some(t);
        }

        config.validate()?;
        Ok(config)
    }

    /// Session cache around the synthetic evaluator
    pub fn build_cache(&self, config: &SearchConfig) -> Arc<EvaluationCache> {
        let evaluator = SyntheticEvaluator::with_dims(self.input_dim, self.num_classes);
        let cache = match config.evaluation_timeout() {
            Some(deadline) => {
                EvaluationCache::with_policy(DeadlineEvaluator::new(evaluator, deadline), config.cache_policy)
            }
            None => EvaluationCache::with_policy(evaluator, config.cache_policy),
        };
        Arc::new(cache)
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_random(args: &SearchArgs) -> anyhow::Result<()> {
    section("Random search");
    let config = args.resolve_config()?;
    let cache = args.build_cache(&config);

    step_run(&format!("Sampling {} architectures", config.num_random.to_string().cyan()));
    let start = Instant::now();
    let mut sampler = RandomSampler::new(Arc::clone(&cache), config.seed, &config.parallel_config())?;
    let results = sampler.sample(config.num_random);
    step_done(&format!("{:?}", start.elapsed()));

    let report = SearchReport::from_random(config, results, &cache)
        .with_elapsed(start.elapsed().as_secs_f64());
    print_summary(&report, None);
    write_report(&report, args.output.as_deref())
}

pub fn cmd_nsga2(args: &SearchArgs) -> anyhow::Result<()> {
    section("NSGA-II");
    let config = args.resolve_config()?;
    let cache = args.build_cache(&config);

    step_run(&format!(
        "Evolving {} individuals for {} generations",
        config.pop_size.to_string().cyan(),
        config.num_generations.to_string().cyan()
    ));
    let start = Instant::now();
    let mut engine = Nsga2Engine::new(config.clone(), Arc::clone(&cache))?;
    let status = engine.run();
    step_finish(&status, start);
    // a failed run still reports every generation that completed
    let outcome = engine.snapshot();

    println!();
    for line in outcome.logbook.to_string().lines() {
        println!("  {}", dim(line));
    }

    let report = SearchReport::from_nsga2(config, &outcome, &cache)
        .with_elapsed(start.elapsed().as_secs_f64());
    print_summary(&report, Some(&outcome.hall_of_fame));
    write_report(&report, args.output.as_deref())?;
    status?;
    Ok(())
}

pub fn cmd_hybrid(args: &SearchArgs) -> anyhow::Result<()> {
    section("Hybrid search");
    let config = args.resolve_config()?;
    let cache = args.build_cache(&config);

    let mut combiner = HybridCombiner::new(config.clone(), Arc::clone(&cache))?;
    step_run(&format!(
        "Running {} random + {} NSGA-II individuals",
        config.num_random.to_string().cyan(),
        combiner.nsga2_config().pop_size.to_string().cyan()
    ));
    let start = Instant::now();
    let status = combiner.run();
    step_finish(&status, start);
    let outcome = combiner.snapshot();

    let report = SearchReport::from_hybrid(config, &outcome, &cache)
        .with_elapsed(start.elapsed().as_secs_f64());
    print_summary(&report, Some(&outcome.nsga2.hall_of_fame));
    write_report(&report, args.output.as_deref())?;
    status?;
    Ok(())
}

// ─── Output ────────────────────────────────────────────────────────────────────

fn print_summary(report: &SearchReport, hall_of_fame: Option<&HallOfFame>) {
    println!();
    line_box_top();

    match report.best() {
        Some(best) => {
            line_box(&kv("Best", &best.architecture.to_string()));
            line_box(&kv("Accuracy", &format!("{:.4}", best.fitness.accuracy)));
            line_box(&kv("Parameters", &best.fitness.param_count.to_string()));
        }
        None => line_box(&"No architecture was scored successfully".yellow().to_string()),
    }

    if let Some(hof) = hall_of_fame.and_then(HallOfFame::best) {
        line_box(&kv(
            "Hall of Fame",
            &format!("{} (gen {})", hof.architecture, hof.generation),
        ));
    }

    line_box_sep();
    match &report.statistics {
        Some(stats) => print_statistics(stats),
        None => line_box(&muted("no valid results").to_string()),
    }
    line_box(&kv("Pareto front", &report.pareto_front.len().to_string()));

    line_box_sep();
    print_cache_stats(&report.cache);
    line_box_bottom();
    println!();
}

fn print_statistics(stats: &ResultStatistics) {
    line_box(&kv("Valid", &format!("{} ({} failed)", stats.valid, stats.failed)));
    line_box(&kv(
        "Accuracy",
        &format!(
            "mean {:.4}  min {:.4}  max {:.4}",
            stats.mean_accuracy, stats.min_accuracy, stats.max_accuracy
        ),
    ));
    line_box(&kv(
        "Parameters",
        &format!("mean {:.0}  min {}", stats.mean_params, stats.min_params),
    ));
}

fn print_cache_stats(stats: &CacheStats) {
    line_box(&kv(
        "Evaluations",
        &format!("{} ({} failed)", stats.evaluations, stats.failures),
    ));
    line_box(&kv(
        "Cache",
        &format!("{} entries, hit rate {:.1}%", stats.entries, stats.hit_rate * 100.0),
    ));
}

fn write_report(report: &SearchReport, output: Option<&Path>) -> anyhow::Result<()> {
    if let Some(path) = output {
        report.save_json(path)?;
        step_ok(&format!("Report written to {}", path.display()));
    }
    Ok(())
}
