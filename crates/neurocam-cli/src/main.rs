use std::path::PathBuf;

use clap::{Parser, Subcommand};
use neurocam_core::{CamConfig, MatchMode, MatchResult, NeuroCam, Pattern};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "neurocam", about = "Drive a NeuroCAM matcher from the command line")]
struct Cli {
    /// TOML configuration file; environment overrides still apply
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search each pattern against a freshly seeded store
    Search {
        /// Patterns as hex (`0x1A3` or `1a3`) or binary (`0b...`); bare digits are hex
        #[arg(required = true)]
        patterns: Vec<String>,
        #[arg(long, default_value = "fuzzy")]
        mode: String,
        #[arg(long)]
        threshold: Option<u8>,
        /// Partial-mode mask, hex or `0b` binary; `255` means 0x255
        #[arg(long)]
        mask: Option<String>,
        /// Learn misses into the learned pool
        #[arg(long)]
        learn: bool,
    },
    /// Replay the reference scenarios against the factory store
    Demo {},
    /// Print the effective configuration, or save it
    Config {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Search the patterns and dump the match history
    History {
        /// Patterns as hex or `0b` binary
        #[arg(required = true)]
        patterns: Vec<String>,
    },
}

fn init_logging() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(d) = "neurocam_core=info".parse() {
        filter = filter.add_directive(d);
    }
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn load_config(path: Option<&PathBuf>) -> Result<CamConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(p) => CamConfig::from_file_with_env(p)?,
        None => CamConfig::load_layered(None, None)?,
    };
    Ok(config)
}

fn parse_patterns(raw: &[String]) -> Result<Vec<Pattern>, Box<dyn std::error::Error>> {
    raw.iter()
        .map(|s| Pattern::parse(s).ok_or_else(|| format!("invalid pattern: {}", s).into()))
        .collect()
}

fn print_result(r: &MatchResult, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(r)?);
        return Ok(());
    }
    let query = r.query.map(|q| q.to_string()).unwrap_or_else(|| "-".into());
    let slot = r.slot.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
    let index = r
        .slot_index
        .map(|i| i.to_string())
        .unwrap_or_else(|| "-".into());
    print!(
        "{} valid={} slot={} index={} distance={} confidence={}",
        query, r.valid, slot, index, r.distance, r.confidence
    );
    if let Some(learned) = r.learned {
        print!(" learned={}", learned);
    }
    println!();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    debug!("effective config: {:?}", config);

    match cli.cmd {
        Commands::Search {
            patterns,
            mode,
            threshold,
            mask,
            learn,
        } => {
            let mode = MatchMode::parse(&mode).ok_or_else(|| format!("unknown mode: {}", mode))?;
            let mut cam = NeuroCam::new(config)?;
            if let Some(t) = threshold {
                cam.set_fuzzy_threshold(t)?;
            }
            if let Some(m) = mask {
                let m = Pattern::parse(&m).ok_or_else(|| format!("invalid mask: {}", m))?;
                cam.set_partial_mask(m.bits())?;
            }
            if learn {
                cam.set_learning_enabled(true);
            }
            for p in parse_patterns(&patterns)? {
                let r = cam.search(p, mode)?;
                print_result(&r, cli.json)?;
            }
            if cli.json {
                eprintln!("{}", cam.stats().to_json()?);
            } else {
                info!(
                    "{} queries, hit rate {:.2}, {} learned",
                    cam.stats().queries_completed,
                    cam.stats().hit_rate(),
                    cam.stats().learned_writes
                );
            }
        }
        Commands::Demo {} => run_demo(config, cli.json)?,
        Commands::Config { out } => match out {
            Some(path) => {
                config.save_to_file(&path)?;
                println!("Saved configuration to {}", path.display());
            }
            None => print!("{}", config.to_toml_string()?),
        },
        Commands::History { patterns } => {
            let mut cam = NeuroCam::new(config)?;
            for p in parse_patterns(&patterns)? {
                cam.search(p, MatchMode::Fuzzy)?;
            }
            let history = cam.read_history();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else {
                for entry in history {
                    println!(
                        "tick {:>4}  {} -> {} (distance {})",
                        entry.tick, entry.query, entry.slot, entry.distance
                    );
                }
            }
        }
    }
    Ok(())
}

fn run_demo(config: CamConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut cam = NeuroCam::new(config)?;
    info!("Factory store, latency {} ticks", cam.latency());

    for bits in [0x000, 0x001, 0xFFF, 0x0FF, 0xF00, 0xAAA, 0x555] {
        let r = cam.search(Pattern(bits), MatchMode::Fuzzy)?;
        print_result(&r, json)?;
    }

    info!("Ambiguous query with threshold 4");
    let previous = cam.fuzzy_threshold();
    cam.set_fuzzy_threshold(4)?;
    let r = cam.search(Pattern(0x03A), MatchMode::Fuzzy)?;
    print_result(&r, json)?;
    cam.set_fuzzy_threshold(previous)?;

    info!("Write 0x123 to slot 0:0, then search it");
    cam.write_template(0, 0, Pattern(0x123))?;
    cam.tick();
    let r = cam.search(Pattern(0x123), MatchMode::Exact)?;
    print_result(&r, json)?;

    info!("Learning a miss");
    let r = cam.search(Pattern(0x137), MatchMode::Learning)?;
    print_result(&r, json)?;
    let r = cam.search(Pattern(0x137), MatchMode::Exact)?;
    print_result(&r, json)?;

    if !json {
        println!("{}", cam.stats().to_json()?);
    }
    Ok(())
}
