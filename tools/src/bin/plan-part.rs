use anyhow::Context as _;
use anyhow::Result;
use rand::SeedableRng as _;
use rand_pcg::Pcg64;
use shardplan::input;
use shardplan::Partitioner;
use shardplan::PlacementStrategy;
use shardplan::QueryShape;
use shardplan::Settings;
use std::env;
use std::fs;
use std::io;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::Registry;
use tracing_tree::HierarchicalLayer;

const USAGE: &str = "Usage: plan-part [options] -i positions.tsv";

fn parse_strategy(s: &str) -> Result<PlacementStrategy> {
    match s {
        "players" => Ok(PlacementStrategy::PlayerPositions),
        "bbox" => Ok(PlacementStrategy::BoundingBox),
        _ => anyhow::bail!("unknown strategy {s:?}, expected 'players' or 'bbox'"),
    }
}

fn main() -> Result<()> {
    let mut options = getopts::Options::new();
    options.optflag("h", "help", "print this help menu");
    options.optopt("i", "input", "positions file (TSV, one 'x<TAB>y' per line)", "FILE");
    options.optopt("f", "focuses", "number of focuses", "COUNT");
    options.optopt("s", "strategy", "focus placement: players or bbox", "NAME");
    options.optopt("n", "trials", "number of randomized trials", "COUNT");
    options.optopt("l", "load-cap", "max comfortable load factor", "PERCENT");
    options.optopt("e", "cell-exp", "spatial-index cell size exponent", "BITS");
    options.optopt("k", "neighbors", "per-player neighbor count", "COUNT");
    options.optopt("", "seed", "64-bit seed for experiment reproduction", "INTEGER");
    options.optflag("v", "verbose", "print every improvement");

    let matches = options.parse(env::args().skip(1))?;

    if matches.opt_present("h") {
        eprintln!("{}", options.usage(USAGE));
        return Ok(());
    }

    Registry::default()
        .with(EnvFilter::from_env("LOG"))
        .with(HierarchicalLayer::new(2).with_targets(true))
        .init();

    let mut settings = Settings::default();
    if let Some(focus_count) = matches.opt_get("f")? {
        settings.focus_count = focus_count;
    }
    if let Some(strategy) = matches.opt_str("s") {
        settings.strategy = parse_strategy(&strategy)?;
    }
    if let Some(load_cap) = matches.opt_get("l")? {
        settings.max_comfortable_load_factor = load_cap;
    }
    if let Some(cell_exp) = matches.opt_get("e")? {
        settings.cell_size_exponent = cell_exp;
    }
    if let Some(neighbor_count) = matches.opt_get("k")? {
        settings.neighbor_count = neighbor_count;
    }
    let trials: usize = matches.opt_get("n")?.unwrap_or(1000);
    let verbose = matches.opt_present("v");

    let input_file = matches
        .opt_str("i")
        .context("missing required option 'input'")?;
    let input_file = fs::File::open(&input_file)
        .with_context(|| format!("failed to open {input_file:?}"))?;
    let positions =
        input::read(io::BufReader::new(input_file)).context("failed to read positions")?;
    anyhow::ensure!(!positions.is_empty(), "the input holds no positions");

    let rng = match matches.opt_get("seed")? {
        Some(seed) => Pcg64::seed_from_u64(seed),
        None => Pcg64::from_os_rng(),
    };

    let player_count = positions.len();
    let mut partitioner = Partitioner::new(settings, rng)?;
    partitioner.set_positions(positions)?;

    for _ in 0..trials {
        let outcome = partitioner.randomize()?;
        if verbose && outcome.is_improvement() {
            let best = partitioner.best_snapshot().unwrap();
            eprintln!(
                "run {}: {} forwards",
                partitioner.runs(),
                best.forward_count()
            );
        }
    }

    let settings = partitioner.settings();
    println!(
        "settings: {} focuses, {:?}, cap {}%, cells 2^{}, K {}",
        settings.focus_count,
        settings.strategy,
        settings.max_comfortable_load_factor,
        settings.cell_size_exponent,
        settings.neighbor_count,
    );
    println!("players:  {player_count}");
    println!("trials:   {}", partitioner.runs());
    println!("failures: {}", partitioner.failures());
    println!("elapsed:  {:?}", partitioner.total_elapsed());

    let best = match partitioner.best_snapshot() {
        Some(best) => best,
        None => {
            println!("no placement stayed under the load cap");
            return Ok(());
        }
    };

    println!("forwards: {}", best.forward_count());
    if let Some((min, max)) = best.load_factor_spread() {
        println!("load:     {min:.3}% .. {max:.3}%");
    }
    // how many players sit within one cell side of each anchor
    let index = partitioner.spatial_index();
    let near_radius = (1_u64 << settings.cell_size_exponent) as f64;

    println!("focus     x          y          own   external  load%   hull  near");
    for focus in 0..best.focus_count() {
        let anchor = best.focuses()[focus];
        let near = index
            .query(anchor.x, anchor.y, near_radius, QueryShape::Circle)
            .len();
        println!(
            "{focus:<9} {:<10.1} {:<10.1} {:<5} {:<9} {:<7.3} {:<5} {near}",
            anchor.x,
            anchor.y,
            best.own_players(focus).len(),
            best.external_interest(focus).len(),
            best.load_factor(focus),
            best.inner_hull(focus).len(),
        );
    }

    Ok(())
}
