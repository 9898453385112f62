//! load-synth entry point: CLI wiring, logging setup, and CSV output.

mod cli;

use std::path::Path;
use std::process;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use load_synth::config::GeneratorConfig;
use load_synth::error::{GenerationError, Result};
use load_synth::generator::{LoadGenerator, LoadSeries};
use load_synth::io::{export, import};
use load_synth::profile::WeeklyPattern;
use load_synth::runner::{self, ScenarioOutcome};

use cli::CliOptions;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &CliOptions) -> Result<GeneratorConfig> {
    // --config takes priority, then --preset, then baseline default
    let mut cfg = if let Some(ref path) = cli.config {
        GeneratorConfig::from_toml_file(path)?
    } else if let Some(ref name) = cli.preset {
        GeneratorConfig::from_preset(name)?
    } else {
        GeneratorConfig::baseline()
    };
    if let Some(seed) = cli.seed {
        cfg.simulation.seed = Some(seed);
    }
    Ok(cfg)
}

fn summary(index: usize, series: &LoadSeries) {
    println!(
        "scenario {index} (seed {}): {} rows x {} loads, {} horizons",
        series.seed,
        series.nb_rows(),
        series.nb_loads(),
        series.nb_horizons()
    );
}

fn write_scenario(out: Option<&Path>, nb_scenarios: usize, index: usize, series: &LoadSeries) -> Result<()> {
    let Some(out) = out else {
        return Ok(());
    };
    let dir = if nb_scenarios == 1 {
        out.to_path_buf()
    } else {
        out.join(format!("scenario_{index}"))
    };
    export::write_all(&dir, series)?;
    Ok(())
}

fn run(cli: &CliOptions) -> Result<()> {
    let cfg = load_config(cli)?;
    let errors = cfg.validate();
    if let Some(first) = errors.first().cloned() {
        for e in &errors {
            eprintln!("{e}");
        }
        return Err(first.into());
    }

    let loads = import::read_loads_file(&cli.loads)?;
    let gens = match cli.prods {
        Some(ref path) => import::read_generators_file(path)?,
        None => Vec::new(),
    };
    let weekly = match cli.pattern {
        Some(ref path) => import::read_weekly_pattern_file(path, cfg.weekly.step_minutes)?,
        None => {
            warn!("no weekly pattern given, using a flat profile");
            WeeklyPattern::flat()
        }
    };

    let seed = cfg.simulation.seed.unwrap_or_else(runner::draw_seed);
    info!(seed, scenarios = cli.scenarios, "starting generation");
    let generator = LoadGenerator::new(cfg)?;

    let outcomes = if cli.scenarios == 1 {
        vec![ScenarioOutcome {
            index: 0,
            seed,
            result: generator.generate(seed, &loads, &gens, &weekly),
        }]
    } else {
        let seeds = runner::scenario_seeds(seed, cli.scenarios);
        runner::run_scenarios(&generator, &seeds, &loads, &gens, &weekly)
    };

    let mut first_error: Option<GenerationError> = None;
    for outcome in outcomes {
        let written = outcome.result.and_then(|series| {
            summary(outcome.index, &series);
            write_scenario(cli.out.as_deref(), cli.scenarios, outcome.index, &series)
        });
        if let Err(e) = written {
            first_error.get_or_insert(e);
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn main() {
    init_tracing();

    let cli = match cli::parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
