use std::env;
use std::path::PathBuf;

pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
    pub loads: PathBuf,
    pub prods: Option<PathBuf>,
    pub pattern: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub seed: Option<u64>,
    pub scenarios: usize,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_options(&args)
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut config = None;
    let mut preset = None;
    let mut loads = None;
    let mut prods = None;
    let mut pattern = None;
    let mut out = None;
    let mut seed = None;
    let mut scenarios = None;

    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--config" => set_once(&mut config, flag, PathBuf::from(args.value(&mut i, flag)?))?,
            "--preset" => set_once(&mut preset, flag, args.value(&mut i, flag)?.to_string())?,
            "--loads" => set_once(&mut loads, flag, PathBuf::from(args.value(&mut i, flag)?))?,
            "--prods" => set_once(&mut prods, flag, PathBuf::from(args.value(&mut i, flag)?))?,
            "--pattern" => set_once(&mut pattern, flag, PathBuf::from(args.value(&mut i, flag)?))?,
            "--out" => set_once(&mut out, flag, PathBuf::from(args.value(&mut i, flag)?))?,
            "--seed" => {
                let raw = args.value(&mut i, flag)?;
                let value = raw
                    .parse::<u64>()
                    .map_err(|_| format!("--seed value \"{raw}\" is not a valid u64"))?;
                set_once(&mut seed, flag, value)?;
            }
            "--scenarios" => {
                let raw = args.value(&mut i, flag)?;
                let value = raw
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| format!("--scenarios value \"{raw}\" must be a positive integer"))?;
                set_once(&mut scenarios, flag, value)?;
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if config.is_some() && preset.is_some() {
        return Err(
            "arguments `--config` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }
    let loads = loads.ok_or_else(|| "missing required argument --loads".to_string())?;

    Ok(CliOptions {
        config,
        preset,
        loads,
        prods,
        pattern,
        out,
        seed,
        scenarios: scenarios.unwrap_or(1),
    })
}

fn set_once<T>(slot: &mut Option<T>, flag: &str, value: T) -> Result<(), String> {
    if slot.replace(value).is_some() {
        return Err(format!("{flag} provided more than once"));
    }
    Ok(())
}

trait SliceArgExt {
    fn value(&self, index: &mut usize, flag: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    /// Advances past `flag` and returns its value.
    fn value(&self, index: &mut usize, flag: &str) -> Result<&str, String> {
        *index += 1;
        self.get(*index)
            .map(String::as_str)
            .ok_or_else(|| format!("missing value for {flag}"))
    }
}

pub fn print_usage() {
    eprintln!("load-synth — spatiotemporally correlated load chronics and forecasts");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  load-synth --loads <csv> [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>      Load configuration from a TOML file");
    eprintln!("  --preset <name>      Use a built-in preset (baseline, hourly)");
    eprintln!("  --loads <path>       Load characteristics CSV (name, x, y, Pmax)");
    eprintln!("  --prods <path>       Generation characteristics CSV (x, y)");
    eprintln!("  --pattern <path>     Weekly load pattern CSV (column \"test\")");
    eprintln!("  --out <dir>          Write chronics as CSV into this directory");
    eprintln!("  --seed <u64>         Override the random seed");
    eprintln!("  --scenarios <n>      Number of independent scenarios (default: 1)");
    eprintln!("  --help               Show this help message");
    eprintln!();
    eprintln!("Without --config or --preset the baseline preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}
