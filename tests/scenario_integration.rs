//! Multi-scenario runs, config files, and CSV round trips.

mod common;

use std::fs;

use load_synth::config::GeneratorConfig;
use load_synth::generator::LoadGenerator;
use load_synth::io::{export, import};
use load_synth::runner::{run_scenarios, scenario_seeds};
use load_synth::site::LoadSite;

#[test]
fn scenarios_are_independent_and_reproducible() {
    let generator = LoadGenerator::new(common::small_config()).unwrap();
    let loads = common::three_loads();
    let gens = common::two_gens();
    let pattern = common::ramp_pattern();
    let seeds = scenario_seeds(100, 3);

    let outcomes = run_scenarios(&generator, &seeds, &loads, &gens, &pattern);
    assert_eq!(outcomes.len(), 3);
    for (i, outcome) in outcomes.iter().enumerate() {
        assert_eq!(outcome.index, i);
        assert_eq!(outcome.seed, seeds[i]);
        let series = outcome.result.as_ref().unwrap();
        // each scenario matches a standalone run with its seed
        let alone = generator.generate(seeds[i], &loads, &gens, &pattern).unwrap();
        assert_eq!(series, &alone);
    }

    let first = outcomes[0].result.as_ref().unwrap();
    let second = outcomes[1].result.as_ref().unwrap();
    assert_ne!(first.load_p, second.load_p);
}

#[test]
fn outcomes_report_each_scenario_result() {
    let generator = LoadGenerator::new(common::small_config()).unwrap();
    let empty: Vec<LoadSite> = Vec::new();
    let outcomes = run_scenarios(&generator, &[1, 2], &empty, &[], &common::ramp_pattern());
    assert!(outcomes.iter().all(|o| o.result.is_err()));

    let outcomes = run_scenarios(&generator, &[1, 2], &common::three_loads(), &[], &common::ramp_pattern());
    assert!(outcomes.iter().all(|o| o.result.is_ok()));
}

#[test]
fn toml_file_drives_generation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gen.toml");
    fs::write(
        &path,
        r#"
[simulation]
start = "2012-01-02T00:00:00"
end = "2012-01-02T03:00:00"
dt_minutes = 15
seed = 12

[mesh]
lx = 100.0
ly = 100.0
dx_corr = 50.0
dy_corr = 50.0
dt_corr_minutes = 60.0

[forecast]
horizons_minutes = [15, 60]
horizon_std = [0.02, 0.05]
n_neighbors = 8
algorithm = "ball_tree"
"#,
    )
    .unwrap();

    let cfg = GeneratorConfig::from_toml_file(&path).unwrap();
    assert!(cfg.validate().is_empty());
    let seed = cfg.simulation.seed.unwrap();
    let generator = LoadGenerator::new(cfg).unwrap();
    let series = generator
        .generate(seed, &common::three_loads(), &[], &common::ramp_pattern())
        .unwrap();
    // 3 h at 15 min -> 13 steps, one dropped
    assert_eq!(series.nb_rows(), 12);
    assert_eq!(series.load_p_forecasted.len(), 24);
    assert!(series.warnings.is_empty());
}

#[test]
fn csv_inputs_to_csv_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let loads_path = dir.path().join("loads_charac.csv");
    let prods_path = dir.path().join("prods_charac.csv");
    let pattern_path = dir.path().join("load_weekly_pattern.csv");
    fs::write(
        &loads_path,
        "name,bus,Pmax,x,y\nload_0,0,10.0,10.0,20.0\nload_1,1,20.0,40.0,70.0\n",
    )
    .unwrap();
    fs::write(&prods_path, "name,x,y,Pmax\ngen_0,0.0,0.0,50\n").unwrap();
    let mut pattern = String::from("datetime,test\n");
    for i in 0..2016 {
        pattern.push_str(&format!("t{i},{}\n", 1.0 + (i % 288) as f64 / 288.0));
    }
    fs::write(&pattern_path, pattern).unwrap();

    let loads = import::read_loads_file(&loads_path).unwrap();
    let gens = import::read_generators_file(&prods_path).unwrap();
    let weekly = import::read_weekly_pattern_file(&pattern_path, 5).unwrap();
    assert_eq!(loads.len(), 2);
    assert_eq!(gens.len(), 1);
    assert_eq!(weekly.values().len(), 2016);

    let generator = LoadGenerator::new(common::small_config()).unwrap();
    let series = generator.generate(8, &loads, &gens, &weekly).unwrap();
    let out = dir.path().join("out");
    let paths = export::write_all(&out, &series).unwrap();

    let text = fs::read_to_string(&paths[0]).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("datetime;load_0;load_1"));
    assert_eq!(lines.count(), series.nb_rows());

    let text = fs::read_to_string(&paths[2]).unwrap();
    assert_eq!(text.lines().count(), 1 + series.nb_rows() * series.nb_horizons());
}
