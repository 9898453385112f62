//! Noise pipeline from mesh to renormalised per-load tensor.

mod common;

use load_synth::config::GeneratorConfig;
use load_synth::forecast::ForecastSpec;
use load_synth::noise::{
    CoordinateMapper, CorrelationMesh, KnnAlgorithm, KnnParams, KnnRegressor, MeshShape,
    NoiseField, NoiseTensor,
};
use load_synth::site::{LoadSite, SpatialExtent};
use load_synth::window::SimulationWindow;

fn tensor_for(cfg: &GeneratorConfig, algorithm: KnnAlgorithm, seed: u64, loads: &[LoadSite]) -> NoiseTensor {
    let s = &cfg.simulation;
    let window = SimulationWindow::new(s.start, s.end, s.dt_minutes).unwrap();
    let (spec, _) = ForecastSpec::from_config(&cfg.forecast, s.dt_minutes).unwrap();
    let shape = MeshShape::from_density(
        &cfg.mesh,
        window.total_minutes(),
        loads,
        cfg.forecast.channel_count(),
    )
    .unwrap();

    let noise = NoiseField::sample(seed, shape);
    let mesh = CorrelationMesh::build(shape, cfg.mesh.ratio_adjust);
    let mut params = KnnParams::from_config(&cfg.forecast).unwrap();
    params.algorithm = algorithm;
    let model = KnnRegressor::fit(mesh.coords().to_vec(), noise.values().to_vec(), params).unwrap();

    let extent = SpatialExtent::from_sites(loads, &common::two_gens()).unwrap();
    let mapper = CoordinateMapper::new(extent, mesh.rho(), window.nb_steps(), &spec);
    NoiseTensor::query(&model, &mapper, loads).unwrap()
}

#[test]
fn tensor_is_globally_standardised() {
    let cfg = common::small_config();
    let loads = common::three_loads();
    let tensor = tensor_for(&cfg, KnnAlgorithm::Auto, 9, &loads);

    assert_eq!(tensor.nb_loads(), 3);
    assert_eq!(tensor.nb_steps(), 25);
    assert_eq!(tensor.nb_channels(), 4);

    let n = tensor.values().len() as f64;
    let mean = tensor.values().iter().sum::<f64>() / n;
    let var = tensor.values().iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    assert!(mean.abs() < 1e-9, "mean {mean}");
    assert!((var.sqrt() - 1.0).abs() < 1e-9, "std {}", var.sqrt());
}

#[test]
fn kd_tree_and_brute_force_agree() {
    let cfg = common::small_config();
    let loads = common::three_loads();
    let kd = tensor_for(&cfg, KnnAlgorithm::KdTree, 17, &loads);
    let brute = tensor_for(&cfg, KnnAlgorithm::Brute, 17, &loads);
    for (a, b) in kd.values().iter().zip(brute.values()) {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn colocated_loads_share_their_noise() {
    let cfg = common::small_config();
    let loads = vec![
        LoadSite::new("a", 30.0, 30.0, 1.0),
        LoadSite::new("b", 30.0, 30.0, 50.0),
        LoadSite::new("c", 80.0, 10.0, 1.0),
    ];
    let tensor = tensor_for(&cfg, KnnAlgorithm::Auto, 4, &loads);
    for c in 0..tensor.nb_channels() {
        assert_eq!(tensor.channel(0, c), tensor.channel(1, c));
    }
    assert_ne!(tensor.channel(0, 0), tensor.channel(2, 0));
}

#[test]
fn renormalisation_holds_at_every_mesh_density() {
    let loads = common::three_loads();
    for (dx_corr, dt_corr_minutes, n_neighbors) in [(25.0, 30.0, 8), (50.0, 60.0, 16), (200.0, 240.0, 40)] {
        let mut cfg = common::small_config();
        cfg.mesh.dx_corr = dx_corr;
        cfg.mesh.dy_corr = dx_corr;
        cfg.mesh.dt_corr_minutes = dt_corr_minutes;
        cfg.forecast.n_neighbors = n_neighbors;

        let tensor = tensor_for(&cfg, KnnAlgorithm::Auto, 31, &loads);
        let n = tensor.values().len() as f64;
        let mean = tensor.values().iter().sum::<f64>() / n;
        let std = (tensor.values().iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
        assert!(mean.abs() < 1e-9, "dx_corr {dx_corr}: mean {mean}");
        assert!((std - 1.0).abs() < 1e-9, "dx_corr {dx_corr}: std {std}");
    }
}
