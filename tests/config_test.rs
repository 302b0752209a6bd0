use ising::config::{Algorithm, SimConfig, StartMode};
use ising::SimError;

#[test]
fn test_defaults_are_valid() {
    let cfg = SimConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.flatness_interval, 10_000);
    assert_eq!(cfg.initial_factor, std::f64::consts::E);
    assert_eq!(cfg.algorithm, Algorithm::WangLandau);
}

#[test]
fn test_start_mode_parsing() {
    assert_eq!("hot".parse::<StartMode>().unwrap(), StartMode::Hot);
    assert_eq!(" Cold ".parse::<StartMode>().unwrap(), StartMode::Cold);
    assert!(matches!("warm".parse::<StartMode>(), Err(SimError::InvalidConfig(_))));
}

#[test]
fn test_algorithm_parsing() {
    assert_eq!("metropolis".parse::<Algorithm>().unwrap(), Algorithm::Metropolis);
    assert_eq!("wang-landau".parse::<Algorithm>().unwrap(), Algorithm::WangLandau);
    assert!("gibbs".parse::<Algorithm>().is_err());
}

#[test]
fn test_metropolis_needs_iterations() {
    let cfg = SimConfig {
        algorithm: Algorithm::Metropolis,
        iterations: 0,
        ..SimConfig::default()
    };
    assert!(cfg.validate().is_err());

    // Iteration count is irrelevant to Wang-Landau.
    let cfg = SimConfig { iterations: 0, ..SimConfig::default() };
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_flatness_threshold_bounds() {
    for threshold in [0.0, 1.0, -0.1, f64::NAN] {
        let cfg = SimConfig { flatness_threshold: threshold, ..SimConfig::default() };
        assert!(cfg.validate().is_err(), "threshold {threshold} accepted");
    }
}

#[test]
fn test_error_messages_are_descriptive() {
    let cfg = SimConfig { temperature: 0.0, ..SimConfig::default() };
    let msg = cfg.validate().unwrap_err().to_string();
    assert!(msg.starts_with("invalid configuration"), "{msg}");
    assert!(msg.contains("temperature"), "{msg}");
}
