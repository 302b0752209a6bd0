use ising::config::StartMode;
use ising::energy::grid_energy;
use ising::lattice::SpinGrid;
use ising::sampler::LatticeSampler;
use ising::wang_landau::{WangLandauParams, WangLandauSampler};
use ising::SimError;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn params(tolerance: f64, interval: u64) -> WangLandauParams {
    WangLandauParams {
        initial_factor: std::f64::consts::E,
        tolerance,
        flatness_threshold: 0.2,
        flatness_interval: interval,
    }
}

#[test]
fn test_cold_start_state() {
    let mut rng = ChaCha20Rng::seed_from_u64(1);
    let grid = SpinGrid::new(4, StartMode::Cold, &mut rng);
    let wl = WangLandauSampler::new(grid, params(1e-8, 10_000)).unwrap();

    assert_eq!(wl.energy(), -32);
    assert_eq!(wl.magnetization(), 16);
    assert_eq!(wl.active_bucket().unwrap(), 0);
    assert_eq!(wl.ln_g().len(), 17);
    assert!(wl.ln_g().iter().all(|&v| v == 0.0));
    assert!(wl.histogram().iter().all(|&h| h == 0));
    assert_eq!(wl.params().flatness_interval, 10_000);
    assert_eq!(wl.params().tolerance, 1e-8);
    assert!((wl.modification_factor() - std::f64::consts::E).abs() < 1e-12);
}

#[test]
fn test_cached_energy_matches_lattice() {
    let mut rng = ChaCha20Rng::seed_from_u64(99);
    let grid = SpinGrid::new(5, StartMode::Hot, &mut rng);
    let mut wl = WangLandauSampler::new(grid, params(1e-8, 1_000)).unwrap();

    for i in 0..50_000 {
        wl.step(&mut rng).unwrap();
        if i % 500 == 0 {
            assert_eq!(wl.energy(), grid_energy(wl.grid()));
            assert_eq!(wl.magnetization(), wl.grid().magnetization());
        }
    }
    assert_eq!(wl.energy(), grid_energy(wl.grid()));
}

#[test]
fn test_histogram_and_dos_follow_visits() {
    let mut rng = ChaCha20Rng::seed_from_u64(2024);
    let grid = SpinGrid::new(4, StartMode::Cold, &mut rng);
    // Interval larger than the run so the histogram is never cleared.
    let mut wl = WangLandauSampler::new(grid, params(1e-8, 1_000_000)).unwrap();
    let ln_f = wl.ln_factor();

    for _ in 0..5_000 {
        wl.step(&mut rng).unwrap();
    }
    let total: u64 = wl.histogram().iter().sum();
    assert_eq!(total, 5_000);
    for (k, (&h, &ln_g)) in wl.histogram().iter().zip(wl.ln_g()).enumerate() {
        assert!((ln_g - h as f64 * ln_f).abs() < 1e-9, "bucket {k}");
    }

    let dos = wl.density_of_states();
    for (k, m) in dos.magnetization_samples().iter().enumerate() {
        assert_eq!(m.is_some(), wl.histogram()[k] > 0, "bucket {k}");
    }
    // Ground-state bucket only holds the all-up or all-down lattice.
    assert!(matches!(dos.magnetization_samples()[0], Some(16) | Some(-16)));
}

#[test]
fn test_modification_factor_never_grows() {
    let mut rng = ChaCha20Rng::seed_from_u64(31337);
    let grid = SpinGrid::new(3, StartMode::Cold, &mut rng);
    let mut wl = WangLandauSampler::new(grid, params(1e-3, 2_000)).unwrap();

    let mut last = wl.modification_factor();
    let mut flat_seen = 0;
    for _ in 0..2_000_000 {
        let info = wl.step(&mut rng).unwrap();
        if let Some(report) = info.flatness {
            assert!(report.factor <= last, "factor grew from {last} to {}", report.factor);
            assert!((0.0..=1.0).contains(&report.hist_percent));
            if report.flat {
                flat_seen += 1;
                assert!(wl.histogram().iter().all(|&h| h == 0));
                assert!((report.factor - last.sqrt()).abs() < 1e-12);
            } else {
                assert_eq!(report.factor, last);
            }
            last = report.factor;
        }
        if wl.is_converged() {
            break;
        }
    }
    assert!(flat_seen > 0);
    assert_eq!(flat_seen, wl.flat_events());
    assert!(wl.is_converged(), "not converged, f = {}", wl.modification_factor());
    assert!(wl.ln_g().iter().all(|v| v.is_finite()));
}

#[test]
fn test_rejects_bad_params() {
    let grid = SpinGrid::from_rows(&[vec![1, 1], vec![1, 1]]).unwrap();
    let mut bad = params(1e-8, 10_000);
    bad.initial_factor = 1.0;
    assert!(matches!(
        WangLandauSampler::new(grid.clone(), bad),
        Err(SimError::InvalidConfig(_))
    ));

    let mut bad = params(1e-8, 10_000);
    bad.flatness_interval = 0;
    assert!(WangLandauSampler::new(grid.clone(), bad).is_err());

    assert!(WangLandauSampler::new(grid, params(0.0, 10_000)).is_err());
}

#[test]
fn test_single_site_grid_is_stable() {
    let grid = SpinGrid::from_rows(&[vec![1]]).unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(0);
    let mut wl = WangLandauSampler::new(grid, params(1e-2, 10)).unwrap();
    for _ in 0..1_000 {
        let info = wl.step(&mut rng).unwrap();
        assert_eq!(info.delta_energy, 0);
        assert_eq!(wl.energy(), -2);
    }
    assert!(wl.is_converged());
}
