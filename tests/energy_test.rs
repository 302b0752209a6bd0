use ising::config::StartMode;
use ising::energy::{
    chain_energy, chain_energy_delta, grid_energy, grid_energy_delta, neighbor_indices,
};
use ising::lattice::{SpinChain, SpinGrid};

use rand::SeedableRng;
use rand_pcg::Pcg64;

#[test]
fn test_grid_delta_matches_full_recomputation() {
    let mut rng = Pcg64::seed_from_u64(42);
    for n in 1..=6 {
        for _ in 0..20 {
            let grid = SpinGrid::new(n, StartMode::Hot, &mut rng);
            let e0 = grid_energy(&grid);
            for row in 0..n {
                for col in 0..n {
                    let mut flipped = grid.clone();
                    flipped.flip(row, col);
                    assert_eq!(
                        grid_energy_delta(&grid, row, col),
                        grid_energy(&flipped) - e0,
                        "N = {n}, site ({row}, {col})"
                    );
                }
            }
        }
    }
}

#[test]
fn test_chain_delta_matches_full_recomputation() {
    let mut rng = Pcg64::seed_from_u64(9);
    for n in 1..=8 {
        let chain = SpinChain::new(n, StartMode::Hot, &mut rng);
        let e0 = chain_energy(&chain);
        for site in 0..n {
            let mut flipped = chain.clone();
            flipped.flip(site);
            assert_eq!(chain_energy_delta(&chain, site), chain_energy(&flipped) - e0);
        }
    }
}

#[test]
fn test_grid_energy_stays_on_bucket_lattice() {
    let mut rng = Pcg64::seed_from_u64(1234);
    for n in 1..=7 {
        let m = (n * n) as i64;
        for _ in 0..50 {
            let e = grid_energy(&SpinGrid::new(n, StartMode::Hot, &mut rng));
            assert!((-2 * m..=2 * m).contains(&e));
            assert_eq!((e + 2 * m) % 4, 0, "E = {e} off the step-4 lattice for N = {n}");
        }
    }
}

#[test]
fn test_chain_energy_known_values() {
    assert_eq!(chain_energy(&SpinChain::from_spins(vec![1, 1, 1, 1])), -4);
    assert_eq!(chain_energy(&SpinChain::from_spins(vec![1, -1, 1, -1])), 4);
    assert_eq!(chain_energy(&SpinChain::from_spins(vec![1, 1, -1, -1])), 0);
}

#[test]
fn test_checkerboard_is_highest_energy() {
    let rows: Vec<Vec<i8>> = (0..4)
        .map(|r| (0..4).map(|c| if (r + c) % 2 == 0 { 1 } else { -1 }).collect())
        .collect();
    let grid = SpinGrid::from_rows(&rows).unwrap();
    assert_eq!(grid_energy(&grid), 32);
    assert_eq!(grid.magnetization(), 0);
}

#[test]
fn test_boundary_wrap_for_four_rows() {
    // Previous row of row 0 is row 3; next row of row 3 is row 0.
    assert_eq!(neighbor_indices(0, 4).prev, 3);
    assert_eq!(neighbor_indices(3, 4).next, 0);
}
