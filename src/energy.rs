// energy.rs - Nearest-neighbour Ising energy under periodic boundaries
//
// All energies are integers in units of the exchange constant J, i.e.
// E = -Σ s_i s_j over bonds. Multiply by `EXCHANGE_J` for physical units.

use crate::lattice::{SpinChain, SpinGrid};

/// Wrapped neighbours of one coordinate along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbors {
    pub next: usize,
    pub prev: usize,
}

/// next = (c + 1) mod n, prev = (c - 1 + n) mod n. For n = 1 both are `c`.
#[inline(always)]
pub fn neighbor_indices(c: usize, n: usize) -> Neighbors {
    debug_assert!(c < n);
    Neighbors {
        next: (c + 1) % n,
        prev: (c + n - 1) % n,
    }
}

/// Σ over bonds (i, i+1 mod N).
pub fn chain_energy(chain: &SpinChain) -> i64 {
    let n = chain.len();
    (0..n)
        .map(|i| {
            let j = neighbor_indices(i, n).next;
            -i64::from(chain.spin(i)) * i64::from(chain.spin(j))
        })
        .sum()
}

/// Energy change from flipping `site` on the chain.
pub fn chain_energy_delta(chain: &SpinChain, site: usize) -> i64 {
    let n = chain.len();
    let nb = neighbor_indices(site, n);
    let s = i64::from(chain.spin(site));
    let sum: i64 = [nb.next, nb.prev]
        .iter()
        .filter(|&&j| j != site)
        .map(|&j| i64::from(chain.spin(j)))
        .sum();
    2 * s * sum
}

/// Σ over each site's right and down bond, so every bond counts once.
pub fn grid_energy(grid: &SpinGrid) -> i64 {
    let n = grid.side();
    let mut energy = 0i64;
    for row in 0..n {
        let down = neighbor_indices(row, n).next;
        for col in 0..n {
            let right = neighbor_indices(col, n).next;
            let s = i64::from(grid.spin(row, col));
            energy -= s * i64::from(grid.spin(row, right));
            energy -= s * i64::from(grid.spin(down, col));
        }
    }
    energy
}

/// Energy change from flipping (row, col): 2 s (Σ of its four neighbours).
///
/// O(1). On a 2 x 2 grid next and prev coincide and both are counted, which
/// matches the doubled bond in [`grid_energy`]. On a 1 x 1 grid every
/// neighbour is the site itself and contributes nothing.
#[inline]
pub fn grid_energy_delta(grid: &SpinGrid, row: usize, col: usize) -> i64 {
    let n = grid.side();
    let rows = neighbor_indices(row, n);
    let cols = neighbor_indices(col, n);
    let s = i64::from(grid.spin(row, col));

    let sum: i64 = [
        (rows.next, col),
        (rows.prev, col),
        (row, cols.next),
        (row, cols.prev),
    ]
    .iter()
    .filter(|&&p| p != (row, col))
    .map(|&(r, c)| i64::from(grid.spin(r, c)))
    .sum();

    2 * s * sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_on_four_sites() {
        let nb = neighbor_indices(0, 4);
        assert_eq!(nb.prev, 3);
        assert_eq!(nb.next, 1);

        let nb = neighbor_indices(3, 4);
        assert_eq!(nb.next, 0);
        assert_eq!(nb.prev, 2);
    }

    #[test]
    fn test_single_site_wraps_to_itself() {
        assert_eq!(neighbor_indices(0, 1), Neighbors { next: 0, prev: 0 });
    }

    #[test]
    fn test_two_sites_share_neighbour() {
        assert_eq!(neighbor_indices(0, 2), Neighbors { next: 1, prev: 1 });
        assert_eq!(neighbor_indices(1, 2), Neighbors { next: 0, prev: 0 });
    }
}
