// lattice.rs - Spin configurations on a periodic chain and a periodic square grid

use rand::Rng;

use crate::config::StartMode;

/// A spin is +1 (up) or -1 (down).
pub type Spin = i8;

pub const UP: Spin = 1;
pub const DOWN: Spin = -1;

/// Draw the initial spin for one site.
fn initial_spin<R: Rng + ?Sized>(mode: StartMode, rng: &mut R) -> Spin {
    match mode {
        StartMode::Cold => UP,
        // Uniform over {0, 1}: 0 is down, 1 is up.
        StartMode::Hot => {
            if rng.gen_range(0..=1) == 0 {
                DOWN
            } else {
                UP
            }
        }
    }
}

/// Up and down sites of one snapshot as (x, y) pairs, in scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpinCoordinates {
    pub up: Vec<(usize, usize)>,
    pub down: Vec<(usize, usize)>,
}

impl SpinCoordinates {
    fn with_capacity(n: usize) -> Self {
        Self {
            up: Vec::with_capacity(n),
            down: Vec::with_capacity(n),
        }
    }

    fn push(&mut self, spin: Spin, point: (usize, usize)) {
        if spin < 0 {
            self.down.push(point);
        } else {
            self.up.push(point);
        }
    }

    /// Total number of sites in the snapshot.
    pub fn len(&self) -> usize {
        self.up.len() + self.down.len()
    }

    pub fn is_empty(&self) -> bool {
        self.up.is_empty() && self.down.is_empty()
    }
}

/// One-dimensional ring of `n` spins; site `n - 1` neighbours site 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpinChain {
    spins: Vec<Spin>,
}

impl SpinChain {
    /// Populate a fresh chain of length `n`.
    pub fn new<R: Rng + ?Sized>(n: usize, mode: StartMode, rng: &mut R) -> Self {
        let spins = (0..n).map(|_| initial_spin(mode, rng)).collect();
        Self { spins }
    }

    /// Wrap an existing configuration. Any non-negative value counts as up.
    pub fn from_spins(spins: Vec<Spin>) -> Self {
        let spins = spins.into_iter().map(|s| if s < 0 { DOWN } else { UP }).collect();
        Self { spins }
    }

    /// Replace the whole chain.
    pub fn initialize<R: Rng + ?Sized>(&mut self, n: usize, mode: StartMode, rng: &mut R) {
        *self = Self::new(n, mode, rng);
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.spins.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.spins.is_empty()
    }

    #[inline(always)]
    pub fn spin(&self, site: usize) -> Spin {
        self.spins[site]
    }

    pub fn spins(&self) -> &[Spin] {
        &self.spins
    }

    #[inline(always)]
    pub fn flip(&mut self, site: usize) {
        self.spins[site] = -self.spins[site];
    }

    /// Σ s_i.
    pub fn magnetization(&self) -> i64 {
        self.spins.iter().map(|&s| i64::from(s)).sum()
    }

    /// Every site at x = `time`, y = site index.
    pub fn coordinates_by_sign(&self, time: usize) -> SpinCoordinates {
        let mut coords = SpinCoordinates::with_capacity(self.len());
        for (i, &s) in self.spins.iter().enumerate() {
            coords.push(s, (time, i));
        }
        coords
    }
}

/// N x N torus of spins, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpinGrid {
    side: usize,
    spins: Vec<Spin>,
}

impl SpinGrid {
    /// Populate a fresh `side` x `side` grid.
    pub fn new<R: Rng + ?Sized>(side: usize, mode: StartMode, rng: &mut R) -> Self {
        let spins = (0..side * side).map(|_| initial_spin(mode, rng)).collect();
        Self { side, spins }
    }

    /// Build from rows; `None` unless the rows form a square.
    pub fn from_rows(rows: &[Vec<Spin>]) -> Option<Self> {
        let side = rows.len();
        if rows.iter().any(|r| r.len() != side) {
            return None;
        }
        let spins = rows
            .iter()
            .flatten()
            .map(|&s| if s < 0 { DOWN } else { UP })
            .collect();
        Some(Self { side, spins })
    }

    /// Replace the whole grid.
    pub fn initialize<R: Rng + ?Sized>(&mut self, side: usize, mode: StartMode, rng: &mut R) {
        *self = Self::new(side, mode, rng);
    }

    #[inline(always)]
    pub fn side(&self) -> usize {
        self.side
    }

    /// M = N².
    #[inline(always)]
    pub fn sites(&self) -> usize {
        self.spins.len()
    }

    #[inline(always)]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.side + col
    }

    /// (row, col) of a flat site index.
    #[inline(always)]
    pub fn position(&self, site: usize) -> (usize, usize) {
        (site / self.side, site % self.side)
    }

    #[inline(always)]
    pub fn spin(&self, row: usize, col: usize) -> Spin {
        self.spins[self.index(row, col)]
    }

    pub fn spins(&self) -> &[Spin] {
        &self.spins
    }

    #[inline(always)]
    pub fn flip(&mut self, row: usize, col: usize) {
        let i = self.index(row, col);
        self.spins[i] = -self.spins[i];
    }

    /// Σ s_ij.
    pub fn magnetization(&self) -> i64 {
        self.spins.iter().map(|&s| i64::from(s)).sum()
    }

    /// Every site at x = column, y = row.
    pub fn coordinates_by_sign(&self) -> SpinCoordinates {
        let mut coords = SpinCoordinates::with_capacity(self.sites());
        for (i, &s) in self.spins.iter().enumerate() {
            let (row, col) = self.position(i);
            coords.push(s, (col, row));
        }
        coords
    }
}
