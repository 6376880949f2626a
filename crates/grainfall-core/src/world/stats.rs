//! Simulation statistics collection

/// Trait for collecting simulation statistics
///
/// Systems record events through this trait so callers can choose between
/// counting ([`TickStats`]) and ignoring them ([`NoopStats`]).
pub trait SimStats {
    /// Record that a cell was moved during the sweep
    fn record_cell_moved(&mut self);

    /// Record that a pairwise interaction fired
    fn record_interaction(&mut self);

    /// Record that a cell's lifetime ran out
    fn record_expired(&mut self);

    /// Record that a particle was spawned
    fn record_particle_spawned(&mut self);

    /// Record that a resting particle was written back into the grid
    fn record_particle_settled(&mut self);

    /// Record that a particle left the world
    fn record_particle_lost(&mut self);
}

/// A no-op implementation for when stats collection is not needed
#[derive(Default)]
pub struct NoopStats;

impl SimStats for NoopStats {
    fn record_cell_moved(&mut self) {}
    fn record_interaction(&mut self) {}
    fn record_expired(&mut self) {}
    fn record_particle_spawned(&mut self) {}
    fn record_particle_settled(&mut self) {}
    fn record_particle_lost(&mut self) {}
}

/// Event counters for one tick plus running totals
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    pub cells_moved: u64,
    pub interactions: u64,
    pub expired: u64,
    pub particles_spawned: u64,
    pub particles_settled: u64,
    pub particles_lost: u64,
    /// Counters of the last completed tick
    pub last_tick: TickCounters,
    /// Completed ticks
    pub ticks: u64,
    current: TickCounters,
}

/// Per-tick event counts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickCounters {
    pub cells_moved: u32,
    pub interactions: u32,
    pub expired: u32,
}

impl TickStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the current tick: publish its counters and start a fresh one
    pub fn end_tick(&mut self) {
        self.last_tick = std::mem::take(&mut self.current);
        self.ticks += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl SimStats for TickStats {
    fn record_cell_moved(&mut self) {
        self.cells_moved += 1;
        self.current.cells_moved += 1;
    }

    fn record_interaction(&mut self) {
        self.interactions += 1;
        self.current.interactions += 1;
    }

    fn record_expired(&mut self) {
        self.expired += 1;
        self.current.expired += 1;
    }

    fn record_particle_spawned(&mut self) {
        self.particles_spawned += 1;
    }

    fn record_particle_settled(&mut self) {
        self.particles_settled += 1;
    }

    fn record_particle_lost(&mut self) {
        self.particles_lost += 1;
    }
}
