//! Fixed-tick run loop.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info};
use wildkeep_ai::{BehaviorEvent, BehaviorState, EventHandler, Simulation};

use crate::config::SimConfig;

/// Logs behavior events and keeps running totals.
#[derive(Debug, Default)]
pub struct EventLog {
    attacks: AtomicU64,
    transitions: AtomicU64,
    deaths: AtomicU64,
    despawns: AtomicU64,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepted attacks seen so far.
    pub fn attacks(&self) -> u64 {
        self.attacks.load(Ordering::Relaxed)
    }

    /// State transitions seen so far.
    pub fn transitions(&self) -> u64 {
        self.transitions.load(Ordering::Relaxed)
    }

    /// Deaths seen so far.
    pub fn deaths(&self) -> u64 {
        self.deaths.load(Ordering::Relaxed)
    }

    /// Removals seen so far.
    pub fn despawns(&self) -> u64 {
        self.despawns.load(Ordering::Relaxed)
    }
}

impl EventHandler for EventLog {
    fn handle(&self, event: &BehaviorEvent) {
        match *event {
            BehaviorEvent::Moving { actor, moving } => {
                debug!("{actor:?} moving={moving}");
            },
            BehaviorEvent::AttackAnimation { actor, target } => {
                self.attacks.fetch_add(1, Ordering::Relaxed);
                debug!("{actor:?} swings at {target:?}");
            },
            BehaviorEvent::StateChanged { actor, from, to } => {
                self.transitions.fetch_add(1, Ordering::Relaxed);
                if to == BehaviorState::Dead {
                    self.deaths.fetch_add(1, Ordering::Relaxed);
                    info!("{actor:?} died while {from:?}");
                } else {
                    debug!("{actor:?} {from:?} -> {to:?}");
                }
            },
            BehaviorEvent::FlightPhaseChanged { actor, from, to } => {
                debug!("{actor:?} flight {from:?} -> {to:?}");
            },
            BehaviorEvent::Despawned { actor } => {
                self.despawns.fetch_add(1, Ordering::Relaxed);
                info!("{actor:?} despawned");
            },
        }
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Ticks executed
    pub ticks: u64,
    /// Simulated seconds elapsed
    pub elapsed: f64,
    /// Actors still present
    pub remaining: usize,
    /// Accepted attacks
    pub attacks: u64,
    /// Deaths observed
    pub deaths: u64,
}

/// Runs the simulation for the configured duration, dispatching events after
/// every tick.
pub fn run(sim: &mut Simulation, config: &SimConfig, log: &EventLog) -> RunSummary {
    let dt = config.fixed_dt();
    let total = config.total_ticks();
    let report_every = if config.report_interval > 0.0 {
        ((config.report_interval * f64::from(config.tick_rate)).round() as u64).max(1)
    } else {
        0
    };

    info!("Running {total} ticks at {} Hz", config.tick_rate);
    for tick in 1..=total {
        sim.tick(dt);
        sim.events().dispatch(log);

        if report_every > 0 && tick % report_every == 0 {
            let engaged = sim.actors().filter(|a| a.state().is_engaged()).count();
            info!(
                "t={:.1}s actors={} engaged={engaged} attacks={}",
                sim.time(),
                sim.len(),
                log.attacks()
            );
        }
    }

    RunSummary {
        ticks: sim.tick_count(),
        elapsed: sim.time(),
        remaining: sim.len(),
        attacks: log.attacks(),
        deaths: log.deaths(),
    }
}
