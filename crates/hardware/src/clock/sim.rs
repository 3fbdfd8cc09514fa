//! Cycle-based simulator for elaborated clock/reset netlists.
//!
//! The simulator advances from clock edge to clock edge:
//! 1. **Scheduling:** Every clock fires at `startup + k * period` picoseconds; all clocks
//!    with an edge at the earliest pending instant fire together.
//! 2. **Commit:** Registers of every firing domain compute their next value from the
//!    prior state and are committed together, as are PLL and synchronizer edges.
//! 3. **Settling:** Combinational logic, PLL clears and reset assertion are re-evaluated
//!    after every commit and after every external input change.
//! 4. **Observation:** Reset state transitions and watched signals are recorded with
//!    their timestamps.

use serde::Serialize;

use super::netlist::{ClockId, CombNode, Design, DomainId, Netlist, SignalId, mask};
use super::primitives::PllState;
use super::reset_sync::{ResetState, ResetSynchronizer};

/// A recorded change, stamped with simulated time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Transition {
    /// A watched signal changed value.
    Signal {
        /// Simulated time in picoseconds.
        time_ps: u64,
        /// Signal name.
        name: String,
        /// New value.
        value: u64,
    },
    /// A domain reset changed state.
    Reset {
        /// Simulated time in picoseconds.
        time_ps: u64,
        /// Domain name.
        domain: String,
        /// New state.
        state: ResetState,
    },
}

/// Simulator state for one [`Design`].
#[derive(Debug)]
pub struct Simulator {
    design: Design,
    values: Vec<u64>,
    widths: Vec<u32>,
    plls: Vec<PllState>,
    pll_reset: Vec<bool>,
    syncs: Vec<ResetSynchronizer>,
    /// Index of the synchronizer driving each domain, if any.
    sync_of_domain: Vec<Option<usize>>,
    next_edge_ps: Vec<u64>,
    edges: Vec<u64>,
    time_ps: u64,
    /// Watched signals with their last recorded value.
    watched: Vec<(SignalId, u64)>,
    reset_states: Vec<Option<ResetState>>,
    transitions: Vec<Transition>,
    trace: bool,
}

impl Simulator {
    /// Powers up `design`: every signal takes its reset value and combinational
    /// logic settles before the first edge.
    pub fn new(design: Design) -> Self {
        let net = &design.netlist;
        let (n_plls, n_clocks, n_domains) = (net.plls.len(), net.clocks.len(), net.domains.len());
        let values = net.signals.iter().map(|s| s.reset).collect();
        let widths = net.signals.iter().map(|s| s.width).collect();
        let plls = net.plls.iter().map(|p| PllState::new(p.lock_cycles)).collect();
        let syncs = net
            .synchronizers
            .iter()
            .map(|s| ResetSynchronizer::new(s.stages))
            .collect();
        let mut sync_of_domain = vec![None; n_domains];
        for (i, s) in net.synchronizers.iter().enumerate() {
            sync_of_domain[s.domain.0] = Some(i);
        }
        let next_edge_ps = net
            .clocks
            .iter()
            .map(|c| c.startup_ps.saturating_add(c.period_ps()))
            .collect();

        let mut sim = Self {
            values,
            widths,
            pll_reset: vec![true; n_plls],
            plls,
            syncs,
            sync_of_domain,
            next_edge_ps,
            edges: vec![0; n_clocks],
            time_ps: 0,
            watched: Vec::new(),
            reset_states: vec![None; n_domains],
            transitions: Vec::new(),
            trace: cfg!(feature = "always-trace"),
            design,
        };
        sim.settle();
        sim.reset_states = (0..sim.reset_states.len())
            .map(|d| sim.reset_state(DomainId(d)))
            .collect();
        sim
    }

    /// Enables per-edge `tracing` output.
    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace || cfg!(feature = "always-trace");
    }

    /// Returns the simulated netlist.
    pub fn netlist(&self) -> &Netlist {
        &self.design.netlist
    }

    /// Re-evaluates combinational logic, PLL clears and reset assertion in dependency order.
    fn settle(&mut self) {
        let net = &self.design.netlist;
        for node in &self.design.order {
            match *node {
                CombNode::Assign(i) => {
                    let (target, expr) = &net.comb[i];
                    let v = expr.eval(&self.values, &self.widths) & mask(self.widths[target.0]);
                    self.values[target.0] = v;
                }
                CombNode::PllClear(i) => {
                    let pll = &net.plls[i];
                    let reset = pll.reset.eval(&self.values, &self.widths) != 0;
                    self.pll_reset[i] = reset;
                    if reset {
                        self.plls[i].clear();
                    }
                    self.values[pll.locked.0] = u64::from(self.plls[i].locked());
                }
                CombNode::SyncAssert(i) => {
                    let s = &net.synchronizers[i];
                    let condition = s.condition.eval(&self.values, &self.widths) != 0;
                    self.syncs[i].set_condition(condition);
                    if let Some(rst) = net.domains[s.domain.0].reset {
                        self.values[rst.0] = u64::from(self.syncs[i].output());
                    }
                }
            }
        }
    }

    /// Drives an external input and settles.
    ///
    /// Asynchronous effects (PLL clear, reset assertion) are visible as soon as
    /// this returns; nothing synchronous happens until the next edge.
    pub fn set_input(&mut self, signal: SignalId, value: u64) {
        self.values[signal.0] = value & mask(self.widths[signal.0]);
        self.settle();
        self.observe();
    }

    /// Advances to the next clock edge instant and returns the clocks that fired.
    pub fn step(&mut self) -> Vec<ClockId> {
        let Some(now) = self.next_edge_ps.iter().copied().min() else {
            return Vec::new();
        };
        self.time_ps = now;
        let firing: Vec<ClockId> = self
            .next_edge_ps
            .iter()
            .enumerate()
            .filter(|(_, t)| **t == now)
            .map(|(i, _)| ClockId(i))
            .collect();

        let net = &self.design.netlist;
        let fires = |clock: ClockId| firing.contains(&clock);

        // Next state from the prior state.
        let mut updates: Vec<(SignalId, u64)> = Vec::new();
        for stmt in &net.sync {
            let domain = &net.domains[stmt.domain.0];
            if !fires(domain.clock) {
                continue;
            }
            let in_reset = domain.reset.is_some_and(|r| self.values[r.0] != 0);
            if in_reset {
                updates.push((stmt.target, net.signals[stmt.target.0].reset));
                continue;
            }
            let enabled = stmt
                .enable
                .as_ref()
                .is_none_or(|en| en.eval(&self.values, &self.widths) != 0);
            if enabled {
                let v = stmt.value.eval(&self.values, &self.widths);
                updates.push((stmt.target, v & mask(self.widths[stmt.target.0])));
            }
        }
        for (i, pll) in net.plls.iter().enumerate() {
            if fires(pll.reference) {
                self.plls[i].clock_edge(self.pll_reset[i]);
            }
        }
        for (i, s) in net.synchronizers.iter().enumerate() {
            if fires(net.domains[s.domain.0].clock) {
                self.syncs[i].clock_edge();
            }
        }

        for (target, v) in updates {
            self.values[target.0] = v;
        }
        for clock in &firing {
            self.edges[clock.0] += 1;
            self.next_edge_ps[clock.0] += net.clocks[clock.0].period_ps();
        }
        if self.trace {
            for clock in &firing {
                tracing::trace!(
                    time_ps = now,
                    clock = %net.clocks[clock.0].name,
                    edge = self.edges[clock.0],
                    "edge"
                );
            }
        }

        self.settle();
        self.observe();
        firing
    }

    /// Steps until `done` holds or `max_steps` edges have elapsed.
    ///
    /// # Returns
    ///
    /// The simulated time at which `done` first held, or `None` on timeout.
    pub fn run_until(&mut self, mut done: impl FnMut(&Self) -> bool, max_steps: u64) -> Option<u64> {
        for _ in 0..max_steps {
            if done(self) {
                return Some(self.time_ps);
            }
            let _ = self.step();
        }
        done(self).then_some(self.time_ps)
    }

    /// Records reset and watched-signal transitions since the last call.
    fn observe(&mut self) {
        for d in 0..self.reset_states.len() {
            let state = self.reset_state(DomainId(d));
            if state != self.reset_states[d] {
                self.reset_states[d] = state;
                if let Some(state) = state {
                    let domain = self.design.netlist.domains[d].name.clone();
                    tracing::debug!(time_ps = self.time_ps, %domain, %state, "reset transition");
                    self.transitions.push(Transition::Reset {
                        time_ps: self.time_ps,
                        domain,
                        state,
                    });
                }
            }
        }
        for i in 0..self.watched.len() {
            let (sig, last) = self.watched[i];
            let value = self.values[sig.0];
            if value != last {
                self.watched[i].1 = value;
                self.transitions.push(Transition::Signal {
                    time_ps: self.time_ps,
                    name: self.design.netlist.signals[sig.0].name.clone(),
                    value,
                });
            }
        }
    }

    /// Starts recording value changes of `signal`, beginning with its current value.
    pub fn watch(&mut self, signal: SignalId) {
        if !self.watched.iter().any(|(s, _)| *s == signal) {
            self.watched.push((signal, self.values[signal.0]));
            self.transitions.push(Transition::Signal {
                time_ps: self.time_ps,
                name: self.design.netlist.signals[signal.0].name.clone(),
                value: self.values[signal.0],
            });
        }
    }

    /// Recorded transitions in time order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Current value of `signal`.
    pub fn value(&self, signal: SignalId) -> u64 {
        self.values[signal.0]
    }

    /// Current simulated time in picoseconds.
    pub const fn time_ps(&self) -> u64 {
        self.time_ps
    }

    /// Rising edges seen so far on `clock`.
    pub fn edges(&self, clock: ClockId) -> u64 {
        self.edges[clock.0]
    }

    /// Reset state of `domain`; `None` for reset-less domains.
    pub fn reset_state(&self, domain: DomainId) -> Option<ResetState> {
        let info = &self.design.netlist.domains[domain.0];
        let rst = info.reset?;
        match self.sync_of_domain[domain.0] {
            Some(i) => Some(self.syncs[i].state()),
            None if self.values[rst.0] != 0 => Some(ResetState::Asserted),
            None => Some(ResetState::Released),
        }
    }

    /// Whether the reset input of PLL `index` is currently asserted.
    pub fn pll_reset(&self, index: usize) -> bool {
        self.pll_reset.get(index).copied().unwrap_or(false)
    }
}
