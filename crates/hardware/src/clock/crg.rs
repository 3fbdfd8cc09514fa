//! Clock/reset generators of the supported targets.
//!
//! A [`Crg`] builds the clock/reset netlist of one target and simulates its
//! bring-up. Two variants exist:
//! 1. **Nexus:** NXOSCA at 50 MHz drives the `osc` and `por` domains; a 16-bit
//!    power-on counter holds the NXPLL in reset until it reaches zero; `sys` is
//!    released once the PLL locks.
//! 2. **Series-7:** STARTUPE2 CFGMCLK drives an S7PLL reset only by the external
//!    reset; `sys` is released once the PLL locks. There is no POR.
//!
//! In both, `sys` reset is `!pll.locked | rst` and `osc` reset (Nexus only) is
//! `rst`, each through a reset synchronizer. The external reset never restarts
//! the power-on counter.

use serde::Serialize;

use super::netlist::{ClockId, DomainId, Expr, Netlist, SignalId, mask};
use super::primitives::oscillator::Oscillator;
use super::primitives::pll::{self, NXPLL, PllPlan, S7PLL};
use super::reset_sync::ResetState;
use super::sim::{Simulator, Transition};
use crate::common::constants::{POR_WIDTH, RESET_SYNC_STAGES};
use crate::common::{ConfigError, Error};
use crate::stats::BringupReport;

/// Frequency the Nexus internal oscillator is configured for.
pub const NEXUS_OSC_HZ: u64 = 50_000_000;

/// Which CRG topology to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CrgKind {
    /// Lattice Nexus: NXOSCA → POR → NXPLL.
    Nexus,
    /// Xilinx 7-series: STARTUPE2 CFGMCLK → S7PLL.
    Series7,
}

/// Tunable CRG parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrgOptions {
    /// Width of the power-on counter; it counts down from `2^width - 1`.
    pub por_width: u32,
    /// Flip-flop stages in each reset synchronizer.
    pub sync_stages: u8,
    /// Oscillator start-up delay before its first edge.
    pub osc_startup_ps: u64,
}

impl Default for CrgOptions {
    fn default() -> Self {
        Self {
            por_width: POR_WIDTH,
            sync_stages: RESET_SYNC_STAGES,
            osc_startup_ps: 0,
        }
    }
}

/// A clock domain of a built CRG.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClockDomain {
    /// Domain name (`sys`, `osc`, `por`).
    pub name: String,
    /// Clock net name.
    pub clock: String,
    /// Reset signal name; `None` for reset-less domains.
    pub reset: Option<String>,
    /// Nominal clock frequency.
    pub freq_hz: u64,
}

/// Por-related handles; present only on Nexus.
#[derive(Clone, Copy, Debug)]
struct Por {
    count: SignalId,
    done: SignalId,
}

/// A clock/reset generator and its running simulation.
#[derive(Debug)]
pub struct Crg {
    kind: CrgKind,
    sim: Simulator,
    oscillator: Oscillator,
    plan: PllPlan,
    rst: SignalId,
    pll_locked: SignalId,
    por: Option<Por>,
    sys: DomainId,
    sys_clock: ClockId,
    osc_clock: ClockId,
}

impl Crg {
    /// Builds the Nexus CRG for `sys_clk_freq`.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if the oscillator or NXPLL cannot produce the requested
    /// frequencies or the options are out of range.
    pub fn nexus(sys_clk_freq: u64, opts: &CrgOptions) -> Result<Self, Error> {
        if opts.por_width == 0 || opts.por_width > 64 {
            return Err(ConfigError::Invalid {
                detail: format!("POR width {} outside 1..=64", opts.por_width),
            }
            .into());
        }
        let osc = Oscillator::nxosca_hf(NEXUS_OSC_HZ)?.with_startup(opts.osc_startup_ps);
        let plan = pll::plan(&NXPLL, osc.freq_hz, sys_clk_freq)?;

        let mut n = Netlist::new();
        let rst = n.input("rst", 1)?;
        let osc_clk = n.oscillator("osc_clk", osc.freq_hz, osc.startup_ps)?;
        let cd_osc = n.domain("osc", osc_clk, false)?;
        let cd_por = n.domain("por", osc_clk, true)?;

        let por_count = n.signal("por_count", opts.por_width, mask(opts.por_width))?;
        let por_done = n.signal("por_done", 1, 0)?;
        n.comb(por_done, Expr::from(por_count).equals(0u64))?;
        n.sync_if(cd_por, !por_done, por_count, Expr::from(por_count) - 1u64)?;

        let pll_reset = n.signal("pll_reset", 1, 0)?;
        n.comb(pll_reset, !por_done | rst)?;
        let (_, sys_clk, locked) = n.pll(
            "pll",
            osc_clk,
            pll_reset,
            plan.output_hz_rounded(),
            NXPLL.lock_cycles,
        )?;
        let cd_sys = n.domain("sys", sys_clk, false)?;

        n.reset_synchronizer(cd_osc, rst, opts.sync_stages)?;
        n.reset_synchronizer(cd_sys, !locked | rst, opts.sync_stages)?;

        tracing::debug!(
            osc_hz = osc.freq_hz,
            osc_div = ?osc.divider,
            vco_hz = plan.vco_hz,
            sys_hz = plan.output_hz,
            "nexus CRG configured"
        );

        Ok(Self {
            kind: CrgKind::Nexus,
            sim: Simulator::new(n.elaborate()?),
            oscillator: osc,
            plan,
            rst,
            pll_locked: locked,
            por: Some(Por {
                count: por_count,
                done: por_done,
            }),
            sys: cd_sys,
            sys_clock: sys_clk,
            osc_clock: osc_clk,
        })
    }

    /// Builds the 7-series CRG for `sys_clk_freq`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnreachableFrequency`] if the S7PLL cannot reach `sys_clk_freq`
    /// from CFGMCLK.
    pub fn series7(sys_clk_freq: u64, opts: &CrgOptions) -> Result<Self, Error> {
        let osc = Oscillator::startupe2_cfgmclk().with_startup(opts.osc_startup_ps);
        let plan = pll::plan(&S7PLL, osc.freq_hz, sys_clk_freq)?;

        let mut n = Netlist::new();
        let rst = n.input("rst", 1)?;
        let cfgm_clk = n.oscillator("cfgm_clk", osc.freq_hz, osc.startup_ps)?;
        let (_, sys_clk, locked) = n.pll(
            "pll",
            cfgm_clk,
            rst,
            plan.output_hz_rounded(),
            S7PLL.lock_cycles,
        )?;
        let cd_sys = n.domain("sys", sys_clk, false)?;
        n.reset_synchronizer(cd_sys, !locked | rst, opts.sync_stages)?;

        tracing::debug!(
            vco_hz = plan.vco_hz,
            sys_hz = plan.output_hz,
            "series-7 CRG configured"
        );

        Ok(Self {
            kind: CrgKind::Series7,
            sim: Simulator::new(n.elaborate()?),
            oscillator: osc,
            plan,
            rst,
            pll_locked: locked,
            por: None,
            sys: cd_sys,
            sys_clock: sys_clk,
            osc_clock: cfgm_clk,
        })
    }

    /// CRG topology.
    pub const fn kind(&self) -> CrgKind {
        self.kind
    }

    /// Raw clock source configuration.
    pub const fn oscillator(&self) -> &Oscillator {
        &self.oscillator
    }

    /// Chosen PLL dividers.
    pub const fn pll_plan(&self) -> &PllPlan {
        &self.plan
    }

    /// Drives the external reset request.
    pub fn set_external_reset(&mut self, asserted: bool) {
        tracing::debug!(asserted, time_ps = self.sim.time_ps(), "external reset");
        self.sim.set_input(self.rst, u64::from(asserted));
    }

    /// Advances to the next clock edge.
    pub fn step(&mut self) {
        let _ = self.sim.step();
    }

    /// Whether the power-on counter has reached zero. Always true without a POR.
    pub fn por_done(&self) -> bool {
        self.por.is_none_or(|p| self.sim.value(p.done) != 0)
    }

    /// Current power-on counter value, if this CRG has one.
    pub fn por_count(&self) -> Option<u64> {
        self.por.map(|p| self.sim.value(p.count))
    }

    /// PLL lock status.
    pub fn pll_locked(&self) -> bool {
        self.sim.value(self.pll_locked) != 0
    }

    /// Whether the PLL reset input is asserted.
    pub fn pll_reset(&self) -> bool {
        self.sim.pll_reset(0)
    }

    /// Whether the external reset request is asserted.
    pub fn external_reset(&self) -> bool {
        self.sim.value(self.rst) != 0
    }

    /// Reset state of the named domain; `None` if it does not exist or is reset-less.
    pub fn state(&self, domain: &str) -> Option<ResetState> {
        let id = self.sim.netlist().find_domain(domain)?;
        self.sim.reset_state(id)
    }

    /// Reset state of `sys`.
    pub fn sys_state(&self) -> ResetState {
        self.sim.reset_state(self.sys).unwrap_or(ResetState::Released)
    }

    /// Current simulated time in picoseconds.
    pub const fn time_ps(&self) -> u64 {
        self.sim.time_ps()
    }

    /// Rising edges seen on the `sys` clock.
    pub fn sys_edges(&self) -> u64 {
        self.sim.edges(self.sys_clock)
    }

    /// Rising edges seen on the raw oscillator clock.
    pub fn osc_edges(&self) -> u64 {
        self.sim.edges(self.osc_clock)
    }

    /// Domains of this CRG.
    pub fn domains(&self) -> Vec<ClockDomain> {
        let net = self.sim.netlist();
        net.domains()
            .map(|(_, d)| {
                let clock = net.clock_info(d.clock);
                ClockDomain {
                    name: d.name.clone(),
                    clock: clock.name.clone(),
                    reset: d.reset.map(|r| net.signal_info(r).name.clone()),
                    freq_hz: clock.freq_hz,
                }
            })
            .collect()
    }

    /// Records value changes of a named signal.
    ///
    /// # Returns
    ///
    /// `false` if no such signal exists.
    pub fn watch(&mut self, signal: &str) -> bool {
        match self.sim.netlist().find_signal(signal) {
            Some(id) => {
                self.sim.watch(id);
                true
            }
            None => false,
        }
    }

    /// Enables per-edge tracing.
    pub fn set_trace(&mut self, trace: bool) {
        self.sim.set_trace(trace);
    }

    /// Recorded transitions.
    pub fn transitions(&self) -> &[Transition] {
        self.sim.transitions()
    }

    /// Runs until `sys` is released or `max_steps` edges elapse.
    ///
    /// # Returns
    ///
    /// A [`BringupReport`]; `sys_release_ps` is `None` if `sys` stayed in reset.
    pub fn run_until_released(&mut self, max_steps: u64) -> BringupReport {
        let mut report = BringupReport::new(self.kind, &self.oscillator, &self.plan);
        let mut steps = 0;
        if self.por_done() {
            report.por_done_ps = Some(self.time_ps());
        }
        while steps < max_steps && self.sys_state() != ResetState::Released {
            self.step();
            steps += 1;
            if report.por_done_ps.is_none() && self.por_done() {
                report.por_done_ps = Some(self.time_ps());
                tracing::info!(time_ps = self.time_ps(), "power-on reset done");
            }
            if report.lock_ps.is_none() && self.pll_locked() {
                report.lock_ps = Some(self.time_ps());
                tracing::info!(time_ps = self.time_ps(), "PLL locked");
            }
        }
        if self.sys_state() == ResetState::Released {
            report.sys_release_ps = Some(self.time_ps());
            tracing::info!(time_ps = self.time_ps(), "sys reset released");
        } else {
            tracing::warn!(steps, "sys still in reset after step limit");
        }
        report.steps = steps;
        report.domains = self
            .domains()
            .into_iter()
            .map(|d| {
                let edges = self
                    .sim
                    .netlist()
                    .find_domain(&d.name)
                    .map_or(0, |id| self.sim.edges(self.sim.netlist().domain_info(id).clock));
                (d.name, edges)
            })
            .collect();
        report
    }
}
