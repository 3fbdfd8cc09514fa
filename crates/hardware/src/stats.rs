//! Bring-up statistics collection and reporting.
//!
//! This module summarizes one simulated power-up. It provides:
//! 1. **Milestones:** Simulated time of `por_done`, PLL lock and `sys` release.
//! 2. **Edge counts:** Rising edges seen per clock domain.
//! 3. **Clocking:** The oscillator and PLL settings that produced them.

use serde::Serialize;

use crate::clock::crg::CrgKind;
use crate::clock::primitives::{Oscillator, PllPlan};
use crate::common::constants::PS_PER_S;

/// Outcome of [`Crg::run_until_released`](crate::clock::Crg::run_until_released).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BringupReport {
    /// CRG topology.
    pub kind: CrgKind,
    /// Oscillator primitive name.
    pub oscillator: &'static str,
    /// Oscillator frequency.
    pub osc_hz: u64,
    /// PLL dividers.
    pub pll: PllPlan,
    /// Time the power-on counter reached zero.
    pub por_done_ps: Option<u64>,
    /// Time the PLL first reported lock.
    pub lock_ps: Option<u64>,
    /// Time `sys` reset was released; `None` if the run timed out.
    pub sys_release_ps: Option<u64>,
    /// Edge instants simulated.
    pub steps: u64,
    /// Rising edges per domain, in declaration order.
    pub domains: Vec<(String, u64)>,
}

impl BringupReport {
    /// Creates an empty report for a CRG.
    pub fn new(kind: CrgKind, osc: &Oscillator, pll: &PllPlan) -> Self {
        Self {
            kind,
            oscillator: osc.primitive,
            osc_hz: osc.freq_hz,
            pll: *pll,
            por_done_ps: None,
            lock_ps: None,
            sys_release_ps: None,
            steps: 0,
            domains: Vec::new(),
        }
    }

    /// Whether `sys` came out of reset.
    pub const fn released(&self) -> bool {
        self.sys_release_ps.is_some()
    }

    /// Prints the report to stdout.
    pub fn print(&self) {
        let fmt_time = |t: Option<u64>| {
            t.map_or_else(
                || "-".to_owned(),
                |ps| format!("{:.3} us", ps as f64 * 1e6 / PS_PER_S as f64),
            )
        };
        println!("\n==========================================================");
        println!("CLOCK/RESET BRING-UP ({:?})", self.kind);
        println!("==========================================================");
        println!("osc.primitive            {}", self.oscillator);
        println!("osc.freq                 {:.3} MHz", self.osc_hz as f64 / 1e6);
        println!(
            "pll.dividers             ref/{} x{} /{}",
            self.pll.ref_div, self.pll.fb_mult, self.pll.out_div
        );
        println!("pll.vco                  {:.3} MHz", self.pll.vco_hz / 1e6);
        println!("pll.out                  {:.3} MHz", self.pll.output_hz / 1e6);
        println!("----------------------------------------------------------");
        println!("time.por_done            {}", fmt_time(self.por_done_ps));
        println!("time.pll_lock            {}", fmt_time(self.lock_ps));
        println!("time.sys_release         {}", fmt_time(self.sys_release_ps));
        println!("sim.steps                {}", self.steps);
        println!("----------------------------------------------------------");
        println!("EDGES PER DOMAIN");
        for (name, edges) in &self.domains {
            println!("  {name:<8} {edges}");
        }
        println!("==========================================================");
    }
}
