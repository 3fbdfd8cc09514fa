//! # CRG Bring-up Tests
//!
//! Verifies the power-on sequence of both clock/reset generators: the POR
//! countdown, the PLL reset equation, lock and the synchronized `sys` release.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

use socboard_core::clock::primitives::NXPLL;
use socboard_core::clock::{Crg, CrgKind, CrgOptions, ResetState, Transition};
use socboard_core::common::{ConfigError, Error};

use crate::common::harness::{FAST_POR_EDGES, OSC_PERIOD_PS, fast_options};

const SYS_HZ: u64 = 50_000_000;

fn nexus() -> Crg {
    Crg::nexus(SYS_HZ, &fast_options()).unwrap()
}

/// Steps until `sys` is `Releasing`, i.e. right after PLL lock.
fn step_to_lock(crg: &mut Crg) {
    for _ in 0..10_000 {
        if crg.pll_locked() {
            return;
        }
        crg.step();
    }
    panic!("PLL never locked");
}

#[test]
fn test_power_up_state() {
    let crg = nexus();
    assert_eq!(crg.kind(), CrgKind::Nexus);
    assert_eq!(crg.por_count(), Some(FAST_POR_EDGES));
    assert!(!crg.por_done());
    assert!(crg.pll_reset());
    assert!(!crg.pll_locked());
    assert_eq!(crg.sys_state(), ResetState::Asserted);
    assert_eq!(crg.time_ps(), 0);
}

#[test]
fn test_por_counter_is_monotonic_and_saturates_at_zero() {
    let mut crg = nexus();
    let mut last = crg.por_count().unwrap();
    for _ in 0..FAST_POR_EDGES * 3 {
        crg.step();
        let now = crg.por_count().unwrap();
        assert!(now <= last, "POR counter went up: {last} -> {now}");
        last = now;
    }
    assert_eq!(last, 0);
    assert!(crg.por_done());
}

#[test]
fn test_por_done_after_exactly_full_count() {
    let mut crg = nexus();
    for _ in 1..FAST_POR_EDGES {
        crg.step();
    }
    assert!(!crg.por_done());
    assert!(crg.pll_reset());
    crg.step();
    assert!(crg.por_done());
    assert!(!crg.pll_reset());
    assert_eq!(crg.time_ps(), FAST_POR_EDGES * OSC_PERIOD_PS);
}

#[test]
fn test_bringup_milestones() {
    let mut crg = nexus();
    let report = crg.run_until_released(10_000);

    let lock_edge = FAST_POR_EDGES + u64::from(NXPLL.lock_cycles);
    let release_edge = lock_edge + 2;
    assert!(report.released());
    assert_eq!(report.por_done_ps, Some(FAST_POR_EDGES * OSC_PERIOD_PS));
    assert_eq!(report.lock_ps, Some(lock_edge * OSC_PERIOD_PS));
    assert_eq!(report.sys_release_ps, Some(release_edge * OSC_PERIOD_PS));
    assert_eq!(report.steps, release_edge);
    assert_eq!(
        report.domains,
        vec![
            ("osc".to_owned(), release_edge),
            ("por".to_owned(), release_edge),
            ("sys".to_owned(), release_edge),
        ]
    );
}

#[test]
fn test_sys_released_only_after_por_and_lock() {
    let mut crg = nexus();
    let mut lock_edges = None;
    for _ in 0..10_000 {
        crg.step();
        if crg.pll_locked() && lock_edges.is_none() {
            assert!(crg.por_done());
            lock_edges = Some(crg.sys_edges());
        }
        if crg.sys_state() == ResetState::Released {
            assert!(crg.por_done());
            assert!(crg.pll_locked());
            let since_lock = crg.sys_edges() - lock_edges.unwrap();
            assert!(since_lock >= 2, "released {since_lock} edges after lock");
            return;
        }
    }
    panic!("sys never released");
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
#[case(5)]
fn test_release_follows_lock_by_sync_depth(#[case] stages: u8) {
    let opts = CrgOptions {
        sync_stages: stages,
        ..fast_options()
    };
    let mut crg = Crg::nexus(SYS_HZ, &opts).unwrap();
    let report = crg.run_until_released(10_000);
    let lock = report.lock_ps.unwrap();
    assert_eq!(
        report.sys_release_ps,
        Some(lock + u64::from(stages) * OSC_PERIOD_PS)
    );
}

#[test]
fn test_releasing_counts_down_pending_edges() {
    let mut crg = nexus();
    step_to_lock(&mut crg);
    assert_eq!(crg.sys_state(), ResetState::Releasing { pending: 2 });
    crg.step();
    assert_eq!(crg.sys_state(), ResetState::Releasing { pending: 1 });
    crg.step();
    assert_eq!(crg.sys_state(), ResetState::Released);
}

#[test]
fn test_reset_during_release_reasserts_immediately() {
    let mut crg = nexus();
    step_to_lock(&mut crg);
    assert!(matches!(crg.sys_state(), ResetState::Releasing { .. }));

    let t = crg.time_ps();
    crg.set_external_reset(true);
    assert_eq!(crg.time_ps(), t);
    assert_eq!(crg.sys_state(), ResetState::Asserted);
    assert!(crg.pll_reset());
    assert!(!crg.pll_locked());

    crg.set_external_reset(false);
    assert_eq!(crg.sys_state(), ResetState::Asserted);
    let report = crg.run_until_released(10_000);
    let relock = u64::from(NXPLL.lock_cycles) * OSC_PERIOD_PS;
    assert_eq!(report.lock_ps, Some(t + relock));
    assert_eq!(report.sys_release_ps, Some(t + relock + 2 * OSC_PERIOD_PS));
}

#[test]
fn test_external_reset_does_not_restart_por() {
    let mut crg = nexus();
    let _ = crg.run_until_released(10_000);
    crg.set_external_reset(true);
    for _ in 0..FAST_POR_EDGES * 2 {
        crg.step();
        assert_eq!(crg.por_count(), Some(0));
        assert!(crg.por_done());
    }
    assert_eq!(crg.state("osc"), Some(ResetState::Asserted));
    assert_eq!(crg.sys_state(), ResetState::Asserted);
}

#[test]
fn test_osc_domain_follows_external_reset_only() {
    let mut crg = nexus();
    assert_eq!(crg.state("osc"), Some(ResetState::Releasing { pending: 2 }));
    crg.step();
    crg.step();
    assert_eq!(crg.state("osc"), Some(ResetState::Released));
    assert_eq!(crg.sys_state(), ResetState::Asserted);

    crg.set_external_reset(true);
    assert_eq!(crg.state("osc"), Some(ResetState::Asserted));
}

#[test]
fn test_domain_table() {
    let crg = nexus();
    let names: Vec<_> = crg.domains().into_iter().map(|d| d.name).collect();
    assert_eq!(names, ["osc", "por", "sys"]);
    assert_eq!(crg.state("por"), None);
    assert_eq!(crg.state("missing"), None);

    let por = crg.domains().into_iter().find(|d| d.name == "por").unwrap();
    assert_eq!(por.reset, None);
    assert_eq!(por.freq_hz, 50_000_000);
}

#[test]
fn test_watch_records_por_done_edge() {
    let mut crg = nexus();
    assert!(crg.watch("por_done"));
    assert!(!crg.watch("no_such_signal"));
    for _ in 0..FAST_POR_EDGES {
        crg.step();
    }
    let por_done: Vec<_> = crg
        .transitions()
        .iter()
        .filter_map(|t| match t {
            Transition::Signal {
                time_ps,
                name,
                value,
            } if name == "por_done" => Some((*time_ps, *value)),
            _ => None,
        })
        .collect();
    assert_eq!(por_done, vec![(0, 0), (FAST_POR_EDGES * OSC_PERIOD_PS, 1)]);
}

#[test]
fn test_sys_release_is_recorded_as_transition() {
    let mut crg = nexus();
    let report = crg.run_until_released(10_000);
    let last_sys = crg
        .transitions()
        .iter()
        .filter_map(|t| match t {
            Transition::Reset {
                time_ps,
                domain,
                state,
            } if domain == "sys" => Some((*time_ps, *state)),
            _ => None,
        })
        .last();
    assert_eq!(
        last_sys,
        Some((report.sys_release_ps.unwrap(), ResetState::Released))
    );
}

#[test]
fn test_timeout_reports_not_released() {
    let mut crg = nexus();
    let report = crg.run_until_released(5);
    assert!(!report.released());
    assert_eq!(report.steps, 5);
    assert_eq!(report.por_done_ps, None);
}

#[test]
fn test_oscillator_startup_delays_first_edge() {
    let opts = CrgOptions {
        osc_startup_ps: 1_000_000,
        ..fast_options()
    };
    let mut crg = Crg::nexus(SYS_HZ, &opts).unwrap();
    crg.step();
    assert_eq!(crg.osc_edges(), 0);
    assert_eq!(crg.sys_edges(), 1);
    let report = crg.run_until_released(10_000);
    assert_eq!(
        report.por_done_ps,
        Some(1_000_000 + FAST_POR_EDGES * OSC_PERIOD_PS)
    );
}

#[test]
fn test_full_width_por() {
    let mut crg = Crg::nexus(SYS_HZ, &CrgOptions::default()).unwrap();
    let report = crg.run_until_released(1_000_000);
    assert!(report.released());
    assert_eq!(report.por_done_ps, Some(0xFFFF * OSC_PERIOD_PS));
}

#[test]
fn test_series7_has_no_por() {
    let mut crg = Crg::series7(100_000_000, &CrgOptions::default()).unwrap();
    assert_eq!(crg.kind(), CrgKind::Series7);
    assert_eq!(crg.por_count(), None);
    assert!(crg.por_done());
    assert!(!crg.pll_reset());
    assert_eq!(crg.oscillator().primitive, "STARTUPE2");

    let names: Vec<_> = crg.domains().into_iter().map(|d| d.name).collect();
    assert_eq!(names, ["sys"]);

    let report = crg.run_until_released(10_000);
    assert!(report.released());
    assert_eq!(report.por_done_ps, Some(0));
    assert!(report.lock_ps.unwrap() < report.sys_release_ps.unwrap());
}

#[test]
fn test_series7_pll_reset_is_external_reset() {
    let mut crg = Crg::series7(100_000_000, &CrgOptions::default()).unwrap();
    crg.set_external_reset(true);
    assert!(crg.pll_reset());
    let report = crg.run_until_released(500);
    assert!(!report.released());
    assert!(!crg.pll_locked());
    crg.set_external_reset(false);
    assert!(!crg.pll_reset());
    assert!(crg.run_until_released(10_000).released());
}

#[test]
fn test_unreachable_sys_clock_is_config_error() {
    let err = Crg::nexus(1_000_000, &fast_options()).unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::UnreachableFrequency {
            requested_hz: 1_000_000,
            ..
        })
    ));
}

#[test]
fn test_zero_por_width_rejected() {
    let opts = CrgOptions {
        por_width: 0,
        ..CrgOptions::default()
    };
    let err = Crg::nexus(SYS_HZ, &opts).unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::Invalid { .. })));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_pll_reset_tracks_por_and_external_reset(
        schedule in proptest::collection::vec(any::<bool>(), 1..120)
    ) {
        let mut crg = nexus();
        for rst in schedule {
            crg.set_external_reset(rst);
            prop_assert_eq!(crg.pll_reset(), !crg.por_done() || rst);
            crg.step();
            prop_assert_eq!(crg.pll_reset(), !crg.por_done() || crg.external_reset());
            if crg.sys_state() == ResetState::Released {
                prop_assert!(crg.pll_locked() && !crg.external_reset());
            }
        }
    }
}
