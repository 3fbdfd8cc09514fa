//! Clock/reset signal graph.
//!
//! A [`Netlist`] is an explicit directed graph of named signals. It holds:
//! 1. **Signals:** Named, width-checked values with a reset value and a single driver.
//! 2. **Combinational assignments:** Evaluated in dependency order after every update.
//! 3. **Synchronous assignments:** Tagged with a clock domain, committed atomically on its edges.
//! 4. **Primitives:** PLLs (asynchronous clear on reset) and reset synchronizers
//!    (asynchronous assert, synchronous release).
//!
//! [`Netlist::elaborate`] orders the combinational part, rejects loops and
//! rejects synchronous reads that cross clock domains without a synchronizer.

use std::collections::{HashMap, HashSet};
use std::ops;

use crate::common::NetlistError;
use crate::common::constants::PS_PER_S;

/// Handle to a signal in a [`Netlist`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalId(pub(crate) usize);

/// Handle to a clock domain in a [`Netlist`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomainId(pub(crate) usize);

/// Handle to a physical clock in a [`Netlist`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClockId(pub(crate) usize);

/// Handle to a PLL primitive in a [`Netlist`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PllId(pub(crate) usize);

/// Returns the all-ones mask for a value of `width` bits.
#[inline]
pub(crate) const fn mask(width: u32) -> u64 {
    if width >= 64 { u64::MAX } else { (1u64 << width) - 1 }
}

/// Combinational expression over netlist signals.
///
/// Every operator produces a value masked to the operator's width: the
/// operand width for `Not`, the wider operand for `And`/`Or`/`Sub`/`Mux`, and
/// one bit for `Eq`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    /// Literal value; its width is the number of significant bits (at least one).
    Const(u64),
    /// Current value of a signal.
    Sig(SignalId),
    /// Bitwise complement.
    Not(Box<Expr>),
    /// Bitwise and.
    And(Box<Expr>, Box<Expr>),
    /// Bitwise or.
    Or(Box<Expr>, Box<Expr>),
    /// Equality comparison; one bit wide.
    Eq(Box<Expr>, Box<Expr>),
    /// Wrapping subtraction.
    Sub(Box<Expr>, Box<Expr>),
    /// `sel ? a : b`.
    Mux(Box<Expr>, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// `self == other`, one bit wide.
    pub fn equals(self, other: impl Into<Self>) -> Self {
        Self::Eq(Box::new(self), Box::new(other.into()))
    }

    /// `sel ? a : b`.
    pub fn mux(sel: impl Into<Self>, a: impl Into<Self>, b: impl Into<Self>) -> Self {
        Self::Mux(Box::new(sel.into()), Box::new(a.into()), Box::new(b.into()))
    }

    /// Calls `f` for every signal the expression reads.
    pub(crate) fn visit_signals(&self, f: &mut impl FnMut(SignalId)) {
        match self {
            Self::Const(_) => {}
            Self::Sig(id) => f(*id),
            Self::Not(e) => e.visit_signals(f),
            Self::And(a, b) | Self::Or(a, b) | Self::Eq(a, b) | Self::Sub(a, b) => {
                a.visit_signals(f);
                b.visit_signals(f);
            }
            Self::Mux(s, a, b) => {
                s.visit_signals(f);
                a.visit_signals(f);
                b.visit_signals(f);
            }
        }
    }

    /// Returns the signals the expression reads, in first-use order.
    pub(crate) fn signals(&self) -> Vec<SignalId> {
        let mut out = Vec::new();
        self.visit_signals(&mut |id| {
            if !out.contains(&id) {
                out.push(id);
            }
        });
        out
    }

    /// Bit width of the expression given the declared signal widths.
    pub(crate) fn width(&self, widths: &[u32]) -> u32 {
        match self {
            Self::Const(v) => (64 - v.leading_zeros()).max(1),
            Self::Sig(id) => widths[id.0],
            Self::Not(e) => e.width(widths),
            Self::Eq(_, _) => 1,
            Self::And(a, b) | Self::Or(a, b) | Self::Sub(a, b) | Self::Mux(_, a, b) => {
                a.width(widths).max(b.width(widths))
            }
        }
    }

    /// Evaluates the expression against current signal values.
    pub(crate) fn eval(&self, values: &[u64], widths: &[u32]) -> u64 {
        match self {
            Self::Const(v) => *v,
            Self::Sig(id) => values[id.0],
            Self::Not(e) => !e.eval(values, widths) & mask(e.width(widths)),
            Self::And(a, b) => a.eval(values, widths) & b.eval(values, widths),
            Self::Or(a, b) => a.eval(values, widths) | b.eval(values, widths),
            Self::Eq(a, b) => u64::from(a.eval(values, widths) == b.eval(values, widths)),
            Self::Sub(a, b) => a
                .eval(values, widths)
                .wrapping_sub(b.eval(values, widths))
                & mask(self.width(widths)),
            Self::Mux(s, a, b) => {
                if s.eval(values, widths) != 0 {
                    a.eval(values, widths)
                } else {
                    b.eval(values, widths)
                }
            }
        }
    }
}

impl From<SignalId> for Expr {
    fn from(id: SignalId) -> Self {
        Self::Sig(id)
    }
}

impl From<u64> for Expr {
    fn from(v: u64) -> Self {
        Self::Const(v)
    }
}

impl From<bool> for Expr {
    fn from(v: bool) -> Self {
        Self::Const(u64::from(v))
    }
}

impl ops::Not for Expr {
    type Output = Self;

    fn not(self) -> Self {
        Self::Not(Box::new(self))
    }
}

impl ops::Not for SignalId {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Box::new(Expr::Sig(self)))
    }
}

impl<T: Into<Expr>> ops::BitOr<T> for Expr {
    type Output = Self;

    fn bitor(self, rhs: T) -> Self {
        Self::Or(Box::new(self), Box::new(rhs.into()))
    }
}

impl<T: Into<Expr>> ops::BitAnd<T> for Expr {
    type Output = Self;

    fn bitand(self, rhs: T) -> Self {
        Self::And(Box::new(self), Box::new(rhs.into()))
    }
}

impl<T: Into<Expr>> ops::Sub<T> for Expr {
    type Output = Self;

    fn sub(self, rhs: T) -> Self {
        Self::Sub(Box::new(self), Box::new(rhs.into()))
    }
}

/// What drives a signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalKind {
    /// Not driven; holds its reset value forever.
    Undriven,
    /// Driven from outside the netlist, asynchronously to every clock.
    Input,
    /// Driven by a combinational assignment.
    Comb,
    /// A register updated on the edges of a domain.
    Register(DomainId),
    /// The lock output of a PLL.
    PllLocked(PllId),
    /// The reset of a domain, driven by its synchronizer.
    DomainReset(DomainId),
}

/// A declared signal.
#[derive(Clone, Debug)]
pub struct SignalInfo {
    /// Unique name.
    pub name: String,
    /// Width in bits (1..=64).
    pub width: u32,
    /// Value at power-up.
    pub reset: u64,
    /// Driver kind.
    pub kind: SignalKind,
}

/// Where a physical clock comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockSource {
    /// A free-running oscillator primitive.
    Oscillator,
    /// An output of a PLL primitive.
    Pll(PllId),
}

/// A physical clock net.
#[derive(Clone, Debug)]
pub struct ClockInfo {
    /// Unique name.
    pub name: String,
    /// Nominal frequency.
    pub freq_hz: u64,
    /// Delay before the first rising edge.
    pub startup_ps: u64,
    /// Source primitive.
    pub source: ClockSource,
}

impl ClockInfo {
    /// Clock period in picoseconds (at least 1).
    pub const fn period_ps(&self) -> u64 {
        let p = PS_PER_S / self.freq_hz;
        if p == 0 { 1 } else { p }
    }
}

/// A clock domain: a clock plus an optional reset.
#[derive(Clone, Debug)]
pub struct DomainInfo {
    /// Unique name (e.g. `sys`, `osc`, `por`).
    pub name: String,
    /// Clock net driving the domain's registers.
    pub clock: ClockId,
    /// Domain reset signal; `None` for reset-less domains.
    pub reset: Option<SignalId>,
}

/// A PLL instance.
#[derive(Clone, Debug)]
pub struct PllInfo {
    /// Instance name.
    pub name: String,
    /// Reference clock.
    pub reference: ClockId,
    /// Asynchronous reset input.
    pub reset: Expr,
    /// Lock status output.
    pub locked: SignalId,
    /// Output clock.
    pub output: ClockId,
    /// Reference edges between reset release and lock.
    pub lock_cycles: u32,
}

/// An asynchronous-assert, synchronous-release reset synchronizer.
#[derive(Clone, Debug)]
pub struct SynchronizerInfo {
    /// Domain whose reset is driven.
    pub domain: DomainId,
    /// Asynchronous reset condition.
    pub condition: Expr,
    /// Number of flip-flop stages (target edges before release).
    pub stages: u8,
}

/// Combinational node in evaluation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum CombNode {
    Assign(usize),
    PllClear(usize),
    SyncAssert(usize),
}

/// A synchronous assignment `If(enable, target.eq(value))` in `domain`.
#[derive(Clone, Debug)]
pub struct SyncAssign {
    /// Clock domain.
    pub domain: DomainId,
    /// Register being written.
    pub target: SignalId,
    /// Next value.
    pub value: Expr,
    /// Optional write enable.
    pub enable: Option<Expr>,
}

/// A mutable clock/reset netlist under construction.
#[derive(Debug, Default)]
pub struct Netlist {
    pub(crate) signals: Vec<SignalInfo>,
    pub(crate) clocks: Vec<ClockInfo>,
    pub(crate) domains: Vec<DomainInfo>,
    pub(crate) comb: Vec<(SignalId, Expr)>,
    pub(crate) sync: Vec<SyncAssign>,
    pub(crate) plls: Vec<PllInfo>,
    pub(crate) synchronizers: Vec<SynchronizerInfo>,
    names: HashSet<String>,
}

impl Netlist {
    /// Creates an empty netlist.
    pub fn new() -> Self {
        Self::default()
    }

    fn claim_name(&mut self, name: &str) -> Result<(), NetlistError> {
        if self.names.insert(name.to_owned()) {
            Ok(())
        } else {
            Err(NetlistError::DuplicateName {
                name: name.to_owned(),
            })
        }
    }

    fn push_signal(
        &mut self,
        name: &str,
        width: u32,
        reset: u64,
        kind: SignalKind,
    ) -> Result<SignalId, NetlistError> {
        if width == 0 || width > 64 {
            return Err(NetlistError::InvalidWidth {
                name: name.to_owned(),
                width,
            });
        }
        self.claim_name(name)?;
        self.signals.push(SignalInfo {
            name: name.to_owned(),
            width,
            reset: reset & mask(width),
            kind,
        });
        Ok(SignalId(self.signals.len() - 1))
    }

    /// Declares an undriven signal; drive it with [`comb`](Self::comb) or [`sync`](Self::sync).
    ///
    /// # Arguments
    ///
    /// * `name` - Unique signal name.
    /// * `width` - Width in bits, 1..=64.
    /// * `reset` - Power-up value (masked to `width`).
    pub fn signal(&mut self, name: &str, width: u32, reset: u64) -> Result<SignalId, NetlistError> {
        self.push_signal(name, width, reset, SignalKind::Undriven)
    }

    /// Declares an external, asynchronous input.
    pub fn input(&mut self, name: &str, width: u32) -> Result<SignalId, NetlistError> {
        self.push_signal(name, width, 0, SignalKind::Input)
    }

    /// Declares a free-running oscillator clock.
    ///
    /// # Arguments
    ///
    /// * `name` - Unique clock name.
    /// * `freq_hz` - Nominal frequency (non-zero).
    /// * `startup_ps` - Delay before the oscillator produces its first edge.
    pub fn oscillator(
        &mut self,
        name: &str,
        freq_hz: u64,
        startup_ps: u64,
    ) -> Result<ClockId, NetlistError> {
        self.claim_name(name)?;
        self.clocks.push(ClockInfo {
            name: name.to_owned(),
            freq_hz: freq_hz.max(1),
            startup_ps,
            source: ClockSource::Oscillator,
        });
        Ok(ClockId(self.clocks.len() - 1))
    }

    /// Declares a clock domain on `clock`.
    ///
    /// Domains with a reset get a one-bit `<name>_rst` signal; registers of the
    /// domain return to their reset value on any edge where it is high.
    pub fn domain(
        &mut self,
        name: &str,
        clock: ClockId,
        reset_less: bool,
    ) -> Result<DomainId, NetlistError> {
        self.claim_name(name)?;
        let id = DomainId(self.domains.len());
        let reset = if reset_less {
            None
        } else {
            Some(self.push_signal(&format!("{name}_rst"), 1, 0, SignalKind::DomainReset(id))?)
        };
        self.domains.push(DomainInfo {
            name: name.to_owned(),
            clock,
            reset,
        });
        Ok(id)
    }

    /// Drives `target` combinationally from `value`.
    pub fn comb(&mut self, target: SignalId, value: impl Into<Expr>) -> Result<(), NetlistError> {
        let info = &mut self.signals[target.0];
        if info.kind != SignalKind::Undriven {
            return Err(NetlistError::MultipleDrivers {
                name: info.name.clone(),
            });
        }
        info.kind = SignalKind::Comb;
        self.comb.push((target, value.into()));
        Ok(())
    }

    /// Registers `target <= value` on every edge of `domain`.
    pub fn sync(
        &mut self,
        domain: DomainId,
        target: SignalId,
        value: impl Into<Expr>,
    ) -> Result<(), NetlistError> {
        self.push_sync(domain, target, value.into(), None)
    }

    /// Registers `If(enable, target <= value)` on the edges of `domain`.
    pub fn sync_if(
        &mut self,
        domain: DomainId,
        enable: impl Into<Expr>,
        target: SignalId,
        value: impl Into<Expr>,
    ) -> Result<(), NetlistError> {
        self.push_sync(domain, target, value.into(), Some(enable.into()))
    }

    fn push_sync(
        &mut self,
        domain: DomainId,
        target: SignalId,
        value: Expr,
        enable: Option<Expr>,
    ) -> Result<(), NetlistError> {
        let info = &mut self.signals[target.0];
        match info.kind {
            SignalKind::Undriven => info.kind = SignalKind::Register(domain),
            SignalKind::Register(d) if d == domain => {}
            _ => {
                return Err(NetlistError::MultipleDrivers {
                    name: info.name.clone(),
                });
            }
        }
        self.sync.push(SyncAssign {
            domain,
            target,
            value,
            enable,
        });
        Ok(())
    }

    /// Instantiates a PLL.
    ///
    /// The PLL clears `locked` asynchronously while `reset` is high, then raises
    /// it after `lock_cycles` reference edges with reset low. Its output clock
    /// toggles at the nominal rate from power-up; `locked` qualifies it.
    ///
    /// # Returns
    ///
    /// `(pll, output_clock, locked_signal)`.
    pub fn pll(
        &mut self,
        name: &str,
        reference: ClockId,
        reset: impl Into<Expr>,
        output_hz: u64,
        lock_cycles: u32,
    ) -> Result<(PllId, ClockId, SignalId), NetlistError> {
        self.claim_name(name)?;
        let id = PllId(self.plls.len());
        let locked = self.push_signal(&format!("{name}_locked"), 1, 0, SignalKind::PllLocked(id))?;
        let out_name = format!("{name}_clkout");
        self.claim_name(&out_name)?;
        self.clocks.push(ClockInfo {
            name: out_name,
            freq_hz: output_hz.max(1),
            startup_ps: 0,
            source: ClockSource::Pll(id),
        });
        let output = ClockId(self.clocks.len() - 1);
        self.plls.push(PllInfo {
            name: name.to_owned(),
            reference,
            reset: reset.into(),
            locked,
            output,
            lock_cycles,
        });
        Ok((id, output, locked))
    }

    /// Drives the reset of `domain` through an `stages`-deep synchronizer.
    ///
    /// The reset asserts as soon as `condition` is high and releases on the
    /// `stages`-th domain edge after it goes low.
    pub fn reset_synchronizer(
        &mut self,
        domain: DomainId,
        condition: impl Into<Expr>,
        stages: u8,
    ) -> Result<(), NetlistError> {
        let info = &self.domains[domain.0];
        if info.reset.is_none() {
            return Err(NetlistError::ResetLess {
                domain: info.name.clone(),
            });
        }
        if self.synchronizers.iter().any(|s| s.domain == domain) {
            return Err(NetlistError::MultipleDrivers {
                name: format!("{}_rst", info.name),
            });
        }
        self.synchronizers.push(SynchronizerInfo {
            domain,
            condition: condition.into(),
            stages: stages.max(1),
        });
        Ok(())
    }

    /// Orders the combinational graph and checks domain crossings.
    ///
    /// # Errors
    ///
    /// [`NetlistError::CombinationalLoop`] if combinational nodes form a cycle,
    /// [`NetlistError::DomainCrossing`] if a synchronous statement reads a
    /// signal owned by a different physical clock (or an asynchronous input)
    /// without going through a synchronizer.
    pub fn elaborate(self) -> Result<Design, NetlistError> {
        let order = self.comb_order()?;
        self.check_crossings()?;
        tracing::debug!(
            signals = self.signals.len(),
            domains = self.domains.len(),
            comb_nodes = order.len(),
            "netlist elaborated"
        );
        Ok(Design {
            netlist: self,
            order,
        })
    }

    /// Signals produced by each combinational node.
    fn comb_producers(&self) -> HashMap<SignalId, CombNode> {
        let mut producers = HashMap::new();
        for (i, (target, _)) in self.comb.iter().enumerate() {
            let _ = producers.insert(*target, CombNode::Assign(i));
        }
        for (i, pll) in self.plls.iter().enumerate() {
            let _ = producers.insert(pll.locked, CombNode::PllClear(i));
        }
        for (i, s) in self.synchronizers.iter().enumerate() {
            if let Some(rst) = self.domains[s.domain.0].reset {
                let _ = producers.insert(rst, CombNode::SyncAssert(i));
            }
        }
        producers
    }

    fn node_inputs(&self, node: CombNode) -> Vec<SignalId> {
        match node {
            CombNode::Assign(i) => self.comb[i].1.signals(),
            CombNode::PllClear(i) => self.plls[i].reset.signals(),
            CombNode::SyncAssert(i) => self.synchronizers[i].condition.signals(),
        }
    }

    fn node_output(&self, node: CombNode) -> SignalId {
        match node {
            CombNode::Assign(i) => self.comb[i].0,
            CombNode::PllClear(i) => self.plls[i].locked,
            CombNode::SyncAssert(i) => {
                let d = &self.domains[self.synchronizers[i].domain.0];
                d.reset.unwrap_or(SignalId(usize::MAX))
            }
        }
    }

    fn comb_order(&self) -> Result<Vec<CombNode>, NetlistError> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Fresh,
            Open,
            Done,
        }

        let producers = self.comb_producers();
        let nodes: Vec<CombNode> = (0..self.comb.len())
            .map(CombNode::Assign)
            .chain((0..self.plls.len()).map(CombNode::PllClear))
            .chain((0..self.synchronizers.len()).map(CombNode::SyncAssert))
            .collect();
        let index: HashMap<CombNode, usize> =
            nodes.iter().enumerate().map(|(i, n)| (*n, i)).collect();

        let mut marks = vec![Mark::Fresh; nodes.len()];
        let mut order = Vec::with_capacity(nodes.len());

        // Iterative DFS; `stack` holds (node index, next input to visit).
        for root in 0..nodes.len() {
            if marks[root] != Mark::Fresh {
                continue;
            }
            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
            marks[root] = Mark::Open;
            while let Some(&mut (n, ref mut next)) = stack.last_mut() {
                let inputs = self.node_inputs(nodes[n]);
                if *next < inputs.len() {
                    let sig = inputs[*next];
                    *next += 1;
                    let Some(dep) = producers.get(&sig).map(|p| index[p]) else {
                        continue;
                    };
                    match marks[dep] {
                        Mark::Fresh => {
                            marks[dep] = Mark::Open;
                            stack.push((dep, 0));
                        }
                        Mark::Open => {
                            let start = stack.iter().position(|(s, _)| *s == dep).unwrap_or(0);
                            let signals = stack[start..]
                                .iter()
                                .map(|(s, _)| self.signals[self.node_output(nodes[*s]).0].name.clone())
                                .collect();
                            return Err(NetlistError::CombinationalLoop { signals });
                        }
                        Mark::Done => {}
                    }
                } else {
                    marks[n] = Mark::Done;
                    order.push(nodes[n]);
                    let _ = stack.pop();
                }
            }
        }
        Ok(order)
    }

    /// Walks back from `sig` through combinational logic to the state elements it reads.
    fn state_sources(&self, sig: SignalId, seen: &mut HashSet<SignalId>, out: &mut Vec<SignalId>) {
        if !seen.insert(sig) {
            return;
        }
        if self.signals[sig.0].kind == SignalKind::Comb {
            if let Some((_, expr)) = self.comb.iter().find(|(t, _)| *t == sig) {
                for s in expr.signals() {
                    self.state_sources(s, seen, out);
                }
            }
        } else {
            out.push(sig);
        }
    }

    fn check_crossings(&self) -> Result<(), NetlistError> {
        for stmt in &self.sync {
            let domain = &self.domains[stmt.domain.0];
            let mut seen = HashSet::new();
            let mut sources = Vec::new();
            let mut reads = stmt.value.signals();
            if let Some(en) = &stmt.enable {
                reads.extend(en.signals());
            }
            for s in reads {
                self.state_sources(s, &mut seen, &mut sources);
            }
            for src in sources {
                let info = &self.signals[src.0];
                let from = match info.kind {
                    SignalKind::Undriven | SignalKind::Comb => continue,
                    SignalKind::Register(d) | SignalKind::DomainReset(d) => {
                        let owner = &self.domains[d.0];
                        if owner.clock == domain.clock {
                            continue;
                        }
                        owner.name.clone()
                    }
                    SignalKind::Input => "async".to_owned(),
                    SignalKind::PllLocked(p) => self.plls[p.0].name.clone(),
                };
                return Err(NetlistError::DomainCrossing {
                    signal: info.name.clone(),
                    from,
                    to: domain.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Looks up a signal by name.
    pub fn find_signal(&self, name: &str) -> Option<SignalId> {
        self.signals.iter().position(|s| s.name == name).map(SignalId)
    }

    /// Looks up a domain by name.
    pub fn find_domain(&self, name: &str) -> Option<DomainId> {
        self.domains.iter().position(|d| d.name == name).map(DomainId)
    }

    /// Returns the declaration of `id`.
    pub fn signal_info(&self, id: SignalId) -> &SignalInfo {
        &self.signals[id.0]
    }

    /// Returns the declaration of `id`.
    pub fn domain_info(&self, id: DomainId) -> &DomainInfo {
        &self.domains[id.0]
    }

    /// Returns the declaration of `id`.
    pub fn clock_info(&self, id: ClockId) -> &ClockInfo {
        &self.clocks[id.0]
    }

    /// Returns all declared domains.
    pub fn domains(&self) -> impl Iterator<Item = (DomainId, &DomainInfo)> + '_ {
        self.domains.iter().enumerate().map(|(i, d)| (DomainId(i), d))
    }
}

/// An elaborated netlist ready for simulation.
#[derive(Debug)]
pub struct Design {
    pub(crate) netlist: Netlist,
    pub(crate) order: Vec<CombNode>,
}

impl Design {
    /// Returns the underlying netlist.
    pub fn netlist(&self) -> &Netlist {
        &self.netlist
    }
}
