/*!
 * CPU Model
 *
 * Per-CPU interrupt-enable state with push/pop nesting, the lock guard that
 * keeps interrupts off while the scheduler lock is held, and the context
 * switch seam the dispatch loop hands processes to.
 */

use super::core::SchedCore;
use crate::core::errors::invariant_violation;
use crate::core::types::CpuId;
use crate::process::ProcHandle;
use parking_lot::MutexGuard;
use std::cell::Cell;
use std::ops::{Deref, DerefMut};

/// One CPU's interrupt state
///
/// Owned by the thread driving that CPU, hence the `Cell`s.
#[derive(Debug)]
pub struct Cpu {
    id: CpuId,
    /// Interrupts enabled
    intr: Cell<bool>,
    /// Depth of `push_off` nesting
    noff: Cell<u32>,
    /// Interrupt state before the outermost `push_off`
    intena: Cell<bool>,
}

impl Cpu {
    /// CPU with interrupts disabled, as after reset
    pub fn new(id: CpuId) -> Self {
        Self {
            id,
            intr: Cell::new(false),
            noff: Cell::new(0),
            intena: Cell::new(false),
        }
    }

    #[inline(always)]
    pub fn id(&self) -> CpuId {
        self.id
    }

    #[inline]
    pub fn interrupts_enabled(&self) -> bool {
        self.intr.get()
    }

    /// Current `push_off` nesting depth
    #[inline]
    pub fn depth(&self) -> u32 {
        self.noff.get()
    }

    /// Enable interrupts; only legal outside any `push_off` section
    pub fn enable_interrupts(&self) {
        if self.noff.get() > 0 {
            invariant_violation(format_args!(
                "cpu{} enabling interrupts at depth {}",
                self.id,
                self.noff.get()
            ));
        }
        self.intr.set(true);
    }

    /// Disable interrupts, remembering the prior state at the outermost level
    #[must_use = "interrupts are restored when the guard drops"]
    pub fn push_off(&self) -> IrqGuard<'_> {
        let old = self.intr.replace(false);
        if self.noff.get() == 0 {
            self.intena.set(old);
        }
        self.noff.set(self.noff.get() + 1);
        IrqGuard { cpu: self }
    }

    fn pop_off(&self) {
        if self.intr.get() {
            invariant_violation(format_args!("cpu{} pop_off with interrupts enabled", self.id));
        }
        let depth = self.noff.get();
        if depth == 0 {
            invariant_violation(format_args!("cpu{} pop_off without push_off", self.id));
        }
        self.noff.set(depth - 1);
        if depth == 1 && self.intena.get() {
            self.intr.set(true);
        }
    }

    /// Run `f` as a process would between suspension points: no nesting,
    /// interrupts on
    ///
    /// The nesting depth and saved state are put back afterwards, interrupts off.
    pub fn unmasked<R>(&self, f: impl FnOnce() -> R) -> R {
        let noff = self.noff.replace(0);
        let intena = self.intena.get();
        self.intr.set(true);

        let result = f();

        self.intr.set(false);
        self.noff.set(noff);
        self.intena.set(intena);
        result
    }
}

/// Restores the interrupt state of a `push_off` on drop
#[derive(Debug)]
pub struct IrqGuard<'a> {
    cpu: &'a Cpu,
}

impl Drop for IrqGuard<'_> {
    fn drop(&mut self) {
        self.cpu.pop_off();
    }
}

/// Scheduler lock held on behalf of a CPU
///
/// Field order matters: the mutex is released before interrupts come back.
pub struct CpuLock<'a> {
    guard: MutexGuard<'a, SchedCore>,
    _irq: IrqGuard<'a>,
}

impl<'a> CpuLock<'a> {
    pub(super) fn new(guard: MutexGuard<'a, SchedCore>, irq: IrqGuard<'a>) -> Self {
        Self { guard, _irq: irq }
    }

    /// Raw guard, for handing to a [`ContextSwitch`]
    #[inline]
    pub fn guard(&mut self) -> &mut MutexGuard<'a, SchedCore> {
        &mut self.guard
    }
}

impl Deref for CpuLock<'_> {
    type Target = SchedCore;

    #[inline(always)]
    fn deref(&self) -> &SchedCore {
        &self.guard
    }
}

impl DerefMut for CpuLock<'_> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut SchedCore {
        &mut self.guard
    }
}

/// Transfer of control into a dispatched process
///
/// Called with the scheduler lock held and the process marked Running.
/// Must return only once the process has left Running (yield, sleep or exit).
/// Implementations may release the lock while the process executes via
/// [`MutexGuard::unlocked`], provided it is held again on return.
pub trait ContextSwitch: Send + Sync {
    fn switch_to(&self, cpu: &Cpu, core: &mut MutexGuard<'_, SchedCore>, proc: ProcHandle);
}
