//! Variável de condição sobre o sleep/wakeup da tabela de unidades.
//!
//! O canal é o endereço da própria `CondVar`. Como `wakeup` é broadcast,
//! `notify_one` acorda todos e o chamador de `wait` deve re-checar a
//! condição em loop.

use crate::arch::{CpuOps, Platform};
use crate::sched::{Channel, Kernel};
use crate::sync::SpinlockGuard;

pub struct CondVar {
    _private: u8,
}

impl CondVar {
    pub const fn new() -> Self {
        Self { _private: 0 }
    }

    fn channel(&self) -> Channel {
        Channel::of(self)
    }

    /// Solta `guard`, dorme até um notify e devolve o lock readquirido.
    pub fn wait<'a, T, C, P>(
        &self,
        kernel: &Kernel<P>,
        guard: SpinlockGuard<'a, T, C>,
    ) -> SpinlockGuard<'a, T, C>
    where
        C: CpuOps + ?Sized,
        P: Platform,
    {
        kernel.sleep(self.channel(), guard)
    }

    pub fn notify_one<P: Platform>(&self, kernel: &Kernel<P>) {
        kernel.wakeup(self.channel());
    }

    pub fn notify_all<P: Platform>(&self, kernel: &Kernel<P>) {
        kernel.wakeup(self.channel());
    }
}

impl Default for CondVar {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::hosted::Harness;
    use crate::sched::UnitState;
    use crate::sync::Spinlock;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_distinct_condvars_use_distinct_channels() {
        let a = CondVar::new();
        let b = CondVar::new();
        assert_ne!(a.channel(), b.channel());
    }

    #[test]
    fn test_notify_all_wakes_every_waiter() {
        static QUEUE: Spinlock<u32> = Spinlock::new("queue", 0);
        static READY: CondVar = CondVar::new();

        let h = Harness::new();
        let served = Arc::new(AtomicU32::new(0));

        let waiter = {
            let served = served.clone();
            move |ctx: &crate::arch::hosted::UserCtx| {
                let kernel = ctx.kernel();
                let mut open = QUEUE.lock(kernel.platform());
                while *open == 0 {
                    open = READY.wait(kernel, open);
                }
                drop(open);
                served.fetch_add(1, Ordering::SeqCst);
                ctx.idle();
            }
        };
        h.program(0x100, waiter);

        h.boot(|ctx| {
            ctx.fork(0x100);
            ctx.fork(0x100);
            ctx.idle();
        });

        let two_sleeping = |k: &Kernel<crate::arch::hosted::Hosted>| {
            k.snapshot().iter().filter(|u| u.state == UnitState::Sleeping).count() == 2
        };
        assert!(h.run_until(two_sleeping, 100));

        *QUEUE.lock(h.hosted()) = 1;
        READY.notify_all(h.kernel());

        assert!(h.run_until(|_| served.load(Ordering::SeqCst) == 2, 100));
    }
}
