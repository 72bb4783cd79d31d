//! # Loop de Despacho e Troca de Contexto
//!
//! Cada CPU roda `run`, que repete `dispatch_pass`: varre a tabela em ordem
//! de slot e, para cada unidade `Runnable`, troca o contexto para ela. A
//! unidade devolve a CPU chamando `sched` (via yield, sleep ou exit), que
//! troca de volta para o loop.
//!
//! O lock da tabela atravessa a troca nos dois sentidos. Uma unidade nova
//! nunca passou por `sched`, então sua primeira execução cai em
//! `fork_return`, que paga a liberação do lock uma única vez.

use crate::arch::Platform;
use crate::sched::task::UnitState;
use crate::sched::{Kernel, TableGuard};

impl<P: Platform> Kernel<P> {
    /// Uma varredura completa da tabela nesta CPU.
    ///
    /// Devolve quantas unidades foram despachadas.
    pub fn dispatch_pass(&self) -> usize {
        // Interrupções ligadas entre varreduras para não travar a máquina
        // quando nada está pronto
        self.platform.enable_interrupts();

        let cpu = self.cpu();
        let mut dispatched = 0;
        let mut table = self.lock_table();

        for slot in 0..table.units.len() {
            if !table.units[slot].state.is_runnable() {
                continue;
            }

            let ctx = {
                let unit = &mut table.units[slot];
                let Some(kstack) = unit.kstack.as_ref() else {
                    panic!("dispatch: runnable unit without kernel stack");
                };
                let ctx = kstack.context::<P::Context>() as *const P::Context;

                cpu.current.set(Some(slot));
                if let Some(space) = unit.space.as_ref() {
                    self.platform.activate(space.space(), kstack.top());
                }
                unit.state = UnitState::Running;
                crate::ktrace!("(Sched) despachando PID=", unit.pid.map_or(0, |p| p.as_u32()));
                ctx
            };

            // SAFETY: lock da tabela segurado, interrupções desligadas (push_off);
            // o contexto da unidade foi salvo por `sched` ou criado em `allocate`
            unsafe { self.platform.switch(cpu.scheduler.get(), ctx) };

            // A unidade voltou por `sched`, com o lock da tabela segurado
            self.platform.activate_kernel();
            cpu.current.set(None);
            dispatched += 1;
        }

        drop(table);
        dispatched
    }

    /// Loop de despacho desta CPU. Nunca retorna.
    pub fn run(&self) -> ! {
        crate::kinfo!("(Sched) loop de despacho na CPU ", self.platform.cpu_id());
        loop {
            if self.dispatch_pass() == 0 {
                self.platform.halt();
            }
        }
    }

    /// Devolve a CPU ao loop de despacho.
    ///
    /// Pré-condições (violação = pânico): lock da tabela segurado exatamente
    /// uma vez, interrupções desligadas e o estado da unidade já trocado
    /// para algo diferente de `Running`.
    pub(crate) fn sched(&self, table: &mut TableGuard<'_, P>) {
        let cpu = self.cpu();
        let Some(slot) = cpu.current.get() else {
            panic!("sched: no current unit");
        };

        if !self.table.holding(&self.platform) {
            panic!("sched ptable.lock");
        }
        if self.platform.irq_state().depth() != 1 {
            panic!("sched locks");
        }
        if table.units[slot].state == UnitState::Running {
            panic!("sched running");
        }
        if self.platform.interrupts_enabled() {
            panic!("sched interruptible");
        }

        let ctx = match table.units[slot].kstack.as_ref() {
            Some(kstack) => kstack.context::<P::Context>(),
            None => panic!("sched: unit without kernel stack"),
        };

        // O estado "interrupções antes do primeiro push_off" pertence à
        // unidade, não à CPU
        let enabled_before = self.platform.irq_state().enabled_before();

        // SAFETY: pré-condições verificadas acima
        unsafe { self.platform.switch(ctx, cpu.scheduler.get()) };

        self.platform.irq_state().set_enabled_before(enabled_before);
    }

    /// Cede a CPU voluntariamente (também chamado pelo handler do timer).
    pub fn yield_now(&self) {
        let slot = self.current();
        let mut table = self.lock_table();
        table.units[slot].state = UnitState::Runnable;
        self.sched(&mut table);
    }
}

/// Primeira execução de uma unidade recém-criada.
///
/// O loop de despacho trocou para cá segurando o lock da tabela; soltá-lo é
/// responsabilidade nossa. Depois, segue o caminho normal de retorno para
/// o modo usuário com o trap frame montado na criação.
pub(crate) unsafe extern "C" fn fork_return<P: Platform>(arg: *const ()) -> ! {
    // SAFETY: `arg` é o `&'static Kernel<P>` gravado por `allocate`
    let kernel = &*(arg as *const Kernel<P>);
    kernel.table.raw_release(&kernel.platform);

    let tf = kernel.current_trap_frame();
    kernel.platform.return_to_user(tf)
}

#[cfg(test)]
mod tests {
    use crate::arch::hosted::Harness;
    use crate::arch::CpuOps;
    use crate::sched::task::UnitState;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Coloca um slot falso como corrente, sem kernel stack: os testes de
    /// pré-condição entram em pânico antes de tocar nela.
    fn fake_current(h: &Harness, state: UnitState) {
        let mut table = h.kernel().lock_table();
        table.units[0].state = state;
        drop(table);
        h.kernel().cpu().current.set(Some(0));
    }

    #[test]
    #[should_panic(expected = "sched ptable.lock")]
    fn test_sched_without_table_lock_panics() {
        let h = Harness::new();
        fake_current(&h, UnitState::Runnable);
        let other = crate::sync::Spinlock::new("other", crate::sched::UnitTable::new());
        let mut guard = other.lock(h.hosted());
        h.kernel().sched(&mut guard);
    }

    #[test]
    #[should_panic(expected = "sched locks")]
    fn test_sched_with_extra_lock_panics() {
        let h = Harness::new();
        fake_current(&h, UnitState::Runnable);
        let extra = crate::sync::Spinlock::new("extra", ());
        let _e = extra.lock(h.hosted());
        let mut table = h.kernel().lock_table();
        h.kernel().sched(&mut table);
    }

    #[test]
    #[should_panic(expected = "sched running")]
    fn test_sched_while_running_panics() {
        let h = Harness::new();
        fake_current(&h, UnitState::Running);
        let mut table = h.kernel().lock_table();
        h.kernel().sched(&mut table);
    }

    #[test]
    #[should_panic(expected = "sched interruptible")]
    fn test_sched_with_interrupts_enabled_panics() {
        let h = Harness::new();
        fake_current(&h, UnitState::Runnable);
        // Sem drop no unwind: soltar o lock com interrupções ligadas é outro pânico
        let mut table = std::mem::ManuallyDrop::new(h.kernel().lock_table());
        h.hosted().enable_interrupts();
        h.kernel().sched(&mut table);
    }

    #[test]
    #[should_panic(expected = "no current unit")]
    fn test_yield_outside_unit_panics() {
        let h = Harness::new();
        h.kernel().yield_now();
    }

    #[test]
    fn test_dispatch_pass_with_empty_table() {
        let h = Harness::new();
        assert_eq!(h.run(3), 0);
        assert!(h.hosted().interrupts_enabled());
        assert_eq!(h.hosted().irq_state().depth(), 0);
    }

    #[test]
    fn test_yield_round_robin_in_slot_order() {
        let h = Harness::new();
        let turns = Arc::new(std::sync::Mutex::new(Vec::new()));

        let t = turns.clone();
        h.program(0x1000, move |ctx| {
            for _ in 0..3 {
                let ret = ctx.getpid();
                t.lock().unwrap().push(ret);
                ctx.yield_now();
            }
            ctx.exit();
        });

        let t = turns.clone();
        h.boot(move |ctx| {
            let ret = ctx.getpid();
            t.lock().unwrap().push(ret);
            ctx.fork(0x1000);
            ctx.fork(0x1000);
            loop {
                let _ = ctx.wait();
                ctx.yield_now();
            }
        });

        let done = turns.clone();
        assert!(h.run_until(|k| done.lock().unwrap().len() == 7 && k.occupancy() == 1, 200));

        let turns = turns.lock().unwrap();
        // init, depois os dois filhos alternando a cada varredura
        assert_eq!(turns[0], 1);
        assert_eq!(&turns[1..], &[2, 3, 2, 3, 2, 3]);
    }

    #[test]
    fn test_interrupt_shadow_is_per_unit() {
        let h = Harness::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let s = seen.clone();
        h.boot(move |ctx| {
            for _ in 0..3 {
                ctx.yield_now();
                // Voltou de sched: interrupções religadas ao soltar o lock
                assert!(ctx.kernel().platform().interrupts_enabled());
                s.fetch_add(1, Ordering::SeqCst);
            }
            ctx.idle();
        });

        assert!(h.run_until(|_| seen.load(Ordering::SeqCst) == 3, 20));
    }
}
