//! Sleep/wakeup sobre canais
//!
//! Uma unidade bloqueia em um canal segurando o lock que protege a condição
//! que espera. O lock da tabela é adquirido ANTES de soltar o lock do
//! chamador e fica segurado até a unidade estar registrada como `Sleeping`,
//! então um `wakeup` concorrente no mesmo canal nunca se perde.
//!
//! `wakeup` é sempre broadcast: todos os que dormem no canal voltam a
//! `Runnable` e devem re-checar a condição.

pub mod channel;

pub use channel::Channel;

use super::{Kernel, TableGuard};
use crate::arch::{CpuOps, Platform};
use crate::sched::task::UnitState;
use crate::sync::SpinlockGuard;

impl<P: Platform> Kernel<P> {
    /// Dorme em `chan`, soltando `guard` enquanto dorme e readquirindo antes
    /// de retornar.
    pub fn sleep<'a, T, C: CpuOps + ?Sized>(
        &self,
        chan: Channel,
        guard: SpinlockGuard<'a, T, C>,
    ) -> SpinlockGuard<'a, T, C> {
        if self.current_slot().is_none() {
            panic!("sleep");
        }

        let (lock, cpu) = guard.into_raw();

        // Tabela primeiro: a partir daqui nenhum wakeup em `chan` se perde
        let mut table = self.lock_table();
        // SAFETY: `lock` veio de um guard desta CPU, já desfeito
        unsafe { lock.raw_release(cpu) };

        self.sleep_locked(&mut table, chan);
        drop(table);

        // SAFETY: nenhum guard para `lock` existe; o novo guard o liberará
        unsafe {
            lock.raw_acquire(cpu);
            SpinlockGuard::from_raw(lock, cpu)
        }
    }

    /// Dorme em `chan` quando o chamador já segura o lock da tabela.
    pub(crate) fn sleep_locked(&self, table: &mut TableGuard<'_, P>, chan: Channel) {
        let slot = self.current();
        {
            let unit = &mut table.units[slot];
            unit.chan = Some(chan);
            unit.state = UnitState::Sleeping;
        }
        crate::ktrace!("(Sleep) dormindo PID=", table.units[slot].pid.map_or(0, |p| p.as_u32()));

        self.sched(table);

        // Acordado
        table.units[slot].chan = None;
    }

    /// Acorda todos que dormem em `chan`.
    pub fn wakeup(&self, chan: Channel) {
        self.lock_table().wakeup(chan);
    }
}
