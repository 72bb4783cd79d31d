//! # Process & Thread Scheduling Core
//!
//! O módulo `sched` é o motor de execução do Forge: tabela de unidades
//! (processos e threads), criação, término e reap, sleep/wakeup e o loop
//! de despacho por CPU.
//!
//! ## 🎯 Propósito e Responsabilidade
//! - **Tabela de Unidades:** registro de capacidade fixa guardado por um
//!   único spinlock (`Kernel::table`).
//! - **Ciclo de Vida:** `userinit`, `fork`, `clone`, `exit`, `wait`, `join`, `kill`.
//! - **Sincronização:** `sleep`/`wakeup` sobre canais, base da `CondVar`.
//! - **Despacho:** `dispatch_pass`/`run` por CPU e `sched`, o único ponto
//!   por onde uma unidade larga a CPU.
//!
//! ## 🏗️ Arquitetura: Cooperativo + Preemptivo
//! 1. **Cooperativo:** unidades cedem a CPU via `yield_now`, `sleep` ou `exit`.
//! 2. **Preemptivo:** o handler do timer (fora deste crate) chama `yield_now`.
//!
//! ## Disciplina de Lock
//! - O lock da tabela é segurado em toda leitura-modificação de estado,
//!   pai, canal ou kill.
//! - Nunca é segurado durante alocação de página ou operação de espaço de
//!   endereçamento (criação em duas fases: slot sob o lock, stack fora).
//! - Atravessa a troca de contexto: quem entra em `sched` segura o lock e
//!   quem é retomado o solta (ou `fork_return`, na primeira vez).

pub mod config;
pub mod core;
pub mod sync;
pub mod table;
pub mod task;

#[cfg(test)]
mod test;

pub use self::core::UnitSnapshot;
pub use self::sync::Channel;
pub use table::UnitTable;
pub use task::{Unit, UnitKind, UnitState};

use self::core::CpuLocal;
use crate::arch::{Platform, TrapFrame};
use crate::mm::SharedSpace;
use crate::sync::{Spinlock, SpinlockGuard};
use crate::sys::{Pid, SysError, SysResult};
use alloc::sync::Arc;
use alloc::vec::Vec;

pub(crate) type TableGuard<'a, P> = SpinlockGuard<'a, UnitTable<P>, P>;

/// O núcleo de processos de um kernel: plataforma injetada, tabela de
/// unidades e o estado por CPU.
pub struct Kernel<P: Platform> {
    platform: P,
    table: Spinlock<UnitTable<P>>,
    cpus: Vec<CpuLocal<P::Context>>,
}

// SAFETY: a tabela é protegida pelo spinlock; cada `CpuLocal` só é tocado
// pela própria CPU com interrupções desligadas.
unsafe impl<P: Platform> Sync for Kernel<P> {}
unsafe impl<P: Platform> Send for Kernel<P> {}

impl<P: Platform> Kernel<P> {
    pub fn new(platform: P) -> Self {
        let cpus = (0..platform.cpu_count())
            .map(|_| CpuLocal::new(platform.boot_context()))
            .collect();

        Self {
            platform,
            table: Spinlock::new("ptable", UnitTable::new()),
            cpus,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub(crate) fn lock_table(&self) -> TableGuard<'_, P> {
        self.table.lock(&self.platform)
    }

    pub(crate) fn cpu(&self) -> &CpuLocal<P::Context> {
        &self.cpus[self.platform.cpu_id()]
    }

    /// Slot da unidade corrente nesta CPU.
    pub(crate) fn current_slot(&self) -> Option<usize> {
        self.cpu().current.get()
    }

    /// Slot da unidade corrente; chamar sem unidade corrente é violação de protocolo.
    pub(crate) fn current(&self) -> usize {
        match self.current_slot() {
            Some(slot) => slot,
            None => panic!("no current unit"),
        }
    }

    // =========================================================================
    // CONSULTAS
    // =========================================================================

    /// Id da unidade corrente.
    pub fn getpid(&self) -> Option<Pid> {
        let slot = self.current_slot()?;
        self.lock_table().units[slot].pid
    }

    /// A unidade corrente foi marcada com kill?
    pub fn killed(&self) -> bool {
        match self.current_slot() {
            Some(slot) => self.lock_table().units[slot].killed,
            None => false,
        }
    }

    /// Slots ocupados na tabela.
    pub fn occupancy(&self) -> usize {
        self.lock_table().occupancy()
    }

    /// Página de stack de usuário com que a thread `pid` foi criada.
    pub fn user_stack(&self, pid: Pid) -> SysResult<u32> {
        let table = self.lock_table();
        let slot = table.find(pid).ok_or(SysError::ProcessNotFound)?;
        table.units[slot].ustack.ok_or(SysError::InvalidArgument)
    }

    /// Instala `file` na tabela de descritores da unidade corrente.
    pub fn fd_alloc(&self, file: P::File) -> Result<usize, P::File> {
        let slot = self.current();
        self.lock_table().units[slot].files.alloc(file)
    }

    /// Trap frame da unidade corrente.
    pub fn current_trap_frame(&self) -> *mut TrapFrame {
        let slot = self.current();
        match self.lock_table().units[slot].kstack.as_ref() {
            Some(kstack) => kstack.trap_frame(),
            None => panic!("current unit without kernel stack"),
        }
    }

    /// Espaço de endereçamento da unidade corrente.
    pub fn current_space(&self) -> Option<Arc<SharedSpace<P::Space>>> {
        let slot = self.current_slot()?;
        self.lock_table().units[slot].space.clone()
    }
}
