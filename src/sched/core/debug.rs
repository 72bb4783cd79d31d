//! Ferramentas de Debug para o Scheduler
//!
//! `procdump` é best-effort e pode ser chamado de qualquer lugar (inclusive
//! de um handler de teclado com a tabela travada): se o lock estiver livre
//! usa o lock, senão lê a tabela sem lock e aceita um retrato rasgado.

use crate::arch::Platform;
use crate::sched::config::NAME_LEN;
use crate::sched::sync::Channel;
use crate::sched::table::UnitTable;
use crate::sched::task::entity::name_as_str;
use crate::sched::task::{UnitKind, UnitState};
use crate::sched::Kernel;
use crate::sys::Pid;
use alloc::vec::Vec;

/// Retrato de uma unidade viva.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitSnapshot {
    pub slot: usize,
    pub pid: Option<Pid>,
    pub kind: UnitKind,
    pub state: UnitState,
    pub parent: Option<Pid>,
    pub chan: Option<Channel>,
    pub killed: bool,
    pub size: usize,
    pub name: [u8; NAME_LEN],
}

impl UnitSnapshot {
    pub fn name_str(&self) -> &str {
        name_as_str(&self.name)
    }
}

fn collect<P: Platform>(table: &UnitTable<P>) -> Vec<UnitSnapshot> {
    table
        .units
        .iter()
        .enumerate()
        .filter(|(_, u)| u.is_live())
        .map(|(slot, u)| UnitSnapshot {
            slot,
            pid: u.pid,
            kind: u.kind,
            state: u.state,
            parent: u.parent,
            chan: u.chan,
            killed: u.killed,
            size: u.space.as_ref().map_or(0, |s| s.size()),
            name: u.name,
        })
        .collect()
}

impl<P: Platform> Kernel<P> {
    /// Retrato das unidades vivas, sem logar.
    pub fn snapshot(&self) -> Vec<UnitSnapshot> {
        if let Some(table) = self.table.try_lock(&self.platform) {
            return collect(&table);
        }

        // SAFETY: leitura sem lock tolerante a estado rasgado; a tabela
        // nunca é realocada depois de `Kernel::new`
        unsafe { collect(&*self.table.data_ptr()) }
    }

    /// Lista as unidades no console (^P) e devolve o retrato.
    pub fn procdump(&self) -> Vec<UnitSnapshot> {
        let units = self.snapshot();

        crate::kinfo!("(Sched) --- procdump ---");
        for unit in &units {
            crate::klog!("pid ", unit.pid.map_or(0, |p| p.as_u32()));
            crate::klog!(" ");
            crate::klog!(unit.kind.as_str());
            crate::klog!(" ");
            crate::klog!(unit.state.as_str());
            crate::klog!(" ");
            crate::klog!(unit.name_str());
            if let Some(Channel::Addr(addr)) = unit.chan {
                crate::klog!(" chan ", addr);
            }
            crate::knl!();
        }

        units
    }
}
