//! Tabela de unidades de execução.
//!
//! Registro de capacidade fixa (`NPROC` slots) protegido por UM lock, o
//! lock da tabela, que vive em `Kernel`.

use crate::arch::Platform;
use crate::sched::config::NPROC;
use crate::sched::sync::Channel;
use crate::sched::task::{Unit, UnitState};
use crate::sys::Pid;
use alloc::vec::Vec;

pub struct UnitTable<P: Platform> {
    pub units: Vec<Unit<P>>,
    next_pid: Pid,
    /// Unidade de bootstrap (init)
    pub init: Option<Pid>,
}

impl<P: Platform> UnitTable<P> {
    pub fn new() -> Self {
        Self {
            units: (0..NPROC).map(|_| Unit::unused()).collect(),
            next_pid: Pid::FIRST,
            init: None,
        }
    }

    /// Próximo id. Monotônico; nunca reutilizado.
    pub fn take_pid(&mut self) -> Pid {
        let pid = self.next_pid;
        self.next_pid = pid.next();
        pid
    }

    pub fn find_unused(&self) -> Option<usize> {
        self.units.iter().position(|u| u.state == UnitState::Unused)
    }

    /// Slot da unidade viva com este id.
    pub fn find(&self, pid: Pid) -> Option<usize> {
        self.units
            .iter()
            .position(|u| u.is_live() && u.pid == Some(pid))
    }

    /// Slots ocupados (qualquer estado diferente de `Unused`)
    pub fn occupancy(&self) -> usize {
        self.units.iter().filter(|u| u.is_live()).count()
    }

    /// Passa os filhos de `from` para `to`. Se algum já é zumbi, acorda `to`.
    pub fn reparent(&mut self, from: Pid, to: Option<Pid>) {
        let mut zombie = false;
        for unit in self.units.iter_mut() {
            if unit.is_live() && unit.parent == Some(from) {
                unit.parent = to;
                zombie |= unit.state == UnitState::Zombie;
            }
        }
        if let (true, Some(to)) = (zombie, to) {
            self.wakeup(Channel::Unit(to));
        }
    }

    /// Acorda todos que dormem em `chan`. Devolve quantos acordaram.
    pub fn wakeup(&mut self, chan: Channel) -> usize {
        let mut woken = 0;
        for unit in self.units.iter_mut() {
            if unit.state == UnitState::Sleeping && unit.chan == Some(chan) {
                unit.state = UnitState::Runnable;
                woken += 1;
            }
        }
        woken
    }
}

impl<P: Platform> Default for UnitTable<P> {
    fn default() -> Self {
        Self::new()
    }
}
