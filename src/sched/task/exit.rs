//! # Término e Reap
//!
//! - `exit`: a unidade corrente vira `Zombie` e nunca mais roda.
//! - `wait`: o pai recolhe um filho processo (stack + espaço de endereçamento).
//! - `join`: uma unidade do mesmo grupo recolhe uma thread (só a stack).
//! - `kill`: pedido de término, honrado no próximo ponto seguro.
//!
//! Quando um PROCESSO sai, as threads do grupo morrem antes dele: ele as
//! marca com kill, acorda as que dormem, recolhe as que já são zumbis e
//! dorme em si mesmo até o grupo esvaziar.
//!
//! Filhos criados por fork numa thread passam ao processo do grupo quando
//! a thread é recolhida, e ao init quando o processo sai.

use super::state::{UnitKind, UnitState};
use crate::arch::Platform;
use crate::mm::KernelStack;
use crate::sched::sync::Channel;
use crate::sched::{Kernel, TableGuard};
use crate::sys::{Pid, SysError, SysResult};
use alloc::sync::Arc;
use alloc::vec::Vec;

impl<P: Platform> Kernel<P> {
    /// Termina a unidade corrente. Nunca retorna.
    pub fn exit(&self) -> ! {
        let me = self.current();

        let (pid, kind) = {
            let table = self.lock_table();
            let unit = &table.units[me];
            if unit.pid.is_some() && unit.pid == table.init {
                panic!("init exiting");
            }
            match unit.pid {
                Some(pid) => (pid, unit.kind),
                None => panic!("exit: unit without pid"),
            }
        };

        if kind == UnitKind::Process {
            self.terminate_group(me, pid);
        }

        // Arquivos e diretório fechados fora do lock
        let (files, cwd) = {
            let mut table = self.lock_table();
            let unit = &mut table.units[me];
            let files: Vec<P::File> = unit.files.take_all().collect();
            (files, unit.cwd.take())
        };
        for file in files {
            self.platform.close_file(file);
        }
        if let Some(cwd) = cwd {
            self.platform.release_dir(cwd);
        }

        let mut table = self.lock_table();
        let parent = table.units[me].parent;

        // Pai pode estar dormindo em wait/join
        if let Some(parent) = parent {
            table.wakeup(Channel::Unit(parent));
        }

        match kind {
            UnitKind::Thread => {
                // Irmãs bloqueadas em join dormem no próprio canal
                let root = table.units[me].root;
                for unit in table.units.iter_mut() {
                    if unit.kind == UnitKind::Thread
                        && unit.root == root
                        && unit.state == UnitState::Sleeping
                        && unit.pid.is_some()
                        && unit.chan == unit.pid.map(Channel::Unit)
                    {
                        unit.state = UnitState::Runnable;
                    }
                }
            }
            UnitKind::Process => {
                // Filhos passam para o init
                let init = table.init;
                table.reparent(pid, init);
            }
        }

        table.units[me].state = UnitState::Zombie;
        crate::kdebug!("(Proc) exit PID=", pid.as_u32());

        self.sched(&mut table);
        panic!("zombie exit");
    }

    /// Mata e recolhe todas as threads do grupo de `pid` antes do processo sair.
    fn terminate_group(&self, me: usize, pid: Pid) {
        let mut stacks: Vec<KernelStack> = Vec::new();
        let mut table = self.lock_table();

        // Thread criada daqui em diante nasce marcada
        table.units[me].killed = true;

        loop {
            let mut live = 0;
            let mut reaped: Vec<Pid> = Vec::new();
            for unit in table.units.iter_mut() {
                if unit.kind != UnitKind::Thread || unit.root != Some(pid) || !unit.is_live() {
                    continue;
                }
                match unit.state {
                    UnitState::Zombie => {
                        stacks.extend(unit.kstack.take());
                        reaped.extend(unit.pid);
                        unit.reset();
                    }
                    state => {
                        live += 1;
                        unit.killed = true;
                        if state == UnitState::Sleeping {
                            unit.state = UnitState::Runnable;
                        }
                    }
                }
            }

            for tid in reaped {
                table.reparent(tid, Some(pid));
            }

            if live == 0 {
                break;
            }
            crate::ktrace!("(Proc) exit: esperando threads=", live);
            self.sleep_locked(&mut table, Channel::Unit(pid));
        }
        drop(table);

        for kstack in stacks {
            // SAFETY: zumbis nunca mais rodam
            unsafe { kstack.release(&self.platform) };
        }
    }

    /// Espera um filho processo terminar e o recolhe. Devolve o id dele.
    pub fn wait(&self) -> SysResult<Pid> {
        let me = self.current();
        let mut table = self.lock_table();

        loop {
            let my_pid = table.units[me].pid;
            let mut have_kids = false;
            let mut zombie = None;

            for (slot, unit) in table.units.iter().enumerate() {
                if unit.kind != UnitKind::Process || !unit.is_live() || unit.parent != my_pid {
                    continue;
                }
                have_kids = true;
                if unit.state == UnitState::Zombie {
                    zombie = Some(slot);
                    break;
                }
            }

            if let Some(slot) = zombie {
                return self.reap_process(table, slot);
            }
            if !have_kids {
                return Err(SysError::NoChildren);
            }
            if table.units[me].killed {
                return Err(SysError::Interrupted);
            }

            match my_pid {
                Some(pid) => self.sleep_locked(&mut table, Channel::Unit(pid)),
                None => panic!("wait: unit without pid"),
            }
        }
    }

    /// Libera stack e espaço de endereçamento de um processo zumbi.
    fn reap_process(&self, mut table: TableGuard<'_, P>, slot: usize) -> SysResult<Pid> {
        let unit = &mut table.units[slot];
        let Some(pid) = unit.pid else {
            panic!("wait: zombie without pid");
        };
        let kstack = unit.kstack.take();
        let space = unit.space.take();
        unit.reset();
        drop(table);

        if let Some(kstack) = kstack {
            // SAFETY: zumbis nunca mais rodam
            unsafe { kstack.release(&self.platform) };
        }
        if let Some(space) = space {
            match Arc::try_unwrap(space) {
                Ok(shared) => self.platform.destroy_space(shared.into_inner()),
                Err(_) => panic!("wait: address space still shared"),
            }
        }

        crate::kdebug!("(Proc) wait recolheu PID=", pid.as_u32());
        Ok(pid)
    }

    /// Espera a thread `target` do mesmo grupo terminar e a recolhe.
    pub fn join(&self, target: Pid) -> SysResult<Pid> {
        let me = self.current();
        let mut table = self.lock_table();

        let Some(my_pid) = table.units[me].pid else {
            panic!("join: unit without pid");
        };
        if target == my_pid {
            return Err(SysError::InvalidArgument);
        }

        loop {
            let Some(slot) = table.find(target) else {
                return Err(SysError::ProcessNotFound);
            };

            {
                let caller = &table.units[me];
                let unit = &table.units[slot];
                if unit.kind == UnitKind::Process {
                    return Err(SysError::InvalidArgument);
                }
                if !unit.shares_space_with(caller) {
                    return Err(SysError::InvalidArgument);
                }
                if caller.kind == UnitKind::Thread && unit.parent != caller.parent {
                    return Err(SysError::InvalidArgument);
                }
            }

            if table.units[slot].state == UnitState::Zombie {
                // Só a stack: o espaço é do processo
                let unit = &mut table.units[slot];
                let kstack = unit.kstack.take();
                let root = unit.root;
                unit.reset();
                table.reparent(target, root);
                drop(table);

                if let Some(kstack) = kstack {
                    // SAFETY: zumbis nunca mais rodam
                    unsafe { kstack.release(&self.platform) };
                }
                crate::kdebug!("(Proc) join recolheu TID=", target.as_u32());
                return Ok(target);
            }

            if table.units[me].killed {
                return Err(SysError::Interrupted);
            }
            self.sleep_locked(&mut table, Channel::Unit(my_pid));
        }
    }

    /// Marca `pid` para término. Se estiver dormindo, acorda para que veja o pedido.
    pub fn kill(&self, pid: Pid) -> SysResult<()> {
        let mut table = self.lock_table();
        let slot = table.find(pid).ok_or(SysError::ProcessNotFound)?;

        let unit = &mut table.units[slot];
        unit.killed = true;
        if unit.state == UnitState::Sleeping {
            unit.state = UnitState::Runnable;
        }
        Ok(())
    }
}
