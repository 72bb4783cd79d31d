//! # Criação de Unidades
//!
//! Toda criação passa por `allocate`, em duas fases:
//!
//! 1. Sob o lock da tabela: acha um slot `Unused`, marca `Embryo` com id novo.
//! 2. Fora do lock: aloca a kernel stack e monta o contexto de primeira
//!    execução (`fork_return`).
//!
//! Quem chamou termina de preencher a unidade e a marca `Runnable`, ou
//! devolve o slot com `abandon` se algo falhar no caminho.

use super::state::{UnitKind, UnitState};
use crate::arch::{FirstResume, Platform, TrapFrame};
use crate::mm::{KernelStack, SharedSpace};
use crate::sched::config::{INIT_NAME, PGSIZE, THREAD_RETURN_SENTINEL};
use crate::sched::core::scheduler::fork_return;
use crate::sched::Kernel;
use crate::sys::{Pid, SysError, SysResult};
use alloc::sync::Arc;
use core::ptr;

impl<P: Platform> Kernel<P> {
    /// Reserva um slot e monta a kernel stack. Devolve o slot (em `Embryo`).
    pub(crate) fn allocate(&'static self) -> SysResult<usize> {
        let slot = {
            let mut table = self.lock_table();
            let Some(slot) = table.find_unused() else {
                crate::kwarn!("(Proc) allocate: tabela cheia");
                return Err(SysError::TooManyProcesses);
            };
            let pid = table.take_pid();
            let unit = &mut table.units[slot];
            unit.pid = Some(pid);
            unit.state = UnitState::Embryo;
            slot
        };

        // Fora do lock: alocação pode ser lenta
        let Some(kstack) = KernelStack::allocate(&self.platform) else {
            crate::kwarn!("(Proc) allocate: sem página para kernel stack");
            self.lock_table().units[slot].reset();
            return Err(SysError::OutOfMemory);
        };

        let resume = FirstResume {
            entry: fork_return::<P>,
            arg: self as *const Self as *const (),
        };

        // SAFETY: página recém-alocada e exclusiva desta unidade
        unsafe {
            let ctx = self
                .platform
                .first_resume_context(kstack.call_stack_top::<P::Context>(), resume);
            ptr::write(kstack.context::<P::Context>(), ctx);
            ptr::write(kstack.trap_frame(), TrapFrame::default());
        }

        self.lock_table().units[slot].kstack = Some(kstack);
        Ok(slot)
    }

    /// Desfaz um `allocate` cuja criação falhou.
    pub(crate) fn abandon(&self, slot: usize) {
        let kstack = {
            let mut table = self.lock_table();
            let unit = &mut table.units[slot];
            let kstack = unit.kstack.take();
            unit.reset();
            kstack
        };

        if let Some(kstack) = kstack {
            // SAFETY: a unidade nunca rodou
            unsafe { kstack.release(&self.platform) };
        }
    }

    // =========================================================================
    // BOOTSTRAP
    // =========================================================================

    /// Cria a primeira unidade (init) com `image` carregada no endereço 0.
    pub fn userinit(&'static self, image: &[u8]) -> SysResult<Pid> {
        if self.lock_table().init.is_some() {
            return Err(SysError::AlreadyExists);
        }

        let slot = self.allocate()?;

        let Some(space) = self.platform.create_space() else {
            self.abandon(slot);
            return Err(SysError::OutOfMemory);
        };
        if !self.platform.load_initial(&space, image) {
            self.platform.destroy_space(space);
            self.abandon(slot);
            return Err(SysError::OutOfMemory);
        }
        let Some(cwd) = self.platform.root_dir() else {
            self.platform.destroy_space(space);
            self.abandon(slot);
            return Err(SysError::NotFound);
        };

        let mut table = self.lock_table();
        let unit = &mut table.units[slot];
        let Some(pid) = unit.pid else {
            panic!("userinit: embryo without pid");
        };

        if let Some(kstack) = unit.kstack.as_ref() {
            // SAFETY: trap frame da unidade, que ainda não rodou
            unsafe { *kstack.trap_frame() = TrapFrame::user_entry(0, PGSIZE as u32) };
        }
        unit.space = Some(Arc::new(SharedSpace::new(space, PGSIZE)));
        unit.kind = UnitKind::Process;
        unit.root = Some(pid);
        unit.cwd = Some(cwd);
        unit.set_name(INIT_NAME);
        unit.state = UnitState::Runnable;
        table.init = Some(pid);

        crate::kinfo!("(Proc) init criado PID=", pid.as_u32());
        Ok(pid)
    }

    // =========================================================================
    // FORK
    // =========================================================================

    /// Duplica a unidade corrente em um novo processo.
    ///
    /// O filho recebe cópia do espaço de endereçamento, do trap frame (com
    /// EAX = 0), dos descritores e do diretório corrente.
    pub fn fork(&'static self) -> SysResult<Pid> {
        let me = self.current();
        let Some(parent_space) = self.lock_table().units[me].space.clone() else {
            panic!("fork: unit without address space");
        };

        let slot = self.allocate()?;

        // Tamanho lido sob o lock de crescimento para casar com a cópia
        let duplicated = {
            let size = parent_space.growth_lock();
            self.platform
                .duplicate_space(parent_space.space(), *size)
                .map(|space| (space, *size))
        };
        let Some((space, size)) = duplicated else {
            crate::kwarn!("(Proc) fork: falha ao duplicar espaço de endereçamento");
            self.abandon(slot);
            return Err(SysError::OutOfMemory);
        };

        let mut table = self.lock_table();
        let (parent_pid, parent_tf, files, cwd, name) = {
            let parent = &table.units[me];
            (
                parent.pid,
                parent.kstack.as_ref().map(KernelStack::trap_frame),
                parent.files.duplicate(&self.platform),
                parent.cwd.as_ref().map(|d| self.platform.dup_dir(d)),
                parent.name,
            )
        };

        let child = &mut table.units[slot];
        let Some(pid) = child.pid else {
            panic!("fork: embryo without pid");
        };

        if let (Some(kstack), Some(parent_tf)) = (child.kstack.as_ref(), parent_tf) {
            // SAFETY: trap frames de duas unidades distintas; a do pai é estável
            // enquanto ele executa este fork
            unsafe {
                let tf = kstack.trap_frame();
                *tf = *parent_tf;
                (*tf).eax = 0;
            }
        }

        child.space = Some(Arc::new(SharedSpace::new(space, size)));
        child.kind = UnitKind::Process;
        child.parent = parent_pid;
        child.root = Some(pid);
        child.files = files;
        child.cwd = cwd;
        child.name = name;
        child.state = UnitState::Runnable;

        crate::kdebug!("(Proc) fork PID=", pid.as_u32());
        Ok(pid)
    }

    // =========================================================================
    // CLONE
    // =========================================================================

    /// Cria uma thread no grupo da unidade corrente.
    ///
    /// `stack` é uma página já mapeada do espaço compartilhado. No topo dela
    /// são gravados o endereço de retorno sentinela e `arg`, e a thread
    /// começa em `entry` como se tivesse sido chamada com `arg`.
    pub fn clone_thread(&'static self, entry: u32, arg: u32, stack: u32) -> SysResult<Pid> {
        if stack as usize % PGSIZE != 0 {
            return Err(SysError::BadAlignment);
        }

        let me = self.current();
        let (space, root) = {
            let table = self.lock_table();
            let unit = &table.units[me];
            match (unit.space.clone(), unit.root) {
                (Some(space), Some(root)) => (space, root),
                _ => panic!("clone: unit outside a thread group"),
            }
        };

        // A página inteira precisa estar dentro do tamanho e mapeada
        let end = stack as usize + PGSIZE;
        if end > space.size() || !self.platform.is_mapped(space.space(), stack, PGSIZE) {
            return Err(SysError::BadAddress);
        }

        let slot = self.allocate()?;

        let sp = (end - 8) as u32;
        let mut words = [0u8; 8];
        words[..4].copy_from_slice(&THREAD_RETURN_SENTINEL.to_le_bytes());
        words[4..].copy_from_slice(&arg.to_le_bytes());
        if !self.platform.copy_out(space.space(), sp, &words) {
            self.abandon(slot);
            return Err(SysError::BadAddress);
        }

        let mut table = self.lock_table();
        let (parent_tf, files, cwd, name) = {
            let caller = &table.units[me];
            (
                caller.kstack.as_ref().map(KernelStack::trap_frame),
                caller.files.duplicate(&self.platform),
                caller.cwd.as_ref().map(|d| self.platform.dup_dir(d)),
                caller.name,
            )
        };

        // Grupo já em término: a thread nasce marcada
        let doomed = match table.find(root) {
            Some(r) => table.units[r].killed || table.units[r].state == UnitState::Zombie,
            None => true,
        };

        let thread = &mut table.units[slot];
        let Some(pid) = thread.pid else {
            panic!("clone: embryo without pid");
        };

        if let (Some(kstack), Some(parent_tf)) = (thread.kstack.as_ref(), parent_tf) {
            // SAFETY: trap frames de duas unidades distintas
            unsafe {
                let tf = kstack.trap_frame();
                *tf = *parent_tf;
                (*tf).esp = sp;
                (*tf).eip = entry;
                (*tf).eax = 0;
            }
        }

        thread.space = Some(space);
        thread.kind = UnitKind::Thread;
        thread.parent = Some(root);
        thread.root = Some(root);
        thread.files = files;
        thread.cwd = cwd;
        thread.name = name;
        thread.ustack = Some(stack);
        thread.killed |= doomed;
        thread.state = UnitState::Runnable;

        crate::kdebug!("(Proc) clone TID=", pid.as_u32());
        Ok(pid)
    }

    // =========================================================================
    // SBRK
    // =========================================================================

    /// Cresce (ou encolhe) o espaço da unidade corrente em `delta` bytes.
    ///
    /// Serializado pelo lock de crescimento do grupo: duas threads nunca
    /// instalam tamanhos diferentes em paralelo. Devolve o tamanho anterior.
    pub fn grow(&self, delta: isize) -> SysResult<usize> {
        let me = self.current();
        let (space, kstack_top) = {
            let table = self.lock_table();
            let unit = &table.units[me];
            match (unit.space.clone(), unit.kstack.as_ref().map(KernelStack::top)) {
                (Some(space), Some(top)) => (space, top),
                _ => panic!("grow: unit without address space"),
            }
        };

        let mut size = space.growth_lock();
        let old = *size;

        if delta > 0 {
            let new = old
                .checked_add(delta.unsigned_abs())
                .filter(|&n| n <= u32::MAX as usize)
                .ok_or(SysError::OutOfMemory)?;
            *size = self
                .platform
                .grow_space(space.space(), old, new)
                .ok_or(SysError::OutOfMemory)?;
        } else if delta < 0 {
            let new = old
                .checked_sub(delta.unsigned_abs())
                .ok_or(SysError::InvalidArgument)?;
            *size = self.platform.shrink_space(space.space(), old, new);
        }
        drop(size);

        self.platform.activate(space.space(), kstack_top);
        Ok(old)
    }
}
