//! Entrada da tabela de unidades (PCB/TCB)

use super::state::{UnitKind, UnitState};
use crate::arch::Platform;
use crate::fs::FileTable;
use crate::mm::{KernelStack, SharedSpace};
use crate::sched::config::NAME_LEN;
use crate::sched::sync::Channel;
use crate::sys::Pid;
use alloc::sync::Arc;

/// Uma unidade de execução: processo ou thread.
///
/// Todos os campos são protegidos pelo lock da tabela, exceto o conteúdo da
/// kernel stack (trap frame e contexto), que pertence à própria unidade.
pub struct Unit<P: Platform> {
    /// Id único; `None` em slots livres
    pub pid: Option<Pid>,
    pub kind: UnitKind,
    pub state: UnitState,
    /// Espaço de endereçamento. O processo é o dono; threads seguram clones do mesmo `Arc`.
    pub space: Option<Arc<SharedSpace<P::Space>>>,
    pub kstack: Option<KernelStack>,
    /// Processo: quem criou. Thread: a raiz do grupo (nunca outra thread).
    pub parent: Option<Pid>,
    /// Raiz do grupo de threads, fixada na criação. Para processos, o próprio id.
    pub root: Option<Pid>,
    pub files: FileTable<P::File>,
    pub cwd: Option<P::Dir>,
    /// Canal em que dorme; só tem significado em `Sleeping`
    pub chan: Option<Channel>,
    /// Pedido de término, honrado no próximo ponto seguro
    pub killed: bool,
    pub name: [u8; NAME_LEN],
    /// Página de stack de usuário recebida no clone (threads)
    pub ustack: Option<u32>,
}

impl<P: Platform> Unit<P> {
    pub fn unused() -> Self {
        Self {
            pid: None,
            kind: UnitKind::Process,
            state: UnitState::Unused,
            space: None,
            kstack: None,
            parent: None,
            root: None,
            files: FileTable::new(),
            cwd: None,
            chan: None,
            killed: false,
            name: [0; NAME_LEN],
            ustack: None,
        }
    }

    /// Recicla o slot.
    ///
    /// A kernel stack, o espaço de endereçamento (se for o dono), os arquivos
    /// e o diretório corrente já devem ter sido retirados: soltá-los aqui
    /// significaria fazê-lo com o lock da tabela segurado.
    pub fn reset(&mut self) {
        debug_assert!(self.kstack.is_none(), "reset with live kernel stack");
        debug_assert!(self.files.open_count() == 0, "reset with open files");
        debug_assert!(self.cwd.is_none(), "reset with cwd");
        *self = Self::unused();
    }

    pub fn is_live(&self) -> bool {
        self.state != UnitState::Unused
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = [0; NAME_LEN];
        let bytes = name.as_bytes();
        let len = bytes.len().min(NAME_LEN - 1);
        self.name[..len].copy_from_slice(&bytes[..len]);
    }

    pub fn name_str(&self) -> &str {
        name_as_str(&self.name)
    }

    /// Mesmo espaço de endereçamento (mesmo grupo de threads)?
    pub fn shares_space_with(&self, other: &Self) -> bool {
        match (&self.space, &other.space) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Interpreta um nome NUL-terminado.
pub fn name_as_str(name: &[u8; NAME_LEN]) -> &str {
    let len = name.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
    core::str::from_utf8(&name[..len]).unwrap_or("?")
}
