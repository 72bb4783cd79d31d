//! # Plataforma Simulada (hosted)
//!
//! Implementação de `Platform` sobre o sistema operacional do host, usada
//! pelos testes (e pela feature `hosted`).
//!
//! - Uma única CPU; flag de interrupção e `IrqState` são atômicos simples.
//! - Cada unidade é um thread do host (`baton`).
//! - "Modo usuário" é uma closure registrada pelo endereço de entrada; ela
//!   faz syscalls através de `UserCtx`.
//! - Páginas e espaços de endereçamento simulados (`memory`).
//! - Arquivos e diretórios são `Arc`s: a contagem de referências mostra o
//!   que ficou aberto.

mod baton;
mod harness;
mod memory;

pub use baton::HostContext;
pub use harness::{Harness, UserCtx};
pub use memory::HostSpace;

use crate::arch::{ContextSwitch, CpuOps, FirstResume, IrqState, TrapFrame, TrapReturn};
use crate::fs::FileOps;
use crate::sched::Kernel;
use baton::Baton;
use memory::HostMemory;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::string::String;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Programa de usuário simulado.
pub type Program = Arc<dyn Fn(&UserCtx) + Send + Sync>;

/// Arquivo aberto simulado.
#[derive(Debug)]
pub struct HostFile {
    pub name: &'static str,
}

/// Diretório simulado.
#[derive(Debug)]
pub struct HostDir {
    pub path: &'static str,
}

pub struct Hosted {
    interrupts: AtomicBool,
    irq: IrqState,
    baton: Arc<Baton>,
    memory: HostMemory,
    root: Arc<HostDir>,
    programs: Mutex<HashMap<u32, Program>>,
    kernel: AtomicPtr<Kernel<Hosted>>,
}

impl Hosted {
    /// CPU com interrupções desligadas, sem kernel associado.
    pub fn new() -> Self {
        Self {
            interrupts: AtomicBool::new(false),
            irq: IrqState::new(),
            baton: Arc::new(Baton::new()),
            memory: HostMemory::default(),
            root: Arc::new(HostDir { path: "/" }),
            programs: Mutex::new(HashMap::new()),
            kernel: AtomicPtr::new(core::ptr::null_mut()),
        }
    }

    /// Associa o kernel que executa sobre esta plataforma.
    pub fn bind(&self, kernel: &'static Kernel<Hosted>) {
        let ptr = kernel as *const Kernel<Hosted> as *mut Kernel<Hosted>;
        self.kernel.store(ptr, Ordering::SeqCst);
    }

    fn kernel(&self) -> &'static Kernel<Hosted> {
        let ptr = self.kernel.load(Ordering::SeqCst);
        if ptr.is_null() {
            panic!("hosted: no kernel bound");
        }
        // SAFETY: `bind` só aceita `&'static`
        unsafe { &*ptr }
    }

    /// Diretório raiz entregue ao init.
    pub fn root(&self) -> &Arc<HostDir> {
        &self.root
    }

    pub fn open(&self, name: &'static str) -> Arc<HostFile> {
        Arc::new(HostFile { name })
    }

    /// Registra o programa que roda quando uma unidade entra em modo
    /// usuário com `eip` igual a `entry`.
    pub fn register(&self, entry: u32, program: Program) {
        self.programs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entry, program);
    }

    fn program(&self, entry: u32) -> Option<Program> {
        self.programs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&entry)
            .cloned()
    }

    pub(crate) fn poisoned(&self) -> Option<String> {
        self.baton.poisoned()
    }

    pub(crate) fn poison(&self, message: String) {
        self.baton.poison(message);
    }
}

impl Default for Hosted {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuOps for Hosted {
    fn cpu_id(&self) -> usize {
        0
    }

    fn cpu_count(&self) -> usize {
        1
    }

    fn interrupts_enabled(&self) -> bool {
        self.interrupts.load(Ordering::SeqCst)
    }

    fn disable_interrupts(&self) {
        self.interrupts.store(false, Ordering::SeqCst);
    }

    fn enable_interrupts(&self) {
        self.interrupts.store(true, Ordering::SeqCst);
    }

    fn halt(&self) {
        std::thread::yield_now();
    }

    fn irq_state(&self) -> &IrqState {
        &self.irq
    }
}

unsafe impl ContextSwitch for Hosted {
    type Context = HostContext;

    fn boot_context(&self) -> HostContext {
        HostContext::empty()
    }

    unsafe fn first_resume_context(&self, _stack_top: *mut u8, resume: FirstResume) -> HostContext {
        // O thread novo tem stack própria; a kernel stack guarda só trap frame e contexto
        HostContext::first_resume(resume)
    }

    unsafe fn switch(&self, old: *mut HostContext, new: *const HostContext) {
        baton::switch(&self.baton, old, new);
    }
}

impl TrapReturn for Hosted {
    unsafe fn return_to_user(&self, tf: *mut TrapFrame) -> ! {
        let kernel = self.kernel();
        let entry = (*tf).eip;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            if kernel.killed() {
                kernel.exit();
            }
            let ctx = UserCtx::new(kernel);
            match self.program(entry) {
                Some(program) => (*program)(&ctx),
                None => panic!("hosted: no program at eip {entry:#x}"),
            }
            // Retornar do programa equivale a exit
            kernel.exit();
        }));

        let message = match outcome {
            Ok(()) => String::from("hosted: unit returned past exit"),
            Err(payload) => baton::panic_message(&*payload),
        };
        self.baton.poison(message);
        baton::park_forever()
    }
}

impl FileOps for Hosted {
    type File = Arc<HostFile>;
    type Dir = Arc<HostDir>;

    fn dup_file(&self, file: &Arc<HostFile>) -> Arc<HostFile> {
        Arc::clone(file)
    }

    fn close_file(&self, file: Arc<HostFile>) {
        drop(file);
    }

    fn dup_dir(&self, dir: &Arc<HostDir>) -> Arc<HostDir> {
        Arc::clone(dir)
    }

    fn release_dir(&self, dir: Arc<HostDir>) {
        drop(dir);
    }

    fn root_dir(&self) -> Option<Arc<HostDir>> {
        Some(Arc::clone(&self.root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cpu_starts_masked() {
        let hosted = Hosted::new();
        assert!(!hosted.interrupts_enabled());
        assert_eq!(hosted.irq_state().depth(), 0);
        hosted.enable_interrupts();
        assert!(hosted.interrupts_enabled());
    }

    #[test]
    fn test_file_refs_are_arcs() {
        let hosted = Hosted::new();
        let root = hosted.root_dir().unwrap();
        assert_eq!(Arc::strong_count(hosted.root()), 2);
        let dup = hosted.dup_dir(&root);
        assert_eq!(Arc::strong_count(hosted.root()), 3);
        hosted.release_dir(dup);
        hosted.release_dir(root);
        assert_eq!(Arc::strong_count(hosted.root()), 1);
    }
}
