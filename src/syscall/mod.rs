//! Fronteira de syscalls do núcleo de processos.
//!
//! # Módulos
//!
//! - `numbers`: Constantes das syscalls
//! - `args`: Leitura dos argumentos do trap frame
//! - `dispatch`: Número → handler
//! - `process`: fork, exit, wait, kill, getpid, sbrk, yield, clone, join,
//!   find_ustack, procdump

pub mod args;
pub mod dispatch;
pub mod numbers;
pub mod process;

pub use args::SyscallArgs;
pub use dispatch::dispatch;

use crate::arch::Platform;
use crate::sched::Kernel;

/// Entrada de syscall vinda do handler de trap.
///
/// Unidades marcadas com kill terminam aqui, antes e depois da chamada.
pub fn trap_syscall<P: Platform>(kernel: &'static Kernel<P>) {
    if kernel.killed() {
        kernel.exit();
    }

    let tf = kernel.current_trap_frame();
    // SAFETY: trap frame da unidade corrente, na kernel stack dela
    let args = SyscallArgs::from_frame(unsafe { &*tf });

    let ret = dispatch(kernel, &args);
    // SAFETY: idem; fork e clone não tocam o frame do chamador
    unsafe { (*tf).eax = ret as u32 };

    if kernel.killed() {
        kernel.exit();
    }
}
