//! # Syscall Dispatcher
//!
//! Número → handler. Números desconhecidos devolvem `NotImplemented`.

use super::args::SyscallArgs;
use super::numbers::*;
use super::process::*;
use crate::arch::Platform;
use crate::sched::Kernel;
use crate::sys::{result_to_isize, SysError};

/// Executa a syscall descrita por `args` e devolve o valor de EAX.
pub fn dispatch<P: Platform>(kernel: &'static Kernel<P>, args: &SyscallArgs) -> isize {
    crate::ktrace!("[SYSCALL] num=", args.num);

    let result = match args.num {
        SYS_FORK => sys_fork(kernel, args),
        SYS_EXIT => sys_exit(kernel, args),
        SYS_WAIT => sys_wait(kernel, args),
        SYS_KILL => sys_kill(kernel, args),
        SYS_GETPID => sys_getpid(kernel, args),
        SYS_SBRK => sys_sbrk(kernel, args),
        SYS_YIELD => sys_yield(kernel, args),
        SYS_CLONE => sys_clone(kernel, args),
        SYS_JOIN => sys_join(kernel, args),
        SYS_USTACK => sys_ustack(kernel, args),
        SYS_PROCDUMP => sys_procdump(kernel, args),
        _ => {
            crate::kwarn!("(Syscall) número desconhecido: ", args.num);
            Err(SysError::NotImplemented)
        }
    };

    result_to_isize(result)
}
