//! # Process & Thread Syscalls
//!
//! Decodificação dos argumentos e chamada da operação do núcleo. Nenhuma
//! regra de negócio aqui.

use super::args::SyscallArgs;
use crate::arch::Platform;
use crate::sched::Kernel;
use crate::sys::{SysError, SysResult};

pub fn sys_fork<P: Platform>(kernel: &'static Kernel<P>, _args: &SyscallArgs) -> SysResult<usize> {
    kernel.fork().map(usize::from)
}

pub fn sys_exit<P: Platform>(kernel: &'static Kernel<P>, _args: &SyscallArgs) -> ! {
    kernel.exit()
}

pub fn sys_wait<P: Platform>(kernel: &'static Kernel<P>, _args: &SyscallArgs) -> SysResult<usize> {
    kernel.wait().map(usize::from)
}

pub fn sys_kill<P: Platform>(kernel: &'static Kernel<P>, args: &SyscallArgs) -> SysResult<usize> {
    let pid = args.pid().ok_or(SysError::ProcessNotFound)?;
    kernel.kill(pid).map(|()| 0)
}

pub fn sys_getpid<P: Platform>(kernel: &'static Kernel<P>, _args: &SyscallArgs) -> SysResult<usize> {
    kernel.getpid().map(usize::from).ok_or(SysError::ProcessNotFound)
}

pub fn sys_sbrk<P: Platform>(kernel: &'static Kernel<P>, args: &SyscallArgs) -> SysResult<usize> {
    kernel.grow(args.signed())
}

pub fn sys_yield<P: Platform>(kernel: &'static Kernel<P>, _args: &SyscallArgs) -> SysResult<usize> {
    kernel.yield_now();
    Ok(0)
}

/// clone(entry, arg, stack)
pub fn sys_clone<P: Platform>(kernel: &'static Kernel<P>, args: &SyscallArgs) -> SysResult<usize> {
    let entry = u32::try_from(args.arg1).map_err(|_| SysError::BadAddress)?;
    let arg = u32::try_from(args.arg2).map_err(|_| SysError::BadAddress)?;
    let stack = u32::try_from(args.arg3).map_err(|_| SysError::BadAddress)?;
    kernel.clone_thread(entry, arg, stack).map(usize::from)
}

pub fn sys_join<P: Platform>(kernel: &'static Kernel<P>, args: &SyscallArgs) -> SysResult<usize> {
    let pid = args.pid().ok_or(SysError::ProcessNotFound)?;
    kernel.join(pid).map(usize::from)
}

/// find_ustack(pid)
pub fn sys_ustack<P: Platform>(kernel: &'static Kernel<P>, args: &SyscallArgs) -> SysResult<usize> {
    let pid = args.pid().ok_or(SysError::ProcessNotFound)?;
    kernel.user_stack(pid).map(|stack| stack as usize)
}

pub fn sys_procdump<P: Platform>(kernel: &'static Kernel<P>, _args: &SyscallArgs) -> SysResult<usize> {
    Ok(kernel.procdump().len())
}
