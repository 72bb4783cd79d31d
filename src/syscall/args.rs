//! # Syscall Arguments
//!
//! Extração de argumentos do trap frame i386.

use crate::arch::TrapFrame;
use crate::sys::Pid;

/// Argumentos de syscall extraídos do trap frame
///
/// Convenção de registradores (i386):
/// - EAX: número da syscall (e retorno)
/// - EBX: arg1
/// - ECX: arg2
/// - EDX: arg3
/// - ESI: arg4
/// - EDI: arg5
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyscallArgs {
    pub num: usize,
    pub arg1: usize,
    pub arg2: usize,
    pub arg3: usize,
    pub arg4: usize,
    pub arg5: usize,
}

impl SyscallArgs {
    pub fn from_frame(tf: &TrapFrame) -> Self {
        Self {
            num: tf.eax as usize,
            arg1: tf.ebx as usize,
            arg2: tf.ecx as usize,
            arg3: tf.edx as usize,
            arg4: tf.esi as usize,
            arg5: tf.edi as usize,
        }
    }

    /// arg1 como pid. Zero e valores que não cabem em 32 bits não são pids.
    pub fn pid(&self) -> Option<Pid> {
        u32::try_from(self.arg1)
            .ok()
            .filter(|&raw| raw != 0)
            .map(Pid::new)
    }

    /// arg1 como inteiro com sinal de 32 bits (delta do sbrk).
    pub fn signed(&self) -> isize {
        self.arg1 as u32 as i32 as isize
    }
}
