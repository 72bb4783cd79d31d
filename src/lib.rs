//! Forge Threads.
//!
//! Núcleo de processos e threads do Forge: tabela de unidades, criação
//! (fork/clone), sleep/wakeup, término e reap (exit/wait/join/kill) e o
//! loop de despacho por CPU.
//!
//! O hardware e os subsistemas vizinhos (memória virtual, VFS) entram pela
//! `arch::Platform` injetada em `sched::Kernel`.

#![cfg_attr(not(any(test, feature = "hosted")), no_std)]

// Habilitar alocação dinâmica (Vec/Arc da tabela e dos espaços compartilhados)
extern crate alloc;

// --- Baixo Nível ---
pub mod arch; // HAL (CPU, troca de contexto, trap frame)
pub mod core; // Logging

// --- Colaboradores ---
pub mod fs; // Referências a arquivos e diretórios
pub mod mm; // Páginas, kernel stack, espaço compartilhado

// --- Núcleo ---
pub mod sched; // Tabela, ciclo de vida, despacho
pub mod sync; // Spinlock e CondVar
pub mod sys; // Ids e códigos de erro
pub mod syscall; // Interface com userspace

pub use crate::sched::Kernel;
pub use crate::sys::{Pid, SysError, SysResult};
