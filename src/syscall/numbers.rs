//! # Syscall Numbers Registry
//!
//! Números das syscalls de processo/thread. Os seis primeiros seguem a
//! numeração clássica do xv6; as de threads vêm depois do bloco de
//! arquivos (que vive fora deste crate).
//!
//! | Range | Categoria              |
//! |-------|------------------------|
//! | 1-12  | Processo (xv6)         |
//! | 13-21 | Reservado (VFS, tempo) |
//! | 22-26 | Threads e diagnóstico  |

// ============================================================================
// PROCESSO
// ============================================================================

/// Duplica o processo atual.
/// Retorno: pid do filho (no pai), 0 (no filho)
pub const SYS_FORK: usize = 1;

/// Termina a unidade atual.
/// Retorno: Nunca retorna
pub const SYS_EXIT: usize = 2;

/// Espera um filho processo terminar.
/// Retorno: pid recolhido ou erro
pub const SYS_WAIT: usize = 3;

/// Marca uma unidade para término.
/// Args: (pid)
pub const SYS_KILL: usize = 6;

pub const SYS_GETPID: usize = 11;

/// Cresce/encolhe a memória do processo.
/// Args: (delta: i32)
/// Retorno: tamanho anterior
pub const SYS_SBRK: usize = 12;

// ============================================================================
// THREADS
// ============================================================================

/// Cria uma thread no espaço do chamador.
/// Args: (entry, arg, stack)
/// Retorno: pid da thread
pub const SYS_CLONE: usize = 22;

/// Espera uma thread do grupo terminar.
/// Args: (pid)
pub const SYS_JOIN: usize = 23;

/// Página de stack com que a thread foi criada.
/// Args: (pid)
pub const SYS_USTACK: usize = 24;

// ============================================================================
// SISTEMA
// ============================================================================

/// Lista a tabela de unidades no console.
pub const SYS_PROCDUMP: usize = 25;

/// Cede a CPU.
pub const SYS_YIELD: usize = 26;
