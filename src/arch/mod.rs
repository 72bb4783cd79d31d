//! # Hardware Abstraction Layer (HAL)
//!
//! O módulo `arch` é a **única** ponte entre o núcleo de processos (lógica
//! agnóstica) e o hardware real. Toda interação com registradores, troca de
//! contexto e retorno para modo usuário passa por aqui.
//!
//! ## 🎯 Propósito e Responsabilidade
//! - **Isolamento:** `sched` não sabe em qual CPU está rodando; recebe uma
//!   `Platform` injetada.
//! - **Abstração:** Define traits (em `traits/`) que as implementações
//!   (`x86/`, `hosted/`) devem satisfazer.
//! - **Seleção de Plataforma:** `x86` só existe em bare metal i386; `hosted`
//!   só existe em testes (ou com a feature `hosted`).

pub mod traits;

#[cfg(all(target_arch = "x86", not(any(test, feature = "hosted"))))]
pub mod x86;

#[cfg(any(test, feature = "hosted"))]
pub mod hosted;

pub use traits::*;

use crate::fs::FileOps;
use crate::mm::{AddressSpaceOps, PageAllocator};

/// Tudo o que o núcleo de processos consome do resto do kernel.
///
/// Implementada automaticamente para qualquer tipo que satisfaça todas as
/// interfaces.
pub trait Platform:
    CpuOps
    + ContextSwitch
    + TrapReturn
    + PageAllocator
    + AddressSpaceOps
    + FileOps
    + Send
    + Sync
    + 'static
{
}

impl<T> Platform for T where
    T: CpuOps
        + ContextSwitch
        + TrapReturn
        + PageAllocator
        + AddressSpaceOps
        + FileOps
        + Send
        + Sync
        + 'static
{
}
