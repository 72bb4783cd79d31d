//! # Synchronization Primitives
//!
//! Primitivas de sincronização do núcleo de processos.
//!
//! ## Hierarquia de Uso
//!
//! ```text
//! Spinlock   → Seções críticas curtas (não pode dormir)
//! CondVar    → Espera por condição (dorme via sleep/wakeup da tabela)
//! ```
//!
//! ## Regras
//!
//! - **Spinlock**: mascara interrupções enquanto estiver segurado (push_off)
//! - **Um spinlock por vez** ao chamar `sleep`: apenas o lock da condição
//! - **Ordem de Lock**: tabela de unidades → lock da condição → lock de crescimento

pub mod condvar;
pub mod spinlock;

pub use condvar::CondVar;
pub use spinlock::{pop_off, push_off, Spinlock, SpinlockGuard};
