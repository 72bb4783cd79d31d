//! Traits do Hardware Abstraction Layer (HAL).
//! Interfaces públicas que o núcleo de processos usa para falar com o hardware
//! e com os subsistemas vizinhos (memória, arquivos).

pub mod context;
pub mod cpu;
pub mod trap;

// Re-exportar para facilitar uso: `use crate::arch::traits::CpuOps;`
pub use context::{ContextSwitch, FirstResume};
pub use cpu::{CpuOps, IrqState};
pub use trap::{EFlags, TrapFrame, TrapReturn};
