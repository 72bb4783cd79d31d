//! Scheduler principal: loop de despacho, `sched`, yield e diagnóstico

pub mod cpu;
pub mod debug;
pub mod scheduler;

pub use cpu::CpuLocal;
pub use debug::UnitSnapshot;
