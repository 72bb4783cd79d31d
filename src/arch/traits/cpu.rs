//! Interface Abstrata de CPU (HAL).
//! Define as operações que qualquer arquitetura (x86, simulador) deve implementar.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Estado de mascaramento de interrupções de UMA CPU.
///
/// `depth` conta quantos `push_off` estão ativos; `enabled_before` guarda se
/// as interrupções estavam ligadas quando a profundidade saiu de zero. O
/// `sched` salva e restaura `enabled_before` em volta da troca de contexto,
/// porque ele pertence à unidade e não à CPU.
///
/// Só é tocado pela própria CPU com interrupções desligadas; os atômicos
/// existem para que o tipo seja `Sync` sem `unsafe impl`.
#[derive(Debug, Default)]
pub struct IrqState {
    depth: AtomicU32,
    enabled_before: AtomicBool,
}

impl IrqState {
    pub const fn new() -> Self {
        Self {
            depth: AtomicU32::new(0),
            enabled_before: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_depth(&self, depth: u32) {
        self.depth.store(depth, Ordering::Relaxed);
    }

    #[inline]
    pub fn enabled_before(&self) -> bool {
        self.enabled_before.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_enabled_before(&self, enabled: bool) {
        self.enabled_before.store(enabled, Ordering::Relaxed);
    }
}

pub trait CpuOps {
    /// Índice da CPU que está executando o chamador (0..cpu_count).
    fn cpu_id(&self) -> usize;

    /// Número de CPUs (e portanto de loops de despacho).
    fn cpu_count(&self) -> usize;

    /// Verifica se as interrupções estão habilitadas.
    fn interrupts_enabled(&self) -> bool;

    /// Desabilita interrupções (CLI).
    /// Crítico para seções atômicas no kernel.
    fn disable_interrupts(&self);

    /// Habilita interrupções (STI).
    fn enable_interrupts(&self);

    /// Para a execução da CPU até a próxima interrupção (instrução HLT).
    fn halt(&self);

    /// Estado de mascaramento da CPU corrente.
    fn irq_state(&self) -> &IrqState;

    /// Entra em loop infinito de halt com interrupções desabilitadas.
    /// Usado em pânicos irrecuperáveis.
    fn hang(&self) -> ! {
        self.disable_interrupts();
        loop {
            self.halt();
        }
    }
}
