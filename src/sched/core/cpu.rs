//! Estado por CPU do núcleo de processos

use core::cell::{Cell, UnsafeCell};

/// O que cada CPU precisa para despachar: o contexto do seu loop de
/// despacho e o slot da unidade que ela está executando.
pub struct CpuLocal<C> {
    /// Contexto salvo do loop de despacho (destino de todo `sched`)
    pub scheduler: UnsafeCell<C>,
    /// Slot da tabela em execução nesta CPU
    pub current: Cell<Option<usize>>,
}

impl<C> CpuLocal<C> {
    pub fn new(scheduler: C) -> Self {
        Self {
            scheduler: UnsafeCell::new(scheduler),
            current: Cell::new(None),
        }
    }
}
