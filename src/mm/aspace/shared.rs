//! # Shared Address Space
//!
//! Um processo é dono do seu espaço de endereçamento; suas threads seguram
//! um clone do mesmo `Arc<SharedSpace>`. Duas unidades estão no mesmo grupo
//! de threads sse `Arc::ptr_eq` entre os seus espaços.
//!
//! O contador de tamanho vive atrás do lock de crescimento: qualquer thread
//! do grupo pode crescer/encolher o espaço, mas duas threads nunca instalam
//! tamanhos diferentes em paralelo.

use spin::{Mutex, MutexGuard};

pub struct SharedSpace<S> {
    space: S,
    size: Mutex<usize>,
}

impl<S> SharedSpace<S> {
    pub fn new(space: S, size: usize) -> Self {
        Self {
            space,
            size: Mutex::new(size),
        }
    }

    /// Handle do gerenciador de memória.
    pub fn space(&self) -> &S {
        &self.space
    }

    /// Tamanho atual em bytes.
    pub fn size(&self) -> usize {
        *self.size.lock()
    }

    /// Lock de crescimento. Segurar durante todo o grow/shrink.
    pub fn growth_lock(&self) -> MutexGuard<'_, usize> {
        self.size.lock()
    }

    /// Desmonta o compartilhado, devolvendo o handle para destruição.
    pub fn into_inner(self) -> S {
        self.space
    }
}
