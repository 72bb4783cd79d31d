//! # Memory Management (interfaces)
//!
//! O núcleo de processos não gerencia memória: ele consome um alocador de
//! páginas físicas (kernel stacks) e um gerenciador de espaços de
//! endereçamento opaco. Este módulo define essas duas interfaces e os dois
//! tipos que o núcleo constrói em cima delas.
//!
//! | Módulo   | Responsabilidade |
//! |----------|------------------|
//! | `kstack` | Página da kernel stack e os offsets fixos (trap frame, contexto). |
//! | `aspace` | Espaço de endereçamento compartilhado entre processo e threads. |

pub mod aspace;
pub mod kstack;

pub use aspace::SharedSpace;
pub use kstack::KernelStack;

use core::ptr::NonNull;

/// Alocador de páginas físicas (kalloc/kfree).
pub trait PageAllocator {
    /// Aloca uma página de `PGSIZE` bytes alinhada a `PGSIZE`.
    fn alloc_page(&self) -> Option<NonNull<u8>>;

    /// Devolve uma página obtida de `alloc_page`.
    ///
    /// # Safety
    ///
    /// A página não pode mais ser acessada e não pode ser liberada de novo.
    unsafe fn free_page(&self, page: NonNull<u8>);
}

/// Gerenciador de espaços de endereçamento de usuário.
///
/// Todas as operações podem ser lentas e são chamadas SEM o lock da tabela.
/// Endereços de usuário são de 32 bits.
pub trait AddressSpaceOps {
    type Space: Send + Sync;

    /// Espaço novo contendo apenas os mapeamentos do kernel (setupkvm).
    fn create_space(&self) -> Option<Self::Space>;

    /// Carrega a imagem inicial no endereço 0 (inituvm). A imagem cabe em uma página.
    fn load_initial(&self, space: &Self::Space, image: &[u8]) -> bool;

    /// Cópia profunda dos primeiros `size` bytes (copyuvm).
    fn duplicate_space(&self, space: &Self::Space, size: usize) -> Option<Self::Space>;

    /// Cresce de `old` para `new` bytes (allocuvm). Retorna o novo tamanho.
    fn grow_space(&self, space: &Self::Space, old: usize, new: usize) -> Option<usize>;

    /// Encolhe de `old` para `new` bytes (deallocuvm). Retorna o novo tamanho.
    fn shrink_space(&self, space: &Self::Space, old: usize, new: usize) -> usize;

    /// Libera o espaço inteiro (freevm).
    fn destroy_space(&self, space: Self::Space);

    /// Todas as páginas de `[va, va + len)` estão mapeadas?
    fn is_mapped(&self, space: &Self::Space, va: u32, len: usize) -> bool;

    /// Escreve `bytes` em `va` no espaço dado (copyout).
    fn copy_out(&self, space: &Self::Space, va: u32, bytes: &[u8]) -> bool;

    /// Lê `out.len()` bytes de `va`.
    fn copy_in(&self, space: &Self::Space, va: u32, out: &mut [u8]) -> bool;

    /// Instala o espaço da unidade que vai rodar (switchuvm).
    fn activate(&self, space: &Self::Space, kstack_top: usize);

    /// Volta para a tabela de páginas só do kernel (switchkvm).
    fn activate_kernel(&self);
}
