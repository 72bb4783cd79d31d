//! Kernel stack de uma unidade de execução.
//!
//! Uma página física exclusiva, alocada na criação e liberada no reap.
//!
//! ```text
//! topo (base + PGSIZE) ┌──────────────────┐
//!                      │ TrapFrame        │  registradores de usuário
//!                      ├──────────────────┤
//!                      │ Context          │  salvo pelo switch
//!                      ├──────────────────┤
//!                      │ call stack  ↓    │
//! base                 └──────────────────┘
//! ```

use crate::arch::TrapFrame;
use crate::mm::PageAllocator;
use crate::sched::config::PGSIZE;
use core::mem::{align_of, size_of};
use core::ptr::NonNull;

pub struct KernelStack {
    page: NonNull<u8>,
}

// A página pertence exclusivamente à unidade; o ponteiro pode cruzar CPUs.
unsafe impl Send for KernelStack {}

impl KernelStack {
    /// Aloca a página. Não inicializa nada.
    pub fn allocate<A: PageAllocator + ?Sized>(allocator: &A) -> Option<Self> {
        allocator.alloc_page().map(|page| Self { page })
    }

    /// Endereço base (mais baixo) da página.
    pub fn base(&self) -> *mut u8 {
        self.page.as_ptr()
    }

    /// Endereço logo acima do último byte (valor de esp0 no TSS).
    pub fn top(&self) -> usize {
        self.page.as_ptr() as usize + PGSIZE
    }

    /// Trap frame no topo da página.
    pub fn trap_frame(&self) -> *mut TrapFrame {
        let addr = (self.top() - size_of::<TrapFrame>()) & !(align_of::<TrapFrame>() - 1);
        addr as *mut TrapFrame
    }

    /// Região do contexto salvo, logo abaixo do trap frame.
    pub fn context<C>(&self) -> *mut C {
        let addr = (self.trap_frame() as usize - size_of::<C>()) & !(align_of::<C>() - 1);
        addr as *mut C
    }

    /// Topo da call stack do kernel (abaixo do contexto, alinhado a 16).
    pub fn call_stack_top<C>(&self) -> *mut u8 {
        ((self.context::<C>() as usize) & !0xF) as *mut u8
    }

    /// Devolve a página ao alocador.
    ///
    /// # Safety
    ///
    /// Nada pode estar executando nesta stack (a unidade já é ZOMBIE e outro
    /// contexto está ativo).
    pub unsafe fn release<A: PageAllocator + ?Sized>(self, allocator: &A) {
        allocator.free_page(self.page);
    }
}
