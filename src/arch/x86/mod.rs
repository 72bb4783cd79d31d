//! Implementação i386 da HAL.
//!
//! Fornece interrupções (cli/sti/eflags), a troca de contexto (`forge_swtch`)
//! e o caminho de retorno para o usuário (`forge_trapret`). Memória e
//! arquivos vêm de um backend `B` fornecido pelo kernel que embarca este
//! núcleo; `X86` só repassa.

use crate::arch::traits::{ContextSwitch, CpuOps, EFlags, FirstResume, IrqState, TrapFrame, TrapReturn};
use crate::fs::FileOps;
use crate::mm::{AddressSpaceOps, PageAllocator};
use crate::sched::config::NCPU;
use core::arch::{asm, global_asm};
use core::ptr::NonNull;

// =============================================================================
// ASSEMBLY
// =============================================================================

// forge_swtch(old: *mut X86Context, new: *const X86Context)
//   Empilha os callee-saved, salva esp em *old, carrega esp de *new.
//
// forge_first_resume
//   Primeiro "ret" de uma unidade nova: ebx = entry, esi = arg.
//
// forge_trapret(tf: *mut TrapFrame)
//   Restaura o trap frame e executa iret.
global_asm!(
    r#"
.globl forge_swtch
forge_swtch:
    movl 4(%esp), %eax
    movl 8(%esp), %edx

    pushl %ebp
    pushl %ebx
    pushl %esi
    pushl %edi

    movl %esp, (%eax)
    movl (%edx), %esp

    popl %edi
    popl %esi
    popl %ebx
    popl %ebp
    ret

.globl forge_first_resume
forge_first_resume:
    pushl %esi
    call *%ebx
    ud2

.globl forge_trapret
forge_trapret:
    movl 4(%esp), %esp
    popal
    popl %gs
    popl %fs
    popl %es
    popl %ds
    addl $0x8, %esp
    iret
"#,
    options(att_syntax)
);

extern "C" {
    fn forge_swtch(old: *mut X86Context, new: *const X86Context);
    fn forge_first_resume();
    fn forge_trapret(tf: *mut TrapFrame) -> !;
}

// =============================================================================
// CPU
// =============================================================================

#[inline]
pub fn read_eflags() -> EFlags {
    let eflags: u32;
    unsafe {
        asm!("pushfl", "popl {0}", out(reg) eflags, options(att_syntax, preserves_flags));
    }
    EFlags::from_bits_truncate(eflags)
}

/// Contexto salvo: só o esp. Os callee-saved ficam empilhados na kernel stack.
#[repr(C)]
pub struct X86Context {
    esp: usize,
}

/// Plataforma i386 sobre um backend de memória e arquivos.
pub struct X86<B> {
    backend: B,
    irq: [IrqState; NCPU],
    ncpu: usize,
    /// Índice da CPU corrente (tipicamente derivado do id do LAPIC)
    cpu_id: fn() -> usize,
}

impl<B> X86<B> {
    pub fn new(backend: B, ncpu: usize, cpu_id: fn() -> usize) -> Self {
        Self {
            backend,
            irq: core::array::from_fn(|_| IrqState::new()),
            ncpu: ncpu.clamp(1, NCPU),
            cpu_id,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B> CpuOps for X86<B> {
    fn cpu_id(&self) -> usize {
        (self.cpu_id)()
    }

    fn cpu_count(&self) -> usize {
        self.ncpu
    }

    fn interrupts_enabled(&self) -> bool {
        read_eflags().contains(EFlags::IF)
    }

    fn disable_interrupts(&self) {
        unsafe { asm!("cli", options(nomem, nostack)) };
    }

    fn enable_interrupts(&self) {
        unsafe { asm!("sti", options(nomem, nostack)) };
    }

    fn halt(&self) {
        unsafe { asm!("hlt", options(nomem, nostack)) };
    }

    fn irq_state(&self) -> &IrqState {
        &self.irq[self.cpu_id()]
    }
}

unsafe impl<B> ContextSwitch for X86<B> {
    type Context = X86Context;

    fn boot_context(&self) -> X86Context {
        X86Context { esp: 0 }
    }

    unsafe fn first_resume_context(&self, stack_top: *mut u8, resume: FirstResume) -> X86Context {
        // edi, esi(arg), ebx(entry), ebp, eip(forge_first_resume)
        let frame = [
            0usize,
            resume.arg as usize,
            resume.entry as usize,
            0,
            forge_first_resume as usize,
        ];
        let sp = (stack_top as usize - core::mem::size_of_val(&frame)) & !0x3;
        core::ptr::write(sp as *mut [usize; 5], frame);
        X86Context { esp: sp }
    }

    unsafe fn switch(&self, old: *mut X86Context, new: *const X86Context) {
        forge_swtch(old, new);
    }
}

impl<B> TrapReturn for X86<B> {
    unsafe fn return_to_user(&self, tf: *mut TrapFrame) -> ! {
        forge_trapret(tf)
    }
}

// =============================================================================
// REPASSE PARA O BACKEND
// =============================================================================

impl<B: PageAllocator> PageAllocator for X86<B> {
    fn alloc_page(&self) -> Option<NonNull<u8>> {
        self.backend.alloc_page()
    }

    unsafe fn free_page(&self, page: NonNull<u8>) {
        self.backend.free_page(page)
    }
}

impl<B: AddressSpaceOps> AddressSpaceOps for X86<B> {
    type Space = B::Space;

    fn create_space(&self) -> Option<B::Space> {
        self.backend.create_space()
    }

    fn load_initial(&self, space: &B::Space, image: &[u8]) -> bool {
        self.backend.load_initial(space, image)
    }

    fn duplicate_space(&self, space: &B::Space, size: usize) -> Option<B::Space> {
        self.backend.duplicate_space(space, size)
    }

    fn grow_space(&self, space: &B::Space, old: usize, new: usize) -> Option<usize> {
        self.backend.grow_space(space, old, new)
    }

    fn shrink_space(&self, space: &B::Space, old: usize, new: usize) -> usize {
        self.backend.shrink_space(space, old, new)
    }

    fn destroy_space(&self, space: B::Space) {
        self.backend.destroy_space(space)
    }

    fn is_mapped(&self, space: &B::Space, va: u32, len: usize) -> bool {
        self.backend.is_mapped(space, va, len)
    }

    fn copy_out(&self, space: &B::Space, va: u32, bytes: &[u8]) -> bool {
        self.backend.copy_out(space, va, bytes)
    }

    fn copy_in(&self, space: &B::Space, va: u32, out: &mut [u8]) -> bool {
        self.backend.copy_in(space, va, out)
    }

    fn activate(&self, space: &B::Space, kstack_top: usize) {
        self.backend.activate(space, kstack_top)
    }

    fn activate_kernel(&self) {
        self.backend.activate_kernel()
    }
}

impl<B: FileOps> FileOps for X86<B> {
    type File = B::File;
    type Dir = B::Dir;

    fn dup_file(&self, file: &B::File) -> B::File {
        self.backend.dup_file(file)
    }

    fn close_file(&self, file: B::File) {
        self.backend.close_file(file)
    }

    fn dup_dir(&self, dir: &B::Dir) -> B::Dir {
        self.backend.dup_dir(dir)
    }

    fn release_dir(&self, dir: B::Dir) {
        self.backend.release_dir(dir)
    }

    fn root_dir(&self) -> Option<B::Dir> {
        self.backend.root_dir()
    }
}
