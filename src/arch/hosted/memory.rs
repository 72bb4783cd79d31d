//! Memória simulada: páginas físicas vindas do alocador do host e espaços
//! de endereçamento esparsos (endereço virtual de página → página).
//!
//! Contadores e injeção de falha existem para os testes verificarem que
//! toda página e todo espaço são devolvidos exatamente uma vez.

use super::Hosted;
use crate::mm::{AddressSpaceOps, PageAllocator};
use crate::sched::config::PGSIZE;
use core::ptr::NonNull;
use std::alloc::{self, Layout};
use std::boxed::Box;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

const PAGE_LAYOUT: Layout = match Layout::from_size_align(PGSIZE, PGSIZE) {
    Ok(layout) => layout,
    Err(_) => panic!("page layout"),
};

type Page = Box<[u8; PGSIZE]>;

fn page_round_up(addr: usize) -> usize {
    (addr + PGSIZE - 1) & !(PGSIZE - 1)
}

fn page_round_down(addr: usize) -> usize {
    addr & !(PGSIZE - 1)
}

/// Consome uma falha agendada, se houver.
fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// Ação executada uma vez, na próxima alocação de página.
#[derive(Default)]
struct PageHook(Mutex<Option<Box<dyn FnOnce() + Send>>>);

impl PageHook {
    fn take(&self) -> Option<Box<dyn FnOnce() + Send>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

impl core::fmt::Debug for PageHook {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("PageHook")
    }
}

#[derive(Debug, Default)]
pub(super) struct HostMemory {
    page_hook: PageHook,
    pages_outstanding: AtomicUsize,
    fail_pages: AtomicUsize,
    fail_spaces: AtomicUsize,
    next_space: AtomicUsize,
    spaces_live: AtomicUsize,
    active: AtomicUsize,
}

/// Espaço de endereçamento simulado.
#[derive(Debug)]
pub struct HostSpace {
    id: usize,
    pages: Mutex<BTreeMap<usize, Page>>,
}

impl HostSpace {
    /// Identificador único (nunca 0, que é "só kernel").
    pub fn id(&self) -> usize {
        self.id
    }

    fn pages(&self) -> MutexGuard<'_, BTreeMap<usize, Page>> {
        self.pages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mapped_pages(&self) -> usize {
        self.pages().len()
    }

    /// Percorre `[va, va + len)` página a página. Falha em página ausente.
    fn each_chunk(&self, va: u32, len: usize, mut f: impl FnMut(&mut [u8], usize)) -> bool {
        let mut pages = self.pages();
        let mut addr = va as usize;
        let end = addr + len;
        let mut done = 0;

        while addr < end {
            let base = page_round_down(addr);
            let offset = addr - base;
            let chunk = (PGSIZE - offset).min(end - addr);
            let Some(page) = pages.get_mut(&base) else {
                return false;
            };
            f(&mut page[offset..offset + chunk], done);
            addr += chunk;
            done += chunk;
        }
        true
    }
}

impl Hosted {
    /// Páginas físicas alocadas e ainda não devolvidas.
    pub fn pages_outstanding(&self) -> usize {
        self.memory.pages_outstanding.load(Ordering::SeqCst)
    }

    /// As próximas `n` alocações de página falham.
    pub fn fail_next_pages(&self, n: usize) {
        self.memory.fail_pages.store(n, Ordering::SeqCst);
    }

    /// Roda `f` na próxima alocação de página, antes de alocar.
    ///
    /// A unidade que aloca não segura o lock da tabela nesse ponto, então
    /// `f` pode chamar operações do kernel (ex.: `kill` numa unidade em
    /// construção).
    pub fn before_next_page(&self, f: impl FnOnce() + Send + 'static) {
        *self.memory.page_hook.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(Box::new(f));
    }

    /// As próximas `n` criações/duplicações/crescimentos de espaço falham.
    pub fn fail_next_space_ops(&self, n: usize) {
        self.memory.fail_spaces.store(n, Ordering::SeqCst);
    }

    /// Espaços criados e ainda não destruídos.
    pub fn spaces_live(&self) -> usize {
        self.memory.spaces_live.load(Ordering::SeqCst)
    }

    /// Id do espaço instalado no momento (0 = só kernel).
    pub fn active_space(&self) -> usize {
        self.memory.active.load(Ordering::SeqCst)
    }

    fn new_space(&self) -> HostSpace {
        self.memory.spaces_live.fetch_add(1, Ordering::SeqCst);
        HostSpace {
            id: self.memory.next_space.fetch_add(1, Ordering::SeqCst) + 1,
            pages: Mutex::new(BTreeMap::new()),
        }
    }
}

impl PageAllocator for Hosted {
    fn alloc_page(&self) -> Option<NonNull<u8>> {
        if let Some(hook) = self.memory.page_hook.take() {
            hook();
        }
        if take_failure(&self.memory.fail_pages) {
            return None;
        }
        // SAFETY: layout com tamanho não nulo
        let page = NonNull::new(unsafe { alloc::alloc_zeroed(PAGE_LAYOUT) })?;
        self.memory.pages_outstanding.fetch_add(1, Ordering::SeqCst);
        Some(page)
    }

    unsafe fn free_page(&self, page: NonNull<u8>) {
        alloc::dealloc(page.as_ptr(), PAGE_LAYOUT);
        self.memory.pages_outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AddressSpaceOps for Hosted {
    type Space = HostSpace;

    fn create_space(&self) -> Option<HostSpace> {
        if take_failure(&self.memory.fail_spaces) {
            return None;
        }
        Some(self.new_space())
    }

    fn load_initial(&self, space: &HostSpace, image: &[u8]) -> bool {
        if image.len() > PGSIZE {
            return false;
        }
        let mut page: Page = Box::new([0; PGSIZE]);
        page[..image.len()].copy_from_slice(image);
        space.pages().insert(0, page);
        true
    }

    fn duplicate_space(&self, space: &HostSpace, size: usize) -> Option<HostSpace> {
        if take_failure(&self.memory.fail_spaces) {
            return None;
        }
        let copy = self.new_space();
        {
            let source = space.pages();
            let mut target = copy.pages();
            for (&va, page) in source.range(..page_round_up(size)) {
                target.insert(va, page.clone());
            }
        }
        Some(copy)
    }

    fn grow_space(&self, space: &HostSpace, old: usize, new: usize) -> Option<usize> {
        if new < old {
            return Some(old);
        }
        if take_failure(&self.memory.fail_spaces) {
            return None;
        }
        let mut pages = space.pages();
        for va in (page_round_up(old)..new).step_by(PGSIZE) {
            pages.insert(va, Box::new([0; PGSIZE]));
        }
        Some(new)
    }

    fn shrink_space(&self, space: &HostSpace, old: usize, new: usize) -> usize {
        if new >= old {
            return old;
        }
        let mut pages = space.pages();
        for va in (page_round_up(new)..page_round_up(old)).step_by(PGSIZE) {
            pages.remove(&va);
        }
        new
    }

    fn destroy_space(&self, space: HostSpace) {
        self.memory.spaces_live.fetch_sub(1, Ordering::SeqCst);
        drop(space);
    }

    fn is_mapped(&self, space: &HostSpace, va: u32, len: usize) -> bool {
        let pages = space.pages();
        let start = page_round_down(va as usize);
        let end = va as usize + len;
        (start..end).step_by(PGSIZE).all(|page| pages.contains_key(&page))
    }

    fn copy_out(&self, space: &HostSpace, va: u32, bytes: &[u8]) -> bool {
        space.each_chunk(va, bytes.len(), |chunk, done| {
            chunk.copy_from_slice(&bytes[done..done + chunk.len()]);
        })
    }

    fn copy_in(&self, space: &HostSpace, va: u32, out: &mut [u8]) -> bool {
        let len = out.len();
        space.each_chunk(va, len, |chunk, done| {
            out[done..done + chunk.len()].copy_from_slice(chunk);
        })
    }

    fn activate(&self, space: &HostSpace, _kstack_top: usize) {
        self.memory.active.store(space.id, Ordering::SeqCst);
    }

    fn activate_kernel(&self) {
        self.memory.active.store(0, Ordering::SeqCst);
    }
}
