//! Spinlock - bloqueio com busy-wait
//!
//! Adquirir mascara as interrupções da CPU (`push_off`) e liberar restaura
//! (`pop_off`). As duas chamadas aninham: as interrupções só voltam quando o
//! último lock da CPU é solto, e só se estavam ligadas antes do primeiro.

use crate::arch::CpuOps;
use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Desliga interrupções e incrementa a profundidade de mascaramento.
pub fn push_off<C: CpuOps + ?Sized>(cpu: &C) {
    let was_enabled = cpu.interrupts_enabled();
    cpu.disable_interrupts();

    let state = cpu.irq_state();
    if state.depth() == 0 {
        state.set_enabled_before(was_enabled);
    }
    state.set_depth(state.depth() + 1);
}

/// Desfaz um `push_off`.
pub fn pop_off<C: CpuOps + ?Sized>(cpu: &C) {
    if cpu.interrupts_enabled() {
        panic!("pop_off - interruptible");
    }

    let state = cpu.irq_state();
    let depth = state.depth();
    if depth == 0 {
        panic!("pop_off");
    }

    state.set_depth(depth - 1);
    if depth == 1 && state.enabled_before() {
        cpu.enable_interrupts();
    }
}

/// Spinlock - usa busy-wait, NÃO pode dormir
///
/// # Quando usar
///
/// - Seções críticas MUITO curtas
/// - Proteger a condição de um `sleep` (o lock é solto enquanto dorme)
///
/// # Quando NÃO usar
///
/// - Seções que podem demorar
/// - Em volta de alocação de páginas ou operações de espaço de endereçamento
pub struct Spinlock<T> {
    locked: AtomicBool,
    /// cpu_id + 1 da CPU que segura o lock (0 = ninguém)
    holder: AtomicUsize,
    name: &'static str,
    data: UnsafeCell<T>,
}

// SAFETY: Spinlock protege acesso com lock atômico
unsafe impl<T: Send> Send for Spinlock<T> {}
unsafe impl<T: Send> Sync for Spinlock<T> {}

impl<T> Spinlock<T> {
    /// Cria novo spinlock
    pub const fn new(name: &'static str, data: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            holder: AtomicUsize::new(0),
            name,
            data: UnsafeCell::new(data),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Adquire o lock
    pub fn lock<'a, C: CpuOps + ?Sized>(&'a self, cpu: &'a C) -> SpinlockGuard<'a, T, C> {
        // SAFETY: o guard libera exatamente uma vez
        unsafe { self.raw_acquire(cpu) };
        SpinlockGuard { lock: self, cpu }
    }

    /// Tenta adquirir sem girar. Falha também se esta CPU já segura o lock.
    pub fn try_lock<'a, C: CpuOps + ?Sized>(&'a self, cpu: &'a C) -> Option<SpinlockGuard<'a, T, C>> {
        push_off(cpu);
        if !self.holding(cpu)
            && self
                .locked
                .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
        {
            self.holder.store(cpu.cpu_id() + 1, Ordering::Relaxed);
            return Some(SpinlockGuard { lock: self, cpu });
        }

        // Não conseguiu, restaurar interrupções
        pop_off(cpu);
        None
    }

    /// Adquire sem criar guard.
    ///
    /// # Safety
    ///
    /// O chamador se compromete a chamar `raw_release` (possivelmente em
    /// outro contexto de execução da mesma CPU, como faz o scheduler).
    pub unsafe fn raw_acquire<C: CpuOps + ?Sized>(&self, cpu: &C) {
        push_off(cpu);
        if self.holding(cpu) {
            panic!("acquire {}", self.name);
        }

        // Spin até conseguir o lock
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            // Hint para CPU que estamos em spin loop
            core::hint::spin_loop();
        }

        self.holder.store(cpu.cpu_id() + 1, Ordering::Relaxed);
    }

    /// Libera um lock adquirido com `raw_acquire`.
    ///
    /// # Safety
    ///
    /// Nenhum guard pode estar vivo para este lock.
    pub unsafe fn raw_release<C: CpuOps + ?Sized>(&self, cpu: &C) {
        if !self.holding(cpu) {
            panic!("release {}", self.name);
        }

        self.holder.store(0, Ordering::Relaxed);
        self.locked.store(false, Ordering::Release);
        pop_off(cpu);
    }

    /// Esta CPU segura o lock?
    ///
    /// Só é confiável com interrupções desligadas.
    pub fn holding<C: CpuOps + ?Sized>(&self, cpu: &C) -> bool {
        self.locked.load(Ordering::Relaxed)
            && self.holder.load(Ordering::Relaxed) == cpu.cpu_id() + 1
    }

    /// Ponteiro para o dado protegido.
    ///
    /// # Safety
    ///
    /// Desreferenciar só com o lock segurado, ou em leitura best-effort
    /// tolerante a estado rasgado (procdump).
    pub unsafe fn data_ptr(&self) -> *mut T {
        self.data.get()
    }
}

/// Guard do spinlock - libera ao sair do escopo
pub struct SpinlockGuard<'a, T, C: CpuOps + ?Sized> {
    lock: &'a Spinlock<T>,
    cpu: &'a C,
}

impl<'a, T, C: CpuOps + ?Sized> SpinlockGuard<'a, T, C> {
    /// Desfaz o guard sem liberar o lock.
    pub fn into_raw(self) -> (&'a Spinlock<T>, &'a C) {
        let parts = (self.lock, self.cpu);
        core::mem::forget(self);
        parts
    }

    /// Reconstrói um guard para um lock já segurado por esta CPU.
    ///
    /// # Safety
    ///
    /// `lock` foi adquirido por `raw_acquire` e ninguém mais vai liberá-lo.
    pub unsafe fn from_raw(lock: &'a Spinlock<T>, cpu: &'a C) -> Self {
        Self { lock, cpu }
    }
}

impl<T, C: CpuOps + ?Sized> Deref for SpinlockGuard<'_, T, C> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: Lock está adquirido
        unsafe { &*self.lock.data.get() }
    }
}

impl<T, C: CpuOps + ?Sized> DerefMut for SpinlockGuard<'_, T, C> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: Lock está adquirido
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T, C: CpuOps + ?Sized> Drop for SpinlockGuard<'_, T, C> {
    fn drop(&mut self) {
        // SAFETY: o guard representa a única aquisição pendente
        unsafe { self.lock.raw_release(self.cpu) };
    }
}
