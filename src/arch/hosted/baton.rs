//! Troca de contexto do simulador.
//!
//! Cada unidade é um thread do host. Só o dono do "bastão" executa código
//! do kernel; `switch` entrega o bastão ao contexto de destino e bloqueia
//! até recebê-lo de volta. Um contexto de primeira execução ainda não tem
//! thread: o primeiro `switch` para ele cria o thread, que chama
//! `FirstResume::entry`.
//!
//! Um pânico em qualquer thread do simulador "envenena" o bastão: todos os
//! outros threads do kernel param para sempre e o `Harness` repassa a
//! mensagem para o thread do teste.

use crate::arch::FirstResume;
use std::cell::Cell;
use std::string::String;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

/// Token 0 nunca é de ninguém.
static NEXT_TOKEN: AtomicUsize = AtomicUsize::new(1);

thread_local! {
    static TOKEN: Cell<usize> = const { Cell::new(0) };
}

/// Token do thread do host que está executando.
pub(super) fn current_token() -> usize {
    TOKEN.with(|token| {
        if token.get() == 0 {
            token.set(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed));
        }
        token.get()
    })
}

fn fresh_token() -> usize {
    NEXT_TOKEN.fetch_add(1, Ordering::Relaxed)
}

/// Estacionamento definitivo de um thread cujo simulador morreu.
pub(super) fn park_forever() -> ! {
    loop {
        thread::park();
    }
}

/// Mensagem de um payload de pânico.
pub(super) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        String::from(*msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        String::from("hosted: panic with non-string payload")
    }
}

struct BatonState {
    turn: usize,
    poison: Option<String>,
}

pub(super) struct Baton {
    state: Mutex<BatonState>,
    cv: Condvar,
}

impl Baton {
    pub(super) fn new() -> Self {
        Self {
            state: Mutex::new(BatonState {
                turn: 0,
                poison: None,
            }),
            cv: Condvar::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, BatonState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn pass_to(&self, token: usize) {
        self.state().turn = token;
        self.cv.notify_all();
    }

    /// Bloqueia até o bastão ser de `token`. Nunca volta se o simulador morreu.
    pub(super) fn wait_for(&self, token: usize) {
        let mut state = self.state();
        loop {
            if state.poison.is_some() {
                drop(state);
                park_forever();
            }
            if state.turn == token {
                return;
            }
            state = self.cv.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Registra o primeiro pânico e acorda todos para que estacionem.
    pub(super) fn poison(&self, message: String) {
        let mut state = self.state();
        if state.poison.is_none() {
            state.poison = Some(message);
        }
        drop(state);
        self.cv.notify_all();
    }

    pub(super) fn poisoned(&self) -> Option<String> {
        self.state().poison.clone()
    }
}

/// Contexto salvo de uma unidade: o token do thread que a executa, ou a
/// continuação de primeira execução enquanto o thread não existe.
pub struct HostContext {
    token: Cell<usize>,
    start: Cell<Option<FirstResume>>,
}

impl HostContext {
    pub(super) fn empty() -> Self {
        Self {
            token: Cell::new(0),
            start: Cell::new(None),
        }
    }

    pub(super) fn first_resume(resume: FirstResume) -> Self {
        Self {
            token: Cell::new(0),
            start: Cell::new(Some(resume)),
        }
    }
}

/// `FirstResume` carrega um ponteiro cru; o thread novo é o único a usá-lo.
struct SendResume(FirstResume);

unsafe impl Send for SendResume {}

impl SendResume {
    fn run(self) -> ! {
        // SAFETY: continuação montada por `first_resume_context`
        unsafe { (self.0.entry)(self.0.arg) }
    }
}

/// `switch` do simulador: salva o token atual em `old` e entrega o bastão a `new`.
///
/// # Safety
///
/// Mesmo contrato de `ContextSwitch::switch`.
pub(super) unsafe fn switch(baton: &Arc<Baton>, old: *mut HostContext, new: *const HostContext) {
    let me = current_token();
    (*old).token.set(me);

    let target = match (*new).start.take() {
        Some(resume) => {
            let token = fresh_token();
            (*new).token.set(token);
            spawn_unit(baton.clone(), token, SendResume(resume));
            token
        }
        None => (*new).token.get(),
    };

    baton.pass_to(target);
    baton.wait_for(me);
}

fn spawn_unit(baton: Arc<Baton>, token: usize, resume: SendResume) {
    let spawned = thread::Builder::new()
        .name(std::format!("unit-{token}"))
        .spawn(move || {
            TOKEN.with(|t| t.set(token));
            baton.wait_for(token);
            resume.run()
        });

    if spawned.is_err() {
        panic!("hosted: cannot spawn unit thread");
    }
}
