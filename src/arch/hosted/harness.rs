//! Bancada de testes: um kernel simulado, o thread da CPU que roda o loop
//! de despacho e a interface de syscalls dos programas de usuário.
//!
//! O thread do teste nunca executa código de unidade. Ele pede `n`
//! varreduras ao thread da CPU e espera a resposta; entre varreduras todas
//! as unidades estão paradas em `switch`, então o teste pode inspecionar
//! e mexer no kernel livremente.

use super::{baton, Hosted, Program};
use crate::arch::TrapFrame;
use crate::core::logging::{self, Console};
use crate::mm::AddressSpaceOps;
use crate::sched::Kernel;
use crate::sys::Pid;
use crate::syscall::numbers::*;
use std::boxed::Box;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Imagem do init: `nop; nop; jmp .`
const INIT_IMAGE: [u8; 4] = [0x90, 0x90, 0xeb, 0xfe];

/// Tempo máximo de um `run` antes de considerar o despacho travado.
const RUN_DEADLINE: Duration = Duration::from_secs(10);

struct StderrConsole;

impl Console for StderrConsole {
    fn write_str(&self, s: &str) {
        std::eprint!("{s}");
    }
}

static STDERR: StderrConsole = StderrConsole;

pub struct Harness {
    kernel: &'static Kernel<Hosted>,
    requests: Sender<usize>,
    replies: Receiver<usize>,
}

impl Harness {
    pub fn new() -> Self {
        logging::install(&STDERR);

        let kernel: &'static Kernel<Hosted> = Box::leak(Box::new(Kernel::new(Hosted::new())));
        kernel.platform().bind(kernel);

        let (requests, cpu_requests) = mpsc::channel();
        let (cpu_replies, replies) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name(std::string::String::from("cpu0"))
            .spawn(move || cpu_loop(kernel, cpu_requests, cpu_replies));
        if spawned.is_err() {
            panic!("hosted: cannot spawn cpu thread");
        }

        Self {
            kernel,
            requests,
            replies,
        }
    }

    pub fn kernel(&self) -> &'static Kernel<Hosted> {
        self.kernel
    }

    pub fn hosted(&self) -> &'static Hosted {
        self.kernel.platform()
    }

    /// Registra o programa de usuário em `entry`.
    pub fn program<F>(&self, entry: u32, program: F)
    where
        F: Fn(&UserCtx) + Send + Sync + 'static,
    {
        let program: Program = Arc::new(program);
        self.hosted().register(entry, program);
    }

    /// Cria o init rodando `program`.
    pub fn boot<F>(&self, program: F) -> Pid
    where
        F: Fn(&UserCtx) + Send + Sync + 'static,
    {
        self.program(0, program);
        match self.kernel.userinit(&INIT_IMAGE) {
            Ok(pid) => pid,
            Err(e) => panic!("hosted: userinit failed: {e}"),
        }
    }

    /// Roda `passes` varreduras de despacho. Devolve quantas unidades foram despachadas.
    ///
    /// Um pânico dentro do simulador é repassado para o thread do teste.
    pub fn run(&self, passes: usize) -> usize {
        self.check_poison();
        if self.requests.send(passes).is_err() {
            self.check_poison();
            panic!("hosted: cpu thread gone");
        }

        let deadline = Instant::now() + RUN_DEADLINE;
        loop {
            match self.replies.recv_timeout(Duration::from_millis(10)) {
                Ok(dispatched) => return dispatched,
                Err(RecvTimeoutError::Timeout) => {
                    self.check_poison();
                    if Instant::now() > deadline {
                        panic!("hosted: dispatcher stuck");
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.check_poison();
                    panic!("hosted: cpu thread gone");
                }
            }
        }
    }

    /// Roda uma varredura por vez até `cond` valer, no máximo `max_passes`.
    pub fn run_until<F>(&self, cond: F, max_passes: usize) -> bool
    where
        F: Fn(&Kernel<Hosted>) -> bool,
    {
        for _ in 0..max_passes {
            if cond(self.kernel) {
                return true;
            }
            self.run(1);
        }
        cond(self.kernel)
    }

    fn check_poison(&self) {
        if let Some(message) = self.hosted().poisoned() {
            panic!("{message}");
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

fn cpu_loop(kernel: &'static Kernel<Hosted>, requests: Receiver<usize>, replies: Sender<usize>) {
    while let Ok(passes) = requests.recv() {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            (0..passes).map(|_| kernel.dispatch_pass()).sum::<usize>()
        }));
        match outcome {
            Ok(dispatched) => {
                if replies.send(dispatched).is_err() {
                    return;
                }
            }
            Err(payload) => {
                kernel.platform().poison(baton::panic_message(&*payload));
                return;
            }
        }
    }
}

// =============================================================================
// MODO USUÁRIO SIMULADO
// =============================================================================

/// O que um programa de usuário enxerga: registradores via trap frame e
/// syscalls. Retornos seguem o ABI (negativo = erro).
pub struct UserCtx {
    kernel: &'static Kernel<Hosted>,
}

impl UserCtx {
    pub(super) fn new(kernel: &'static Kernel<Hosted>) -> Self {
        Self { kernel }
    }

    pub fn kernel(&self) -> &'static Kernel<Hosted> {
        self.kernel
    }

    /// `int $T_SYSCALL` com EAX = `num` e os argumentos em EBX, ECX, EDX, ESI, EDI.
    pub fn syscall(&self, num: usize, args: [u32; 5]) -> i32 {
        let tf = self.kernel.current_trap_frame();
        // SAFETY: trap frame da unidade corrente, que é este thread
        unsafe {
            (*tf).eax = num as u32;
            (*tf).ebx = args[0];
            (*tf).ecx = args[1];
            (*tf).edx = args[2];
            (*tf).esi = args[3];
            (*tf).edi = args[4];
        }
        crate::syscall::trap_syscall(self.kernel);
        // SAFETY: idem
        unsafe { (*tf).eax as i32 }
    }

    /// Cópia do trap frame corrente.
    pub fn tf(&self) -> TrapFrame {
        // SAFETY: idem
        unsafe { *self.kernel.current_trap_frame() }
    }

    pub fn getpid(&self) -> i32 {
        self.syscall(SYS_GETPID, [0; 5])
    }

    /// fork cujo filho começa no programa registrado em `child_entry`.
    pub fn fork(&self, child_entry: u32) -> i32 {
        let tf = self.kernel.current_trap_frame();
        // SAFETY: idem
        unsafe { (*tf).eip = child_entry };
        self.syscall(SYS_FORK, [0; 5])
    }

    pub fn exit(&self) -> ! {
        self.syscall(SYS_EXIT, [0; 5]);
        panic!("exit returned");
    }

    pub fn wait(&self) -> i32 {
        self.syscall(SYS_WAIT, [0; 5])
    }

    pub fn kill(&self, pid: i32) -> i32 {
        self.syscall(SYS_KILL, [pid as u32, 0, 0, 0, 0])
    }

    pub fn sbrk(&self, delta: i32) -> i32 {
        self.syscall(SYS_SBRK, [delta as u32, 0, 0, 0, 0])
    }

    pub fn yield_now(&self) {
        self.syscall(SYS_YIELD, [0; 5]);
    }

    pub fn clone(&self, entry: u32, arg: u32, stack: u32) -> i32 {
        self.syscall(SYS_CLONE, [entry, arg, stack, 0, 0])
    }

    pub fn join(&self, pid: i32) -> i32 {
        self.syscall(SYS_JOIN, [pid as u32, 0, 0, 0, 0])
    }

    pub fn find_ustack(&self, pid: i32) -> i32 {
        self.syscall(SYS_USTACK, [pid as u32, 0, 0, 0, 0])
    }

    pub fn procdump(&self) -> i32 {
        self.syscall(SYS_PROCDUMP, [0; 5])
    }

    /// Tamanho atual da memória do processo.
    pub fn size(&self) -> usize {
        self.kernel.current_space().map_or(0, |space| space.size())
    }

    pub fn read_word(&self, va: u32) -> Option<u32> {
        let space = self.kernel.current_space()?;
        let mut word = [0u8; 4];
        self.kernel
            .platform()
            .copy_in(space.space(), va, &mut word)
            .then(|| u32::from_le_bytes(word))
    }

    pub fn write_word(&self, va: u32, value: u32) -> bool {
        match self.kernel.current_space() {
            Some(space) => self
                .kernel
                .platform()
                .copy_out(space.space(), va, &value.to_le_bytes()),
            None => false,
        }
    }

    /// Cede a CPU para sempre.
    pub fn idle(&self) -> ! {
        loop {
            self.yield_now();
        }
    }
}
