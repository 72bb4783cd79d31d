//! Cenários de ciclo de vida rodando no simulador hospedado.
//!
//! Cada teste registra programas de usuário (closures), cria o init e
//! dirige o loop de despacho até o estado esperado.

use crate::arch::hosted::{Harness, Hosted, UserCtx};
use crate::sched::config::{NPROC, PGSIZE, THREAD_RETURN_SENTINEL};
use crate::sched::{Kernel, UnitKind, UnitState};
use crate::sync::Spinlock;
use crate::sys::{Pid, SysError};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::vec::Vec;

const CHILD: u32 = 0x1000;
const GRANDCHILD: u32 = 0x1100;
const WORKER: u32 = 0x2000;
const SIBLING: u32 = 0x2100;

const PAGE: i32 = PGSIZE as i32;

fn err(e: SysError) -> i32 {
    e.as_isize() as i32
}

type Log = Arc<Mutex<Vec<i32>>>;

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn logged(log: &Log) -> Vec<i32> {
    log.lock().unwrap().clone()
}

fn state_of(k: &Kernel<Hosted>, pid: i32) -> Option<UnitState> {
    k.snapshot()
        .into_iter()
        .find(|u| u.pid == Some(Pid::new(pid as u32)))
        .map(|u| u.state)
}

/// Dá a vez até `pid` virar zumbi.
fn yield_until_zombie(ctx: &UserCtx, pid: i32) {
    while state_of(ctx.kernel(), pid) != Some(UnitState::Zombie) {
        ctx.yield_now();
    }
}

// =============================================================================
// FORK / WAIT
// =============================================================================

#[test]
fn test_fork_wait_then_no_children() {
    let h = Harness::new();
    let out = log();

    h.program(CHILD, |ctx| ctx.exit());

    let o = out.clone();
    h.boot(move |ctx| {
        let child = ctx.fork(CHILD);
        o.lock().unwrap().push(child);
        // Nada de guard vivo enquanto a unidade dorme
        let reaped = ctx.wait();
        o.lock().unwrap().push(reaped);
        let none_left = ctx.wait();
        o.lock().unwrap().push(none_left);
        ctx.idle();
    });

    assert!(h.run_until(|_| logged(&out).len() == 3, 50));
    assert_eq!(logged(&out), [2, 2, err(SysError::NoChildren)]);

    // Só o init sobrou, com a kernel stack e o espaço dele
    assert_eq!(h.kernel().occupancy(), 1);
    assert_eq!(h.hosted().pages_outstanding(), 1);
    assert_eq!(h.hosted().spaces_live(), 1);
}

#[test]
fn test_fork_child_sees_zero_and_copied_memory() {
    let h = Harness::new();
    let seen = log();

    let s = seen.clone();
    h.program(CHILD, move |ctx| {
        let ret = ctx.tf().eax as i32;
        s.lock().unwrap().push(ret);
        let ret = ctx.read_word(0x40).unwrap_or(0) as i32;
        s.lock().unwrap().push(ret);
        ctx.exit();
    });

    h.boot(|ctx| {
        ctx.write_word(0x40, 77);
        ctx.fork(CHILD);
        ctx.wait();
        ctx.idle();
    });

    assert!(h.run_until(|k| k.occupancy() == 1 && logged(&seen).len() == 2, 50));
    assert_eq!(logged(&seen), [0, 77]);
}

#[test]
fn test_fork_does_not_alias_address_space() {
    let h = Harness::new();
    let sizes = log();

    let s = sizes.clone();
    h.program(CHILD, move |ctx| {
        let ret = ctx.size() as i32;
        s.lock().unwrap().push(ret);
        ctx.sbrk(3 * PAGE);
        let ret = ctx.size() as i32;
        s.lock().unwrap().push(ret);
        ctx.exit();
    });

    let s = sizes.clone();
    h.boot(move |ctx| {
        ctx.fork(CHILD);
        // O pai cresce antes do filho rodar
        ctx.sbrk(PAGE);
        ctx.wait();
        let ret = ctx.size() as i32;
        s.lock().unwrap().push(ret);
        ctx.idle();
    });

    assert!(h.run_until(|_| logged(&sizes).len() == 3, 50));
    assert_eq!(logged(&sizes), [PAGE, 4 * PAGE, 2 * PAGE]);
}

#[test]
fn test_wait_reaps_children_of_exited_process() {
    let h = Harness::new();
    let reaped = log();

    h.program(GRANDCHILD, |ctx| {
        for _ in 0..3 {
            ctx.yield_now();
        }
        ctx.exit();
    });
    h.program(CHILD, |ctx| {
        ctx.fork(GRANDCHILD);
        ctx.exit();
    });

    let r = reaped.clone();
    h.boot(move |ctx| {
        ctx.fork(CHILD);
        loop {
            let pid = ctx.wait();
            r.lock().unwrap().push(pid);
            if pid < 0 {
                break;
            }
        }
        ctx.idle();
    });

    assert!(h.run_until(|_| logged(&reaped).len() == 3, 100));
    // O neto foi herdado pelo init
    assert_eq!(logged(&reaped), [2, 3, err(SysError::NoChildren)]);
    assert_eq!(h.kernel().occupancy(), 1);
}

// =============================================================================
// CLONE / JOIN
// =============================================================================

#[test]
fn test_clone_runs_entry_with_argument_and_join_returns_tid() {
    let h = Harness::new();
    let frame = log();
    let out = log();

    let f = frame.clone();
    h.program(WORKER, move |ctx| {
        let esp = ctx.tf().esp;
        let mut f = f.lock().unwrap();
        f.push(esp as i32);
        f.push(ctx.read_word(esp).unwrap_or(0) as i32);
        f.push(ctx.read_word(esp + 4).unwrap_or(0) as i32);
        drop(f);

        // Memória compartilhada com o processo
        let global = ctx.read_word(0x40).unwrap_or(0);
        ctx.write_word(0x40, global + 1);
        ctx.exit();
    });

    let o = out.clone();
    h.boot(move |ctx| {
        ctx.write_word(0x40, 1);
        let stack = ctx.sbrk(2 * PAGE) as u32;
        let tid = ctx.clone(WORKER, 42, stack);
        let ustack = ctx.find_ustack(tid);
        let joined = ctx.join(tid);
        let global = ctx.read_word(0x40).unwrap_or(0) as i32;
        o.lock().unwrap().extend([stack as i32, tid, ustack, joined, global]);
        ctx.idle();
    });

    assert!(h.run_until(|_| logged(&out).len() == 5, 50));
    let out = logged(&out);
    let stack = out[0];
    assert_eq!(&out[1..], &[2, stack, 2, 2]);

    // Topo da página: [sentinela, arg]
    assert_eq!(
        logged(&frame),
        [stack + PAGE - 8, THREAD_RETURN_SENTINEL as i32, 42]
    );

    // Join libera só a kernel stack; o espaço continua do processo
    assert_eq!(h.kernel().occupancy(), 1);
    assert_eq!(h.hosted().pages_outstanding(), 1);
    assert_eq!(h.hosted().spaces_live(), 1);
}

#[test]
fn test_clone_with_bad_stack_allocates_nothing() {
    let h = Harness::new();
    let out = log();

    let o = out.clone();
    h.boot(move |ctx| {
        let stack = ctx.sbrk(2 * PAGE) as u32;
        let before = ctx.kernel().occupancy() as i32;
        let misaligned = ctx.clone(WORKER, 0, stack + 4);
        let unmapped = ctx.clone(WORKER, 0, 16 * PGSIZE as u32);
        // Alinhada mas a página passa do fim da memória
        let past_end = ctx.clone(WORKER, 0, stack + 2 * PGSIZE as u32);
        let after = ctx.kernel().occupancy() as i32;
        o.lock().unwrap().extend([misaligned, unmapped, past_end, before, after]);
        ctx.idle();
    });

    assert!(h.run_until(|_| logged(&out).len() == 5, 20));
    assert_eq!(
        logged(&out),
        [
            err(SysError::BadAlignment),
            err(SysError::BadAddress),
            err(SysError::BadAddress),
            1,
            1
        ]
    );
    assert_eq!(h.hosted().pages_outstanding(), 1);
}

#[test]
fn test_clone_aliases_address_space_growth() {
    let h = Harness::new();
    let out = log();

    let o = out.clone();
    h.program(WORKER, move |ctx| {
        let ret = ctx.sbrk(PAGE);
        o.lock().unwrap().push(ret);
        ctx.exit();
    });

    let o = out.clone();
    h.boot(move |ctx| {
        let stack = ctx.sbrk(2 * PAGE) as u32;
        let tid = ctx.clone(WORKER, 0, stack);
        ctx.join(tid);
        let ret = ctx.size() as i32;
        o.lock().unwrap().push(ret);
        ctx.idle();
    });

    assert!(h.run_until(|_| logged(&out).len() == 2, 50));
    // A thread viu 3 páginas; o processo vê o crescimento feito por ela
    assert_eq!(logged(&out), [3 * PAGE, 4 * PAGE]);
}

#[test]
fn test_join_rejects_self_and_processes() {
    let h = Harness::new();
    let out = log();

    h.program(CHILD, |ctx| ctx.idle());

    let o = out.clone();
    h.boot(move |ctx| {
        let me = ctx.getpid();
        let child = ctx.fork(CHILD);
        let on_self = ctx.join(me);
        let on_process = ctx.join(child);
        let on_nobody = ctx.join(99);
        o.lock().unwrap().extend([on_self, on_process, on_nobody]);
        ctx.idle();
    });

    assert!(h.run_until(|_| logged(&out).len() == 3, 20));
    assert_eq!(
        logged(&out),
        [
            err(SysError::InvalidArgument),
            err(SysError::InvalidArgument),
            err(SysError::ProcessNotFound)
        ]
    );
}

#[test]
fn test_join_rejects_thread_of_another_group() {
    let h = Harness::new();
    let foreign = Arc::new(AtomicI32::new(0));
    let out = log();

    h.program(WORKER, |ctx| ctx.idle());

    let f = foreign.clone();
    h.program(CHILD, move |ctx| {
        let stack = ctx.sbrk(2 * PAGE) as u32;
        f.store(ctx.clone(WORKER, 0, stack), Ordering::SeqCst);
        ctx.idle();
    });

    let (f, o) = (foreign.clone(), out.clone());
    h.boot(move |ctx| {
        ctx.fork(CHILD);
        while f.load(Ordering::SeqCst) == 0 {
            ctx.yield_now();
        }
        let joined = ctx.join(f.load(Ordering::SeqCst));
        o.lock().unwrap().push(joined);
        ctx.idle();
    });

    assert!(h.run_until(|_| logged(&out).len() == 1, 50));
    assert_eq!(logged(&out), [err(SysError::InvalidArgument)]);
}

#[test]
fn test_sibling_thread_can_join() {
    let h = Harness::new();
    let first = Arc::new(AtomicI32::new(0));
    let out = log();

    h.program(WORKER, |ctx| {
        for _ in 0..3 {
            ctx.yield_now();
        }
        ctx.exit();
    });

    let (f, o) = (first.clone(), out.clone());
    h.program(SIBLING, move |ctx| {
        let joined = ctx.join(f.load(Ordering::SeqCst));
        o.lock().unwrap().push(joined);
        ctx.exit();
    });

    let f = first.clone();
    h.boot(move |ctx| {
        let base = ctx.sbrk(3 * PAGE) as u32;
        let t1 = ctx.clone(WORKER, 0, base);
        f.store(t1, Ordering::SeqCst);
        let t2 = ctx.clone(SIBLING, 0, base + PGSIZE as u32);
        ctx.join(t2);
        ctx.idle();
    });

    assert!(h.run_until(|k| logged(&out).len() == 1 && k.occupancy() == 1, 50));
    assert_eq!(logged(&out), [2]);
}

#[test]
fn test_wait_ignores_zombie_thread() {
    let h = Harness::new();
    let out = log();

    h.program(WORKER, |ctx| ctx.exit());

    let o = out.clone();
    h.boot(move |ctx| {
        let stack = ctx.sbrk(2 * PAGE) as u32;
        let tid = ctx.clone(WORKER, 0, stack);
        yield_until_zombie(ctx, tid);
        let waited = ctx.wait();
        let joined = ctx.join(tid);
        o.lock().unwrap().extend([waited, joined]);
        ctx.idle();
    });

    assert!(h.run_until(|_| logged(&out).len() == 2, 50));
    assert_eq!(logged(&out), [err(SysError::NoChildren), 2]);
}

// =============================================================================
// EXIT / KILL
// =============================================================================

#[test]
fn test_thread_exit_leaves_group_running() {
    let h = Harness::new();
    let ticks = Arc::new(AtomicUsize::new(0));
    let joined = Arc::new(AtomicI32::new(0));

    h.program(WORKER, |ctx| ctx.exit());

    let t = ticks.clone();
    h.program(SIBLING, move |ctx| loop {
        t.fetch_add(1, Ordering::SeqCst);
        ctx.yield_now();
    });

    let j = joined.clone();
    h.boot(move |ctx| {
        let base = ctx.sbrk(3 * PAGE) as u32;
        let short = ctx.clone(WORKER, 0, base);
        ctx.clone(SIBLING, 0, base + PGSIZE as u32);
        j.store(ctx.join(short), Ordering::SeqCst);
        ctx.idle();
    });

    assert!(h.run_until(|_| joined.load(Ordering::SeqCst) == 2, 50));
    let before = ticks.load(Ordering::SeqCst);
    h.run(5);
    assert!(ticks.load(Ordering::SeqCst) > before);

    let units = h.kernel().snapshot();
    assert_eq!(units.len(), 2);
    assert!(units.iter().all(|u| !u.killed));
    assert!(units.iter().any(|u| u.kind == UnitKind::Thread));
}

#[test]
fn test_process_exit_kills_and_reaps_its_threads() {
    let h = Harness::new();
    let reaped = Arc::new(AtomicI32::new(0));

    h.program(WORKER, |ctx| ctx.idle());

    // Dorme em join até o processo sair
    let sibling_target = Arc::new(AtomicI32::new(0));
    let st = sibling_target.clone();
    h.program(SIBLING, move |ctx| {
        ctx.join(st.load(Ordering::SeqCst));
        ctx.idle();
    });

    let st = sibling_target.clone();
    h.program(CHILD, move |ctx| {
        let base = ctx.sbrk(3 * PAGE) as u32;
        let spinner = ctx.clone(WORKER, 0, base);
        st.store(spinner, Ordering::SeqCst);
        ctx.clone(SIBLING, 0, base + PGSIZE as u32);
        for _ in 0..3 {
            ctx.yield_now();
        }
        ctx.exit();
    });

    let r = reaped.clone();
    h.boot(move |ctx| {
        ctx.fork(CHILD);
        r.store(ctx.wait(), Ordering::SeqCst);
        ctx.idle();
    });

    assert!(h.run_until(|_| reaped.load(Ordering::SeqCst) != 0, 100));
    assert_eq!(reaped.load(Ordering::SeqCst), 2);

    // Nada do grupo sobrou: slots, kernel stacks e o espaço compartilhado
    assert_eq!(h.kernel().occupancy(), 1);
    assert_eq!(h.hosted().pages_outstanding(), 1);
    assert_eq!(h.hosted().spaces_live(), 1);
}

#[test]
fn test_children_forked_by_thread_reach_init_after_process_exit() {
    let h = Harness::new();
    let out = log();

    h.program(GRANDCHILD, |ctx| ctx.exit());
    h.program(WORKER, |ctx| {
        ctx.fork(GRANDCHILD);
        ctx.idle();
    });

    h.program(CHILD, |ctx| {
        let stack = ctx.sbrk(2 * PAGE) as u32;
        ctx.clone(WORKER, 0, stack);
        // pid 4: o filho que a thread criou
        yield_until_zombie(ctx, 4);
        ctx.exit();
    });

    let o = out.clone();
    h.boot(move |ctx| {
        ctx.fork(CHILD);
        loop {
            let pid = ctx.wait();
            o.lock().unwrap().push(pid);
            if pid < 0 {
                break;
            }
        }
        ctx.idle();
    });

    assert!(h.run_until(|_| logged(&out).len() == 3, 100));
    let mut reaped = logged(&out);
    assert_eq!(reaped.pop(), Some(err(SysError::NoChildren)));
    reaped.sort_unstable();
    assert_eq!(reaped, [2, 4]);

    assert_eq!(h.kernel().occupancy(), 1);
    assert_eq!(h.hosted().pages_outstanding(), 1);
    assert_eq!(h.hosted().spaces_live(), 1);
}

#[test]
fn test_join_hands_thread_children_to_process() {
    let h = Harness::new();
    let out = log();

    h.program(GRANDCHILD, |ctx| ctx.exit());
    h.program(WORKER, |ctx| {
        ctx.fork(GRANDCHILD);
        ctx.exit();
    });

    let o = out.clone();
    h.boot(move |ctx| {
        let stack = ctx.sbrk(2 * PAGE) as u32;
        let tid = ctx.clone(WORKER, 0, stack);
        let joined = ctx.join(tid);
        let reaped = ctx.wait();
        let none_left = ctx.wait();
        o.lock().unwrap().extend([tid, joined, reaped, none_left]);
        ctx.idle();
    });

    assert!(h.run_until(|_| logged(&out).len() == 4, 50));
    assert_eq!(logged(&out), [2, 2, 3, err(SysError::NoChildren)]);
    assert_eq!(h.kernel().occupancy(), 1);
}

#[test]
fn test_kill_on_thread_under_construction_is_kept() {
    let h = Harness::new();
    let ran = Arc::new(AtomicBool::new(false));
    let out = log();

    let r = ran.clone();
    h.program(WORKER, move |ctx| {
        r.store(true, Ordering::SeqCst);
        ctx.exit();
    });

    let o = out.clone();
    h.boot(move |ctx| {
        let kernel = ctx.kernel();
        let stack = ctx.sbrk(2 * PAGE) as u32;
        // A kernel stack da thread 2 é alocada com o slot já em Embryo
        kernel.platform().before_next_page(move || {
            let _ = kernel.kill(Pid::new(2));
        });
        let tid = ctx.clone(WORKER, 0, stack);
        let joined = ctx.join(tid);
        o.lock().unwrap().extend([tid, joined]);
        ctx.idle();
    });

    assert!(h.run_until(|_| logged(&out).len() == 2, 50));
    assert_eq!(logged(&out), [2, 2]);
    assert!(!ran.load(Ordering::SeqCst));
}

#[test]
fn test_kill_wakes_sleeper() {
    static NEVER: Spinlock<bool> = Spinlock::new("never", false);

    let h = Harness::new();
    let woke = Arc::new(AtomicBool::new(false));
    let out = log();

    let w = woke.clone();
    h.program(CHILD, move |ctx| {
        let kernel = ctx.kernel();
        let chan = crate::sched::Channel::of(&NEVER);
        let mut guard = NEVER.lock(kernel.platform());
        while !*guard && !kernel.killed() {
            guard = kernel.sleep(chan, guard);
        }
        drop(guard);
        w.store(true, Ordering::SeqCst);
        // Próxima syscall encerra a unidade marcada
        ctx.yield_now();
        panic!("killed unit kept running");
    });

    let o = out.clone();
    h.boot(move |ctx| {
        let child = ctx.fork(CHILD);
        while state_of(ctx.kernel(), child) != Some(UnitState::Sleeping) {
            ctx.yield_now();
        }
        let killed = ctx.kill(child);
        let waited = ctx.wait();
        o.lock().unwrap().extend([killed, waited]);
        ctx.idle();
    });

    assert!(h.run_until(|_| logged(&out).len() == 2, 50));
    assert_eq!(logged(&out), [0, 2]);
    assert!(woke.load(Ordering::SeqCst));
}

#[test]
fn test_kill_unknown_pid_fails() {
    let h = Harness::new();
    let out = log();

    let o = out.clone();
    h.boot(move |ctx| {
        let ret = ctx.kill(99);
        o.lock().unwrap().push(ret);
        ctx.idle();
    });

    assert!(h.run_until(|_| logged(&out).len() == 1, 10));
    assert_eq!(logged(&out), [err(SysError::ProcessNotFound)]);
}

#[test]
#[should_panic(expected = "init exiting")]
fn test_init_exit_is_fatal() {
    let h = Harness::new();
    h.boot(|ctx| ctx.exit());
    h.run(2);
}

#[test]
fn test_exit_releases_files_and_cwd() {
    let h = Harness::new();
    let file = h.hosted().open("console");
    let done = Arc::new(AtomicBool::new(false));

    h.program(CHILD, |ctx| ctx.exit());
    h.program(WORKER, |ctx| ctx.exit());

    let (f, d) = (file.clone(), done.clone());
    h.boot(move |ctx| {
        if ctx.kernel().fd_alloc(f.clone()).is_err() {
            panic!("fd table full");
        }
        ctx.fork(CHILD);
        ctx.wait();

        let stack = ctx.sbrk(2 * PAGE) as u32;
        let tid = ctx.clone(WORKER, 0, stack);
        ctx.join(tid);

        d.store(true, Ordering::SeqCst);
        ctx.idle();
    });

    assert!(h.run_until(|_| done.load(Ordering::SeqCst), 50));
    // Teste + closure do init + tabela do init
    assert_eq!(Arc::strong_count(&file), 3);
    // Plataforma + cwd do init
    assert_eq!(Arc::strong_count(h.hosted().root()), 2);
}

// =============================================================================
// ALOCAÇÃO
// =============================================================================

#[test]
fn test_fork_failures_roll_back() {
    let h = Harness::new();
    let out = log();

    let o = out.clone();
    h.boot(move |ctx| {
        let kernel = ctx.kernel();
        let hosted = kernel.platform();
        let pages = hosted.pages_outstanding() as i32;

        hosted.fail_next_pages(1);
        let no_page = ctx.fork(CHILD);

        hosted.fail_next_space_ops(1);
        let no_space = ctx.fork(CHILD);

        o.lock().unwrap().extend([
            no_page,
            no_space,
            kernel.occupancy() as i32,
            hosted.pages_outstanding() as i32 - pages,
        ]);
        ctx.idle();
    });

    assert!(h.run_until(|_| logged(&out).len() == 4, 20));
    assert_eq!(
        logged(&out),
        [err(SysError::OutOfMemory), err(SysError::OutOfMemory), 1, 0]
    );
    assert_eq!(h.hosted().spaces_live(), 1);
}

#[test]
fn test_fork_with_full_table_fails() {
    let h = Harness::new();
    let out = log();

    let o = out.clone();
    h.boot(move |ctx| {
        let kernel = ctx.kernel();
        {
            // Ocupa todos os slots livres sem criar unidades de verdade
            let mut table = kernel.lock_table();
            for unit in table.units.iter_mut().filter(|u| !u.is_live()) {
                unit.state = UnitState::Embryo;
            }
        }
        let full = ctx.fork(CHILD);
        let occupancy = kernel.occupancy() as i32;
        {
            let mut table = kernel.lock_table();
            for unit in table.units.iter_mut().filter(|u| u.pid.is_none()) {
                unit.state = UnitState::Unused;
            }
        }
        o.lock().unwrap().extend([full, occupancy]);
        ctx.idle();
    });

    assert!(h.run_until(|_| logged(&out).len() == 2, 20));
    assert_eq!(logged(&out), [err(SysError::TooManyProcesses), NPROC as i32]);
    assert_eq!(h.kernel().occupancy(), 1);
}

#[test]
fn test_slot_reuse_does_not_leak_previous_occupant() {
    let h = Harness::new();
    let out = log();

    h.program(CHILD, |ctx| ctx.exit());

    let o = out.clone();
    h.boot(move |ctx| {
        let first = ctx.fork(CHILD);
        ctx.kill(first);
        ctx.wait();
        let second = ctx.fork(CHILD);
        let snapshot = ctx.kernel().snapshot();
        let reused = snapshot
            .iter()
            .find(|u| u.pid == Some(Pid::new(second as u32)));
        let killed = reused.map_or(-1, |u| u.killed as i32);
        ctx.wait();
        o.lock().unwrap().extend([first, second, killed]);
        ctx.idle();
    });

    assert!(h.run_until(|_| logged(&out).len() == 3, 50));
    // Mesmo slot, id novo, sem o kill do ocupante anterior
    assert_eq!(logged(&out), [2, 3, 0]);
}

#[test]
fn test_procdump_syscall_counts_live_units() {
    let h = Harness::new();
    let out = log();

    h.program(CHILD, |ctx| ctx.idle());

    let o = out.clone();
    h.boot(move |ctx| {
        ctx.fork(CHILD);
        let ret = ctx.procdump();
        o.lock().unwrap().push(ret);
        ctx.idle();
    });

    assert!(h.run_until(|_| logged(&out).len() == 1, 20));
    assert_eq!(logged(&out), [2]);
}

#[test]
fn test_unknown_syscall_is_not_implemented() {
    let h = Harness::new();
    let out = log();

    let o = out.clone();
    h.boot(move |ctx| {
        let ret = ctx.syscall(0x7f, [0; 5]);
        o.lock().unwrap().push(ret);
        ctx.idle();
    });

    assert!(h.run_until(|_| logged(&out).len() == 1, 20));
    assert_eq!(logged(&out), [err(SysError::NotImplemented)]);
}
