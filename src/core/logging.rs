// =============================================================================
// KERNEL LOGGING SYSTEM - ZERO OVERHEAD
// =============================================================================
//
// Sistema de logging do núcleo de processos com custo ZERO quando desligado.
//
// ARQUITETURA:
// - Usa features do Cargo para filtragem em tempo de compilação
// - Com feature "no_logs", TODOS os macros viram expressões vazias
// - SEM core::fmt - apenas strings literais e valores em hexadecimal
// - SEM alocação
// - Escreve no `Console` instalado pelo kernel hospedeiro (serial, buffer de
//   teste...). Sem console instalado a saída é descartada.
//
// NÍVEIS DE LOG (do mais crítico ao menos):
// - ERROR: Violações de protocolo, falhas que não deveriam acontecer
// - WARN:  Situações suspeitas mas recuperáveis (sem slot, sem memória)
// - INFO:  Eventos de ciclo de vida (bootstrap, exit de processo)
// - DEBUG: Criação/reap de unidades
// - TRACE: Cada despacho e troca de contexto
//
// COMO USAR:
//   kinfo!("(Proc) fork concluído");             // Apenas string
//   kinfo!("(Proc) fork PID=", pid.as_u32());    // String + hex
//
// =============================================================================

use spin::Once;

/// Destino das linhas de log (serial, console de vídeo, buffer de teste).
pub trait Console: Sync {
    fn write_str(&self, s: &str);
}

static CONSOLE: Once<&'static dyn Console> = Once::new();

/// Instala o console global. Apenas a primeira chamada tem efeito.
pub fn install(console: &'static dyn Console) {
    CONSOLE.call_once(|| console);
}

#[inline]
pub fn emit_str(s: &str) {
    if let Some(console) = CONSOLE.get() {
        console.write_str(s);
    }
}

pub fn emit_nl() {
    emit_str("\n");
}

/// Emite `0x` seguido do valor em hexadecimal, sem passar por core::fmt.
pub fn emit_hex(value: u64) {
    let mut buf = [0u8; 16];
    emit_str("0x");
    emit_str(hex_digits(value, &mut buf));
}

/// Dígitos hexadecimais de `value` sem zeros à esquerda (pelo menos um).
fn hex_digits(value: u64, buf: &mut [u8; 16]) -> &str {
    for (i, slot) in buf.iter_mut().enumerate() {
        let nibble = ((value >> ((15 - i) * 4)) & 0xF) as u8;
        *slot = match nibble {
            0..=9 => b'0' + nibble,
            _ => b'a' + (nibble - 10),
        };
    }

    let first = buf[..15].iter().position(|&b| b != b'0').unwrap_or(15);
    core::str::from_utf8(&buf[first..]).unwrap_or("?")
}

// =============================================================================
// PREFIXOS COM CORES ANSI
// =============================================================================

pub const P_ERROR: &str = "\x1b[1;31m[ERRO]\x1b[0m ";
pub const P_WARN: &str = "\x1b[1;33m[WARN]\x1b[0m ";
pub const P_INFO: &str = "\x1b[32m[INFO]\x1b[0m ";
pub const P_DEBUG: &str = "\x1b[36m[DEBG]\x1b[0m ";
pub const P_TRACE: &str = "\x1b[35m[TRAC]\x1b[0m ";

// =============================================================================
// MACROS DE LOG
// =============================================================================

/// Corpo comum dos macros de nível. Não usar diretamente.
#[doc(hidden)]
#[macro_export]
macro_rules! __klog_line {
    ($prefix:expr, $msg:expr) => {{
        $crate::core::logging::emit_str($prefix);
        $crate::core::logging::emit_str($msg);
        $crate::core::logging::emit_nl();
    }};
    ($prefix:expr, $msg:expr, $val:expr) => {{
        $crate::core::logging::emit_str($prefix);
        $crate::core::logging::emit_str($msg);
        $crate::core::logging::emit_hex($val as u64);
        $crate::core::logging::emit_nl();
    }};
}

// kerror! - Sempre ativo (exceto com no_logs)
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kerror {
    ($msg:expr) => {
        $crate::__klog_line!($crate::core::logging::P_ERROR, $msg)
    };
    ($msg:expr, $val:expr) => {
        $crate::__klog_line!($crate::core::logging::P_ERROR, $msg, $val)
    };
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kerror {
    ($($t:tt)*) => {{}};
}

// kwarn! - Ativo exceto com no_logs
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kwarn {
    ($msg:expr) => {
        $crate::__klog_line!($crate::core::logging::P_WARN, $msg)
    };
    ($msg:expr, $val:expr) => {
        $crate::__klog_line!($crate::core::logging::P_WARN, $msg, $val)
    };
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kwarn {
    ($($t:tt)*) => {{}};
}

// kinfo! - Ativo com log_info, log_debug ou log_trace
#[cfg(all(
    not(feature = "no_logs"),
    any(feature = "log_info", feature = "log_debug", feature = "log_trace")
))]
#[macro_export]
macro_rules! kinfo {
    ($msg:expr) => {
        $crate::__klog_line!($crate::core::logging::P_INFO, $msg)
    };
    ($msg:expr, $val:expr) => {
        $crate::__klog_line!($crate::core::logging::P_INFO, $msg, $val)
    };
}

#[cfg(not(all(
    not(feature = "no_logs"),
    any(feature = "log_info", feature = "log_debug", feature = "log_trace")
)))]
#[macro_export]
macro_rules! kinfo {
    ($($t:tt)*) => {{}};
}

// kdebug! - Ativo com log_debug ou log_trace
#[cfg(all(
    not(feature = "no_logs"),
    any(feature = "log_debug", feature = "log_trace")
))]
#[macro_export]
macro_rules! kdebug {
    ($msg:expr) => {
        $crate::__klog_line!($crate::core::logging::P_DEBUG, $msg)
    };
    ($msg:expr, $val:expr) => {
        $crate::__klog_line!($crate::core::logging::P_DEBUG, $msg, $val)
    };
}

#[cfg(not(all(
    not(feature = "no_logs"),
    any(feature = "log_debug", feature = "log_trace")
)))]
#[macro_export]
macro_rules! kdebug {
    ($($t:tt)*) => {{}};
}

// ktrace! - Ativo apenas com log_trace
#[cfg(all(not(feature = "no_logs"), feature = "log_trace"))]
#[macro_export]
macro_rules! ktrace {
    ($msg:expr) => {
        $crate::__klog_line!($crate::core::logging::P_TRACE, $msg)
    };
    ($msg:expr, $val:expr) => {
        $crate::__klog_line!($crate::core::logging::P_TRACE, $msg, $val)
    };
}

#[cfg(not(all(not(feature = "no_logs"), feature = "log_trace")))]
#[macro_export]
macro_rules! ktrace {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS AUXILIARES
// =============================================================================

/// klog! - Log genérico sem prefixo de nível e sem newline.
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! klog {
    ($msg:expr) => {{
        $crate::core::logging::emit_str($msg);
    }};
    ($msg:expr, $val:expr) => {{
        $crate::core::logging::emit_str($msg);
        $crate::core::logging::emit_hex($val as u64);
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! klog {
    ($($t:tt)*) => {{}};
}

/// knl! - Emite apenas newline.
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! knl {
    () => {{
        $crate::core::logging::emit_nl();
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! knl {
    () => {{}};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_digits_trims_leading_zeros() {
        let mut buf = [0u8; 16];
        assert_eq!(hex_digits(0x2a, &mut buf), "2a");
        assert_eq!(hex_digits(0xffff_ffff, &mut buf), "ffffffff");
        assert_eq!(hex_digits(u64::MAX, &mut buf), "ffffffffffffffff");
    }

    #[test]
    fn test_hex_digits_zero_keeps_one_digit() {
        let mut buf = [0u8; 16];
        assert_eq!(hex_digits(0, &mut buf), "0");
    }

    #[test]
    fn test_emit_without_console_is_silent() {
        // Sem console instalado (ou com qualquer console) não deve entrar em pânico
        emit_hex(0x1234);
        emit_nl();
    }
}
