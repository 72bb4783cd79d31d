//! Trap frame (i386) e caminho de retorno para o usuário.

use bitflags::bitflags;

/// Seletor de código de usuário: (SEG_UCODE << 3) | DPL_USER
pub const USER_CS: u16 = (3 << 3) | 3;
/// Seletor de dados de usuário: (SEG_UDATA << 3) | DPL_USER
pub const USER_DS: u16 = (4 << 3) | 3;

bitflags! {
    /// Bits do EFLAGS que o núcleo manipula.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EFlags: u32 {
        /// Interrupt enable
        const IF = 1 << 9;
    }
}

/// Registradores salvos na entrada do kernel.
/// Deve corresponder EXATAMENTE à ordem de push do stub de trap (pushal +
/// segmentos + número/erro + frame de hardware).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct TrapFrame {
    // pushal
    pub edi: u32,
    pub esi: u32,
    pub ebp: u32,
    pub oesp: u32,
    pub ebx: u32,
    pub edx: u32,
    pub ecx: u32,
    pub eax: u32,

    // Segmentos
    pub gs: u16,
    pub padding1: u16,
    pub fs: u16,
    pub padding2: u16,
    pub es: u16,
    pub padding3: u16,
    pub ds: u16,
    pub padding4: u16,
    pub trapno: u32,

    // Frame de hardware
    pub err: u32,
    pub eip: u32,
    pub cs: u16,
    pub padding5: u16,
    pub eflags: u32,

    // Apenas em transição de privilégio
    pub esp: u32,
    pub ss: u16,
    pub padding6: u16,
}

impl TrapFrame {
    /// Frame para a primeira entrada em modo usuário: segmentos de usuário,
    /// interrupções ligadas, `eip` e `esp` dados.
    pub fn user_entry(eip: u32, esp: u32) -> Self {
        Self {
            cs: USER_CS,
            ds: USER_DS,
            es: USER_DS,
            ss: USER_DS,
            eflags: EFlags::IF.bits(),
            esp,
            eip,
            ..Self::default()
        }
    }
}

/// Caminho kernel→usuário (trapret).
pub trait TrapReturn {
    /// Restaura `tf` e entra em modo usuário.
    ///
    /// # Safety
    ///
    /// `tf` aponta para o trap frame da unidade corrente, na kernel stack dela.
    unsafe fn return_to_user(&self, tf: *mut TrapFrame) -> !;
}
