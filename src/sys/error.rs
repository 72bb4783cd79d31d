//! Códigos de Erro do Forge
//!
//! Erros recuperáveis do núcleo de processos. São devolvidos ao chamador
//! imediato e, na fronteira de syscall, viram valores negativos em EAX.
//!
//! Violações de protocolo (entrar no scheduler sem o lock, init saindo...)
//! NÃO aparecem aqui: são `panic!`.

/// Enum de erros do sistema.
///
/// Valores são i32 para permitir representação negativa em isize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SysError {
    // === Erros Gerais (1-15) ===
    /// Objeto não encontrado
    NotFound = 2,
    /// Objeto já existe (segunda unidade de bootstrap)
    AlreadyExists = 3,
    /// Argumento inválido (join em processo, join em si mesmo, grupo diferente)
    InvalidArgument = 4,
    /// Operação interrompida (chamador marcado com kill enquanto esperava)
    Interrupted = 6,

    // === Erros de Memória (32-47) ===
    /// Sem memória disponível (página de kstack, espaço de endereçamento)
    OutOfMemory = 32,
    /// Endereço inválido ou não mapeado
    BadAddress = 33,
    /// Alinhamento incorreto
    BadAlignment = 35,

    // === Erros de Processo (80-95) ===
    /// Processo não encontrado
    ProcessNotFound = 80,
    /// Limite de processos atingido (tabela cheia)
    TooManyProcesses = 81,
    /// wait() sem nenhum filho
    NoChildren = 82,

    // === Erros de Sistema (240-255) ===
    /// Syscall não implementada
    NotImplemented = 254,
}

impl SysError {
    /// Converte para isize negativo (formato de retorno da syscall)
    #[inline]
    pub fn as_isize(self) -> isize {
        -(self as i32 as isize)
    }

    /// Cria erro a partir de código negativo (None se desconhecido)
    pub fn from_code(code: isize) -> Option<Self> {
        if code >= 0 {
            return None;
        }
        let abs = code.unsigned_abs();
        Some(match abs {
            2 => Self::NotFound,
            3 => Self::AlreadyExists,
            4 => Self::InvalidArgument,
            6 => Self::Interrupted,
            32 => Self::OutOfMemory,
            33 => Self::BadAddress,
            35 => Self::BadAlignment,
            80 => Self::ProcessNotFound,
            81 => Self::TooManyProcesses,
            82 => Self::NoChildren,
            254 => Self::NotImplemented,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not found",
            Self::AlreadyExists => "already exists",
            Self::InvalidArgument => "invalid argument",
            Self::Interrupted => "interrupted",
            Self::OutOfMemory => "out of memory",
            Self::BadAddress => "bad address",
            Self::BadAlignment => "bad alignment",
            Self::ProcessNotFound => "no such process",
            Self::TooManyProcesses => "process table full",
            Self::NoChildren => "no children",
            Self::NotImplemented => "not implemented",
        }
    }
}

impl core::fmt::Display for SysError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resultado de syscall: Ok(valor) ou Err(SysError)
pub type SysResult<T> = Result<T, SysError>;

/// Helper para converter SysResult<usize> em isize para retorno
pub fn result_to_isize(result: SysResult<usize>) -> isize {
    match result {
        Ok(val) => val as isize,
        Err(e) => e.as_isize(),
    }
}
