//! Tipos fundamentais do sistema

/// Identificador de uma unidade de execução (processo ou thread).
///
/// Atribuído de forma monotônica e nunca reutilizado. Um slot reciclado não
/// tem id: o campo correspondente da tabela vira `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Pid(pub u32);

impl Pid {
    /// Primeiro id entregue pela tabela (a unidade de bootstrap).
    pub const FIRST: Pid = Pid(1);

    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Próximo id da sequência.
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl From<Pid> for usize {
    fn from(pid: Pid) -> usize {
        pid.0 as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_sequence() {
        let a = Pid::FIRST;
        let b = a.next();
        assert_eq!(b.as_u32(), 2);
        assert!(a < b);
        assert_eq!(usize::from(b), 2);
    }
}
