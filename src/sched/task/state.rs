//! Estados e tipos de unidade

/// Estado de uma unidade de execução
///
/// ```text
/// Unused → Embryo → Runnable ⇄ Running → { Sleeping → Runnable, Zombie } → Unused
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    /// Slot livre; nenhum outro campo tem significado
    Unused,
    /// Slot reservado, kernel stack ainda sendo montada
    Embryo,
    /// Pronta para executar
    Runnable,
    /// Executando em alguma CPU
    Running,
    /// Bloqueada em um canal
    Sleeping,
    /// Terminada, esperando reap (wait para processos, join para threads)
    Zombie,
}

impl UnitState {
    /// Pode ser escolhida pelo loop de despacho?
    pub const fn is_runnable(self) -> bool {
        matches!(self, Self::Runnable)
    }

    /// Rótulo de largura fixa para o procdump
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unused => "unused",
            Self::Embryo => "embryo",
            Self::Runnable => "runble",
            Self::Running => "run   ",
            Self::Sleeping => "sleep ",
            Self::Zombie => "zombie",
        }
    }
}

/// Processo (dono do espaço de endereçamento) ou thread (compartilha o do processo)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Process,
    Thread,
}

impl UnitKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Process => "proc",
            Self::Thread => "thrd",
        }
    }
}
