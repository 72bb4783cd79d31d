//! Canais de sleep/wakeup

use crate::sys::Pid;

/// Valor opaco que liga quem dorme a quem acorda. Só a igualdade importa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// A própria unidade (wait/join dormem em si mesmos; exit acorda o pai)
    Unit(Pid),
    /// Endereço de um objeto do kernel (condvar, buffer, ...)
    Addr(usize),
}

impl Channel {
    /// Canal de um objeto qualquer, pelo seu endereço.
    pub fn of<T>(object: &T) -> Self {
        Self::Addr(object as *const T as usize)
    }
}
