//! # File Table
//!
//! Tabela de descritores por unidade: `NOFILE` slots, índice = fd.

use super::FileOps;
use crate::sched::config::NOFILE;

pub struct FileTable<F> {
    slots: [Option<F>; NOFILE],
}

impl<F> FileTable<F> {
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
        }
    }

    /// Instala `file` no menor fd livre. Devolve o arquivo se a tabela está cheia.
    pub fn alloc(&mut self, file: F) -> Result<usize, F> {
        match self.slots.iter().position(Option::is_none) {
            Some(fd) => {
                self.slots[fd] = Some(file);
                Ok(fd)
            }
            None => Err(file),
        }
    }

    pub fn get(&self, fd: usize) -> Option<&F> {
        self.slots.get(fd).and_then(Option::as_ref)
    }

    /// Número de descritores abertos.
    pub fn open_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Duplica cada descritor aberto, preservando os números (fork/clone).
    pub fn duplicate<O>(&self, ops: &O) -> Self
    where
        O: FileOps<File = F> + ?Sized,
    {
        Self {
            slots: core::array::from_fn(|fd| self.slots[fd].as_ref().map(|f| ops.dup_file(f))),
        }
    }

    /// Esvazia a tabela, entregando os arquivos para serem fechados fora do lock.
    pub fn take_all(&mut self) -> impl Iterator<Item = F> + '_ {
        self.slots.iter_mut().filter_map(Option::take)
    }
}

impl<F> Default for FileTable<F> {
    fn default() -> Self {
        Self::new()
    }
}
