//! System Definitions (ABI).
//!
//! Identificadores e códigos de erro compartilhados entre o núcleo de
//! processos e a interface de syscalls.

pub mod error;
pub mod types;

pub use error::{result_to_isize, SysError, SysResult};
pub use types::Pid;
