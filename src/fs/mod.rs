//! Arquivos vistos pelo núcleo de processos.
//!
//! O VFS é um colaborador externo: o núcleo só duplica e fecha referências
//! a arquivos abertos e ao diretório corrente, na criação e no término de
//! unidades.

pub mod table;

pub use table::FileTable;

/// Operações de referência sobre arquivos e diretórios (filedup/fileclose,
/// idup/iput, namei("/")).
pub trait FileOps {
    type File: Send;
    type Dir: Send;

    /// Nova referência para o mesmo arquivo aberto.
    fn dup_file(&self, file: &Self::File) -> Self::File;

    /// Solta uma referência para arquivo aberto.
    fn close_file(&self, file: Self::File);

    /// Nova referência para o mesmo diretório.
    fn dup_dir(&self, dir: &Self::Dir) -> Self::Dir;

    /// Solta uma referência para diretório.
    fn release_dir(&self, dir: Self::Dir);

    /// Diretório raiz ("/"), para a unidade de bootstrap.
    fn root_dir(&self) -> Option<Self::Dir>;
}
