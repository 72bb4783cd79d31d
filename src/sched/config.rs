//! Constantes de configuração do núcleo de processos

/// Capacidade da tabela de unidades (processos + threads)
pub const NPROC: usize = 64;

/// Número máximo de CPUs (um loop de despacho por CPU)
pub const NCPU: usize = 8;

/// Descritores de arquivo abertos por unidade
pub const NOFILE: usize = 16;

/// Tamanho de página (kernel stack, stack de thread, unidade de crescimento)
pub const PGSIZE: usize = 4096;

/// Tamanho do nome de diagnóstico, incluindo o NUL
pub const NAME_LEN: usize = 16;

/// Endereço de retorno falso empilhado para a função de entrada de uma
/// thread. Retornar da função faz a thread falhar nesse endereço.
pub const THREAD_RETURN_SENTINEL: u32 = 0xffff_ffff;

/// Nome da unidade de bootstrap
pub const INIT_NAME: &str = "initcode";
