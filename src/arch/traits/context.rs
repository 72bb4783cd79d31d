//! Troca de contexto crua.
//!
//! Único ponto onde a execução passa do estado de registradores de uma
//! unidade para o de outra. Todo o resto do scheduler é fluxo de controle
//! comum.

/// Continuação executada na PRIMEIRA vez que uma unidade recém-criada é
/// trocada para dentro. Nunca retorna: termina no caminho kernel→usuário.
#[derive(Clone, Copy)]
pub struct FirstResume {
    pub entry: unsafe extern "C" fn(*const ()) -> !,
    pub arg: *const (),
}

/// Primitiva de troca de contexto.
///
/// # Safety
///
/// Implementações devem salvar em `old` tudo o que for necessário para
/// retomar o chamador exatamente no retorno de `switch`, e só então carregar
/// `new`. Um contexto de primeira execução deve chamar `FirstResume::entry`
/// com `arg` na kernel stack fornecida.
pub unsafe trait ContextSwitch {
    /// Registradores salvos enquanto a unidade não está rodando.
    type Context;

    /// Contexto vazio, preenchido pelo primeiro `switch` que o usa como `old`
    /// (o contexto do loop de despacho de cada CPU).
    fn boot_context(&self) -> Self::Context;

    /// Monta o contexto de primeira execução de uma unidade.
    ///
    /// # Safety
    ///
    /// `stack_top` deve ser o topo de uma região de stack válida, exclusiva da
    /// unidade e viva até o reap.
    unsafe fn first_resume_context(
        &self,
        stack_top: *mut u8,
        resume: FirstResume,
    ) -> Self::Context;

    /// Salva o contexto atual em `old` e retoma `new`.
    ///
    /// # Safety
    ///
    /// - Interrupções devem estar desabilitadas
    /// - `old` e `new` devem ser ponteiros válidos e distintos
    /// - `new` precisa ter sido salvo por um `switch` anterior ou criado por
    ///   `first_resume_context`
    unsafe fn switch(&self, old: *mut Self::Context, new: *const Self::Context);
}
