//! Espaço de endereçamento compartilhado.

pub mod shared;

pub use shared::SharedSpace;
