//! Unidades de execução (processos e threads)

pub mod entity;
pub mod exit;
pub mod lifecycle;
pub mod state;

pub use entity::Unit;
pub use state::{UnitKind, UnitState};
