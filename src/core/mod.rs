//! Core Module
//!
//! Infraestrutura central independente de arquitetura. Por enquanto apenas
//! o sistema de logging zero-overhead.

pub mod logging;
