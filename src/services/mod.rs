//! Service layer: canvas mutations and connection lifecycle.

pub mod canvas;
pub mod session;
