//! Minimal host for a generated backend. `models`, `services` and `routes`
//! are written by the generator before this crate is built.

pub mod models;
pub mod routes;
pub mod services;
