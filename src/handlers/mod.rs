// handlers/mod.rs - Two-tier handler layout
//
// Public (no bearer token required) and Protected (bearer token resolved to a
// caller before any datastore write). Route wiring lives in app.rs.

pub mod protected;
pub mod public;
