//! Shared plumbing for the capcheck workspace.
//!
//! Today this is only the [`observability`] module: a centralised `tracing`
//! initialiser that binaries and integration tests go through so they all emit
//! into the same rolling file sink. Error types deliberately live next to the
//! code that produces them (`capcheck-http`, `capcheck-social`, `capcheck-llm`)
//! rather than here.

pub mod observability;
