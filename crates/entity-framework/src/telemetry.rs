//! # Observability
//!
//! The engine logs through `tracing` with structured fields rather than
//! formatted messages: `entity_type` and `id` on every entity event, `route` on
//! every request, `event` on every dispatch.
//!
//! | Level   | What                                                       |
//! |---------|------------------------------------------------------------|
//! | `info`  | dispatcher start/shutdown, scope invalidation              |
//! | `debug` | actor creation, materialization, fold outcomes, dispatches |
//! | `warn`  | failed requests, failed dispatches, rejected config values |
//!
//! ```bash
//! RUST_LOG=info cargo run
//! RUST_LOG=entity_framework=debug cargo run
//! ```

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
///
/// Call once, at the top of `main`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
