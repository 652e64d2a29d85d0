// warden-core/src/lib.rs

#![allow(missing_docs)]
// Memory safety
#![deny(unsafe_code)]
// Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (Interfaces / Traits)
// Contracts the pipeline needs from the outside world (RecordStore).
pub mod ports;

// 2. Domain (Pure pipeline logic)
// Profiler, rule generation/execution, incidents, dashboard, truth enforcement.
// Depends on nothing else (no infra, no app).
pub mod domain;

// 3. Infrastructure (Adapters)
// In-memory keyed table store, pipeline configuration.
pub mod infrastructure;

// 4. Application (Use Cases)
// The control-plane orchestrator and the request/response contract.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
pub use error::WardenError;
