//! Topology bootstrapper for KOI-net node deployments.
//!
//! This crate turns the fixed registry of KOI-net nodes (a coordinator
//! plus sensor and processor nodes) into a runnable configuration, in
//! either of two deployment modes: direct local processes or container
//! services.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │   Registry   │───▶│   Context    │───▶│  Documents   │
//! │  (topology)  │    │  (pre-pass)  │    │   (synth)    │
//! └──────────────┘    └──────────────┘    └──────────────┘
//!        │                                       │
//!        ▼                                       ▼
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │    Source    │    │  Env merge   │    │  Artifacts / │
//! │  resolution  │    │  (secrets)   │    │  provision   │
//! └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! The driver in [`bootstrap`] runs these stages sequentially, once per
//! registry row. The coordinator's address is resolved in a context
//! pre-pass before any document is built, so every dependent node's
//! `first_contact` is consistent by construction.

pub mod artifacts;
pub mod bootstrap;
pub mod config;
pub mod context;
pub mod document;
pub mod envmerge;
pub mod error;
pub mod provision;
pub mod secrets;
pub mod source;
pub mod synth;
pub mod topology;
pub mod types;

// Re-export error types
pub use error::{BootstrapError, BootstrapResult};

// Re-export core types
pub use types::{DeployMode, NodeName};

// Re-export the registry and driver entry points
pub use bootstrap::{BootstrapReport, Bootstrapper, NodeReport};
pub use config::OrchestratorConfig;
pub use context::BootstrapContext;
pub use topology::{NodeKind, NodeSpec, Topology};
