//! Core use-case services.
//!
//! # Responsibility
//! - Wrap a `Storager` backend into caller-facing APIs.
//! - Keep CLI and embedding layers decoupled from backend details.

pub mod catalog_service;
