//! Cached data-access layer and media ingestion pipeline for a photo-sharing
//! backend.
//!
//! The crate is organized in layers:
//!
//! - [`domain`] holds the persistent records and value types.
//! - [`infra`] abstracts the entity backend ([`infra::EntityStore`]), the
//!   object store ([`infra::ObjectStore`]), and telemetry setup, with
//!   in-memory implementations for both stores.
//! - [`cache`] provides TTL-bounded caches and the typed registry the service
//!   reads through.
//! - [`application`] exposes [`application::DataService`], the single mediator
//!   for entity access, and [`application::MediaPipeline`] for turning an
//!   uploaded byte stream into a published image with resolution variants.
//! - [`config`] layers file and `LUMINA__`-prefixed environment settings into
//!   [`config::CoreConfig`].

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;

pub use application::{DataService, MediaPipeline, ServiceError};
pub use config::CoreConfig;
