//! Person API Library
//!
//! CRUD over people stored in Postgres, with gender and nationality inferred
//! from the first name by two external lookup services when a person is
//! created.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `db`: Database connection pool and migrations.
//! - `db_storage`: Persistence gateway trait and Postgres implementation.
//! - `memory_storage`: In-process persistence gateway for tests.
//! - `enrichment`: Gender/nationality enrichment with confidence thresholds.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers and router.
//! - `models`: Person and request/response models.
//! - `openapi`: OpenAPI document.
//! - `person_service`: Person operations.
//! - `services`: Name lookup service clients.

pub mod config;
pub mod db;
pub mod db_storage;
pub mod enrichment;
pub mod errors;
pub mod handlers;
pub mod memory_storage;
pub mod models;
pub mod openapi;
pub mod person_service;
pub mod services;
