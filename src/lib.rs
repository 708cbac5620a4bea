//! Listings Proxy Library
//!
//! A small HTTP proxy in front of the YGL real-estate listings API. Requests are
//! validated, mapped onto YGL's form fields, forwarded, and the XML/JSON answer is
//! normalized into a JSON envelope. Search results are cached in memory.
//!
//! # Modules
//!
//! - `api`: Router assembly, CORS and static files.
//! - `cache`: In-process response cache and cache keys.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `field_mapper`: Validated requests to YGL form fields.
//! - `handlers`: HTTP request handlers and the shared pipeline.
//! - `models`: Request bodies and validated request types.
//! - `normalizer`: XML/JSON response normalization.
//! - `validation`: Request-body validation.
//! - `ygl_client`: YGL API client.

pub mod api;
pub mod cache;
pub mod config;
pub mod errors;
pub mod field_mapper;
pub mod handlers;
pub mod models;
pub mod normalizer;
pub mod validation;
pub mod ygl_client;
