//! # Persona Context
//!
//! A hybrid retrieval engine that grounds synthetic customer personas in
//! ingested documents.
//!
//! Persona Context provides an offline ingestion pipeline that turns a tree
//! of heterogeneous documents (JSON, PDF, DOCX, plain text) into embedded,
//! searchable rows in PostgreSQL, and an online retriever that combines
//! lexical full-text search with vector similarity via Reciprocal Rank
//! Fusion to produce bounded, citable context for a persona prompt.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌───────────────┐
//! │ Source tree │──▶│   Pipeline   │──▶│  PostgreSQL   │
//! │ json/pdf/.. │   │ Chunk+Embed  │   │ tsvector+HNSW │
//! └─────────────┘   └──────────────┘   └──────┬────────┘
//!                                             │
//!                              ┌──────────────┴───────┐
//!                              ▼                      ▼
//!                        ┌──────────┐          ┌──────────────┐
//!                        │  Hybrid  │─────────▶│   Context    │
//!                        │ retriever│   RRF    │  assembler   │
//!                        └──────────┘          └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! pctx init                        # create schema + indexes
//! pctx ingest                      # sync source roots into the store
//! pctx search "meal plan pricing" --persona nutri
//! pctx retrieve nutri "how do you handle objections about cost"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Chunks, identities, retrieval results |
//! | [`chunk`] | Sliding-window text chunking |
//! | [`extract`] | Per-format text extraction |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`store`] | Document store trait + backends |
//! | [`ingest`] | Batch ingestion and garbage collection |
//! | [`search`] | Hybrid search and rank fusion |
//! | [`context`] | Context assembly under a character budget |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema setup |

pub mod chunk;
pub mod config;
pub mod context;
pub mod db;
pub mod embedding;
pub mod extract;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod search;
pub mod store;
