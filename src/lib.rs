//! # journal-recall
//!
//! Load journal entries from CSV exports into Postgres with an embedding per
//! entry, then search and summarize them by meaning.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌────────────────┐
//! │   CSV    │──▶│ Tokens+Embed │──▶│   Postgres     │
//! │  export  │   │  (OpenAI)    │   │  + pgvector    │
//! └──────────┘   └──────────────┘   └───────┬────────┘
//!                                           │
//!                      ┌────────────────────┤
//!                      ▼                    ▼
//!                 ┌──────────┐       ┌─────────────┐
//!                 │  search  │       │  summarize  │
//!                 │          │       │ (chat API)  │
//!                 └──────────┘       └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! recall init                                  # create table + extension
//! recall load --file entries.csv --dry-run     # token and cost estimate
//! recall load --file entries.csv               # embed and store new entries
//! recall search --query "trips to the coast"
//! recall summarize --query "how work felt in spring"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Entry data types |
//! | [`csv_source`] | CSV export reader |
//! | [`timestamp`] | Textual ↔ nullable timestamp conversion |
//! | [`tokens`] | Token counting and cost estimate |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`chat`] | Chat-completion client |
//! | [`store`] | Entry storage (Postgres and in-memory) |
//! | [`load`] | Incremental load pipeline |
//! | [`search`] | Similarity search |
//! | [`summarize`] | Retrieval-augmented summary |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema setup |

pub mod chat;
pub mod config;
pub mod csv_source;
pub mod db;
pub mod embedding;
pub mod get;
pub mod load;
pub mod logging;
pub mod migrate;
pub mod models;
pub mod openai;
pub mod progress;
pub mod search;
pub mod stats;
pub mod store;
pub mod summarize;
pub mod timestamp;
pub mod tokens;
