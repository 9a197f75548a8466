#![deny(clippy::all, clippy::pedantic)]
#![deny(missing_docs)]
#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]
//! # veracross
//!
//! veracross is a convenient wrapper library around the Veracross v3 REST API.
//!
//! This library can:
//! - fetch an OAuth2 [`Token`] with the client-credentials grant
//! - pull every page of an endpoint into [`Records`]
//! - resolve coded values with the [`ValueLists`] sent alongside the data
//!
//! While respecting:
//! - `X-Rate-Limit-Remaining` / `X-Rate-Limit-Reset` headers (see [`RateLimit`]).
//! - `X-Page-Size` / `X-Page-Number` pagination with `X-Total-Count`.
//!
//! ## Example: Printing every student's name.
//!
//! ```no_run
//! # type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
//! use veracross::{Client, Query};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut client = Client::new("demo", "client-id", "client-secret")?;
//!     client.get_token(["students:list"]).await?;
//!
//!     let query = Query::new().filter("grade_level", 9);
//!     let students = client.pull_resolved("students", &query).await?;
//!
//!     for student in students.iter() {
//!         println!("{}", student["last_name"]);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! [`Token`]:      crate::token::Token
//! [`Records`]:    crate::records::Records
//! [`ValueLists`]: crate::value_lists::ValueLists
//! [`RateLimit`]:  crate::rate_limit::RateLimit

/// Client module contains [`Client`] for fetching tokens and pulling data.
pub mod client;

/// Contains [`Error`]s that can be thrown by the libary.
///
/// [`Error`]: crate::error::Error
pub mod error;

/// Contains [`Query`] for filtering a pull.
pub mod query;

/// Contains [`RateLimit`], the rate-limit state reported by the API.
///
/// [`RateLimit`]: crate::rate_limit::RateLimit
pub mod rate_limit;

pub(crate) mod models;

/// Contains the crate's [`Result`] alias.
///
/// [`Result`]: crate::result::Result
pub mod result;

pub use client::{Client, ClientBuilder};
pub use error::Error;
pub use models::*;
pub use query::Query;
pub use value_lists::apply_value_lists;
