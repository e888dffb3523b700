//! Silo: a declarative SQL statement-map engine.
//!
//! Statement definitions live in TOML documents: parameterized SQL text
//! marked with `$name$` placeholders, plus result-shape declarations that
//! map columns onto registered record types. At startup the definitions
//! compile into immutable execution plans; at call time an argument value
//! binds into positional parameters, the statement runs through a pooled
//! connection or an open transaction, and result rows materialize back
//! into typed values.
//!
//! ```rust,no_run
//! use silo::{Params, RecordDescriptor, Registry};
//!
//! #[derive(Debug, Default)]
//! struct Person {
//!     id: i64,
//!     name: String,
//! }
//!
//! # async fn demo() -> silo::Result<()> {
//! let registry = Registry::new();
//! let db = registry.get("main");
//! db.register_record(
//!     RecordDescriptor::of::<Person>("Person")
//!         .field("id", |p: &mut Person, v: i64| p.id = v)
//!         .field("name", |p: &mut Person, v: String| p.name = v)
//!         .build(),
//! )?;
//! registry.start("conf/db").await?;
//!
//! let found = db
//!     .query_one("person.find", &Params::scalar(42i64))
//!     .await?
//!     .and_then(|row| row.into_record::<Person>());
//! # let _ = found;
//! # Ok(())
//! # }
//! ```

pub use silo_core::*;
