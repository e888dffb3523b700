mod as_value;
mod binder;
mod data_source;
mod decode;
mod definition;
mod error;
mod executor;
mod record;
mod registry;
mod statement;
mod template;
mod transaction;
mod value;

pub use ::anyhow::Context;
pub use as_value::*;
pub use binder::*;
pub use data_source::*;
pub use decode::*;
pub use definition::*;
pub use error::*;
pub use executor::*;
pub use record::*;
pub use registry::*;
pub use statement::*;
pub use template::*;
pub use transaction::*;
pub use value::*;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
