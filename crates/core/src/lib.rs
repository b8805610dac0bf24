//! Domain primitives shared by every ledger crate: part and model identities,
//! the error type, and the aggregate traits. No IO lives here.

pub mod aggregate;
pub mod error;
pub mod id;

pub use aggregate::{Aggregate, AggregateRoot};
pub use error::{DomainError, DomainResult, Shortfall, Shortfalls};
pub use id::{ModelName, PartKey};
