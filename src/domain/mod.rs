//! # Domain
//!
//! Entity model, validation rules, the outcome type, and the operations
//! that tie them to a store.

pub mod errors;
pub mod model;
pub mod service;
pub mod validation;

pub use errors::{Failure, FailureKind, Outcome};
pub use model::{Author, AuthorDetail, Book};
pub use service::AuthorService;
pub use validation::{eq_ignore_case, fold_case, validate_non_empty};
