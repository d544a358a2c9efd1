//! Identity, identifiers, and bearer credential models.

pub mod credential;
pub mod id;
pub mod identity;
pub mod jwt;

pub use credential::*;
pub use id::{IdentifierError, SubjectId};
pub use identity::*;
pub use jwt::TokenClaims;

pub(crate) use id::def_id;
