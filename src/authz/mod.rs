//! Authorization module - rights evaluation engine
//!
//! A user's roles carry flat rights (read/write/only-own on a model). A request
//! is allowed when the admin role holds any right on the target's model, or when
//! some right reachable from the user grants the action, own-only rights
//! counting only when the user owns the target.

mod evaluator;
mod principal;

pub use evaluator::{Authorizer, RightsStore};
pub use principal::{Principal, ProtectedEntity};

pub use crate::models::rbac::Action;
