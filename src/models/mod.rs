pub mod advertisement;
pub mod rbac;
pub mod token;
pub mod user;
