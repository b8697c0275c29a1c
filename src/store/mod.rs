//! Session store: every query the service issues against SQLite.
//!
//! Functions take the request's own connection (`&mut SqliteConnection`) so a
//! request never shares a storage session with another one.

pub mod advertisements;
pub mod catalog;
pub mod tokens;
pub mod users;
