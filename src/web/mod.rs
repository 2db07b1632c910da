//! HTML dashboard: session handling and page handlers

pub mod handlers;
pub mod session;

pub use session::{Session, SessionStore, SESSION_COOKIE};
