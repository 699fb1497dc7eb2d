//! Session state with actor pattern
//!
//! SessionStore owns every live SessionState and processes messages via
//! channels, serializing all access per session.

mod messages;
mod session;
mod store;

pub use messages::{SessionCommand, StoreError, StoreResponse};
pub use session::{SessionId, SessionState};
pub use store::SessionStore;
