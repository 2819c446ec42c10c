pub mod error;
pub mod handlers;
pub mod logging;
pub mod routes;
pub mod server;
pub mod sessions;
pub mod state;

pub use error::*;
pub use routes::*;
pub use server::*;
pub use sessions::{SessionStore, SESSION_HEADER};
pub use state::*;
