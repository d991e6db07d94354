//! Gateway server implementation

pub mod router;
mod server;

pub use router::{AppState, create_router};
pub use server::Gateway;
