mod auth;
mod status;
mod store;

pub use auth::{TokenAction, TokenManager};
pub use status::{EXPIRY_LOOKAHEAD_SECS, TokenStatus};
pub use store::{CredentialStore, FileBackend, MemoryBackend, StoreBackend, StoredState};
