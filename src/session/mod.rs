pub mod credentials;
pub mod events;
pub mod store;

pub use credentials::{
    CredentialError, CredentialLifetimes, CredentialPair, CredentialStore, FileCredentialStore,
    MemoryCredentialStore,
};
pub use events::{SessionEvent, SessionEvents};
pub use store::{SessionState, SessionStore};
