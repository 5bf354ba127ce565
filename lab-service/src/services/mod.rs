//! Business logic and persistence for lab-service.

mod account;
mod components;
mod database;
pub mod error;
mod jwt;
mod memory;
mod notifier;
pub mod policy;
mod records;
pub mod store;

pub use account::AccountService;
pub use components::ComponentService;
pub use database::Database;
pub use error::ServiceError;
pub use jwt::{JwtService, SessionClaims, TokenError};
pub use memory::MemoryStore;
pub use notifier::{LogNotifier, MockNotifier, ResetNotifier};
pub use policy::{authorize, permits, Capability, GateError};
pub use records::RecordService;
pub use store::{AccountStore, ComponentStore, RecordStore, StoreError};
