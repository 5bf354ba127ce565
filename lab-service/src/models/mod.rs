pub mod account;
pub mod component;
pub mod record;
pub mod role;

pub use account::{Account, AccountResponse, AccountUpdate, NewAccount};
pub use component::{Component, NewComponent};
pub use record::{Record, RecordKind};
pub use role::{normalize_roles, Role};
