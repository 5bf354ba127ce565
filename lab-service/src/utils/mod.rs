pub mod password;
pub mod token;
pub mod validation;

pub use password::{
    dummy_password_hash, hash_password, verify_password, Password, PasswordHashString,
};
pub use token::{digest_token, generate_reset_token};
pub use validation::{non_blank, ValidatedJson};
