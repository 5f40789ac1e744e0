pub mod db;
pub mod models;

pub use db::{Database, DatabaseStats};
pub use models::{
    Clearance, Fingerprint, NewClearance, NewFingerprint, NewOffence, NewUser, Offence, Role, User,
};
