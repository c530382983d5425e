pub mod apply;
mod documents;
pub mod init;
pub mod migrate;
pub mod validate;

pub use apply::{apply, ApplyArgs};
pub use init::{init, InitArgs};
pub use migrate::{migrate, MigrateArgs};
pub use validate::{validate, ValidateArgs};
