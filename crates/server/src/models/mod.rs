//! Domain models backed by the local database.

pub mod product;
pub mod user;

pub use product::{MirrorFields, NewMirror, ProductMirror};
pub use user::{NewUser, User};
