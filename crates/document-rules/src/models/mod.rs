//! 文档模型

pub mod user;

pub use user::{Emails, Gender, User, UserDocument};
