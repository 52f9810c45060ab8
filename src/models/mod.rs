pub mod subscription;
pub mod user;

pub use subscription::*;
pub use user::*;
