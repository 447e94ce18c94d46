pub mod user;

pub use user::{is_valid_email, User, UserCreate, UserRead, UserUpdate};
