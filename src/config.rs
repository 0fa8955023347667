pub mod options;
pub mod user;

pub use options::ConnectionOptions;
pub use user::{load_options, load_user_options, user_options_path};
