mod init;
mod state;
mod step;
mod watchers;

pub use init::load_world_config;
pub use state::{App, Motion};
