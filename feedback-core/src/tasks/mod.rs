pub mod token_refresh;
pub mod cache_maintenance;

pub use token_refresh::spawn_token_refresh_task;
pub use cache_maintenance::{run_sweep, spawn_cache_sweep_task};
