pub mod runs;
pub mod start;

pub use runs::resolve_run;
pub use start::select_start_time;
