pub mod context;
pub(crate) mod operations;
pub mod pool;
pub mod scheduler;
