mod fuse;
pub mod plan;
