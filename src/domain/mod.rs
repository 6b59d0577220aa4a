pub mod domain;
pub mod realize;
pub mod value;
