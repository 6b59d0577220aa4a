pub(crate) mod codegen;
pub(crate) mod program;
