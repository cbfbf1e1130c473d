pub mod compile;
pub mod exe;
pub mod inst;
