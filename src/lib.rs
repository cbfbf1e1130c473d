pub mod codegen;
pub mod diag;
pub mod ir;
pub mod parsing;
pub mod resolve;
pub mod runner;
pub mod runtime;
pub mod util;
