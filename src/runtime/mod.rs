pub mod builtins;
pub mod module;
pub mod value;
pub mod vm;
