pub mod parsing;
pub mod tokenization;
