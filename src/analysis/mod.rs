pub mod token;
pub mod tokenizer;
