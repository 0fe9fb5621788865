pub mod inverted;
pub mod posting;
pub mod key;
pub mod string;
pub mod integer;
pub mod full_text;
pub mod boolean;
