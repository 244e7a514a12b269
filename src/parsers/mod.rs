pub mod fact;


pub use fact::{FactExtractor, extract_fact_line};
