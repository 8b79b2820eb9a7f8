pub mod mappings;
pub mod run;
