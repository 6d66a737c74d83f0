pub mod config;
pub mod run;
pub mod tools;
