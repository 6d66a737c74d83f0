//! Stateless domain types shared by the engine and the workflows.

pub mod feature_set;
pub mod files;
pub mod io;
pub mod modification;
pub mod peprec;
pub mod pipeline;
