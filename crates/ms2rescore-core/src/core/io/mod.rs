//! Writers for the configuration files consumed by external tools.

pub mod ms2pip_config;
