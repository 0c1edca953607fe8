pub mod pipelines;
pub mod ports;
pub mod services;
