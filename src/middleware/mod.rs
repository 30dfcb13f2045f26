// src/middleware/mod.rs
pub mod rate_limit;
