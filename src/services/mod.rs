// src/services/mod.rs
pub mod chart;
pub mod layout;
pub mod market_data;
pub mod report;
pub mod returns;
pub mod writer;
