//! shop-types: domain model and ports shared by every shop crate

pub mod domain;
pub mod ports;
