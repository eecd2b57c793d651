// src/utils/mod.rs

pub mod chart;
pub mod hash;
pub mod html;
pub mod session;
