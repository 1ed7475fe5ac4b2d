// src/insights/mod.rs
//! Services composing the generative client with warehouse trend queries:
//! prompt construction and output parsing.

pub mod career;
pub mod roadmap;
pub mod synthesis;
pub mod trend_cards;
