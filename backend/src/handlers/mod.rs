// src/handlers/mod.rs

pub mod attempt;
pub mod health;
pub mod leaderboard;
pub mod quiz;
pub mod tutor;
