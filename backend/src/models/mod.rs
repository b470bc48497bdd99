// src/models/mod.rs

pub mod assessment;
pub mod attempt;
pub mod leaderboard;
pub mod question;
pub mod result;
pub mod user;
