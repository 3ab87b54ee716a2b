pub mod config;
pub mod db;
pub mod duration;
pub mod estimate;
pub mod models;
pub mod refill;
