pub mod config;
pub mod db;
pub mod entities;
pub mod services;
