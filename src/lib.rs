#![allow(non_snake_case)]

pub mod checkin;
pub mod client;
pub mod config;
pub mod logging;
