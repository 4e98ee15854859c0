// Test modules

pub mod common;
mod health_check_test;
