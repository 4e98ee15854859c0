pub mod alerts;
pub mod health;
pub mod history;
pub mod kpi;
pub mod script;
pub mod sessions;
pub mod tables;
