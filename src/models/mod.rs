pub mod alert;
pub mod health;
pub mod inventory;
pub mod kpi;
pub mod script;

pub use alert::*;
pub use health::*;
pub use inventory::*;
pub use kpi::*;
pub use script::*;
