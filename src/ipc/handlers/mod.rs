pub mod assignments;
pub mod backup_exchange;
pub mod behavior;
pub mod classes;
pub mod core;
pub mod students;
