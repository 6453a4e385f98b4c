// charrank state managers
// Managers own persisted state: ranking history and favorite creators.

pub mod favorites_manager;
pub mod history_manager;
