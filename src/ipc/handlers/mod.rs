pub mod analytics;
pub mod attendance;
pub mod backup;
pub mod batches;
pub mod core;
pub mod notifications;
pub mod results;
pub mod students;
pub mod tests;
