pub mod database_migration;
pub mod manage_events;
pub mod sample_data;
