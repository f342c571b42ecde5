pub mod repo;
pub mod state_file;
