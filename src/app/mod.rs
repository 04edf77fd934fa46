// ==========================================
// Marking Maestro - Application layer
// ==========================================
// Responsibility: wire repositories and APIs for the CLI
// ==========================================

pub mod state;

pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
