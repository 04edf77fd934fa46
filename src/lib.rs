// ==========================================
// Marking Maestro - Core library
// ==========================================
// Stack: Rust + SQLite
// Purpose: allocate marking of assessment tasks to teachers,
// then track marking progress
// ==========================================

// ==========================================
// Modules
// ==========================================

// Domain layer - entities and types
pub mod domain;

// Repository layer - data access
pub mod repository;

// Engine layer - allocation and progress rules
pub mod engine;

// Import layer - roster files
pub mod importer;

// Config layer
pub mod config;

// Database setup (connection PRAGMAs, schema)
pub mod db;

// Logging
pub mod logging;

// API layer
pub mod api;

// Application layer - wiring
pub mod app;

// ==========================================
// Re-exports
// ==========================================

pub use domain::{
    Allocation, AllocationPatch, Class, ClassId, LeaveInterval, ProgressRecord, ProgressUpdate,
    Task, TaskId, TaskStatus, Teacher, TeacherId,
};

pub use engine::{AllocationEngine, AllocationRunResult, MarkingWindow, RosterSnapshot};

pub use api::{AllocationApi, ApiError, ApiResult, DashboardApi, ImportApi, ProgressApi};

// ==========================================
// Constants
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "Marking Maestro";
