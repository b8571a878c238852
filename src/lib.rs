pub mod audit;
pub mod casework;
pub mod classify;
pub mod config;
pub mod intake;
pub mod model;
pub mod reports;
pub mod store;
pub mod workflow;

// Re-export commonly used types for convenience.
pub use audit::{AuditEvent, AuditLog, EventType};
pub use classify::{ClassificationOutcome, ClassificationResult, ConflictClassifier, Typology};
pub use config::{ensure_workspace_structure, workspace_root, AppConfig, WorkspacePaths};
pub use model::{CaseStatus, ConflictCase, RiskLevel, UserProfile, UserRole};
pub use store::DirectoryStore;
pub use workflow::{route, RouteAssignment};
