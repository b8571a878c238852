use std::fs;

use cuentame::audit::AuditLog;
use cuentame::config::{StorageSettings, WorkspacePaths};
use cuentame::store::DirectoryStore;
use tempfile::TempDir;

/// Self-contained workspace rooted in a temp directory.
pub struct IntegrationHarness {
    _workspace: TempDir,
    pub paths: WorkspacePaths,
}

impl IntegrationHarness {
    pub fn new() -> Self {
        let workspace = TempDir::new().expect("failed to create temp workspace");
        let root = workspace.path().to_path_buf();
        let paths = WorkspacePaths {
            store_dir: root.join("store"),
            reports_dir: root.join("reports"),
            root,
        };
        fs::create_dir_all(&paths.store_dir).expect("failed to create store dir");
        fs::create_dir_all(&paths.reports_dir).expect("failed to create reports dir");
        Self {
            _workspace: workspace,
            paths,
        }
    }

    pub fn store(&self) -> DirectoryStore {
        self.store_with_seed(false)
    }

    pub fn store_with_seed(&self, seed_demo_accounts: bool) -> DirectoryStore {
        let settings = StorageSettings { seed_demo_accounts };
        DirectoryStore::open(&self.paths, &settings).expect("failed to open store")
    }

    pub fn audit(&self) -> AuditLog {
        AuditLog::for_workspace(&self.paths)
    }
}


mod intake_flow;
mod login;
mod store_roundtrip;
