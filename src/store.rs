//! Persistence adapter for the profile and case collections.
//!
//! Both collections are JSON arrays on disk, rewritten wholesale on every
//! mutation. Array order carries no meaning; lookups are by field equality.
//! The store assumes a single synchronous writer — a server-backed deployment
//! would have to replace this with per-record concurrency control before
//! admitting concurrent writers.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use uuid::Uuid;

use crate::config::{StorageSettings, WorkspacePaths};
use crate::model::{
    ConflictCase, NotificationKind, UserNotification, UserProfile, UserRole,
};

/// File-backed store for the two top-level collections.
pub struct DirectoryStore {
    paths: WorkspacePaths,
}

impl DirectoryStore {
    /// Opens the store, seeding the demo accounts when the profile collection
    /// has never been written and the policy allows it. A collection file
    /// that exists but cannot be parsed is a hard error, not silent-empty.
    pub fn open(paths: &WorkspacePaths, settings: &StorageSettings) -> Result<Self> {
        let store = Self {
            paths: paths.clone(),
        };
        if settings.seed_demo_accounts && !store.paths.profiles_path().exists() {
            store.write_collection(&store.paths.profiles_path(), &demo_profiles())?;
        }
        Ok(store)
    }

    // --- Collection 1: user profiles (restricted access) ---

    pub fn list_profiles(&self) -> Result<Vec<UserProfile>> {
        self.read_collection(&self.paths.profiles_path())
    }

    /// Looks a profile up by its access code, case-insensitively.
    pub fn profile_by_code(&self, code: &str) -> Result<Option<UserProfile>> {
        let wanted = code.to_uppercase();
        Ok(self
            .list_profiles()?
            .into_iter()
            .find(|p| p.access_code.to_uppercase() == wanted))
    }

    /// Upserts a profile by internal id. Rejects an access code already held
    /// by a different profile, since the code is the foreign key cases carry.
    pub fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        let mut profiles = self.list_profiles()?;
        let wanted = profile.access_code.to_uppercase();
        if profiles
            .iter()
            .any(|p| p.id != profile.id && p.access_code.to_uppercase() == wanted)
        {
            bail!(
                "Access code {} is already assigned to another profile",
                profile.access_code
            );
        }
        match profiles.iter_mut().find(|p| p.id == profile.id) {
            Some(existing) => *existing = profile.clone(),
            None => profiles.push(profile.clone()),
        }
        self.write_collection(&self.paths.profiles_path(), &profiles)
    }

    /// Prepends a notification to the matching profile's inbox. Returns the
    /// stored notification, or `None` when no profile holds the code.
    pub fn append_notification(
        &self,
        code: &str,
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationKind,
        related_case_id: Option<String>,
    ) -> Result<Option<UserNotification>> {
        let mut profiles = self.list_profiles()?;
        let wanted = code.to_uppercase();
        let Some(profile) = profiles
            .iter_mut()
            .find(|p| p.access_code.to_uppercase() == wanted)
        else {
            return Ok(None);
        };
        let note = UserNotification::new(title, message, kind, related_case_id);
        profile.notifications.insert(0, note.clone());
        self.write_collection(&self.paths.profiles_path(), &profiles)?;
        Ok(Some(note))
    }

    /// Records the reporter's answer on exactly the matching notification,
    /// marking it read. Returns the updated profile, or `None` (mutating
    /// nothing) when the profile or notification does not exist.
    pub fn record_reply(
        &self,
        code: &str,
        notification_id: &Uuid,
        text: impl Into<String>,
    ) -> Result<Option<UserProfile>> {
        let mut profiles = self.list_profiles()?;
        let wanted = code.to_uppercase();
        let Some(profile) = profiles
            .iter_mut()
            .find(|p| p.access_code.to_uppercase() == wanted)
        else {
            return Ok(None);
        };
        let Some(note) = profile
            .notifications
            .iter_mut()
            .find(|n| &n.id == notification_id)
        else {
            return Ok(None);
        };
        note.reply = Some(text.into());
        note.reply_date = Some(Utc::now());
        note.read = true;
        let updated = profile.clone();
        self.write_collection(&self.paths.profiles_path(), &profiles)?;
        Ok(Some(updated))
    }

    // --- Collection 2: cases (broad access, anonymized) ---

    pub fn list_cases(&self) -> Result<Vec<ConflictCase>> {
        self.read_collection(&self.paths.cases_path())
    }

    pub fn case_by_id(&self, id: &str) -> Result<Option<ConflictCase>> {
        Ok(self.list_cases()?.into_iter().find(|c| c.id == id))
    }

    /// All cases filed under one access code, oldest first.
    pub fn cases_by_code(&self, code: &str) -> Result<Vec<ConflictCase>> {
        let wanted = code.to_uppercase();
        let mut cases: Vec<ConflictCase> = self
            .list_cases()?
            .into_iter()
            .filter(|c| c.reporter_code.to_uppercase() == wanted)
            .collect();
        cases.sort_by_key(|c| c.created_at);
        Ok(cases)
    }

    /// Upserts a case by id.
    pub fn save_case(&self, case: &ConflictCase) -> Result<()> {
        let mut cases = self.list_cases()?;
        match cases.iter_mut().find(|c| c.id == case.id) {
            Some(existing) => *existing = case.clone(),
            None => cases.push(case.clone()),
        }
        self.write_collection(&self.paths.cases_path(), &cases)
    }

    // --- Shared plumbing ---

    fn read_collection<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data =
            fs::read(path).with_context(|| format!("Failed to read collection {:?}", path))?;
        serde_json::from_slice(&data)
            .with_context(|| format!("Failed to parse collection {:?}", path))
    }

    fn write_collection<T: Serialize>(&self, path: &Path, items: &[T]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create store directory {:?}", parent))?;
        }
        let data = serde_json::to_vec_pretty(items)?;
        fs::write(path, data).with_context(|| format!("Failed to write collection {:?}", path))
    }
}

/// Generates a fresh pseudonymous access code for a role, e.g. `EST-K3QZ7F2M`.
pub fn generate_access_code(role: UserRole) -> String {
    let mut rng = rand::thread_rng();
    let tail: String = (0..8)
        .map(|_| (rng.sample(Alphanumeric) as char).to_ascii_uppercase())
        .collect();
    format!("{}-{}", role.code_prefix(), tail)
}

/// The five demo accounts seeded on first initialization.
fn demo_profiles() -> Vec<UserProfile> {
    let mut student = UserProfile::new("Estudiante Demo", "EST-2024-A", "123", UserRole::Student);
    student.grade = Some("10".into());
    student.demographics.address = Some("Calle Ficticia 123".into());
    student.psychographics = Some(Default::default());

    let mut parent = UserProfile::new("Padre Demo", "FAM-2024-B", "123", UserRole::Parent);
    parent.phone = "555-0000".into();
    parent.demographics.address = Some("Avenida Siempre Viva".into());
    parent.psychographics = Some(Default::default());

    let mut teacher = UserProfile::new("Profesor Demo", "DOC-2024-C", "123", UserRole::Teacher);
    teacher.psychographics = Some(Default::default());

    let admin = UserProfile::new("Director General", "ADM-MASTER", "admin", UserRole::Admin);
    let staff = UserProfile::new("Psicóloga Escolar", "STAFF-PSI", "staff", UserRole::Staff);

    vec![student, parent, teacher, admin, staff]
}
