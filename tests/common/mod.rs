#![allow(dead_code)]

use jobpipe::model::{MatchSettings, UserSkill};
use jobpipe::{ApplicationRepository, NewApplication, SqliteStore};
use tempfile::TempDir;

pub fn init_test_logging() {
    jobpipe::logging::init_test_logging();
}

/// Repository over an in-memory store.
pub fn test_repo() -> ApplicationRepository {
    init_test_logging();
    ApplicationRepository::new(SqliteStore::open_memory().expect("open in-memory store"))
}

/// Repository over an on-disk store; the directory guard must outlive it.
pub fn test_repo_on_disk() -> (ApplicationRepository, TempDir) {
    init_test_logging();
    let dir = TempDir::new().expect("tempdir");
    let store = SqliteStore::open(&dir.path().join("pipeline.db")).expect("open store");
    (ApplicationRepository::new(store), dir)
}

pub fn new_app(company: &str, role: &str) -> NewApplication {
    NewApplication {
        company_name: company.to_string(),
        role_title: role.to_string(),
        ..NewApplication::default()
    }
}

pub fn skill(key: &str, label: &str, level: i64) -> UserSkill {
    UserSkill {
        key: key.to_string(),
        label: label.to_string(),
        level,
        years: None,
        evidence: None,
    }
}

pub fn seed_profile(repo: &mut ApplicationRepository, user_id: &str, skills: Vec<UserSkill>) {
    repo.save_user_profile(user_id, skills, MatchSettings::default())
        .expect("save profile");
}
