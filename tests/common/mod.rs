//! 統合テスト共通のヘルパー
//!
//! gitを使わないリポジトリプロバイダと、マニフェストのフィクスチャを提供する。

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

use mess::domain::entities::{Manifest, RepositoryDefinition};
use mess::infrastructure::scm::{CloneError, RepositoryProvider};

/// ディレクトリを作るだけのリポジトリプロバイダ
///
/// `clone_repository` は `<root>/<name>/.git` と `README` を作成し、
/// 呼び出し回数を名前ごとに記録する。
pub struct FakeRepositoryProvider {
    root: PathBuf,
    clones: Mutex<HashMap<String, usize>>,
    failing: Vec<String>,
}

impl FakeRepositoryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            clones: Mutex::new(HashMap::new()),
            failing: Vec::new(),
        }
    }

    /// 指定したリポジトリのクローンを失敗させる
    pub fn failing_on(mut self, name: impl Into<String>) -> Self {
        self.failing.push(name.into());
        self
    }

    pub fn clone_count(&self, name: &str) -> usize {
        self.clones
            .lock()
            .unwrap()
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_clones(&self) -> usize {
        self.clones.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl RepositoryProvider for FakeRepositoryProvider {
    fn repository_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn is_cloned(&self, name: &str) -> bool {
        self.repository_path(name).join(".git").exists()
    }

    async fn clone_repository(&self, repo: &RepositoryDefinition) -> Result<PathBuf, CloneError> {
        let path = self.repository_path(&repo.name);
        if self.failing.contains(&repo.name) {
            return Err(CloneError::git_failed(&repo.url, &path, 128));
        }
        if path.exists() {
            return Err(CloneError::already_exists(&path));
        }

        std::fs::create_dir_all(path.join(".git")).map_err(|source| {
            CloneError::CreateDirFailed {
                path: path.clone(),
                source,
            }
        })?;
        std::fs::write(path.join("README"), format!("{}\n", repo.name)).map_err(|source| {
            CloneError::CreateDirFailed {
                path: path.clone(),
                source,
            }
        })?;

        *self
            .clones
            .lock()
            .unwrap()
            .entry(repo.name.clone())
            .or_insert(0) += 1;
        Ok(path)
    }
}

/// マニフェストをJSONで書き出す
pub fn write_manifest(dir: &Path, manifest: &Manifest) -> PathBuf {
    let path = dir.join("mess.json");
    let json = serde_json::to_string_pretty(manifest).expect("Failed to serialize manifest");
    std::fs::write(&path, json).expect("Failed to write manifest");
    path
}

/// マニフェストを生のJSONで書き出す
pub fn write_manifest_json(dir: &Path, json: &str) -> PathBuf {
    let path = dir.join("mess.json");
    std::fs::write(&path, json).expect("Failed to write manifest");
    path
}

/// マニフェストを読み込む
pub fn read_manifest(path: &Path) -> Manifest {
    let content = std::fs::read_to_string(path).expect("Failed to read manifest");
    serde_json::from_str(&content).expect("Failed to parse manifest")
}

/// gitコマンドが使えるかどうか
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// コミットを1つ持つローカルリポジトリを作成し、そのパスを返す
pub fn init_local_git_repo(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::create_dir_all(&path).expect("Failed to create repo dir");

    let git = |args: &[&str]| {
        let status = Command::new("git")
            .args(args)
            .current_dir(&path)
            .env("GIT_AUTHOR_NAME", "mess")
            .env("GIT_AUTHOR_EMAIL", "mess@example.com")
            .env("GIT_COMMITTER_NAME", "mess")
            .env("GIT_COMMITTER_EMAIL", "mess@example.com")
            .status()
            .expect("Failed to run git");
        assert!(status.success(), "git {:?} failed", args);
    };

    git(&["init", "-q"]);
    std::fs::write(path.join("README.md"), format!("# {}\n", name)).expect("Failed to write file");
    git(&["add", "README.md"]);
    git(&["commit", "-q", "-m", "initial"]);
    path
}
