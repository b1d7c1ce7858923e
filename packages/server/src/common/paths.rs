//! Layout of the local data directory.
//!
//! One leads file per distinct query+location (`leads-<slug>.json`), one
//! outreach log, one daily-state file, one job-queue file, one website index.
//! Generated HTML lands under `websites/`, per-slug image manifests under
//! `images/`.

use std::path::{Path, PathBuf};

use crate::common::slug::query_slug;

#[derive(Debug, Clone)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the data, images and websites directories if absent.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [self.root.clone(), self.images_dir(), self.websites_dir()] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn jobs_file(&self) -> PathBuf {
        self.root.join("jobs.json")
    }

    /// File name (not path) for a query+location scrape.
    pub fn leads_file_name(query: &str, location: &str) -> String {
        format!("leads-{}.json", query_slug(query, location))
    }

    /// Resolve a leads file reference to a path. Payloads may carry either a
    /// bare file name or a stale absolute path; only the base name counts.
    pub fn leads_file(&self, reference: &str) -> PathBuf {
        let name = Path::new(reference)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| reference.to_string());
        self.root.join(name)
    }

    /// Base name of a leads file reference, used as the remote conflict key.
    pub fn source_name(reference: &str) -> String {
        Path::new(reference)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| reference.to_string())
    }

    pub fn outreach_log(&self) -> PathBuf {
        self.root.join("outreach-log.json")
    }

    pub fn daily_state_file(&self) -> PathBuf {
        self.root.join("daily-state.json")
    }

    pub fn templates_file(&self) -> PathBuf {
        self.root.join("templates.json")
    }

    pub fn artifacts_file(&self) -> PathBuf {
        self.root.join("artifacts.json")
    }

    pub fn websites_dir(&self) -> PathBuf {
        self.root.join("websites")
    }

    pub fn site_index(&self) -> PathBuf {
        self.websites_dir().join("index.json")
    }

    pub fn site_file(&self, slug: &str) -> PathBuf {
        self.websites_dir().join(format!("{}.html", slug))
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join("images")
    }

    pub fn image_manifest(&self, slug: &str) -> PathBuf {
        self.images_dir().join(format!("{}.json", slug))
    }

    /// Names of every leads file currently on disk.
    pub fn list_leads_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.root)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter_map(|e| e.file_name().into_string().ok())
                    .filter(|n| n.starts_with("leads-") && n.ends_with(".json"))
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leads_file_strips_directories() {
        let paths = DataPaths::new("/data/website-biz");
        assert_eq!(
            paths.leads_file("/tmp/elsewhere/leads-plumbers-austin.json"),
            PathBuf::from("/data/website-biz/leads-plumbers-austin.json")
        );
        assert_eq!(
            paths.leads_file("leads-plumbers-austin.json"),
            PathBuf::from("/data/website-biz/leads-plumbers-austin.json")
        );
    }

    #[test]
    fn leads_file_name_uses_query_slug() {
        assert_eq!(
            DataPaths::leads_file_name("plumbers", "Austin"),
            "leads-plumbers-austin.json"
        );
    }
}
