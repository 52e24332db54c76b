// crates/microscope/src/ui/assets.rs
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const MANIFEST_FILE: &str = "mix-manifest.json";

/// Maps logical asset paths (`/app.css`) to the file to request under `/static/`.
///
/// In production the versioned name comes from the build manifest, read once
/// on first use. A missing or broken manifest is logged and resolution falls
/// back to the logical path for the rest of the process.
#[derive(Debug)]
pub struct AssetResolver {
    root: PathBuf,
    production: bool,
    manifest: OnceLock<HashMap<String, String>>,
}

impl AssetResolver {
    pub fn new(root: impl Into<PathBuf>, production: bool) -> Self {
        Self {
            root: root.into(),
            production,
            manifest: OnceLock::new(),
        }
    }

    pub fn resolve(&self, path: &str) -> String {
        if path.is_empty() {
            return String::new();
        }

        if !self.production {
            return strip_slash(path).to_string();
        }

        let manifest = self.manifest.get_or_init(|| load_manifest(&self.root));
        match manifest.get(path) {
            Some(hashed) => strip_slash(hashed).to_string(),
            None => strip_slash(path).to_string(),
        }
    }
}

fn strip_slash(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

fn load_manifest(root: &Path) -> HashMap<String, String> {
    let file = root.join(MANIFEST_FILE);

    let raw = match std::fs::read_to_string(&file) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(path = %file.display(), error = %e, "asset manifest unavailable");
            return HashMap::new();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(path = %file.display(), error = %e, "asset manifest is not valid json");
            HashMap::new()
        }
    }
}
