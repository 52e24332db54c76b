pub mod assets;

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use tower_http::services::ServeDir;

use crate::api::RoutePaths;
pub use assets::AssetResolver;

pub const INDEX_FILE: &str = "index.html";
const STATIC_URL: &str = "/static/";

#[derive(Debug, Clone)]
pub struct UiSettings {
    pub app_name: String,
    pub timezone: String,
    pub recording: bool,
}

/// Configuration handed to the client app as `window.Microscope`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bootstrap {
    pub timezone: String,
    pub path: String,
    pub api_path: String,
    pub recording: bool,
}

/// The index template plus everything needed to fill it in.
#[derive(Debug)]
pub struct Ui {
    root: PathBuf,
    template: String,
    assets: AssetResolver,
    app_name: String,
    bootstrap: Bootstrap,
}

impl Ui {
    pub fn load(
        root: impl AsRef<Path>,
        production: bool,
        paths: &RoutePaths,
        settings: UiSettings,
    ) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        anyhow::ensure!(
            root.is_dir(),
            "static directory {} does not exist",
            root.display()
        );

        let index = root.join(INDEX_FILE);
        let template = std::fs::read_to_string(&index)
            .with_context(|| format!("failed to read index template {}", index.display()))?;

        tracing::info!(root = %root.display(), production, "loaded ui");

        Ok(Self {
            assets: AssetResolver::new(&root, production),
            root,
            template,
            app_name: settings.app_name,
            bootstrap: Bootstrap {
                timezone: settings.timezone,
                path: paths.base().to_string(),
                api_path: paths.api_base(),
                recording: settings.recording,
            },
        })
    }

    pub fn bootstrap(&self) -> &Bootstrap {
        &self.bootstrap
    }

    pub fn static_service(&self) -> ServeDir {
        ServeDir::new(&self.root)
    }

    pub fn render_index(&self) -> String {
        let css = format!("{STATIC_URL}{}", self.assets.resolve("/app.css"));
        let js = format!("{STATIC_URL}{}", self.assets.resolve("/app.js"));

        // `<\/` keeps a stray `</script>` in a value from closing the tag
        let bootstrap = serde_json::to_string(&self.bootstrap)
            .unwrap_or_else(|_| "{}".to_string())
            .replace("</", "<\\/");

        self.template
            .replace("{{ app_name }}", &escape_html(&self.app_name))
            .replace("{{ css_path }}", &escape_html(&css))
            .replace("{{ js_path }}", &escape_html(&js))
            .replace("{{ bootstrap }}", &bootstrap)
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
