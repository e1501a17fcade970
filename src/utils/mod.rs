// Small helpers shared by the app: text tables, config file, manifest discovery
pub mod table {
    // Helper to render a separator line
    fn sep(widths: &[usize]) -> String {
        let mut s = String::from("+");
        for w in widths {
            s.push_str(&"-".repeat(w + 2));
            s.push('+');
        }
        s
    }

    // Helper to render a row line
    fn line(cells: &[String], widths: &[usize]) -> String {
        let mut s = String::from("|");
        for (i, cell) in cells.iter().enumerate() {
            let w = widths[i];
            let len = cell.chars().count();
            s.push(' ');
            s.push_str(cell);
            if len < w {
                s.push_str(&" ".repeat(w - len));
            }
            s.push(' ');
            s.push('|');
        }
        s
    }

    /// Render a simple ASCII table given headers and rows.
    ///
    /// Multi-line cells are flattened with `, ` so every row stays on one line.
    #[must_use]
    pub fn render(headers: &[&str], rows: &[Vec<String>]) -> String {
        let cols = headers.len();
        let rows: Vec<Vec<String>> = rows
            .iter()
            .map(|row| (0..cols).map(|i| row.get(i).map_or_else(String::new, |c| c.replace('\n', ", "))).collect())
            .collect();
        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in &rows {
            for (c, w) in widths.iter_mut().enumerate() {
                *w = (*w).max(row[c].chars().count());
            }
        }

        let mut out = String::new();
        out.push_str(&sep(&widths));
        out.push('\n');
        let header_cells: Vec<String> = headers.iter().map(|s| (*s).to_string()).collect();
        out.push_str(&line(&header_cells, &widths));
        out.push('\n');
        out.push_str(&sep(&widths));
        out.push('\n');
        for row in &rows {
            out.push_str(&line(row, &widths));
            out.push('\n');
        }
        out.push_str(&sep(&widths));
        out
    }
}

pub mod config {
    use serde::Deserialize;
    use std::fs;
    use std::path::{Path, PathBuf};

    #[derive(Debug, Clone, Deserialize, Default)]
    pub struct RenderConfig {
        pub show_link_labels: Option<bool>,
        pub namespaces: Option<bool>,
        pub title: Option<String>,
        pub format: Option<String>, // "plantuml" | "dot" | "json"
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    pub struct DotConfig {
        pub theme: Option<String>,   // "light" | "dark"
        pub rankdir: Option<String>, // "LR" | "TB"
        pub clusters: Option<bool>,
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    pub struct InferenceConfig {
        pub namespace_scoped: Option<bool>,
        pub empty_selector_matches_all: Option<bool>,
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    pub struct QueryConfig {
        pub default_format: Option<String>, // "text" | "json"
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    pub struct Config {
        pub render: Option<RenderConfig>,
        pub dot: Option<DotConfig>,
        pub inference: Option<InferenceConfig>,
        pub query: Option<QueryConfig>,
    }

    impl Config {
        /// Inference options with any overrides from the `[inference]` section applied.
        #[must_use]
        pub fn inference_options(&self) -> crate::graph::InferenceOptions {
            let mut opts = crate::graph::InferenceOptions::default();
            if let Some(inf) = &self.inference {
                if let Some(v) = inf.namespace_scoped {
                    opts.namespace_scoped = v;
                }
                if let Some(v) = inf.empty_selector_matches_all {
                    opts.empty_selector_matches_all = v;
                }
            }
            opts
        }
    }

    fn default_config_path(root: &Path) -> PathBuf {
        root.join("kuml.toml")
    }

    /// Load a config file. Unreadable or malformed files are logged and yield `None`.
    #[must_use]
    pub fn load_config_at(path: &Path) -> Option<Config> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(path = %path.display(), "ignoring unreadable config: {e}");
                return None;
            }
        };
        match toml::from_str::<Config>(&data) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                tracing::warn!(path = %path.display(), "ignoring invalid config: {e}");
                None
            }
        }
    }

    /// Look for `kuml.toml` directly under `root`.
    #[must_use]
    pub fn load_config_near(root: &Path) -> Option<Config> {
        let p = default_config_path(root);
        if p.exists() {
            load_config_at(&p)
        } else {
            None
        }
    }
}

pub mod file_walker {
    use std::path::{Path, PathBuf};

    fn is_manifest(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
    }

    /// Discover YAML manifests under `root`, sorted by path.
    ///
    /// Only the top level is listed unless `recursive` is set. `.gitignore`
    /// and `.ignore` rules apply unless `no_ignore` is set; hidden files are skipped.
    #[must_use]
    pub fn manifest_files(root: &Path, recursive: bool, no_ignore: bool) -> Vec<PathBuf> {
        let mut walker = ignore::WalkBuilder::new(root);
        walker
            .follow_links(false)
            .git_ignore(!no_ignore)
            .git_global(false)
            .git_exclude(false)
            .ignore(!no_ignore)
            .require_git(false)
            .parents(true);
        if !recursive {
            walker.max_depth(Some(1));
        }
        let mut out: Vec<PathBuf> = walker
            .build()
            .flatten()
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .map(ignore::DirEntry::into_path)
            .filter(|p| is_manifest(p))
            .collect();
        out.sort();
        tracing::debug!(root = %root.display(), files = out.len(), "discovered manifests");
        out
    }
}
