// 💾 File import / export of configurations

use crate::config::Configuration;
use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Name given to exported configurations.
pub const EXPORT_FILE_NAME: &str = "life_timeline_config.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    /// `.json` files are JSON; everything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => FileFormat::Json,
            _ => FileFormat::Yaml,
        }
    }
}

/// Read and validate a configuration file.
pub fn load_config(path: &Path) -> Result<Configuration> {
    let text = fs::read_to_string(path)?;
    let config = match FileFormat::from_path(path) {
        FileFormat::Json => Configuration::from_json(&text)?,
        FileFormat::Yaml => Configuration::from_yaml(&text)?,
    };
    log::info!(
        "loaded {:?} from {} ({} periods)",
        config.name,
        path.display(),
        config.periods.len()
    );
    Ok(config)
}

/// Write a configuration, choosing the format from the extension.
pub fn save_config(path: &Path, config: &Configuration) -> Result<()> {
    let text = match FileFormat::from_path(path) {
        FileFormat::Json => serde_json::to_string_pretty(&config.to_document())?,
        FileFormat::Yaml => config.to_yaml()?,
    };
    fs::write(path, text)?;
    log::info!("saved configuration to {}", path.display());
    Ok(())
}

/// Export into `dir` as [`EXPORT_FILE_NAME`], or a numbered variant
/// (`life_timeline_config-1.yaml`, ...) when that name is taken.
pub fn export_config(dir: &Path, config: &Configuration) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = unique_path(dir, EXPORT_FILE_NAME);
    save_config(&path, config)?;
    Ok(path)
}

/// YAML files (`.yaml` / `.yml`) directly inside `dir`, sorted by name.
pub fn list_config_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml")
            )
        })
        .collect();
    files.sort();
    Ok(files)
}

fn unique_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let path = Path::new(file_name);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(file_name);
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("yaml");

    let mut counter = 1;
    loop {
        let candidate = dir.join(format!("{}-{}.{}", stem, counter, ext));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
