//! Configuration loaded with Figment.
//!
//! Precedence, highest first:
//! 1. Environment variables (prefix `WEBTABLE_`, nested keys split on `__`)
//! 2. `./webtable.toml`
//! 3. `config.toml` in the platform config directory
//! 4. Defaults

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::domain::entities::field::{Field, FieldCatalog, ValueType};
use crate::domain::entities::order::OrderTerm;
use crate::domain::entities::pagination::PaginationConfig;
use crate::domain::entities::table_view::TableMeta;
use crate::error::ConfigError;

const ENV_PREFIX: &str = "WEBTABLE_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub db_path: Option<PathBuf>,
    /// Loaded into the table on startup when the table is still empty.
    pub seed_csv: Option<PathBuf>,
    pub table: TableConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            db_path: None,
            seed_csv: None,
            table: TableConfig::default(),
        }
    }
}

/// One table: its record shape, render metadata, and paging defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub table: String,
    pub url: String,
    pub target: String,
    pub field_filters_enabled: bool,
    pub filter_option_limit: u64,
    pub pagination: PaginationConfig,
    pub fields: FieldCatalog,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            table: "records".to_string(),
            url: "/data/".to_string(),
            target: "target".to_string(),
            field_filters_enabled: false,
            filter_option_limit: 100,
            pagination: PaginationConfig::default().with_default_order(OrderTerm::asc("name")),
            fields: FieldCatalog::new(vec![
                Field::new("id", "ID", ValueType::Int),
                Field::new("name", "Name", ValueType::String),
                Field::new("type", "Type", ValueType::String),
            ]),
        }
    }
}

impl TableConfig {
    pub fn meta(&self) -> TableMeta {
        TableMeta {
            table: self.table.clone(),
            url: self.url.clone(),
            target: self.target.clone(),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from("com", "webtable", "webtable").ok_or(ConfigError::Directory("project"))
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let mut paths = Vec::new();
        if let Ok(dirs) = project_dirs() {
            paths.push(dirs.config_dir().join("config.toml"));
        }
        paths.push(PathBuf::from("webtable.toml"));

        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));
        for path in &paths {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            } else {
                tracing::debug!("No configuration at {}", path.display());
            }
        }

        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config)
    }

    /// Loads one file on top of the defaults, ignoring the environment.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .extract()?;
        Ok(config)
    }

    pub fn resolved_db_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.db_path {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_local_dir().join("records.sqlite")),
        }
    }

    pub fn webview_data_dir(&self) -> Result<PathBuf, ConfigError> {
        Ok(project_dirs()?.data_local_dir().join("webview"))
    }
}
