use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::errors::{CodeflowError, Result};

/// Name of the configuration file stored inside the `.codeflow` directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// Name of the hidden directory used to store codeflow settings.
pub const CODEFLOW_DIR: &str = ".codeflow";

/// Source language family handed to the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceSyntax {
    Typescript,
    Ecmascript,
}

/// Grammar options passed to a `SourceParser`.
///
/// Extraction always uses `ParseOptions::default()`: TypeScript with TSX,
/// decorators and dynamic import, comments kept, module mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOptions {
    pub syntax: SourceSyntax,
    pub target: String,
    pub comments: bool,
    pub decorators: bool,
    pub dynamic_import: bool,
    /// Parse as a script instead of a module.
    pub script: bool,
    pub tsx: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            syntax: SourceSyntax::Typescript,
            target: "es2022".to_string(),
            comments: true,
            decorators: true,
            dynamic_import: true,
            script: false,
            tsx: true,
        }
    }
}

/// Configuration for scanning a project.
///
/// Controls which files are scanned and size limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeflowConfig {
    /// Schema version of the configuration.
    pub version: u32,
    /// Root directory of the project being scanned.
    pub root_dir: String,
    /// Glob patterns for files to include.
    pub include: Vec<String>,
    /// Glob patterns for files to exclude.
    pub exclude: Vec<String>,
    /// Maximum file size in bytes; larger files are skipped.
    pub max_file_size: u64,
}

impl Default for CodeflowConfig {
    fn default() -> Self {
        Self {
            version: 1,
            root_dir: String::new(),
            include: vec![
                "**/*.ts".to_string(),
                "**/*.tsx".to_string(),
                "**/*.mts".to_string(),
                "**/*.cts".to_string(),
            ],
            exclude: vec![
                "node_modules/**".to_string(),
                "**/node_modules/**".to_string(),
                "dist/**".to_string(),
                "build/**".to_string(),
                "target/**".to_string(),
                ".git/**".to_string(),
                ".codeflow/**".to_string(),
                "**/*.d.ts".to_string(),
                "**/*.min.*".to_string(),
            ],
            max_file_size: 1_048_576,
        }
    }
}

/// Returns the path to the `.codeflow` directory within the given project root.
pub fn get_codeflow_dir(project_root: &Path) -> PathBuf {
    project_root.join(CODEFLOW_DIR)
}

/// Returns the path to the configuration file within the `.codeflow` directory.
pub fn get_config_path(project_root: &Path) -> PathBuf {
    get_codeflow_dir(project_root).join(CONFIG_FILENAME)
}

fn config_error(action: &str, path: &Path, cause: impl std::fmt::Display) -> CodeflowError {
    CodeflowError::Config {
        message: format!("failed to {action} '{}': {cause}", path.display()),
    }
}

/// Loads the project configuration, or the defaults rooted at
/// `project_root` when none was saved.
pub fn load_config(project_root: &Path) -> Result<CodeflowConfig> {
    let path = get_config_path(project_root);
    if !path.exists() {
        return Ok(CodeflowConfig {
            root_dir: project_root.to_string_lossy().to_string(),
            ..CodeflowConfig::default()
        });
    }
    let contents = fs::read_to_string(&path).map_err(|e| config_error("read", &path, e))?;
    serde_json::from_str(&contents).map_err(|e| config_error("parse", &path, e))
}

/// Saves the configuration; the file is replaced in one rename so readers
/// never see a partial write.
pub fn save_config(project_root: &Path, config: &CodeflowConfig) -> Result<()> {
    let dir = get_codeflow_dir(project_root);
    fs::create_dir_all(&dir).map_err(|e| config_error("create", &dir, e))?;

    let path = get_config_path(project_root);
    let staged = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(config).map_err(|e| config_error("encode", &path, e))?;
    fs::write(&staged, json).map_err(|e| config_error("write", &staged, e))?;
    fs::rename(&staged, &path).map_err(|e| config_error("replace", &path, e))
}

/// Determines whether a file should be scanned based on the configuration's
/// include and exclude glob patterns.
///
/// Exclude patterns take precedence.
pub fn should_include_file(file_path: &str, config: &CodeflowConfig) -> bool {
    let match_opts = glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };

    let matches = |patterns: &[String]| {
        patterns
            .iter()
            .filter_map(|p| Pattern::new(p).ok())
            .any(|pattern| pattern.matches_with(file_path, match_opts))
    };

    !matches(&config.exclude) && matches(&config.include)
}
