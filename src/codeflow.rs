use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Instant;

use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::{load_config, save_config, should_include_file, CodeflowConfig, ParseOptions};
use crate::errors::{CodeflowError, Result};
use crate::extraction::{SourceParser, TypeScriptParser};
use crate::method::extract_method;
use crate::normalize::{normalize, NodeId, Tree};
use crate::syntax::NodeKind;
use crate::types::*;
use crate::walk::{walk, Visitor};

static LINE_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\n").expect("valid line ending regex"));

/// Collapses every whitespace run that ends in a line break into a single
/// `\n`, dropping trailing spaces, `\r` and blank lines.
pub fn normalize_line_endings(source: &str) -> String {
    LINE_END_RE.replace_all(source, "\n").into_owned()
}

/// Extracts every codeflow method from `source`.
///
/// Returns the methods together with the normalized text that all spans and
/// code snippets refer to. Fails only when the parser fails or the parsed
/// tree contains syntax errors.
pub fn parse<P: SourceParser + ?Sized>(source: &str, parser: &P) -> Result<(Vec<Method>, String)> {
    let text = normalize_line_endings(source);
    let syntax = parser.parse(&text, &ParseOptions::default())?;
    let tree = normalize(&syntax, &text);
    validate(&tree, &text)?;

    let mut collector = MethodCollector {
        text: &text,
        methods: Vec::new(),
    };
    if let Some(root) = tree.root() {
        walk(&tree, root, &mut collector);
    }
    let methods = collector.methods;
    Ok((methods, text))
}

/// `parse` with the built-in tree-sitter TypeScript parser.
pub fn parse_typescript(source: &str) -> Result<(Vec<Method>, String)> {
    parse(source, &TypeScriptParser)
}

/// Reads and extracts a single file.
pub fn extract_file(path: &Path) -> Result<(Vec<Method>, String)> {
    let source = std::fs::read_to_string(path).map_err(|e| CodeflowError::File {
        message: e.to_string(),
        path: path.display().to_string(),
    })?;
    parse_typescript(&source)
}

/// Compute SHA-256 content hash of file content.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Rejects trees holding syntax errors.
fn validate(tree: &Tree, text: &str) -> Result<()> {
    let mut validator = Validator { invalid: None };
    if let Some(root) = tree.root() {
        walk(tree, root, &mut validator);
    }
    match validator.invalid {
        None => Ok(()),
        Some(id) => {
            let start = tree.node(id).span.start;
            let line = text
                .get(..start)
                .map_or(0, |before| before.matches('\n').count() as u32 + 1);
            Err(CodeflowError::Validation {
                message: format!("syntax error at byte {start} (line {line})"),
            })
        }
    }
}

struct Validator {
    invalid: Option<NodeId>,
}

impl Visitor for Validator {
    fn fallback(&mut self, tree: &Tree, id: NodeId) -> Option<bool> {
        if self.invalid.is_none() && tree.node(id).kind == NodeKind::Invalid {
            self.invalid = Some(id);
        }
        Some(self.invalid.is_none())
    }
}

/// Finds candidate constructs; nested functions are not candidates.
struct MethodCollector<'t> {
    text: &'t str,
    methods: Vec<Method>,
}

impl MethodCollector<'_> {
    fn collect(&mut self, tree: &Tree, id: NodeId) -> Option<bool> {
        if let Some(method) = extract_method(tree, id, self.text) {
            self.methods.push(method);
        }
        Some(false)
    }
}

impl Visitor for MethodCollector<'_> {
    fn class_method(&mut self, tree: &Tree, id: NodeId) -> Option<bool> {
        self.collect(tree, id)
    }

    fn function_declaration(&mut self, tree: &Tree, id: NodeId) -> Option<bool> {
        self.collect(tree, id)
    }
}

/// Scans a project directory for codeflow methods.
pub struct Codeflow {
    config: CodeflowConfig,
    project_root: PathBuf,
}

impl Codeflow {
    /// Writes a default configuration for the project at `project_root`.
    pub fn init(project_root: &Path) -> Result<Self> {
        let config = CodeflowConfig {
            root_dir: project_root.to_string_lossy().to_string(),
            ..CodeflowConfig::default()
        };
        save_config(project_root, &config)?;
        Ok(Self {
            config,
            project_root: project_root.to_path_buf(),
        })
    }

    /// Opens a project, using the default configuration if none was saved.
    pub fn open(project_root: &Path) -> Result<Self> {
        let config = load_config(project_root)?;
        Ok(Self {
            config,
            project_root: project_root.to_path_buf(),
        })
    }

    pub fn config(&self) -> &CodeflowConfig {
        &self.config
    }

    /// Extracts every matching file of the project.
    ///
    /// Files that fail to read or parse are reported in `errors` and do not
    /// stop the scan; files without codeflow methods are left out.
    pub fn scan(&self) -> Result<ScanReport> {
        let start = Instant::now();
        let files = self.scan_files();
        let mut report = ScanReport {
            scanned: files.len(),
            ..ScanReport::default()
        };

        for file_path in &files {
            let abs_path = self.project_root.join(file_path);
            let source = match std::fs::read_to_string(&abs_path) {
                Ok(s) => s,
                Err(e) => {
                    warn!(path = %file_path, error = %e, "failed to read file");
                    report.errors.push(ScanError {
                        path: file_path.clone(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            match parse_typescript(&source) {
                Ok((methods, _)) if methods.is_empty() => {}
                Ok((methods, _)) => {
                    debug!(path = %file_path, methods = methods.len(), "found codeflow methods");
                    report.files.push(FileReport {
                        path: file_path.clone(),
                        content_hash: content_hash(&source),
                        methods,
                    });
                }
                Err(e) => {
                    warn!(path = %file_path, error = %e, "failed to extract file");
                    report.errors.push(ScanError {
                        path: file_path.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        Ok(report)
    }

    /// Project-relative paths of the files to scan, in walk order.
    ///
    /// Hidden entries and `node_modules` are never entered; the rest must
    /// pass the include/exclude globs and the size limit.
    fn scan_files(&self) -> Vec<String> {
        WalkDir::new(&self.project_root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_skipped(e.file_name()))
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let relative = entry.path().strip_prefix(&self.project_root).ok()?;
                let relative = relative.to_string_lossy().replace('\\', "/");
                if !should_include_file(&relative, &self.config) {
                    return None;
                }
                let size = entry.metadata().ok()?.len();
                (size <= self.config.max_file_size).then_some(relative)
            })
            .collect()
    }
}

fn is_skipped(name: &OsStr) -> bool {
    let name = name.to_string_lossy();
    name.starts_with('.') || name == "node_modules"
}
