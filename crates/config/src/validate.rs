//! Configuration validation engine.
//!
//! Validates config files against the known schema, detects unknown or
//! misspelled fields, and flags router settings that would strand users
//! (unreachable entries, keywords that shadow menu digits, and so on).

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

use switchboard_common::REPLY_ENDPOINT;

use crate::{
    loader::{find_config_file, parse_config, parse_config_value},
    schema::SwitchboardConfig,
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "router",
    /// "dispatch", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "router.entries[1].endpoint"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a configuration.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

/// Expected shape of the configuration.
enum KnownKeys {
    Struct(HashMap<&'static str, KnownKeys>),
    Array(Box<KnownKeys>),
    Leaf,
}

/// Schema map mirroring every field in `schema.rs`.
fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Array, Leaf, Struct};

    Struct(HashMap::from([
        (
            "router",
            Struct(HashMap::from([
                ("session_expiry", Leaf),
                ("session_data_version", Leaf),
                ("menu_title", Struct(HashMap::from([("content", Leaf)]))),
                (
                    "entries",
                    Array(Box::new(Struct(HashMap::from([
                        ("endpoint", Leaf),
                        ("label", Leaf),
                    ])))),
                ),
                ("keyword", Leaf),
                ("invalid_input_message", Leaf),
                ("error_message", Leaf),
            ])),
        ),
        (
            "store",
            Struct(HashMap::from([("backend", Leaf), ("path", Leaf)])),
        ),
        (
            "dispatch",
            Struct(HashMap::from([("workers", Leaf), ("queue_depth", Leaf)])),
        ),
        ("metrics", Struct(HashMap::from([("enabled", Leaf)]))),
    ]))
}

// ── Levenshtein distance ────────────────────────────────────────────────────

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Closest candidate within `max_distance` edits, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&c| (c, levenshtein(needle, c)))
        .filter(|&(_, d)| d > 0 && d <= max_distance)
        .min_by_key(|&(_, d)| d)
        .map(|(c, _)| c)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or discover the default config
/// file location if `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = path.map(Path::to_path_buf).or_else(find_config_file);

    let Some(actual_path) = config_path else {
        let mut result = validate_config(&SwitchboardConfig::default());
        result.diagnostics.insert(
            0,
            Diagnostic::new(
                Severity::Info,
                "file-ref",
                "",
                "no config file found; using defaults",
            ),
        );
        return result;
    };

    let mut result = match std::fs::read_to_string(&actual_path) {
        Ok(raw) => validate_str(&crate::env_subst::substitute_env(&raw), &actual_path),
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("failed to read config file: {e}"),
            )],
            config_path: None,
        },
    };
    result.config_path = Some(actual_path);
    result
}

/// Validate raw config text. `path` only selects the format by extension.
#[must_use]
pub fn validate_str(raw: &str, path: &Path) -> ValidationResult {
    let mut diagnostics = Vec::new();

    // 1. Syntax
    let value = match parse_config_value(raw, path) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("syntax error: {e}"),
            ));
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    // 2. Unknown fields
    check_unknown_fields(&value, &build_schema_map(), "", &mut diagnostics);

    // 3. Types, then semantics on the parsed config
    match parse_config(raw, path) {
        Ok(config) => diagnostics.extend(validate_config(&config).diagnostics),
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "type-error",
            "",
            format!("type error: {e}"),
        )),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

/// Semantic checks on an already-parsed config.
#[must_use]
pub fn validate_config(config: &SwitchboardConfig) -> ValidationResult {
    let mut diagnostics = Vec::new();
    check_router(config, &mut diagnostics);

    if config.dispatch.workers == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "dispatch",
            "dispatch.workers",
            "at least one worker is required",
        ));
    }
    if config.dispatch.queue_depth == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "dispatch",
            "dispatch.queue_depth",
            "queue depth must be greater than zero",
        ));
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

/// Longest accepted `router.session_expiry`.
pub const MAX_SESSION_EXPIRY_SECS: u64 = 365 * 24 * 60 * 60;

fn check_router(config: &SwitchboardConfig, diagnostics: &mut Vec<Diagnostic>) {
    let router = &config.router;

    if router.session_expiry == 0 {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "router",
            "router.session_expiry",
            "sessions would expire immediately; use a positive number of seconds",
        ));
    } else if router.session_expiry > MAX_SESSION_EXPIRY_SECS {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "router",
            "router.session_expiry",
            format!("must be at most {MAX_SESSION_EXPIRY_SECS} seconds (one year)"),
        ));
    }

    if router.entries.is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "router",
            "router.entries",
            "no entries configured; every choice will be rejected",
        ));
    }

    let mut seen = HashSet::new();
    for (i, entry) in router.entries.iter().enumerate() {
        let path = format!("router.entries[{i}]");
        if entry.endpoint.trim().is_empty() {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "router",
                format!("{path}.endpoint"),
                "endpoint must not be empty",
            ));
        } else if entry.endpoint == REPLY_ENDPOINT {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "router",
                format!("{path}.endpoint"),
                format!("\"{REPLY_ENDPOINT}\" is reserved for replies to the user"),
            ));
        } else if !seen.insert(entry.endpoint.as_str()) {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "router",
                format!("{path}.endpoint"),
                format!("endpoint \"{}\" is listed more than once", entry.endpoint),
            ));
        }
        if entry.label.trim().is_empty() {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "router",
                format!("{path}.label"),
                "label must not be empty",
            ));
        }
    }

    if router.keyword.trim().is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "router",
            "router.keyword",
            "keyword must not be empty",
        ));
    } else if looks_like_choice(&router.keyword) {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "router",
            "router.keyword",
            "keyword is numeric and can be confused with a menu choice",
        ));
    }
}

/// Whether the first token of `keyword` parses as a menu number.
fn looks_like_choice(keyword: &str) -> bool {
    keyword
        .split_whitespace()
        .next()
        .is_some_and(|token| token.parse::<i64>().is_ok())
}

/// Walk the value tree against the schema tree and flag unknown keys.
fn check_unknown_fields(
    value: &serde_json::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match (value, schema) {
        (serde_json::Value::Object(table), KnownKeys::Struct(fields)) => {
            let known_keys: Vec<&str> = fields.keys().copied().collect();
            for (key, child_value) in table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                if let Some(child_schema) = fields.get(key.as_str()) {
                    check_unknown_fields(child_value, child_schema, &path, diagnostics);
                    continue;
                }
                let message = match suggest(key, &known_keys, 3) {
                    Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
                    None => "unknown field".to_string(),
                };
                diagnostics.push(Diagnostic::new(
                    Severity::Error,
                    "unknown-field",
                    path,
                    message,
                ));
            }
        },
        (serde_json::Value::Array(items), KnownKeys::Array(item_schema)) => {
            for (i, item) in items.iter().enumerate() {
                let path = format!("{prefix}[{i}]");
                check_unknown_fields(item, item_schema, &path, diagnostics);
            }
        },
        // Leaf or type mismatch, type errors are reported separately.
        _ => {},
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn toml_result(raw: &str) -> ValidationResult {
        validate_str(raw, Path::new("switchboard.toml"))
    }

    fn has(result: &ValidationResult, severity: Severity, path: &str) -> bool {
        result
            .diagnostics
            .iter()
            .any(|d| d.severity == severity && d.path == path)
    }

    #[test]
    fn levenshtein_distances() {
        assert_eq!(levenshtein("keyword", "keyword"), 0);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("entries", "entrys"), 2);
        assert_eq!(levenshtein("keywrd", "keyword"), 1);
    }

    #[test]
    fn valid_config_is_clean() {
        let result = toml_result(
            r#"
            [router]
            session_expiry = 300
            [[router.entries]]
            endpoint = "weather"
            label = "Weather"
            "#,
        );
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    }

    #[test]
    fn syntax_error_stops_early() {
        let result = toml_result("[router");
        assert!(result.has_errors());
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].category, "syntax");
    }

    #[test]
    fn unknown_field_with_suggestion() {
        let result = toml_result(
            r#"
            [router]
            keywrd = ":menu"
            "#,
        );
        let diag = result
            .diagnostics
            .iter()
            .find(|d| d.category == "unknown-field")
            .unwrap();
        assert_eq!(diag.path, "router.keywrd");
        assert!(diag.message.contains("keyword"));
    }

    #[test]
    fn unknown_field_inside_entries() {
        let result = toml_result(
            r#"
            [[router.entries]]
            endpoint = "a"
            label = "A"
            lable = "typo"
            "#,
        );
        assert!(has(&result, Severity::Error, "router.entries[0].lable"));
    }

    #[test]
    fn type_error_reported() {
        let result = toml_result(
            r#"
            [router]
            session_expiry = "soon"
            "#,
        );
        assert!(result.diagnostics.iter().any(|d| d.category == "type-error"));
    }

    #[test]
    fn router_semantics() {
        let result = toml_result(
            r#"
            [router]
            session_expiry = 0
            keyword = "9"
            [[router.entries]]
            endpoint = "a"
            label = "A"
            [[router.entries]]
            endpoint = "a"
            label = "Again"
            [[router.entries]]
            endpoint = "default"
            label = "Reserved"
            [[router.entries]]
            endpoint = "b"
            label = " "
            "#,
        );
        assert!(has(&result, Severity::Error, "router.session_expiry"));
        assert!(has(&result, Severity::Warning, "router.keyword"));
        assert!(has(&result, Severity::Warning, "router.entries[1].endpoint"));
        assert!(has(&result, Severity::Error, "router.entries[2].endpoint"));
        assert!(has(&result, Severity::Error, "router.entries[3].label"));
    }

    #[rstest]
    #[case(1, false)]
    #[case(MAX_SESSION_EXPIRY_SECS, false)]
    #[case(MAX_SESSION_EXPIRY_SECS + 1, true)]
    #[case(u64::MAX, true)]
    fn session_expiry_upper_bound(#[case] secs: u64, #[case] rejected: bool) {
        let mut config = SwitchboardConfig::default();
        config.router.session_expiry = secs;
        let result = validate_config(&config);
        assert_eq!(has(&result, Severity::Error, "router.session_expiry"), rejected);
    }

    #[test]
    fn empty_entries_and_workers() {
        let mut config = SwitchboardConfig::default();
        config.dispatch.workers = 0;
        let result = validate_config(&config);
        assert!(has(&result, Severity::Warning, "router.entries"));
        assert!(has(&result, Severity::Error, "dispatch.workers"));
    }

    #[test]
    fn json_format_is_validated_too() {
        let result = validate_str(
            r#"{"router": {"entries": [{"endpoint": "a", "label": "A"}]}, "metric": {}}"#,
            Path::new("switchboard.json"),
        );
        let diag = result
            .diagnostics
            .iter()
            .find(|d| d.path == "metric")
            .unwrap();
        assert!(diag.message.contains("metrics"));
    }
}
