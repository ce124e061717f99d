//! Edge request filter.
//!
//! A pure, ordered rule engine that decides whether an inbound request may
//! reach any handler. Rules are evaluated top to bottom and the first match
//! wins:
//!
//! 1. declared body larger than the ceiling -> 413
//! 2. path ends with a denylisted extension -> 404
//! 3. path matches a denylisted pattern -> 404
//! 4. query string matches an injection signature -> 400
//! 5. a request-rewriting header is present -> 400
//! 6. user agent: known attack tool -> 403; empty or automation client -> allowed but flagged
//! 7. method not allowed for the path -> 405
//! 8. POST outside the allowlisted prefixes -> 405
//!
//! Rules 2 and 3 match both the raw and the percent-decoded path.
//!
//! The rule tables are plain data ([`EdgeRuleTables`]) so they can be extended
//! from configuration; [`EdgeRuleTables::compile`] turns them into
//! [`EdgeRules`] once at startup.

use percent_encoding::percent_decode_str;
use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Default body ceiling: 1 MiB.
pub const DEFAULT_MAX_BODY_BYTES: u64 = 1_048_576;

/// Upper bound on decoding passes; double-encoded paths need two.
const MAX_DECODE_PASSES: usize = 3;

/// Path prefix of the admin API, which permits PUT and DELETE.
pub const ADMIN_API_PREFIX: &str = "/api/admin";

const BASE_METHODS: &[&str] = &["GET", "HEAD", "OPTIONS", "POST"];
const ADMIN_METHODS: &[&str] = &["GET", "HEAD", "OPTIONS", "POST", "PUT", "DELETE"];

const BLOCKED_EXTENSIONS: &[&str] = &[
    "php", "php3", "php4", "php5", "phtml", "asp", "aspx", "ashx", "asmx", "jsp", "jspx", "cgi",
    "pl", "py", "rb", "sh", "bash", "exe", "dll", "bat", "cmd", "com", "msi", "vbs", "ps1", "env",
    "ini", "conf", "cfg", "config", "yml", "yaml", "toml", "sql", "sqlite", "db", "mdb", "bak",
    "backup", "old", "orig", "save", "swp", "tmp", "log", "htaccess", "htpasswd", "git", "svn",
    "pem", "key", "crt",
];

const BLOCKED_PATH_PATTERNS: &[&str] = &[
    // CMS admin and install paths
    r"/wp-(admin|login|content|includes|json|config|cron)",
    r"/xmlrpc",
    r"^/administrator(/|$)",
    r"/(phpmyadmin|pma|myadmin|mysqladmin|adminer|sqladmin)(/|$)",
    r"/(install|setup|upgrade)\.(php|asp)",
    r"/(joomla|drupal|magento|typo3)(/|$)",
    // shells and exploit kits
    r"/(shell|c99|r57|wso|webshell|cmd|b374k|alfa)([._/-]|$)",
    r"/eval-stdin",
    r"/vendor/phpunit",
    r"/cgi-bin(/|$)",
    r"/(boaform|hnap1|goform)(/|$)",
    // version control and secrets
    r"/\.(git|svn|hg|bzr|env|aws|ssh|docker|vscode|idea|ds_store|npmrc|htaccess|htpasswd)",
    r"/(etc/passwd|proc/self)",
    // backups and dumps
    r"/(backup|backups|dump|db|database|site|www|web)\.(zip|tar|gz|tgz|rar|7z|sql)$",
    r"/(backup|backups|dump|dumps)(/|$)",
    // framework probe endpoints
    r"/actuator(/|$)",
    r"/server-(status|info)",
    r"/(_profiler|_ignition|telescope|horizon)(/|$)",
    r"/(solr|jmx-console|manager/html|invoker)(/|$)",
];

const SUSPICIOUS_QUERY_PATTERNS: &[&str] = &[
    // SQL injection
    r"union(\s|\+|%20|/\*.*\*/)+(all(\s|\+|%20)+)?select",
    r"select(\s|\+|%20)+.*(\s|\+|%20)+from(\s|\+|%20)",
    r"(insert(\s|\+|%20)+into|drop(\s|\+|%20)+table|delete(\s|\+|%20)+from)",
    r"('|%27)(\s|\+|%20)*(or|and)(\s|\+|%20)+('|%27)?\d+('|%27)?(\s|\+|%20)*=",
    r"(sleep|benchmark|pg_sleep|waitfor(\s|\+|%20)+delay)(\s|\+|%20)*(\(|%28)",
    r"information_schema",
    // script injection
    r"(<|%3c)(\s|%20)*script",
    r"(javascript|vbscript|livescript)(:|%3a)",
    r"data(:|%3a)text/html",
    r"on(error|load|mouseover|focus)(\s|%20)*(=|%3d)",
    // path traversal and file wrappers
    r"\.\./",
    r"\.\.\\",
    r"\.\.(%2f|%5c)",
    r"%2e%2e",
    r"%252e",
    r"(php|file|expect|phar|zip|data)://",
    r"/etc/passwd",
    // template injection
    r"\{\{",
    r"\$\{",
    r"%7b%7b",
    r"%24%7b",
    // null byte
    r"%00",
];

const SUSPICIOUS_HEADERS: &[&str] = &[
    "x-forwarded-host",
    "x-original-url",
    "x-rewrite-url",
    "x-host",
    "x-http-method-override",
    "x-http-method",
    "x-method-override",
];

const MALICIOUS_USER_AGENTS: &[&str] = &[
    "sqlmap", "nikto", "nmap", "masscan", "zgrab", "nuclei", "acunetix", "wpscan", "dirbuster",
    "gobuster", "dirb", "havij", "netsparker", "w3af", "openvas", "nessus", "hydra", "fimap",
    "jaeles", "arachni", "skipfish", "commix", "xsstrike", "whatweb", "zmeu", "morfeus",
];

const FLAGGED_USER_AGENTS: &[&str] = &[
    "curl", "wget", "python-requests", "python-urllib", "aiohttp", "httpx", "go-http-client",
    "libwww-perl", "java/", "okhttp", "apache-httpclient", "scrapy", "node-fetch", "axios",
    "headlesschrome", "phantomjs", "httpie", "postmanruntime",
];

const POST_ALLOWED_PREFIXES: &[&str] = &["/api/send-email", "/api/admin/", "/.netlify/functions/"];

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Rule data for the edge filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeRuleTables {
    pub max_body_bytes: u64,
    /// Extensions without the leading dot.
    pub blocked_extensions: Vec<String>,
    pub blocked_path_patterns: Vec<String>,
    pub suspicious_query_patterns: Vec<String>,
    pub suspicious_headers: Vec<String>,
    /// Substrings of user agents that are rejected with 403.
    pub malicious_user_agents: Vec<String>,
    /// Substrings of user agents that are allowed but logged.
    pub flagged_user_agents: Vec<String>,
    /// Paths that accept POST. An entry ending in `/` is a prefix; any other
    /// entry matches itself and its sub-paths.
    pub post_allowed_prefixes: Vec<String>,
}

impl Default for EdgeRuleTables {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            blocked_extensions: to_strings(BLOCKED_EXTENSIONS),
            blocked_path_patterns: to_strings(BLOCKED_PATH_PATTERNS),
            suspicious_query_patterns: to_strings(SUSPICIOUS_QUERY_PATTERNS),
            suspicious_headers: to_strings(SUSPICIOUS_HEADERS),
            malicious_user_agents: to_strings(MALICIOUS_USER_AGENTS),
            flagged_user_agents: to_strings(FLAGGED_USER_AGENTS),
            post_allowed_prefixes: to_strings(POST_ALLOWED_PREFIXES),
        }
    }
}

/// Error compiling rule tables.
#[derive(Debug, Error)]
pub enum EdgeRuleError {
    #[error("invalid {table} pattern: {source}")]
    InvalidPattern {
        table: &'static str,
        #[source]
        source: regex::Error,
    },
}

impl EdgeRuleTables {
    /// Appends operator-supplied entries to each table.
    pub fn extend(&mut self, other: &EdgeRuleTables) {
        self.blocked_extensions
            .extend(other.blocked_extensions.iter().cloned());
        self.blocked_path_patterns
            .extend(other.blocked_path_patterns.iter().cloned());
        self.suspicious_query_patterns
            .extend(other.suspicious_query_patterns.iter().cloned());
        self.suspicious_headers
            .extend(other.suspicious_headers.iter().cloned());
        self.malicious_user_agents
            .extend(other.malicious_user_agents.iter().cloned());
        self.flagged_user_agents
            .extend(other.flagged_user_agents.iter().cloned());
        self.post_allowed_prefixes
            .extend(other.post_allowed_prefixes.iter().cloned());
    }

    /// Compiles the tables. Patterns are matched case-insensitively.
    pub fn compile(&self) -> Result<EdgeRules, EdgeRuleError> {
        Ok(EdgeRules {
            max_body_bytes: self.max_body_bytes,
            blocked_extensions: self
                .blocked_extensions
                .iter()
                .map(|e| format!(".{}", e.trim_start_matches('.').to_lowercase()))
                .collect(),
            blocked_paths: regex_set("path", &self.blocked_path_patterns)?,
            suspicious_query: regex_set("query", &self.suspicious_query_patterns)?,
            suspicious_headers: self
                .suspicious_headers
                .iter()
                .map(|h| h.to_lowercase())
                .collect(),
            malicious_user_agents: lowercase_all(&self.malicious_user_agents),
            flagged_user_agents: lowercase_all(&self.flagged_user_agents),
            post_allowed_prefixes: self.post_allowed_prefixes.clone(),
        })
    }
}

fn regex_set(table: &'static str, patterns: &[String]) -> Result<RegexSet, EdgeRuleError> {
    RegexSet::new(patterns.iter().map(|p| format!("(?i){}", p)))
        .map_err(|source| EdgeRuleError::InvalidPattern { table, source })
}

fn lowercase_all(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

/// The parts of a request the filter looks at.
#[derive(Debug, Clone, Copy)]
pub struct EdgeRequest<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub user_agent: Option<&'a str>,
    /// Header names, lowercase.
    pub header_names: &'a [&'a str],
    pub content_length: Option<u64>,
}

/// Why a request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    OversizedBody,
    BlockedExtension,
    BlockedPath,
    SuspiciousQuery,
    SuspiciousHeader,
    MaliciousUserAgent,
    MethodNotAllowed,
    PostNotAllowed,
}

impl BlockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::OversizedBody => "oversized_body",
            BlockReason::BlockedExtension => "blocked_extension",
            BlockReason::BlockedPath => "blocked_path",
            BlockReason::SuspiciousQuery => "suspicious_query",
            BlockReason::SuspiciousHeader => "suspicious_header",
            BlockReason::MaliciousUserAgent => "malicious_user_agent",
            BlockReason::MethodNotAllowed => "method_not_allowed",
            BlockReason::PostNotAllowed => "post_not_allowed",
        }
    }

    /// HTTP status for the rejection.
    pub fn status(&self) -> u16 {
        match self {
            BlockReason::OversizedBody => 413,
            BlockReason::BlockedExtension | BlockReason::BlockedPath => 404,
            BlockReason::SuspiciousQuery | BlockReason::SuspiciousHeader => 400,
            BlockReason::MaliciousUserAgent => 403,
            BlockReason::MethodNotAllowed | BlockReason::PostNotAllowed => 405,
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an allowed request was still worth logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagReason {
    EmptyUserAgent,
    AutomationUserAgent,
}

impl FlagReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagReason::EmptyUserAgent => "empty_user_agent",
            FlagReason::AutomationUserAgent => "automation_user_agent",
        }
    }
}

/// Filter decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeVerdict {
    Allow,
    AllowFlagged(FlagReason),
    Block(BlockReason),
}

impl EdgeVerdict {
    pub fn is_blocked(&self) -> bool {
        matches!(self, EdgeVerdict::Block(_))
    }
}

/// Compiled edge filter rules.
#[derive(Debug, Clone)]
pub struct EdgeRules {
    max_body_bytes: u64,
    blocked_extensions: Vec<String>,
    blocked_paths: RegexSet,
    suspicious_query: RegexSet,
    suspicious_headers: Vec<String>,
    malicious_user_agents: Vec<String>,
    flagged_user_agents: Vec<String>,
    post_allowed_prefixes: Vec<String>,
}

impl EdgeRules {
    pub fn max_body_bytes(&self) -> u64 {
        self.max_body_bytes
    }

    /// Evaluates the rules against a request.
    pub fn evaluate(&self, req: &EdgeRequest<'_>) -> EdgeVerdict {
        if req
            .content_length
            .map(|len| len > self.max_body_bytes)
            .unwrap_or(false)
        {
            return EdgeVerdict::Block(BlockReason::OversizedBody);
        }

        let path = req.path.to_lowercase();
        let decoded = decode_path(&path);
        let forms = [path.as_str(), decoded.as_str()];
        if forms.iter().any(|p| self.has_blocked_extension(p)) {
            return EdgeVerdict::Block(BlockReason::BlockedExtension);
        }
        if forms.iter().any(|p| self.blocked_paths.is_match(p)) {
            return EdgeVerdict::Block(BlockReason::BlockedPath);
        }

        if let Some(query) = req.query.filter(|q| !q.is_empty()) {
            if self.suspicious_query.is_match(&query.to_lowercase()) {
                return EdgeVerdict::Block(BlockReason::SuspiciousQuery);
            }
        }

        if req.header_names.iter().any(|name| {
            self.suspicious_headers
                .iter()
                .any(|h| h.eq_ignore_ascii_case(name))
        }) {
            return EdgeVerdict::Block(BlockReason::SuspiciousHeader);
        }

        let flag = match req.user_agent.map(str::trim).filter(|ua| !ua.is_empty()) {
            None => Some(FlagReason::EmptyUserAgent),
            Some(ua) => {
                let ua = ua.to_lowercase();
                if self.malicious_user_agents.iter().any(|s| ua.contains(s)) {
                    return EdgeVerdict::Block(BlockReason::MaliciousUserAgent);
                }
                self.flagged_user_agents
                    .iter()
                    .any(|s| ua.contains(s))
                    .then_some(FlagReason::AutomationUserAgent)
            }
        };

        let method = req.method.to_uppercase();
        let allowed = if is_admin_api(&path) {
            ADMIN_METHODS
        } else {
            BASE_METHODS
        };
        if !allowed.contains(&method.as_str()) {
            return EdgeVerdict::Block(BlockReason::MethodNotAllowed);
        }

        if method == "POST" && !self.post_allowed(&path) {
            return EdgeVerdict::Block(BlockReason::PostNotAllowed);
        }

        match flag {
            Some(reason) => EdgeVerdict::AllowFlagged(reason),
            None => EdgeVerdict::Allow,
        }
    }

    fn has_blocked_extension(&self, path: &str) -> bool {
        self.blocked_extensions.iter().any(|ext| path.ends_with(ext.as_str()))
    }

    fn post_allowed(&self, path: &str) -> bool {
        self.post_allowed_prefixes.iter().any(|prefix| {
            if prefix.ends_with('/') {
                path.starts_with(prefix.as_str())
            } else {
                path == prefix
                    || path
                        .strip_prefix(prefix.as_str())
                        .map(|rest| rest.starts_with('/'))
                        .unwrap_or(false)
            }
        })
    }
}

/// Percent-decodes until the path stops changing, then lowercases.
fn decode_path(path: &str) -> String {
    let mut current = path.to_string();
    for _ in 0..MAX_DECODE_PASSES {
        let next = percent_decode_str(&current).decode_utf8_lossy().into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    current.to_lowercase()
}

fn is_admin_api(path: &str) -> bool {
    path == ADMIN_API_PREFIX
        || path
            .strip_prefix(ADMIN_API_PREFIX)
            .map(|rest| rest.starts_with('/'))
            .unwrap_or(false)
}
