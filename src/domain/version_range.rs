//! Version range matching for Bower declarations
//!
//! Handles declared version formats:
//! - Exact: `1.2.3`, `v1.2.3`, `=1.2.3`
//! - Caret / Tilde: `^1.2.3`, `~1.2.0`, `~1.2`
//! - Comparison: `>=1.2.3`, `> 1.0.0 <2.0.0`
//! - Wildcard: `*`, `1.x`, `1.2.*`
//! - Hyphen: `1.0.0 - 2.0.0`
//! - Alternatives: `^1.0.0 || ^2.0.0`
//! - Endpoints: `jquery#~2.1.0` (range after `#`)
//!
//! Anything else (urls, branch names, `latest`) is not a range.

use regex::Regex;
use semver::{Version, VersionReq};
use std::sync::LazyLock;

static COMPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(<=|>=|<|>|=|~|\^)?v?([0-9xX*]+(?:\.[0-9xX*]+){0,2})(-[0-9A-Za-z.-]+)?(?:\+[0-9A-Za-z.-]+)?$",
    )
    .unwrap()
});
static HYPHEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)\s+-\s+(\S+)$").unwrap());
static PARTIAL_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?$").unwrap());

/// A parsed declared range: satisfied when any alternative matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    alternatives: Vec<VersionReq>,
}

impl VersionRange {
    /// Parses a declared version string, returning `None` if it is not a range
    pub fn parse(declared: &str) -> Option<Self> {
        let spec = match declared.rsplit_once('#') {
            Some((_, range)) => range,
            None => declared,
        }
        .trim();

        if spec.eq_ignore_ascii_case("latest") || spec.contains('/') || spec.contains(':') {
            return None;
        }

        let alternatives = spec
            .split("||")
            .map(parse_alternative)
            .collect::<Option<Vec<_>>>()?;

        Some(Self { alternatives })
    }

    /// Parses an installed version, tolerating a leading `v` and short forms like `1.2`
    pub fn parse_version(version: &str) -> Option<Version> {
        let trimmed = version.trim();
        let trimmed = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('='))
            .unwrap_or(trimmed);

        if let Ok(parsed) = Version::parse(trimmed) {
            return Some(parsed);
        }

        if PARTIAL_VERSION_RE.is_match(trimmed) {
            let padded = match trimmed.matches('.').count() {
                0 => format!("{}.0.0", trimmed),
                _ => format!("{}.0", trimmed),
            };
            return Version::parse(&padded).ok();
        }

        None
    }

    /// Returns whether `installed` satisfies the range, or `None` if it is not semver
    pub fn satisfied_by(&self, installed: &str) -> Option<bool> {
        let version = Self::parse_version(installed)?;
        Some(self.matches(&version))
    }

    /// Returns true if any alternative matches
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }
}

fn parse_alternative(text: &str) -> Option<VersionReq> {
    let text = text.trim();
    if text.is_empty() {
        return Some(VersionReq::STAR);
    }

    if let Some(caps) = HYPHEN_RE.captures(text) {
        let lower = normalize_comparator(&format!(">={}", &caps[1]))?;
        let upper = normalize_comparator(&format!("<={}", &caps[2]))?;
        let joined = [lower, upper].into_iter().flatten().collect::<Vec<_>>();
        return build_req(&joined);
    }

    // npm allows whitespace between an operator and its version (">= 1.2.3")
    let mut comparators = Vec::new();
    let mut pending_op = String::new();
    for token in text.split_whitespace() {
        if token.chars().all(|c| matches!(c, '<' | '>' | '=' | '~' | '^')) {
            pending_op.push_str(token);
            continue;
        }
        let token = format!("{}{}", pending_op, token);
        pending_op.clear();
        if let Some(comparator) = normalize_comparator(&token)? {
            comparators.push(comparator);
        }
    }
    if !pending_op.is_empty() {
        return None;
    }

    build_req(&comparators)
}

fn build_req(comparators: &[String]) -> Option<VersionReq> {
    if comparators.is_empty() {
        return Some(VersionReq::STAR);
    }
    VersionReq::parse(&comparators.join(", ")).ok()
}

/// Rewrites one npm comparator into semver crate syntax.
///
/// Outer `None`: not a comparator. Inner `None`: matches any version.
fn normalize_comparator(token: &str) -> Option<Option<String>> {
    let caps = COMPARATOR_RE.captures(token)?;
    let op = caps.get(1).map(|m| m.as_str()).unwrap_or("=");
    let prerelease = caps.get(3).map(|m| m.as_str());

    let mut parts = Vec::new();
    let mut wildcard = false;
    for part in caps[2].split('.') {
        if matches!(part, "x" | "X" | "*") {
            wildcard = true;
            break;
        }
        parts.push(part);
    }

    if wildcard && prerelease.is_some() {
        return None;
    }
    if parts.is_empty() {
        return Some(None);
    }

    let mut comparator = format!("{}{}", op, parts.join("."));
    if let Some(pre) = prerelease {
        comparator.push_str(pre);
    }
    Some(Some(comparator))
}
