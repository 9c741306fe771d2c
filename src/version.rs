//! Gem version parsing and constraint matching
//!
//! Versions follow RubyGems rules rather than strict semver:
//! - Any number of dot-separated segments: "1", "1.2", "1.2.3.4"
//! - Letters start a prerelease: "2.0.0.rc1", "1.0.beta"
//! - A hyphen is shorthand for ".pre.": "1.0.0-rc1" == "1.0.0.pre.rc1"
//!
//! Constraints are comma-separated clauses:
//! - Exact: "1.2.3" or "= 1.2.3"
//! - Not equal: "!= 1.2.3"
//! - Greater/Less: "> 1.0", ">= 1.0", "< 2.0", "<= 2.0"
//! - Pessimistic: "~> 1.2" (>= 1.2, < 2.0), "~> 1.2.3" (>= 1.2.3, < 1.3)
//! - Range: ">= 1.2.0, < 1.8.0"

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::{GemError, Result};

/// One segment of a version: a run of digits or a run of letters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Numeric(u64),
    Alpha(String),
}

/// Missing segments compare as zero
const ZERO: Segment = Segment::Numeric(0);

impl Segment {
    fn is_alpha(&self) -> bool {
        matches!(self, Segment::Alpha(_))
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Segment::Numeric(a), Segment::Numeric(b)) => a.cmp(b),
            (Segment::Alpha(a), Segment::Alpha(b)) => a.cmp(b),
            (Segment::Alpha(_), Segment::Numeric(_)) => Ordering::Less,
            (Segment::Numeric(_), Segment::Alpha(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Numeric(n) => write!(f, "{}", n),
            Segment::Alpha(s) => write!(f, "{}", s),
        }
    }
}

/// A gem version
///
/// Ordering is total: versions are first ranked by RubyGems precedence
/// (see [`Version::precedence`]), then a version carrying an explicit
/// prerelease flag sorts below the same unflagged version, then fewer
/// segments sort first. Two versions are equal iff their segments and
/// prerelease flags are equal.
#[derive(Debug, Clone)]
pub struct Version {
    text: String,
    segments: Vec<Segment>,
    flagged_prerelease: bool,
}

impl Version {
    /// Parse a version string like "1.2.3" or "2.0.0.rc1"
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(GemError::parse(s, "version is empty"));
        }

        let (release, pre) = match trimmed.split_once('-') {
            Some((release, pre)) => (release, Some(pre)),
            None => (trimmed, None),
        };

        let mut parts = release.split('.');
        let first = parts.next().unwrap_or_default();
        if first.is_empty() || !first.bytes().all(|b| b.is_ascii_digit()) {
            return Err(GemError::parse(s, "version must start with a number"));
        }
        for part in parts {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_alphanumeric()) {
                return Err(GemError::parse(s, format!("malformed segment '{}'", part)));
            }
        }

        if let Some(pre) = pre {
            for part in pre.split('.') {
                let valid = !part.is_empty()
                    && part.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-');
                if !valid {
                    return Err(GemError::parse(
                        s,
                        format!("malformed prerelease segment '{}'", part),
                    ));
                }
            }
        }

        let text = trimmed.replace('-', ".pre.");
        let segments = scan_segments(&text).map_err(|message| GemError::parse(s, message))?;

        Ok(Version {
            text,
            segments,
            flagged_prerelease: false,
        })
    }

    /// The lowest version, "0"
    pub fn zero() -> Self {
        Self::from_segments(vec![ZERO])
    }

    fn from_segments(segments: Vec<Segment>) -> Self {
        let text = segments
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(".");
        Version {
            text,
            segments,
            flagged_prerelease: false,
        }
    }

    /// Mark this version as a prerelease regardless of its segments
    ///
    /// Store records carry a separate prerelease flag for versions whose
    /// text alone does not reveal it.
    pub fn with_prerelease_flag(mut self, flag: bool) -> Self {
        self.flagged_prerelease = flag;
        self
    }

    /// Normalized version text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// A version is a prerelease if any segment contains letters or it was
    /// explicitly flagged
    pub fn is_prerelease(&self) -> bool {
        self.flagged_prerelease || self.segments.iter().any(Segment::is_alpha)
    }

    /// The release this version leads up to ("1.0.0.rc1" -> "1.0.0")
    pub fn release(&self) -> Version {
        if !self.is_prerelease() {
            return self.clone();
        }
        let segments: Vec<Segment> = self
            .segments
            .iter()
            .take_while(|s| !s.is_alpha())
            .cloned()
            .collect();
        Self::from_segments(segments)
    }

    /// The exclusive upper bound used by `~>`
    ///
    /// Drops prerelease segments and the last release segment, then
    /// increments what remains: "1.2.3" -> "1.3", "1.2" -> "2", "1" -> "2".
    pub fn bump(&self) -> Version {
        let mut segments: Vec<Segment> = self
            .segments
            .iter()
            .take_while(|s| !s.is_alpha())
            .cloned()
            .collect();
        if segments.len() > 1 {
            segments.pop();
        }
        match segments.last_mut() {
            Some(Segment::Numeric(n)) => *n = n.saturating_add(1),
            _ => segments = vec![Segment::Numeric(1)],
        }
        Self::from_segments(segments)
    }

    /// Compare by RubyGems precedence only
    ///
    /// Segments are compared pairwise with the shorter side padded with
    /// zeros; a letter segment is lower than any number. "1.0" and "1.0.0"
    /// have equal precedence, "1.0.0.rc1" is lower than "1.0.0".
    pub fn precedence(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let lhs = self.segments.get(i).unwrap_or(&ZERO);
            let rhs = other.segments.get(i).unwrap_or(&ZERO);
            match lhs.cmp(rhs) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        Ordering::Equal
    }

    /// Check if this version satisfies a constraint
    pub fn satisfies(&self, constraint: &Constraint) -> bool {
        constraint.is_satisfied_by(self)
    }
}

fn scan_segments(text: &str) -> std::result::Result<Vec<Segment>, String> {
    let mut segments = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_ascii_digit() {
            let mut end = start;
            while let Some(&(i, d)) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                end = i + d.len_utf8();
                chars.next();
            }
            let digits = &text[start..end];
            let n = digits
                .parse::<u64>()
                .map_err(|_| format!("segment '{}' is too large", digits))?;
            segments.push(Segment::Numeric(n));
        } else if c.is_ascii_alphabetic() {
            let mut end = start;
            while let Some(&(i, a)) = chars.peek() {
                if !a.is_ascii_alphabetic() {
                    break;
                }
                end = i + a.len_utf8();
                chars.next();
            }
            segments.push(Segment::Alpha(text[start..end].to_string()));
        } else {
            chars.next();
        }
    }

    if segments.is_empty() {
        return Err("version has no segments".to_string());
    }
    Ok(segments)
}

impl FromStr for Version {
    type Err = GemError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments && self.flagged_prerelease == other.flagged_prerelease
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.segments.hash(state);
        self.flagged_prerelease.hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.precedence(other)
            .then_with(|| other.flagged_prerelease.cmp(&self.flagged_prerelease))
            .then_with(|| self.segments.len().cmp(&other.segments.len()))
    }
}

/// Constraint operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,          // = 1.2.3 or 1.2.3
    NotEq,       // != 1.2.3
    Greater,     // > 1.2.3
    GreaterEq,   // >= 1.2.3
    Less,        // < 1.2.3
    LessEq,      // <= 1.2.3
    Pessimistic, // ~> 1.2.3
}

impl Op {
    fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::NotEq => "!=",
            Op::Greater => ">",
            Op::GreaterEq => ">=",
            Op::Less => "<",
            Op::LessEq => "<=",
            Op::Pessimistic => "~>",
        }
    }
}

/// One `operator version` clause of a constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub op: Op,
    pub version: Version,
}

impl Clause {
    /// Check if a version satisfies this clause
    pub fn matches(&self, version: &Version) -> bool {
        let ord = version.precedence(&self.version);
        match self.op {
            Op::Eq => ord == Ordering::Equal,
            Op::NotEq => ord != Ordering::Equal,
            Op::Greater => ord == Ordering::Greater,
            Op::GreaterEq => ord != Ordering::Less,
            Op::Less => ord == Ordering::Less,
            Op::LessEq => ord != Ordering::Greater,
            Op::Pessimistic => {
                ord != Ordering::Less
                    && version.release().precedence(&self.version.bump()) == Ordering::Less
            }
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op.as_str(), self.version)
    }
}

/// A version constraint: every clause must hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    clauses: Vec<Clause>,
}

impl Constraint {
    /// Parse a constraint string
    ///
    /// Empty text yields the default constraint, ">= 0".
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::default());
        }

        let clauses = s
            .split(',')
            .map(Self::parse_clause)
            .collect::<Result<Vec<_>>>()?;

        Ok(Constraint { clauses })
    }

    /// Parse a single clause (no commas)
    fn parse_clause(s: &str) -> Result<Clause> {
        let s = s.trim();
        if s.is_empty() {
            return Err(GemError::parse(s, "empty constraint clause"));
        }

        // Two-character operators must be tried before their prefixes
        let (op, version_str) = if let Some(rest) = s.strip_prefix(">=") {
            (Op::GreaterEq, rest)
        } else if let Some(rest) = s.strip_prefix("<=") {
            (Op::LessEq, rest)
        } else if let Some(rest) = s.strip_prefix("!=") {
            (Op::NotEq, rest)
        } else if let Some(rest) = s.strip_prefix("~>") {
            (Op::Pessimistic, rest)
        } else if let Some(rest) = s.strip_prefix('>') {
            (Op::Greater, rest)
        } else if let Some(rest) = s.strip_prefix('<') {
            (Op::Less, rest)
        } else if let Some(rest) = s.strip_prefix('=') {
            (Op::Eq, rest)
        } else {
            (Op::Eq, s)
        };

        let version = Version::parse(version_str).map_err(|err| match err {
            GemError::Parse { message, .. } => GemError::parse(s, message),
            other => other,
        })?;

        Ok(Clause { op, version })
    }

    /// Check if a version matches every clause
    pub fn is_satisfied_by(&self, version: &Version) -> bool {
        self.clauses.iter().all(|c| c.matches(version))
    }

    /// A constraint explicitly requests prereleases when one of its own
    /// reference versions is a prerelease
    pub fn is_prerelease(&self) -> bool {
        self.clauses.iter().any(|c| c.version.is_prerelease())
    }
}

impl Default for Constraint {
    fn default() -> Self {
        Constraint {
            clauses: vec![Clause {
                op: Op::GreaterEq,
                version: Version::zero(),
            }],
        }
    }
}

impl FromStr for Constraint {
    type Err = GemError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.clauses.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn c(s: &str) -> Constraint {
        Constraint::parse(s).unwrap()
    }

    #[test]
    fn test_version_parse() {
        let ver = v("1.2.3");
        assert_eq!(
            ver.segments,
            &[Segment::Numeric(1), Segment::Numeric(2), Segment::Numeric(3)]
        );
        assert!(!ver.is_prerelease());

        let ver = v("2.0.0.rc1");
        assert_eq!(
            ver.segments,
            &[
                Segment::Numeric(2),
                Segment::Numeric(0),
                Segment::Numeric(0),
                Segment::Alpha("rc".to_string()),
                Segment::Numeric(1),
            ]
        );
        assert!(ver.is_prerelease());
    }

    #[test]
    fn test_version_parse_hyphen_prerelease() {
        let ver = v("1.0.0-beta.2");
        assert_eq!(ver.as_str(), "1.0.0.pre.beta.2");
        assert!(ver.is_prerelease());
        assert_eq!(ver, v("1.0.0.pre.beta.2"));
    }

    #[test]
    fn test_version_parse_errors() {
        assert!(matches!(Version::parse(""), Err(GemError::Parse { .. })));
        assert!(Version::parse("   ").is_err());
        assert!(Version::parse("abc").is_err());
        assert!(Version::parse("1..2").is_err());
        assert!(Version::parse("1.2.").is_err());
        assert!(Version::parse("1.2 3").is_err());
        assert!(Version::parse("1.0-").is_err());
        assert!(Version::parse("99999999999999999999999").is_err());
    }

    #[test]
    fn test_version_comparison() {
        assert!(v("1.2.3") < v("1.2.4"));
        assert!(v("1.2.4") < v("1.3.0"));
        assert!(v("1.9") < v("1.10"));
        assert!(v("2.0.0.rc1") < v("2.0.0"));
        assert!(v("2.0.0.a") < v("2.0.0.b"));
        assert!(v("1.0.0") < v("1.0.0.1"));
        assert!(v("1.2.0") < v("2.0.0.rc1"));
    }

    #[test]
    fn test_precedence_pads_with_zero() {
        assert_eq!(v("1.0").precedence(&v("1.0.0")), Ordering::Equal);
        assert_ne!(v("1.0"), v("1.0.0"));
        assert!(v("1.0") < v("1.0.0"));
        assert_eq!(v("1.0.rc").precedence(&v("1.0")), Ordering::Less);
    }

    #[test]
    fn test_prerelease_flag() {
        let flagged = v("1.0.0").with_prerelease_flag(true);
        assert!(flagged.is_prerelease());
        assert!(flagged < v("1.0.0"));
        assert_ne!(flagged, v("1.0.0"));
    }

    #[test]
    fn test_release_and_bump() {
        assert_eq!(v("1.2.3.rc1").release(), v("1.2.3"));
        assert_eq!(v("1.2.3").release(), v("1.2.3"));
        assert_eq!(v("1.2.3").bump(), v("1.3"));
        assert_eq!(v("1.2").bump(), v("2"));
        assert_eq!(v("1").bump(), v("2"));
        assert_eq!(v("1.2.3.rc1").bump(), v("1.3"));
    }

    #[test]
    fn test_exact_constraint() {
        let req = c("= 1.2.3");
        assert!(req.is_satisfied_by(&v("1.2.3")));
        assert!(!req.is_satisfied_by(&v("1.2.4")));

        let req = c("1.2");
        assert!(req.is_satisfied_by(&v("1.2.0")));
    }

    #[test]
    fn test_pessimistic_constraint() {
        let req = c("~> 1.0");
        assert!(req.is_satisfied_by(&v("1.0.0")));
        assert!(req.is_satisfied_by(&v("1.1.0")));
        assert!(!req.is_satisfied_by(&v("2.0.0")));

        let req = c("~> 1.1");
        assert!(!req.is_satisfied_by(&v("1.0.0")));
        assert!(req.is_satisfied_by(&v("1.1.0")));

        let req = c("~>1.2.3");
        assert!(req.is_satisfied_by(&v("1.2.9")));
        assert!(!req.is_satisfied_by(&v("1.3.0")));
        assert!(!req.is_satisfied_by(&v("1.3.0.rc1")));
    }

    #[test]
    fn test_range_constraint() {
        let req = c(">= 1.2.0, < 1.8.0");
        assert!(!req.is_satisfied_by(&v("1.1.9")));
        assert!(req.is_satisfied_by(&v("1.2.0")));
        assert!(req.is_satisfied_by(&v("1.5.0")));
        assert!(!req.is_satisfied_by(&v("1.8.0")));
    }

    #[test]
    fn test_greater_less_not_equal() {
        let req = c("> 1.0.0");
        assert!(!req.is_satisfied_by(&v("1.0.0")));
        assert!(req.is_satisfied_by(&v("1.0.1")));

        let req = c("<= 2.0");
        assert!(req.is_satisfied_by(&v("2.0.0")));
        assert!(!req.is_satisfied_by(&v("2.0.1")));

        let req = c("!= 1.5");
        assert!(!req.is_satisfied_by(&v("1.5.0")));
        assert!(req.is_satisfied_by(&v("1.5.1")));
    }

    #[test]
    fn test_default_constraint() {
        let req = c("");
        assert_eq!(req, Constraint::default());
        assert_eq!(req.to_string(), ">= 0");
        assert!(req.is_satisfied_by(&v("0.0.1")));
        assert!(!req.is_prerelease());
    }

    #[test]
    fn test_constraint_parse_errors() {
        assert!(Constraint::parse(">= 1.0,").is_err());
        assert!(Constraint::parse("~> ").is_err());
        assert!(Constraint::parse(">> 1.0").is_err());
    }

    #[test]
    fn test_constraint_prerelease_request() {
        assert!(c(">= 2.0.0.rc1").is_prerelease());
        assert!(!c(">= 1.0, < 2.0").is_prerelease());
    }

    fn version_text() -> impl Strategy<Value = String> {
        (
            prop::collection::vec(0u64..12, 1..5),
            prop::option::of((prop::sample::select(vec!["a", "b", "pre", "rc"]), 0u64..3)),
        )
            .prop_map(|(nums, pre)| {
                let mut text = nums
                    .iter()
                    .map(|n| n.to_string())
                    .collect::<Vec<_>>()
                    .join(".");
                if let Some((tag, n)) = pre {
                    text.push_str(&format!(".{}{}", tag, n));
                }
                text
            })
    }

    proptest! {
        #[test]
        fn prop_compare_is_reflexive(a in version_text()) {
            let a = v(&a);
            prop_assert_eq!(a.cmp(&a), Ordering::Equal);
        }

        #[test]
        fn prop_compare_is_antisymmetric(a in version_text(), b in version_text()) {
            let (a, b) = (v(&a), v(&b));
            prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
            prop_assert_eq!(a.cmp(&b) == Ordering::Equal, a == b);
        }

        #[test]
        fn prop_compare_is_transitive(
            a in version_text(),
            b in version_text(),
            c in version_text(),
        ) {
            let mut sorted = vec![v(&a), v(&b), v(&c)];
            sorted.sort();
            prop_assert!(sorted[0] <= sorted[1]);
            prop_assert!(sorted[1] <= sorted[2]);
            prop_assert!(sorted[0] <= sorted[2]);
        }

        #[test]
        fn prop_version_satisfies_own_exact_constraint(a in version_text()) {
            let ver = v(&a);
            let req = c(&format!("= {}", ver));
            prop_assert!(ver.satisfies(&req));
        }
    }
}
