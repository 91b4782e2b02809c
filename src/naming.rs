//! Output file naming.
//!
//! Resolved records are named from their identity tokens. Collisions inside one
//! destination directory are broken with the record's 1-based start page.
//! Fallback files (orphans, unknown records, errors) use a fixed prefix and the
//! start page.

use crate::classifier::RecordIdentity;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

lazy_static! {
    static ref RE_UNSAFE_CHARS: Regex = Regex::new(r"[^\w\s\-]").unwrap();
    static ref RE_WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
    static ref RE_LEADING_MONTH: Regex = Regex::new(r"^([0-9]{2})([^0-9].*)?$").unwrap();
}

/// Longest cleaned token, in characters.
pub const MAX_TOKEN_CHARS: usize = 120;

/// Extension of every produced file.
pub const OUTPUT_EXTENSION: &str = "pdf";

/// Make a token safe for use in a file name.
///
/// Drops anything that is not a word character, whitespace or `-`, turns
/// whitespace runs into `_` and truncates to [`MAX_TOKEN_CHARS`].
///
/// ```
/// use payslip_split::naming::clean_filename;
///
/// assert_eq!(clean_filename("  Jean-Pierre D'Arc "), "Jean-Pierre_DArc");
/// ```
pub fn clean_filename(text: &str) -> String {
    let stripped = RE_UNSAFE_CHARS.replace_all(text.trim(), "");
    let joined = RE_WHITESPACE_RUN.replace_all(&stripped, "_");
    joined.chars().take(MAX_TOKEN_CHARS).collect()
}

/// Language used for month names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthLocale {
    /// January, February, ...
    English,
    /// Janvier, Fevrier, ... (ASCII spelling)
    French,
}

impl MonthLocale {
    fn names(self) -> [&'static str; 12] {
        match self {
            MonthLocale::English => [
                "January",
                "February",
                "March",
                "April",
                "May",
                "June",
                "July",
                "August",
                "September",
                "October",
                "November",
                "December",
            ],
            MonthLocale::French => [
                "Janvier",
                "Fevrier",
                "Mars",
                "Avril",
                "Mai",
                "Juin",
                "Juillet",
                "Aout",
                "Septembre",
                "Octobre",
                "Novembre",
                "Decembre",
            ],
        }
    }
}

/// How a token is rendered into a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenFormat {
    /// Token as extracted
    #[default]
    Verbatim,
    /// Leading two-digit month replaced by its name: `12-2025` -> `December-2025`
    MonthName(MonthLocale),
}

impl TokenFormat {
    /// Apply the format. Depends only on the token value.
    pub fn apply(self, token: &str) -> String {
        match self {
            TokenFormat::Verbatim => token.to_string(),
            TokenFormat::MonthName(locale) => {
                let Some(caps) = RE_LEADING_MONTH.captures(token) else {
                    return token.to_string();
                };
                let month: usize = match caps[1].parse() {
                    Ok(m) if (1..=12).contains(&m) => m,
                    _ => return token.to_string(),
                };
                let rest = caps.get(2).map_or("", |m| m.as_str());
                format!("{}{}", locale.names()[month - 1], rest)
            },
        }
    }
}

/// Suffix appended when a base name is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionStyle {
    /// `_p005`, used when pages are grouped into records
    #[default]
    Record,
    /// `_page005`, used when every page is its own file
    Page,
}

impl CollisionStyle {
    fn suffix(self, start_page: usize) -> String {
        match self {
            CollisionStyle::Record => format!("_p{:03}", start_page),
            CollisionStyle::Page => format!("_page{:03}", start_page),
        }
    }
}

/// Builds canonical, collision-free output names from identities.
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    formats: HashMap<String, TokenFormat>,
    collision: CollisionStyle,
}

impl NameResolver {
    /// Resolver with verbatim tokens and record-style collision suffixes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `field` with `format` instead of verbatim.
    pub fn with_format(mut self, field: impl Into<String>, format: TokenFormat) -> Self {
        self.formats.insert(field.into(), format);
        self
    }

    /// Choose the collision suffix style.
    pub fn with_collision_style(mut self, style: CollisionStyle) -> Self {
        self.collision = style;
        self
    }

    /// Collision suffix style in use.
    pub fn collision_style(&self) -> CollisionStyle {
        self.collision
    }

    /// Name built from the identity alone, e.g. `Dupont_Marie_12-2025.pdf`.
    pub fn base_name(&self, identity: &RecordIdentity) -> String {
        let stem = identity
            .iter()
            .map(|(field, value)| {
                let format = self.formats.get(field).copied().unwrap_or_default();
                clean_filename(&format.apply(value))
            })
            .collect::<Vec<_>>()
            .join("_");
        format!("{}.{}", stem, OUTPUT_EXTENSION)
    }

    /// Resolve the output name for a record starting at `start_page` (1-based).
    ///
    /// Returns the base name unless it is in `existing`, in which case the
    /// start-page suffix is appended. A numeric counter follows if that is
    /// taken as well. Same inputs always give the same name.
    ///
    /// ```
    /// use std::collections::HashSet;
    /// use payslip_split::classifier::RecordIdentity;
    /// use payslip_split::naming::NameResolver;
    ///
    /// let resolver = NameResolver::new();
    /// let identity = RecordIdentity::from_pairs([("period", "01-2026"), ("id", "BBB-002")]);
    /// let mut existing = HashSet::new();
    ///
    /// let first = resolver.resolve(&identity, 1, &existing);
    /// assert_eq!(first, "01-2026_BBB-002.pdf");
    /// existing.insert(first);
    /// assert_eq!(resolver.resolve(&identity, 5, &existing), "01-2026_BBB-002_p005.pdf");
    /// ```
    pub fn resolve(
        &self,
        identity: &RecordIdentity,
        start_page: usize,
        existing: &HashSet<String>,
    ) -> String {
        let base = self.base_name(identity);
        if !existing.contains(&base) {
            return base;
        }

        let stem = base
            .strip_suffix(&format!(".{}", OUTPUT_EXTENSION))
            .unwrap_or(&base);
        let suffixed = format!(
            "{}{}.{}",
            stem,
            self.collision.suffix(start_page),
            OUTPUT_EXTENSION
        );
        if !existing.contains(&suffixed) {
            return suffixed;
        }

        let mut counter = 2;
        loop {
            let candidate = format!(
                "{}{}_{}.{}",
                stem,
                self.collision.suffix(start_page),
                counter,
                OUTPUT_EXTENSION
            );
            if !existing.contains(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }
}

/// Kind of fallback file written to the error directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackKind {
    /// Continuation page seen before any record was opened
    Orphan,
    /// Record closed without a complete identity
    UnknownRecord,
    /// Single page without a complete identity (page-per-file mode)
    UnknownPage,
    /// Record whose primary write failed
    ErrorRecord,
    /// Page whose text could not be extracted
    ErrorPage,
}

impl FallbackKind {
    /// Deterministic file name for a fallback starting at `start_page` (1-based).
    pub fn file_name(self, start_page: usize) -> String {
        match self {
            FallbackKind::Orphan => format!("orphan_page_{:03}.{}", start_page, OUTPUT_EXTENSION),
            FallbackKind::UnknownRecord => {
                format!("unknown_record_p{:03}.{}", start_page, OUTPUT_EXTENSION)
            },
            FallbackKind::UnknownPage => {
                format!("unknown_page_{:03}.{}", start_page, OUTPUT_EXTENSION)
            },
            FallbackKind::ErrorRecord => {
                format!("error_record_p{:03}.{}", start_page, OUTPUT_EXTENSION)
            },
            FallbackKind::ErrorPage => format!("error_page_{:03}.{}", start_page, OUTPUT_EXTENSION),
        }
    }
}

/// Names claimed per destination directory during one run.
#[derive(Debug, Default)]
pub struct NameRegistry {
    claimed: HashMap<PathBuf, HashSet<String>>,
    empty: HashSet<String>,
}

impl NameRegistry {
    /// Empty registry for a new run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names already written to `dir` in this run.
    pub fn names_in(&self, dir: &Path) -> &HashSet<String> {
        self.claimed.get(dir).unwrap_or(&self.empty)
    }

    /// Record that `name` was written to `dir`. Returns false if it already was.
    pub fn claim(&mut self, dir: &Path, name: impl Into<String>) -> bool {
        self.claimed
            .entry(dir.to_path_buf())
            .or_default()
            .insert(name.into())
    }
}
