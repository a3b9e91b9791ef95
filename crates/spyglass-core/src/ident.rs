//! Identifier allocation for application records.
//!
//! Record identifiers are human-readable slugs derived from the backend's
//! display name, made unique among currently active records. Freed
//! identifiers may be reused by a later allocation of the same name.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Regex for runs of characters that are not slug-safe.
static NON_SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9\-]+").unwrap());

/// Regex for consecutive separators.
static CONSECUTIVE_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").unwrap());

/// Normalize a display name into a URL-safe, lowercased slug.
///
/// # Rules Applied
/// 1. Convert to lowercase
/// 2. Replace runs of non-alphanumeric characters with `-`
/// 3. Collapse consecutive separators
/// 4. Trim leading/trailing separators
///
/// An all-symbol name slugifies to the empty string; callers fall back to a
/// counter-derived identifier in that case.
///
/// # Examples
///
/// ```
/// use spyglass_core::ident::slugify;
///
/// assert_eq!(slugify("My App"), "my-app");
/// assert_eq!(slugify("Shop (v2)"), "shop-v2");
/// assert_eq!(slugify("---"), "");
/// ```
pub fn slugify(name: &str) -> String {
    let mut result = name.to_lowercase();

    result = NON_SLUG.replace_all(&result, "-").to_string();
    result = CONSECUTIVE_SEPARATORS.replace_all(&result, "-").to_string();
    result = result.trim_matches('-').to_string();

    result
}

/// Allocator for record identifiers.
///
/// Tracks the set of identifiers currently in use. On a collision with a
/// requested default, free suffixes are probed as `"{default}:N"` while the
/// emitted identifier is `"{default}_{N}"`. The probe/emit asymmetry is
/// load-bearing: both forms are recorded, so repeated allocations of the same
/// default walk the suffix sequence instead of re-issuing `_1`.
#[derive(Debug, Default)]
pub struct IdentRegistry {
    allocated: HashSet<String>,
    /// Emitted identifier -> probe key recorded alongside it.
    probe_aliases: HashMap<String, String>,
}

impl IdentRegistry {
    /// Create an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an identifier.
    ///
    /// The candidate is `default_id` when given and non-empty, else the
    /// stringified `fallback_seed`. A taken default is suffixed with the
    /// first free probe number.
    pub fn allocate(&mut self, default_id: Option<&str>, fallback_seed: u64) -> String {
        let default_id = default_id.filter(|id| !id.is_empty());

        let Some(default_id) = default_id else {
            let id = fallback_seed.to_string();
            self.allocated.insert(id.clone());
            return id;
        };

        if !self.allocated.contains(default_id) {
            self.allocated.insert(default_id.to_string());
            return default_id.to_string();
        }

        let mut count = 1;
        while self.allocated.contains(&format!("{}:{}", default_id, count)) {
            count += 1;
        }
        let probe = format!("{}:{}", default_id, count);
        let id = format!("{}_{}", default_id, count);

        self.allocated.insert(probe.clone());
        self.allocated.insert(id.clone());
        self.probe_aliases.insert(id.clone(), probe);

        id
    }

    /// Release an identifier, making it available for reuse.
    pub fn free(&mut self, id: &str) {
        self.allocated.remove(id);
        if let Some(probe) = self.probe_aliases.remove(id) {
            self.allocated.remove(&probe);
        }
    }

    /// Check whether an identifier is currently allocated.
    pub fn is_allocated(&self, id: &str) -> bool {
        self.allocated.contains(id)
    }
}
