//! Best-match version selection
//!
//! Picks the single version of a gem that a dependency constraint resolves
//! to. Stable releases win over prereleases unless the constraint itself
//! points at a prerelease line.

use crate::version::{Constraint, Version};

/// Select the highest version in `available` that satisfies `constraint`
///
/// Prereleases are only eligible when the constraint references a
/// prerelease version (e.g. `>= 3.0.0.beta`). Among versions that rank equal
/// the one with the lexically greatest text wins, so the result does not
/// depend on the order of `available`.
///
/// Returns `None` when nothing satisfies the constraint.
pub fn resolve_best(available: &[Version], constraint: &Constraint) -> Option<Version> {
    let allow_prerelease = constraint.is_prerelease();
    let mut best: Option<&Version> = None;

    for candidate in available {
        if !candidate.satisfies(constraint) {
            continue;
        }
        if candidate.is_prerelease() && !allow_prerelease {
            continue;
        }

        let better = match best {
            None => true,
            Some(current) => {
                candidate > current || (candidate == current && candidate.as_str() > current.as_str())
            }
        };
        if better {
            best = Some(candidate);
        }
    }

    best.cloned()
}

/// Version resolver bound to one gem's available versions
pub struct VersionResolver {
    available: Vec<Version>,
}

impl VersionResolver {
    /// Create a resolver over the given versions
    pub fn new(available: Vec<Version>) -> Self {
        Self { available }
    }

    /// Resolve a constraint to the best available version
    pub fn resolve(&self, constraint: &Constraint) -> Option<Version> {
        resolve_best(&self.available, constraint)
    }
}
