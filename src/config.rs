//! Global configuration for pipeline-wide runtime behavior.
//!
//! Mirrors the "class-alloc lock" one-time-init singletons from the
//! originating design: here a handful of atomics plus a `OnceLock`-guarded
//! default set, read at negligible cost from hot parsing loops.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::OnceLock;

static STRICT_MODE: AtomicBool = AtomicBool::new(true);
static RETAIN_IDS: AtomicBool = AtomicBool::new(false);
static FASTA_WRAP_WIDTH: AtomicUsize = AtomicUsize::new(60);

/// Enable or disable strict mode (default: enabled).
///
/// In strict mode, parse and semantic errors abort the stream. In tidy
/// mode (`set_strict_mode(false)`), input adapters log a warning and
/// attempt to repair or skip the offending record instead.
#[inline]
pub fn set_strict_mode(enabled: bool) {
    STRICT_MODE.store(enabled, Ordering::Release);
}

#[inline]
pub fn is_strict_mode() -> bool {
    STRICT_MODE.load(Ordering::Acquire)
}

/// Whether GFF3 output should preserve incoming `ID=` values, renaming
/// only on collision, rather than renumbering every feature.
#[inline]
pub fn set_retain_ids(enabled: bool) {
    RETAIN_IDS.store(enabled, Ordering::Release);
}

#[inline]
pub fn retain_ids() -> bool {
    RETAIN_IDS.load(Ordering::Acquire)
}

/// Column width used to wrap inline FASTA sequence lines.
#[inline]
pub fn set_fasta_wrap_width(width: usize) {
    FASTA_WRAP_WIDTH.store(width.max(1), Ordering::Release);
}

#[inline]
pub fn fasta_wrap_width() -> usize {
    FASTA_WRAP_WIDTH.load(Ordering::Acquire)
}

/// Process-wide defaults, initialised once and never mutated afterward.
///
/// Stands in for the class-descriptor singletons of the original design;
/// `OnceLock` already gives the one-time-init guarantee a hand-rolled lock
/// would, including safely under a hypothetical future multi-threaded
/// caller.
pub struct Defaults {
    pub default_feature_type: &'static str,
    pub default_source: &'static str,
}

static DEFAULTS: OnceLock<Defaults> = OnceLock::new();

pub fn defaults() -> &'static Defaults {
    DEFAULTS.get_or_init(|| Defaults {
        default_feature_type: "region",
        default_source: ".",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_default_strict_mode() {
        set_strict_mode(true);
        assert!(is_strict_mode());
    }

    #[test]
    #[serial]
    fn test_tidy_mode_toggle() {
        set_strict_mode(false);
        assert!(!is_strict_mode());
        set_strict_mode(true);
    }

    #[test]
    fn test_fasta_wrap_width_default() {
        assert_eq!(fasta_wrap_width(), 60);
    }

    #[test]
    fn test_defaults_singleton() {
        let d = defaults();
        assert_eq!(d.default_source, ".");
    }
}
