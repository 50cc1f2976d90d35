//! Read-only diagnostic reports.
//!
//! Each report is gathered with a `collect*` function and rendered through
//! [`std::fmt::Display`], so formatting is testable without a database.

pub mod constraints;
pub mod counts;
pub mod deletion;
pub mod marks;
pub mod schedules;
pub mod teachers;

use std::fmt;

pub(crate) const WIDTH: usize = 60;

/// Writes a `=====` framed title.
pub(crate) fn banner(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "{}", "=".repeat(WIDTH))?;
    writeln!(f, "{title}")?;
    writeln!(f, "{}", "=".repeat(WIDTH))
}

/// Writes a `-----` separator.
pub(crate) fn rule(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{}", "-".repeat(WIDTH))
}

pub(crate) fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}
