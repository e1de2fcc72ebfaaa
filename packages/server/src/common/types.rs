//! Shared academic-term types.
//!
//! `AcademicYear` and `Semester` identify a term everywhere a score record,
//! enrollment or registration is keyed. The year format ("2024/2025") is
//! free-form in the database, so it is validated here, at the boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An academic year in "YYYY/YYYY" form, e.g. "2024/2025".
///
/// The second year must be the first plus one. Validated on construction;
/// values decoded from the database are trusted (they were validated on the
/// way in).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
#[serde(try_from = "String", into = "String")]
pub struct AcademicYear(String);

impl AcademicYear {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The calendar year the session starts in.
    pub fn start_year(&self) -> i32 {
        // Format is validated on construction, the parse cannot fail.
        self.0[..4].parse().unwrap_or(0)
    }
}

impl FromStr for AcademicYear {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((start, end)) = s.split_once('/') else {
            anyhow::bail!("academic year must be in YYYY/YYYY form, got {s:?}");
        };
        if start.len() != 4 || end.len() != 4 {
            anyhow::bail!("academic year must be in YYYY/YYYY form, got {s:?}");
        }
        let start_year: i32 = start
            .parse()
            .map_err(|_| anyhow::anyhow!("academic year must be in YYYY/YYYY form, got {s:?}"))?;
        let end_year: i32 = end
            .parse()
            .map_err(|_| anyhow::anyhow!("academic year must be in YYYY/YYYY form, got {s:?}"))?;
        if end_year != start_year + 1 {
            anyhow::bail!("academic year {s:?} does not span consecutive years");
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for AcademicYear {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AcademicYear> for String {
    fn from(year: AcademicYear) -> Self {
        year.0
    }
}

impl fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// First or second semester of a session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default,
)]
#[sqlx(type_name = "semester", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Semester {
    #[default]
    First,
    Second,
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Semester::First => write!(f, "first"),
            Semester::Second => write!(f, "second"),
        }
    }
}

impl FromStr for Semester {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(Semester::First),
            "second" => Ok(Semester::Second),
            _ => Err(anyhow::anyhow!("invalid semester: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_academic_year_parses() {
        let year: AcademicYear = "2024/2025".parse().unwrap();
        assert_eq!(year.as_str(), "2024/2025");
        assert_eq!(year.start_year(), 2024);
    }

    #[test]
    fn non_consecutive_years_rejected() {
        assert!("2024/2026".parse::<AcademicYear>().is_err());
        assert!("2025/2024".parse::<AcademicYear>().is_err());
    }

    #[test]
    fn malformed_years_rejected() {
        assert!("2024".parse::<AcademicYear>().is_err());
        assert!("24/25".parse::<AcademicYear>().is_err());
        assert!("abcd/efgh".parse::<AcademicYear>().is_err());
        assert!("2024-2025".parse::<AcademicYear>().is_err());
    }

    #[test]
    fn semester_round_trips() {
        assert_eq!("first".parse::<Semester>().unwrap(), Semester::First);
        assert_eq!(Semester::Second.to_string(), "second");
        assert!("third".parse::<Semester>().is_err());
    }
}
