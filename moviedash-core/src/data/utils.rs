use std::{convert::TryFrom, sync::Arc};

use itertools::Itertools;
use serde::{Deserialize, Deserializer};
use time::{macros::format_description, Date, Month};

pub const NOT_AVAILABLE: &str = "N/A";

pub fn default_str() -> Arc<str> {
    "".into()
}

pub fn deserialize_null_arc_str<'de, D>(deserializer: D) -> Result<Arc<str>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_else(default_str))
}

pub fn deserialize_null_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

pub fn deserialize_null_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    let opt = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}

/// Parses the catalog's `YYYY-MM-DD` dates.  Empty or partial dates yield
/// `None`.
pub fn parse_date(date: &str) -> Option<Date> {
    let mut parts = date.splitn(3, '-');
    let year = parts.next()?.parse().ok()?;
    let month: u8 = parts.next()?.parse().ok()?;
    let month = Month::try_from(month).ok()?;
    let day = parts.next()?.parse().ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

pub fn format_date(date: &str) -> String {
    parse_date(date)
        .and_then(|date| date.format(format_description!("[day]/[month]/[year]")).ok())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn format_runtime(minutes: Option<u32>) -> String {
    match minutes {
        Some(minutes) if minutes > 0 => format!("{}h {}m", minutes / 60, minutes % 60),
        _ => NOT_AVAILABLE.to_string(),
    }
}

pub fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let joined = names.filter(|name| !name.is_empty()).join(", ");
    if joined.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_is_split_into_hours_and_minutes() {
        assert_eq!(format_runtime(Some(135)), "2h 15m");
        assert_eq!(format_runtime(Some(45)), "0h 45m");
        assert_eq!(format_runtime(Some(0)), "N/A");
        assert_eq!(format_runtime(None), "N/A");
    }

    #[test]
    fn dates_are_shown_day_first() {
        assert_eq!(format_date("1999-03-31"), "31/03/1999");
        assert_eq!(format_date(""), "N/A");
        assert_eq!(format_date("1999"), "N/A");
        assert_eq!(format_date("1999-13-01"), "N/A");
    }

    #[test]
    fn empty_names_collapse_to_placeholder() {
        assert_eq!(join_names(["Drama", "", "Crime"].into_iter()), "Drama, Crime");
        assert_eq!(join_names(std::iter::empty()), "N/A");
    }
}
