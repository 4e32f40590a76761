//! Field validation and date-of-birth normalization
//!
//! Every function here is pure. Validators return an empty string for a
//! valid value and a human-readable message otherwise, so the result can be
//! stored straight into a [`FieldErrorMap`].

use crate::models::{FieldErrorMap, FormField, FormState};
use crate::{Error, Result};
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

pub const NAME_REQUIRED: &str = "Full name is required";
pub const NAME_TOO_SHORT: &str = "Name must be at least 2 characters";
pub const DOB_REQUIRED: &str = "Date of birth is required";
pub const DOB_INVALID: &str = "Invalid date format (MM/DD/YYYY)";
pub const TRIBE_REQUIRED: &str = "Please select your tribe";

const MIN_NAME_CHARS: usize = 2;

static DOB_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2})/(\d{2})/(\d{4})$").expect("date-of-birth pattern is a valid regex")
});

/// Validate one field's raw value
pub fn validate_field(field: FormField, raw: &str) -> String {
    let message = match field {
        FormField::Name => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                NAME_REQUIRED
            } else if trimmed.chars().count() < MIN_NAME_CHARS {
                NAME_TOO_SHORT
            } else {
                ""
            }
        }
        FormField::Dob => {
            if raw.is_empty() {
                DOB_REQUIRED
            } else if parse_dob(raw).is_none() {
                DOB_INVALID
            } else {
                ""
            }
        }
        FormField::Tribe => {
            if raw.is_empty() {
                TRIBE_REQUIRED
            } else {
                ""
            }
        }
        FormField::Gender => "",
    };
    message.to_string()
}

/// Validate every required field of a form
pub fn validate_form(form: &FormState) -> FieldErrorMap {
    let mut errors = FieldErrorMap::new();
    for field in FormField::REQUIRED {
        errors.set(field, validate_field(field, form.value(field)));
    }
    errors
}

/// Two-digit years are read as 19xx by the scoring service
pub const MIN_DOB_YEAR: i32 = 100;

/// Parse `MM/DD/YYYY` into a calendar date
///
/// Returns `None` unless the text matches the pattern exactly and the
/// constructed date reads back the same month, day and year. Years below
/// [`MIN_DOB_YEAR`] never read back and are rejected.
pub fn parse_dob(raw: &str) -> Option<NaiveDate> {
    let caps = DOB_PATTERN.captures(raw)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    if year < MIN_DOB_YEAR {
        return None;
    }

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    (date.year() == year && date.month() == month && date.day() == day).then_some(date)
}

/// Convert a validated `MM/DD/YYYY` string into `YYYY-MM-DD`
///
/// Refuses input that does not pass [`validate_field`] for `dob`.
pub fn normalize_dob_to_iso(raw: &str) -> Result<String> {
    parse_dob(raw)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .ok_or_else(|| Error::InvalidInput(format!("Not a valid MM/DD/YYYY date: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, dob: &str, tribe: &str) -> FormState {
        FormState {
            name: name.to_string(),
            dob: dob.to_string(),
            tribe: tribe.to_string(),
            gender: None,
        }
    }

    #[test]
    fn test_name_rules() {
        assert_eq!(validate_field(FormField::Name, ""), NAME_REQUIRED);
        assert_eq!(validate_field(FormField::Name, "   "), NAME_REQUIRED);
        assert_eq!(validate_field(FormField::Name, " J "), NAME_TOO_SHORT);
        assert_eq!(validate_field(FormField::Name, "Jo"), "");
        assert_eq!(validate_field(FormField::Name, "  Wanjiru Kamau "), "");
    }

    #[test]
    fn test_dob_required_and_format() {
        assert_eq!(validate_field(FormField::Dob, ""), DOB_REQUIRED);
        assert_eq!(validate_field(FormField::Dob, "1/5/1990"), DOB_INVALID);
        assert_eq!(validate_field(FormField::Dob, "1990-01-05"), DOB_INVALID);
        assert_eq!(validate_field(FormField::Dob, "01/05/90"), DOB_INVALID);
        assert_eq!(validate_field(FormField::Dob, " 01/05/1990"), DOB_INVALID);
        assert_eq!(validate_field(FormField::Dob, "01/05/1990"), "");
    }

    #[test]
    fn test_dob_impossible_calendar_dates() {
        for raw in ["02/30/2023", "13/01/2020", "02/29/2021", "00/10/2020", "04/31/2000", "06/00/1999"] {
            assert_eq!(validate_field(FormField::Dob, raw), DOB_INVALID, "{} should be rejected", raw);
        }
    }

    #[test]
    fn test_dob_two_digit_years_rejected() {
        for raw in ["01/01/0050", "12/31/0099", "06/15/0000"] {
            assert_eq!(validate_field(FormField::Dob, raw), DOB_INVALID, "{} should be rejected", raw);
            assert!(normalize_dob_to_iso(raw).is_err());
        }
        assert_eq!(validate_field(FormField::Dob, "01/01/0100"), "");
    }

    #[test]
    fn test_dob_leap_day() {
        assert_eq!(validate_field(FormField::Dob, "02/29/2020"), "");
        assert_eq!(validate_field(FormField::Dob, "02/29/2000"), "");
        assert_eq!(validate_field(FormField::Dob, "02/29/1900"), DOB_INVALID);
    }

    #[test]
    fn test_tribe_and_gender() {
        assert_eq!(validate_field(FormField::Tribe, ""), TRIBE_REQUIRED);
        assert_eq!(validate_field(FormField::Tribe, "Luo"), "");
        assert_eq!(validate_field(FormField::Gender, ""), "");
        assert_eq!(validate_field(FormField::Gender, "anything"), "");
    }

    #[test]
    fn test_normalize_dob() {
        assert_eq!(normalize_dob_to_iso("01/05/1990").unwrap(), "1990-01-05");
        assert_eq!(normalize_dob_to_iso("12/31/2001").unwrap(), "2001-12-31");
        assert!(normalize_dob_to_iso("02/30/2023").is_err());
        assert!(normalize_dob_to_iso("").is_err());
    }

    #[test]
    fn test_normalize_round_trips_every_day_of_a_leap_year() {
        let mut date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        while date.year() == 2024 {
            let typed = date.format("%m/%d/%Y").to_string();
            assert_eq!(validate_field(FormField::Dob, &typed), "");

            let iso = normalize_dob_to_iso(&typed).unwrap();
            let reparsed = NaiveDate::parse_from_str(&iso, "%Y-%m-%d").unwrap();
            assert_eq!(reparsed, date);

            date = date.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_validate_form_clear_iff_permitted() {
        let ok = validate_form(&form("Jo", "03/14/1995", "Luo"));
        assert!(ok.is_clear());

        let blocked = validate_form(&form("Jo", "02/29/2021", "Luo"));
        assert!(!blocked.is_clear());
        assert_eq!(blocked.get(FormField::Dob), DOB_INVALID);
        assert_eq!(blocked.get(FormField::Name), "");

        let empty = validate_form(&FormState::default());
        assert_eq!(empty.get(FormField::Name), NAME_REQUIRED);
        assert_eq!(empty.get(FormField::Dob), DOB_REQUIRED);
        assert_eq!(empty.get(FormField::Tribe), TRIBE_REQUIRED);
    }
}
