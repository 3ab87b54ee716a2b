//! End-of-supply estimation for prescriptions.
//!
//! Given an issue date and each medication's free-text duration, computes
//! the latest date by which the patient is expected to have exhausted the
//! supply. Month-valued durations use chrono's calendar-month addition,
//! which clamps to month end (2024-01-31 + 1 month = 2024-02-29).

use chrono::{Days, Months, NaiveDate};

use crate::duration::{parse_duration, DurationUnit};

/// Compute the calendar end date for one medication.
///
/// `None` if the duration text is unparseable or the addition overflows
/// the calendar range.
pub fn calculate_end_date(start: NaiveDate, duration: &str) -> Option<NaiveDate> {
    let parsed = parse_duration(duration)?;
    let n = parsed.value;
    match parsed.unit {
        DurationUnit::Day => start.checked_add_days(Days::new(u64::from(n))),
        DurationUnit::Week => start.checked_add_days(Days::new(u64::from(n) * 7)),
        DurationUnit::Month => start.checked_add_months(Months::new(n)),
    }
}

/// Latest end date across a prescription's medications.
///
/// Medications without a duration (or with unreadable text) contribute
/// nothing. `None` if no medication yields a valid end date.
pub fn latest_end_date<'a, I>(issue_date: NaiveDate, durations: I) -> Option<NaiveDate>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    durations
        .into_iter()
        .flatten()
        .filter_map(|text| calculate_end_date(issue_date, text))
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn ten_days_from_new_year() {
        assert_eq!(
            calculate_end_date(date(2024, 1, 1), "10 days"),
            Some(date(2024, 1, 11))
        );
    }

    #[test]
    fn weeks_add_whole_weeks() {
        assert_eq!(
            calculate_end_date(date(2024, 1, 1), "2 weeks"),
            Some(date(2024, 1, 15))
        );
    }

    #[test]
    fn month_addition_clamps_to_month_end() {
        // Jan 31 + 1 month lands on leap-day Feb 29 in 2024.
        assert_eq!(
            calculate_end_date(date(2024, 1, 31), "1 month"),
            Some(date(2024, 2, 29))
        );
        assert_eq!(
            calculate_end_date(date(2023, 1, 31), "1 month"),
            Some(date(2023, 2, 28))
        );
    }

    #[test]
    fn month_addition_is_calendar_aware() {
        // February is short; "1 month" from Feb 1 is Mar 1, not +30 days.
        assert_eq!(
            calculate_end_date(date(2023, 2, 1), "1 month"),
            Some(date(2023, 3, 1))
        );
    }

    #[test]
    fn bad_duration_is_absent() {
        assert_eq!(calculate_end_date(date(2024, 1, 1), "as needed"), None);
    }

    #[test]
    fn latest_picks_the_later_medication() {
        // 5 days vs 2 weeks from the same issue date: the 2-week course wins.
        let issue = date(2024, 3, 1);
        let latest = latest_end_date(issue, [Some("5 days"), Some("2 weeks")]);
        assert_eq!(latest, Some(date(2024, 3, 15)));
    }

    #[test]
    fn empty_medication_list_is_absent() {
        assert_eq!(latest_end_date(date(2024, 3, 1), []), None);
    }

    #[test]
    fn all_missing_durations_is_absent() {
        assert_eq!(latest_end_date(date(2024, 3, 1), [None, None]), None);
    }

    #[test]
    fn unparseable_durations_are_skipped() {
        let issue = date(2024, 3, 1);
        let latest = latest_end_date(issue, [Some("as directed"), Some("7 days")]);
        assert_eq!(latest, Some(date(2024, 3, 8)));
    }

    #[test]
    fn tie_between_medications_is_fine() {
        let issue = date(2024, 3, 1);
        let latest = latest_end_date(issue, [Some("1 week"), Some("7 days")]);
        assert_eq!(latest, Some(date(2024, 3, 8)));
    }
}
