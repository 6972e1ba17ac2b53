use chrono::{Datelike, Days, Months, NaiveDate};

/// Every night in `[start, start + nights)`, in ascending order.
pub fn nights_from(start: NaiveDate, nights: u32) -> Vec<NaiveDate> {
    (0..nights as u64)
        .filter_map(|offset| start.checked_add_days(Days::new(offset)))
        .collect()
}

/// First day of every calendar month touched by `nights` nights starting at `start`.
pub fn months_spanned(start: NaiveDate, nights: u32) -> Vec<NaiveDate> {
    let Some(last_night) = nights
        .checked_sub(1)
        .and_then(|extra| start.checked_add_days(Days::new(extra as u64)))
    else {
        return Vec::new();
    };

    let mut months = Vec::new();
    let mut month = first_of_month(start);
    while month <= last_night {
        months.push(month);
        month = match month.checked_add_months(Months::new(1)) {
            Some(next) => next,
            None => break,
        };
    }
    months
}

/// The first day of the month `date` falls in.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Query parameter for a month request, e.g. `2024-07-01T00:00:00.000Z`.
pub fn format_month_param(month: NaiveDate) -> String {
    format!("{}T00:00:00.000Z", month.format("%Y-%m-%d"))
}

/// Key used by month payloads for a single night, e.g. `2024-07-03T00:00:00Z`.
pub fn format_date_key(date: NaiveDate) -> String {
    format!("{}T00:00:00Z", date.format("%Y-%m-%d"))
}
