use chrono::NaiveDate;

use super::utils::{clean_cell, parse_integral};

const UNIX_EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(1970, 1, 1) {
    Some(d) => d,
    None => panic!("1970-01-01 is a valid date"),
};

/// `YYYY` + `MM` → the first day of that month.
pub fn first_of_month(year: &str, month: &str) -> Result<NaiveDate, String> {
    let y = clean_cell(year)
        .and_then(parse_integral)
        .ok_or_else(|| format!("year {:?} is not a number", year))?;
    let m = clean_cell(month)
        .and_then(parse_integral)
        .ok_or_else(|| format!("month {:?} is not a number", month))?;
    if !(1..=12).contains(&m) {
        return Err(format!("month {} is outside 1-12", m));
    }
    if !(1..=9999).contains(&y) {
        return Err(format!("year {} is outside 1-9999", y));
    }
    NaiveDate::from_ymd_opt(y as i32, m as u32, 1)
        .ok_or_else(|| format!("{:04}-{:02}-01 is not a calendar date", y, m))
}

/// Days since 1970-01-01, the Arrow `Date32` encoding.
pub fn to_date32(date: NaiveDate) -> i32 {
    date.signed_duration_since(UNIX_EPOCH).num_days() as i32
}

pub fn from_date32(days: i32) -> Option<NaiveDate> {
    UNIX_EPOCH.checked_add_signed(chrono::Duration::days(i64::from(days)))
}
