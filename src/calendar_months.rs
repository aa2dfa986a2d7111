use chrono::{Datelike, NaiveDate};

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A calendar month in a given year. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(day: NaiveDate) -> Self {
        Self {
            year: day.year(),
            month: day.month(),
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day.year() == self.year && day.month() == self.month
    }

    /// Shifts by a signed number of months, rolling over year boundaries.
    pub fn offset(&self, months: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + months;
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn label(&self) -> &'static str {
        month_label(self.month)
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.offset(1).first_day()?.pred_opt()
    }
}

/// Three-letter English name keyed by month-of-year only.
pub fn month_label(month: u32) -> &'static str {
    let index = (month.clamp(1, 12) - 1) as usize;
    MONTH_LABELS[index]
}

/// The `window` months ending at and including the month of `now`, oldest first.
pub fn trailing_months(now: NaiveDate, window: usize) -> Vec<MonthKey> {
    let current = MonthKey::of(now);
    (0..window)
        .rev()
        .map(|back| current.offset(-(back as i32)))
        .collect()
}
