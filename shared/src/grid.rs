//! Year grid layout for the contribution heatmap.
//!
//! Partitions the days of a calendar year into week columns aligned to a
//! Sunday origin and derives the month label positions the heatmap header
//! needs. All of this is pure date math so both the frontend renderer and
//! the test suite can use it directly.

use chrono::{Datelike, NaiveDate};

/// Abbreviated month names indexed by `month - 1`
pub const MONTH_ABBREVS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Abbreviated day names indexed by day-of-week (0 = Sunday)
pub const DAY_ABBREVS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// One column of the heatmap: seven slots, slot `i` holding the date that
/// falls on day-of-week `i` (0 = Sunday). `None` slots occur only in the
/// first and last columns of a year.
pub type WeekColumn = [Option<NaiveDate>; 7];

/// A month name anchored to the first week column whose earliest date falls
/// in that month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthLabel {
    pub month: &'static str,
    pub week_index: usize,
}

/// The full layout of one calendar year: 52 or 53 week columns plus one
/// label per month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearGrid {
    pub weeks: Vec<WeekColumn>,
    pub month_labels: Vec<MonthLabel>,
}

impl YearGrid {
    /// How many week columns the label at `index` spans in the header row
    pub fn label_span(&self, index: usize) -> usize {
        match self.month_labels.get(index) {
            Some(label) => {
                let next_start = self
                    .month_labels
                    .get(index + 1)
                    .map(|next| next.week_index)
                    .unwrap_or(self.weeks.len());
                next_start - label.week_index
            }
            None => 0,
        }
    }
}

/// Build the week-column layout for a calendar year.
///
/// Walks every date from January 1 to December 31 in order, starting a new
/// column whenever a Sunday is reached with dates already buffered. The
/// trailing partial column is kept, so concatenating all non-null slots
/// reproduces the year exactly.
pub fn build_year_grid(year: i32) -> YearGrid {
    let (Some(start), Some(end)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) else {
        // Year outside chrono's representable range
        return YearGrid {
            weeks: Vec::new(),
            month_labels: Vec::new(),
        };
    };

    let mut weeks: Vec<WeekColumn> = Vec::with_capacity(54);
    let mut current: WeekColumn = [None; 7];

    let mut day = start;
    loop {
        let slot = day.weekday().num_days_from_sunday() as usize;
        if slot == 0 && current.iter().any(Option::is_some) {
            weeks.push(current);
            current = [None; 7];
        }
        current[slot] = Some(day);

        if day == end {
            break;
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    if current.iter().any(Option::is_some) {
        weeks.push(current);
    }

    let mut month_labels = Vec::with_capacity(12);
    let mut last_month = 0u32;
    for (week_index, week) in weeks.iter().enumerate() {
        if let Some(first) = week.iter().flatten().next() {
            let month = first.month();
            if month != last_month {
                month_labels.push(MonthLabel {
                    month: MONTH_ABBREVS[(month - 1) as usize],
                    week_index,
                });
                last_month = month;
            }
        }
    }

    YearGrid { weeks, month_labels }
}
