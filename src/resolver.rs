// 🎨 Timeline Resolver - assigns a color to every month of the lifespan
//
// Pure function of (configuration, as_of). "Now" is injected so results are
// reproducible; production callers pass the local date.

use crate::color::Rgb;
use crate::config::{Configuration, Period};
use crate::month::YearMonth;
use chrono::NaiveDate;
use serde::Serialize;

/// Four years of months per grid row.
pub const MONTHS_PER_ROW: usize = 48;

// ============================================================================
// OUTPUT TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCell {
    /// Months since birth
    pub index: usize,
    pub month: YearMonth,
    /// `None` = uncolored (rendered as background)
    pub color: Option<Rgb>,
}

impl MonthCell {
    pub fn display_color(&self) -> Rgb {
        self.color.unwrap_or(Rgb::WHITE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    pub name: String,
    pub start: YearMonth,
    pub color: Rgb,
}

impl LegendEntry {
    /// "Name (from YYYY-MM)"
    pub fn label(&self) -> String {
        format!("{} (from {})", self.name, self.start)
    }
}

impl From<&Period> for LegendEntry {
    fn from(period: &Period) -> Self {
        LegendEntry {
            name: period.name.clone(),
            start: period.start,
            color: period.color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timeline {
    pub name: String,
    pub as_of: NaiveDate,
    pub cells: Vec<MonthCell>,
    /// Periods in list order, unchanged
    pub legend: Vec<LegendEntry>,
}

impl Timeline {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Grid rows of [`MONTHS_PER_ROW`] cells; the last row may be short.
    pub fn rows(&self) -> std::slice::Chunks<'_, MonthCell> {
        self.cells.chunks(MONTHS_PER_ROW)
    }

    /// Index of the cell holding `as_of`, when it falls inside the lifespan.
    pub fn current_index(&self) -> Option<usize> {
        let today = YearMonth::from_date(self.as_of);
        self.cells.iter().position(|c| c.month == today)
    }

    /// Number of cells at or before `as_of`.
    pub fn lived_months(&self) -> usize {
        let today = YearMonth::from_date(self.as_of);
        self.cells.iter().take_while(|c| c.month <= today).count()
    }
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Color of a single month.
///
/// Periods are scanned in stored order:
/// - exact start-month match: take it and stop
/// - month after start: take it and keep scanning
/// - month before start: stop
///
/// So the first period starting after `month` ends the scan, and among the
/// ones before it the last listed wins.
pub fn resolve_month(month: YearMonth, today: YearMonth, periods: &[Period]) -> Option<Rgb> {
    if month > today {
        return None;
    }

    let mut color = None;
    for period in periods {
        if month == period.start {
            color = Some(period.color);
            break;
        } else if month > period.start {
            color = Some(period.color);
        } else {
            break;
        }
    }
    color
}

/// Resolve every month of the lifespan, starting at the birth month.
pub fn resolve_timeline(config: &Configuration, as_of: NaiveDate) -> Timeline {
    let today = YearMonth::from_date(as_of);
    let max_months = config.lifespan_months();

    let cells: Vec<MonthCell> = (0..max_months)
        .map(|i| {
            let month = config.date_of_birth.add_months(i);
            MonthCell {
                index: i as usize,
                month,
                color: resolve_month(month, today, &config.periods),
            }
        })
        .collect();

    log::debug!(
        "resolved {} months for {:?} as of {} ({} periods)",
        cells.len(),
        config.name,
        as_of,
        config.periods.len()
    );

    Timeline {
        name: config.name.clone(),
        as_of,
        cells,
        legend: config.periods.iter().map(LegendEntry::from).collect(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
