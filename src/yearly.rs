// 📅 Yearly view - one cell per day of a calendar year, colored by events

use crate::color::Rgb;
use crate::config::{Configuration, YearlyEvent};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Four weeks of days per grid row.
pub const DAYS_PER_ROW: usize = 28;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub color: Option<Rgb>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventLegendEntry {
    pub name: String,
    pub start: NaiveDate,
    /// Start of the following event; `None` while ongoing
    pub end: Option<NaiveDate>,
    pub color: Rgb,
}

impl EventLegendEntry {
    pub fn label(&self) -> String {
        let name = if self.name.is_empty() { "Unknown" } else { &self.name };
        match self.end {
            Some(end) => format!("{} ({} to {})", name, self.start, end),
            None => format!("{} ({} ongoing)", name, self.start),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearView {
    pub year: i32,
    pub days: Vec<DayCell>,
    pub legend: Vec<EventLegendEntry>,
}

impl YearView {
    pub fn rows(&self) -> std::slice::Chunks<'_, DayCell> {
        self.days.chunks(DAYS_PER_ROW)
    }
}

/// Build the day grid for `year`.
///
/// Unlike lifetime periods, events are ordered by start date first; each day
/// takes the color of the latest event already started. Days after `as_of`
/// stay uncolored. Years outside the calendar range yield an empty view.
pub fn resolve_year(config: &Configuration, year: i32, as_of: NaiveDate) -> YearView {
    let mut events: Vec<&YearlyEvent> = config
        .yearly_events
        .get(&year)
        .map(|events| events.iter().collect())
        .unwrap_or_default();
    // Stable: equal starts keep their listed order
    events.sort_by_key(|e| e.start);

    let days = match NaiveDate::from_ymd_opt(year, 1, 1) {
        Some(first) => first
            .iter_days()
            .take_while(|d| d.year() == year)
            .map(|date| DayCell {
                date,
                color: color_for_day(date, as_of, &events),
            })
            .collect(),
        None => Vec::new(),
    };

    let legend = events
        .iter()
        .enumerate()
        .map(|(i, event)| EventLegendEntry {
            name: event.name.clone(),
            start: event.start,
            end: events.get(i + 1).map(|next| next.start),
            color: event.color,
        })
        .collect();

    YearView { year, days, legend }
}

fn color_for_day(date: NaiveDate, as_of: NaiveDate, sorted_events: &[&YearlyEvent]) -> Option<Rgb> {
    if date > as_of {
        return None;
    }
    sorted_events
        .iter()
        .rev()
        .find(|e| e.start <= date)
        .map(|e| e.color)
}
