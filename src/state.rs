// Editable state container - the single current configuration
//
// Replaced wholesale on import / URL load, edited field by field otherwise.
// Every edit validates first, so a failed edit leaves the state untouched.

use crate::config::{self, Configuration, Period};
use crate::error::{Result, TimelineError};
use crate::resolver::{resolve_timeline, Timeline};
use crate::yearly::{resolve_year, YearView};
use chrono::NaiveDate;

/// A single-field edit of a period, as typed into a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodEdit {
    Name(String),
    Start(String),
    Color(String),
}

#[derive(Debug, Clone)]
pub struct TimelineState {
    config: Configuration,
    revision: u64,
}

impl TimelineState {
    pub fn new(config: Configuration) -> Self {
        TimelineState { config, revision: 0 }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Bumped on every successful change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn replace(&mut self, config: Configuration) {
        log::info!(
            "configuration replaced: {:?} with {} periods",
            config.name,
            config.periods.len()
        );
        self.config = config;
        self.touch();
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.config.name = name.into();
        self.touch();
    }

    pub fn set_date_of_birth(&mut self, value: &str) -> Result<()> {
        self.config.date_of_birth = config::parse_month("date_of_birth", value)?;
        self.touch();
        Ok(())
    }

    /// Zero is accepted here and yields an empty grid.
    pub fn set_life_expectancy(&mut self, years: i64) -> Result<()> {
        self.config.life_expectancy_years = config::validate_life_expectancy(years)?;
        self.touch();
        Ok(())
    }

    pub fn add_period(&mut self, period: Period) {
        log::debug!("adding period {:?} from {}", period.name, period.start);
        self.config.periods.push(period);
        self.touch();
    }

    pub fn remove_period(&mut self, index: usize) -> Result<Period> {
        self.check_index(index)?;
        let removed = self.config.periods.remove(index);
        self.touch();
        Ok(removed)
    }

    pub fn update_period(&mut self, index: usize, edit: PeriodEdit) -> Result<()> {
        self.check_index(index)?;
        let field = |name: &str| format!("life_periods[{}].{}", index, name);

        // `?` returns before the assignment
        match edit {
            PeriodEdit::Name(name) => self.config.periods[index].name = name,
            PeriodEdit::Start(value) => {
                self.config.periods[index].start = config::parse_month(&field("start"), &value)?
            }
            PeriodEdit::Color(value) => {
                self.config.periods[index].color = config::parse_color(&field("color"), &value)?
            }
        }
        self.touch();
        Ok(())
    }

    /// Move a period to another list position. Order changes resolution.
    pub fn move_period(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from != to {
            let period = self.config.periods.remove(from);
            self.config.periods.insert(to, period);
            self.touch();
        }
        Ok(())
    }

    pub fn timeline(&self, as_of: NaiveDate) -> Timeline {
        resolve_timeline(&self.config, as_of)
    }

    pub fn year(&self, year: i32, as_of: NaiveDate) -> YearView {
        resolve_year(&self.config, year, as_of)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.config.periods.len() {
            Ok(())
        } else {
            Err(TimelineError::validation(
                "life_periods",
                format!("no period at index {} (have {})", index, self.config.periods.len()),
            ))
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

impl Default for TimelineState {
    fn default() -> Self {
        TimelineState::new(Configuration::template())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::error::ErrorKind;
    use crate::month::YearMonth;

    fn names(state: &TimelineState) -> Vec<&str> {
        state.config().periods.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_field_edits_bump_revision() {
        let mut state = TimelineState::default();
        assert_eq!(state.revision(), 0);

        state.set_name("Jane");
        state.set_date_of_birth("1985-04").unwrap();
        state.set_life_expectancy(90).unwrap();

        assert_eq!(state.revision(), 3);
        assert_eq!(state.config().name, "Jane");
        assert_eq!(state.config().date_of_birth, YearMonth::new(1985, 4).unwrap());
        assert_eq!(state.timeline(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).len(), 1080);
    }

    #[test]
    fn test_failed_edit_leaves_state_untouched() {
        let mut state = TimelineState::default();
        let before = state.config().clone();

        assert_eq!(state.set_date_of_birth("1985").unwrap_err().kind(), ErrorKind::InvalidDate);
        assert_eq!(state.set_life_expectancy(-1).unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(
            state.update_period(0, PeriodEdit::Color("#12".to_string())).unwrap_err().kind(),
            ErrorKind::InvalidColor
        );

        assert_eq!(state.config(), &before);
        assert_eq!(state.revision(), 0);
    }

    #[test]
    fn test_zero_life_expectancy_empties_grid() {
        let mut state = TimelineState::default();
        state.set_life_expectancy(0).unwrap();
        assert!(state.timeline(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).is_empty());
    }

    #[test]
    fn test_update_period_fields() {
        let mut state = TimelineState::default();
        state.update_period(1, PeriodEdit::Name("Teens".to_string())).unwrap();
        state.update_period(1, PeriodEdit::Start("2012-09".to_string())).unwrap();
        state.update_period(1, PeriodEdit::Color("#123456".to_string())).unwrap();

        let period = &state.config().periods[1];
        assert_eq!(period.name, "Teens");
        assert_eq!(period.start, YearMonth::new(2012, 9).unwrap());
        assert_eq!(period.color, Rgb::new(0x12, 0x34, 0x56));
    }

    #[test]
    fn test_add_remove_and_move_periods() {
        let mut state = TimelineState::default();
        state.add_period(Period::new("Retirement", YearMonth::new(2065, 1).unwrap(), Rgb::BLACK));
        assert_eq!(names(&state).last(), Some(&"Retirement"));

        let removed = state.remove_period(0).unwrap();
        assert_eq!(removed.name, "Childhood");

        state.move_period(3, 0).unwrap();
        assert_eq!(
            names(&state),
            vec!["Retirement", "Teenage Years", "Early Adulthood", "Career Growth"]
        );
    }

    #[test]
    fn test_out_of_range_index() {
        let mut state = TimelineState::default();
        assert_eq!(state.remove_period(10).unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(state.move_period(0, 4).unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_replace_swaps_whole_configuration() {
        let mut state = TimelineState::default();
        let mut other = Configuration::template();
        other.name = "Imported".to_string();
        other.periods.clear();

        state.replace(other.clone());
        assert_eq!(state.config(), &other);
        assert_eq!(state.revision(), 1);
    }
}
