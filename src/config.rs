// ⚙️ Configuration - data model, interchange documents, validation
//
// Two layers:
// 1. Documents (`ConfigDocument`, `PeriodDocument`, `EventDocument`) mirror the
//    YAML/JSON interchange shape and accept anything structurally valid.
// 2. `Configuration` holds typed, validated values. Only this layer reaches
//    the resolver, so malformed dates never get that far.

use crate::color::Rgb;
use crate::error::{Result, TimelineError};
use crate::month::YearMonth;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_LIFE_EXPECTANCY_YEARS: u32 = 80;

/// Upper bound for life expectancy (the three-digit input of the desktop
/// version).
pub const MAX_LIFE_EXPECTANCY_YEARS: u32 = 999;

const EVENT_DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// INTERCHANGE DOCUMENTS
// ============================================================================

/// On-disk / on-wire shape of a configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,

    /// Falsy values (absent, null, 0) fall back to the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub life_expectancy: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub life_periods: Option<Vec<PeriodDocument>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub yearly_events: BTreeMap<i32, Vec<EventDocument>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDocument {
    #[serde(default, alias = "location", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

// ============================================================================
// VALIDATED MODEL
// ============================================================================

/// A named, colored, open-ended range starting at `start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub name: String,
    pub start: YearMonth,
    pub color: Rgb,
}

impl Period {
    pub fn new(name: impl Into<String>, start: YearMonth, color: Rgb) -> Self {
        Period {
            name: name.into(),
            start,
            color,
        }
    }
}

/// A day-granular marker inside one calendar year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyEvent {
    pub name: String,
    pub start: NaiveDate,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub name: String,
    pub date_of_birth: YearMonth,
    pub life_expectancy_years: u32,
    /// Stored order is significant to the resolver; never sorted.
    pub periods: Vec<Period>,
    pub yearly_events: BTreeMap<i32, Vec<YearlyEvent>>,
}

impl Configuration {
    /// The starting configuration shown before anything is imported.
    pub fn template() -> Self {
        let month = |year| YearMonth::new(year, 1).unwrap_or(YearMonth::EPOCH);
        let day = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();

        let mut yearly_events = BTreeMap::new();
        yearly_events.insert(
            2023,
            vec![
                YearlyEvent {
                    name: "Winter break".to_string(),
                    start: day(2023, 1, 1),
                    color: Rgb::new(0xFF, 0xA5, 0x00),
                },
                YearlyEvent {
                    name: "Spring term".to_string(),
                    start: day(2023, 2, 1),
                    color: Rgb::new(0x4C, 0xAF, 0x50),
                },
                YearlyEvent {
                    name: "Summer".to_string(),
                    start: day(2023, 5, 1),
                    color: Rgb::new(0xFF, 0xFF, 0xBA),
                },
                YearlyEvent {
                    name: "Autumn term".to_string(),
                    start: day(2023, 9, 1),
                    color: Rgb::new(0x4C, 0xAF, 0x50),
                },
                YearlyEvent {
                    name: "Holidays".to_string(),
                    start: day(2023, 12, 23),
                    color: Rgb::new(0xFF, 0xA5, 0x00),
                },
            ],
        );

        Configuration {
            name: "John Doe".to_string(),
            date_of_birth: month(2000),
            life_expectancy_years: DEFAULT_LIFE_EXPECTANCY_YEARS,
            periods: vec![
                Period::new("Childhood", month(2000), Rgb::new(0xFF, 0xB3, 0xBA)),
                Period::new("Teenage Years", month(2013), Rgb::new(0xBA, 0xFF, 0xC9)),
                Period::new("Early Adulthood", month(2018), Rgb::new(0xBA, 0xE1, 0xFF)),
                Period::new("Career Growth", month(2023), Rgb::new(0xFF, 0xFF, 0xBA)),
            ],
            yearly_events,
        }
    }

    /// Number of month-cells in the lifetime grid.
    pub fn lifespan_months(&self) -> u32 {
        self.life_expectancy_years * 12
    }

    /// Month after the last cell of the grid.
    pub fn end_month(&self) -> YearMonth {
        self.date_of_birth.add_months(self.lifespan_months())
    }

    /// File import. A zero `life_expectancy` is read as unset, like an
    /// absent one.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let mut doc: ConfigDocument = serde_yaml::from_str(text)?;
        if doc.life_expectancy == Some(0) {
            doc.life_expectancy = None;
        }
        Configuration::from_document(doc)
    }

    /// Share links and API bodies. Zero is kept and gives an empty grid.
    pub fn from_json(text: &str) -> Result<Self> {
        let doc: ConfigDocument = serde_json::from_str(text)?;
        Configuration::from_document(doc)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.to_document())?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_document())?)
    }

    /// Validate a document, applying defaults for absent optional fields.
    pub fn from_document(doc: ConfigDocument) -> Result<Self> {
        let name = doc
            .name
            .ok_or_else(|| TimelineError::MissingField("name".to_string()))?;

        let dob_text = doc
            .date_of_birth
            .ok_or_else(|| TimelineError::MissingField("date_of_birth".to_string()))?;
        let date_of_birth = parse_month("date_of_birth", &dob_text)?;

        let life_expectancy_years = match doc.life_expectancy {
            None => DEFAULT_LIFE_EXPECTANCY_YEARS,
            Some(years) => validate_life_expectancy(years)?,
        };

        let periods = doc
            .life_periods
            .ok_or_else(|| TimelineError::MissingField("life_periods".to_string()))?
            .into_iter()
            .enumerate()
            .map(|(i, period)| period_from_document(i, period))
            .collect::<Result<Vec<_>>>()?;

        let mut yearly_events = BTreeMap::new();
        for (year, events) in doc.yearly_events {
            let events = events
                .into_iter()
                .enumerate()
                .map(|(i, event)| event_from_document(year, i, event))
                .collect::<Result<Vec<_>>>()?;
            yearly_events.insert(year, events);
        }

        Ok(Configuration {
            name,
            date_of_birth,
            life_expectancy_years,
            periods,
            yearly_events,
        })
    }

    pub fn to_document(&self) -> ConfigDocument {
        ConfigDocument {
            name: Some(self.name.clone()),
            date_of_birth: Some(self.date_of_birth.to_string()),
            life_expectancy: Some(i64::from(self.life_expectancy_years)),
            life_periods: Some(
                self.periods
                    .iter()
                    .map(|p| PeriodDocument {
                        name: Some(p.name.clone()),
                        start: Some(p.start.to_string()),
                        color: Some(p.color.to_hex()),
                    })
                    .collect(),
            ),
            yearly_events: self
                .yearly_events
                .iter()
                .map(|(year, events)| {
                    let events = events
                        .iter()
                        .map(|e| EventDocument {
                            name: Some(e.name.clone()),
                            start: Some(e.start.format(EVENT_DATE_FORMAT).to_string()),
                            color: Some(e.color.to_hex()),
                        })
                        .collect();
                    (*year, events)
                })
                .collect(),
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration::template()
    }
}

// ============================================================================
// FIELD VALIDATION
// ============================================================================

pub fn parse_month(field: &str, value: &str) -> Result<YearMonth> {
    YearMonth::parse(value).ok_or_else(|| TimelineError::invalid_date(field, value))
}

pub fn parse_color(field: &str, value: &str) -> Result<Rgb> {
    Rgb::parse_hex(value).ok_or_else(|| TimelineError::invalid_color(field, value))
}

/// Negative and oversized values are rejected; zero is a valid, empty lifespan.
pub fn validate_life_expectancy(years: i64) -> Result<u32> {
    if years < 0 {
        return Err(TimelineError::validation(
            "life_expectancy",
            format!("must not be negative, got {}", years),
        ));
    }
    if years > i64::from(MAX_LIFE_EXPECTANCY_YEARS) {
        return Err(TimelineError::validation(
            "life_expectancy",
            format!("must be at most {}, got {}", MAX_LIFE_EXPECTANCY_YEARS, years),
        ));
    }
    Ok(years as u32)
}

fn period_from_document(index: usize, doc: PeriodDocument) -> Result<Period> {
    let field = |name: &str| format!("life_periods[{}].{}", index, name);

    let name = doc.name.ok_or_else(|| TimelineError::MissingField(field("name")))?;
    let start = doc.start.ok_or_else(|| TimelineError::MissingField(field("start")))?;
    let color = doc.color.ok_or_else(|| TimelineError::MissingField(field("color")))?;

    Ok(Period {
        name,
        start: parse_month(&field("start"), &start)?,
        color: parse_color(&field("color"), &color)?,
    })
}

fn event_from_document(year: i32, index: usize, doc: EventDocument) -> Result<YearlyEvent> {
    let field = |name: &str| format!("yearly_events.{}[{}].{}", year, index, name);

    let start_text = doc.start.ok_or_else(|| TimelineError::MissingField(field("start")))?;
    let color = doc.color.ok_or_else(|| TimelineError::MissingField(field("color")))?;

    let start = NaiveDate::parse_from_str(start_text.trim(), EVENT_DATE_FORMAT)
        .map_err(|_| TimelineError::invalid_date(field("start"), start_text.as_str()))?;
    if start.year() != year {
        return Err(TimelineError::validation(
            field("start"),
            format!("{} is not in {}", start_text, year),
        ));
    }

    Ok(YearlyEvent {
        name: doc.name.unwrap_or_default(),
        start,
        color: parse_color(&field("color"), &color)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
