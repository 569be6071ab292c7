// Life Timeline - Core Library
// Exposes all modules for use in the CLI, the TUI, the web server and tests

pub mod color;
pub mod config;
pub mod error;
pub mod month;
pub mod render;
pub mod resolver;
pub mod share;
pub mod state;
pub mod storage;
pub mod yearly;

// Re-export commonly used types
pub use color::Rgb;
pub use config::{
    ConfigDocument, Configuration, EventDocument, Period, PeriodDocument, YearlyEvent,
    DEFAULT_LIFE_EXPECTANCY_YEARS, MAX_LIFE_EXPECTANCY_YEARS,
};
pub use error::{ErrorKind, Result, TimelineError};
pub use month::YearMonth;
pub use render::{render, render_ansi, render_html, render_year_ansi, OutputFormat};
pub use resolver::{resolve_month, resolve_timeline, LegendEntry, MonthCell, Timeline, MONTHS_PER_ROW};
pub use share::{config_from_query, share_url, SHARE_PARAM};
pub use state::{PeriodEdit, TimelineState};
pub use storage::{export_config, list_config_files, load_config, save_config, EXPORT_FILE_NAME};
pub use yearly::{resolve_year, DayCell, EventLegendEntry, YearView};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Today in local time, the `as_of` production callers pass to the resolvers.
pub fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
