//! Fund NAV data: local store, remote sources and incremental sync.

mod clock;
mod csv_source;
mod eastmoney;
mod fallback;
mod retry;
mod store;
mod sync;
mod universe;

pub use clock::{parse_cutoff, Clock, FixedClock, PolicyClock, PublicationPolicy, SystemClock};
pub use csv_source::CsvDirectorySource;
pub use eastmoney::{EastmoneyConfig, EastmoneySource};
pub use fallback::FallbackSource;
pub use retry::{Backoff, RetryPolicy, RetryingSource};
pub use store::LocalSeriesStore;
pub use sync::{SyncConfig, SyncCoordinator};
pub use universe::{load_codes_from_csv, normalize_codes, parse_code_list, DEFAULT_CODE_COLUMN};

use serde::{Deserialize, Serialize};

/// Which published NAV column feeds the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueField {
    /// Unit NAV (单位净值)
    Unit,
    /// Cumulative NAV including distributions (累计净值)
    #[default]
    Cumulative,
}
