//! Named comparison windows anchored to the latest observed week.
//!
//! Every window is an inclusive range of week-ending dates. With `n` the
//! horizon in weeks, the offsets (in weeks before the as-of date) are:
//!
//! | kind     | start      | end  |
//! |----------|------------|------|
//! | Latest   | n - 1      | 0    |
//! | Prior    | 2n - 1     | n    |
//! | PrePrior | 3n - 1     | 2n   |
//! | YearAgo  | 52 + n - 1 | 52   |
//!
//! Windows overlap across names (`L1` sits inside `L4`).

use crate::sales_record::DateRange;
use chrono::{Duration, NaiveDate};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

const WEEKS_PER_YEAR: i64 = 52;

/// Length of a comparison window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Horizon {
    OneWeek,
    FourWeeks,
    ThirteenWeeks,
    TwentySixWeeks,
}

impl Horizon {
    pub const ALL: [Horizon; 4] = [
        Horizon::OneWeek,
        Horizon::FourWeeks,
        Horizon::ThirteenWeeks,
        Horizon::TwentySixWeeks,
    ];

    /// Horizons that carry a price/volume decomposition.
    pub const DECOMPOSED: [Horizon; 3] = [
        Horizon::FourWeeks,
        Horizon::ThirteenWeeks,
        Horizon::TwentySixWeeks,
    ];

    pub fn weeks(&self) -> i64 {
        match self {
            Horizon::OneWeek => 1,
            Horizon::FourWeeks => 4,
            Horizon::ThirteenWeeks => 13,
            Horizon::TwentySixWeeks => 26,
        }
    }
}

/// Position of a window relative to the as-of date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PeriodKind {
    Latest,
    Prior,
    PrePrior,
    YearAgo,
}

impl PeriodKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            PeriodKind::Latest => "L",
            PeriodKind::Prior => "P",
            PeriodKind::PrePrior => "PP",
            PeriodKind::YearAgo => "Y",
        }
    }
}

/// Baseline a latest window is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Comparison {
    Prior,
    YearAgo,
}

impl Comparison {
    pub const ALL: [Comparison; 2] = [Comparison::Prior, Comparison::YearAgo];

    pub fn kind(&self) -> PeriodKind {
        match self {
            Comparison::Prior => PeriodKind::Prior,
            Comparison::YearAgo => PeriodKind::YearAgo,
        }
    }
}

/// A named window such as `L4` or `PP4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    kind: PeriodKind,
    horizon: Horizon,
}

impl Period {
    pub const L1: Period = Period::of(PeriodKind::Latest, Horizon::OneWeek);
    pub const P1: Period = Period::of(PeriodKind::Prior, Horizon::OneWeek);
    pub const Y1: Period = Period::of(PeriodKind::YearAgo, Horizon::OneWeek);
    pub const L4: Period = Period::of(PeriodKind::Latest, Horizon::FourWeeks);
    pub const P4: Period = Period::of(PeriodKind::Prior, Horizon::FourWeeks);
    pub const Y4: Period = Period::of(PeriodKind::YearAgo, Horizon::FourWeeks);
    pub const PP4: Period = Period::of(PeriodKind::PrePrior, Horizon::FourWeeks);
    pub const L13: Period = Period::of(PeriodKind::Latest, Horizon::ThirteenWeeks);
    pub const P13: Period = Period::of(PeriodKind::Prior, Horizon::ThirteenWeeks);
    pub const Y13: Period = Period::of(PeriodKind::YearAgo, Horizon::ThirteenWeeks);
    pub const L26: Period = Period::of(PeriodKind::Latest, Horizon::TwentySixWeeks);
    pub const P26: Period = Period::of(PeriodKind::Prior, Horizon::TwentySixWeeks);
    pub const Y26: Period = Period::of(PeriodKind::YearAgo, Horizon::TwentySixWeeks);

    /// Every canonical period, in column order.
    pub const ALL: [Period; 13] = [
        Period::L1,
        Period::P1,
        Period::Y1,
        Period::L4,
        Period::P4,
        Period::Y4,
        Period::PP4,
        Period::L13,
        Period::P13,
        Period::Y13,
        Period::L26,
        Period::P26,
        Period::Y26,
    ];

    const fn of(kind: PeriodKind, horizon: Horizon) -> Self {
        Period { kind, horizon }
    }

    /// Returns the period if it is one of the canonical windows. Pre-prior
    /// windows only exist for the four-week horizon.
    pub fn new(kind: PeriodKind, horizon: Horizon) -> Option<Self> {
        match (kind, horizon) {
            (PeriodKind::PrePrior, h) if h != Horizon::FourWeeks => None,
            _ => Some(Period::of(kind, horizon)),
        }
    }

    pub fn latest(horizon: Horizon) -> Self {
        Period::of(PeriodKind::Latest, horizon)
    }

    pub fn baseline(horizon: Horizon, comparison: Comparison) -> Self {
        Period::of(comparison.kind(), horizon)
    }

    pub fn kind(&self) -> PeriodKind {
        self.kind
    }

    pub fn horizon(&self) -> Horizon {
        self.horizon
    }

    /// Position in [`Period::ALL`].
    pub fn index(&self) -> usize {
        Period::ALL
            .iter()
            .position(|candidate| candidate == self)
            .unwrap_or_default()
    }

    /// (start, end) offsets in weeks before the as-of date.
    fn week_offsets(&self) -> (i64, i64) {
        let n = self.horizon.weeks();
        match self.kind {
            PeriodKind::Latest => (n - 1, 0),
            PeriodKind::Prior => (2 * n - 1, n),
            PeriodKind::PrePrior => (3 * n - 1, 2 * n),
            PeriodKind::YearAgo => (WEEKS_PER_YEAR + n - 1, WEEKS_PER_YEAR),
        }
    }

    /// Resolves this period to an inclusive date window.
    pub fn window(&self, as_of: NaiveDate) -> DateRange {
        let (start, end) = self.week_offsets();
        DateRange::new(as_of - Duration::weeks(start), as_of - Duration::weeks(end))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.horizon.weeks())
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Every canonical window resolved against one as-of date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodWindows {
    as_of: NaiveDate,
    windows: BTreeMap<Period, DateRange>,
}

impl PeriodWindows {
    /// Resolves all canonical periods. Pure function of `as_of`.
    pub fn resolve(as_of: NaiveDate) -> Self {
        let windows = Period::ALL
            .iter()
            .map(|period| (*period, period.window(as_of)))
            .collect::<BTreeMap<_, _>>();
        for (period, range) in &windows {
            debug!(period = %period, range = %range, "resolved window");
        }
        PeriodWindows { as_of, windows }
    }

    /// Resolves against the latest week present in `dates`; `None` when empty.
    pub fn from_latest<I>(dates: I) -> Option<Self>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        dates.into_iter().max().map(Self::resolve)
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    pub fn get(&self, period: Period) -> Option<&DateRange> {
        self.windows.get(&period)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Period, DateRange)> + '_ {
        self.windows.iter().map(|(period, range)| (*period, *range))
    }
}
