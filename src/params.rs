//! Run parameters shared by every token of a batch.

use era_types::CalendarStream;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::julian::{CivilDate, DEFAULT_GREGORIAN_START};

pub const DEFAULT_TPQ: i32 = -500;
pub const DEFAULT_TAQ: i32 = 2050;

/// Which national calendar families are in play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Civilization {
    China,
    Japan,
    Korea,
}

impl Civilization {
    pub const ALL: [Civilization; 3] = [Self::China, Self::Japan, Self::Korea];

    pub fn calendar_streams(&self) -> &'static [CalendarStream] {
        match self {
            Self::China => &[1, 2, 3],
            Self::Japan => &[4],
            Self::Korea => &[5, 6, 7, 8],
        }
    }

    /// Single-letter code used on the command line (`c`, `j`, `k`).
    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "china" => Some(Self::China),
            "j" | "japan" => Some(Self::Japan),
            "k" | "korea" => Some(Self::Korea),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunParams {
    /// Terminus post quem: earliest plausible civil year
    pub tpq: i32,
    /// Terminus ante quem: latest plausible civil year
    pub taq: i32,
    pub civilizations: Vec<Civilization>,
    pub proleptic_gregorian: bool,
    pub gregorian_start: CivilDate,
    /// Carry implied context from one token to the next
    pub sequential: bool,
    /// Search the lunar tables for tokens with no identifier
    pub proliferate: bool,
}

impl Default for RunParams {
    fn default() -> Self {
        RunParams {
            tpq: DEFAULT_TPQ,
            taq: DEFAULT_TAQ,
            civilizations: Civilization::ALL.to_vec(),
            proleptic_gregorian: false,
            gregorian_start: DEFAULT_GREGORIAN_START,
            sequential: true,
            proliferate: false,
        }
    }
}

impl RunParams {
    /// Fix up values a params file may carry in a broken state.
    pub fn sanitised(mut self) -> Self {
        if !self.gregorian_start.is_valid_gregorian() {
            warn!(start = ?self.gregorian_start, "invalid Gregorian start, using 1582-10-15");
            self.gregorian_start = DEFAULT_GREGORIAN_START;
        }
        if self.tpq > self.taq {
            warn!(tpq = self.tpq, taq = self.taq, "tpq after taq, swapping");
            std::mem::swap(&mut self.tpq, &mut self.taq);
        }
        if self.civilizations.is_empty() {
            self.civilizations = Civilization::ALL.to_vec();
        }
        self
    }

    pub fn allowed_streams(&self) -> Vec<CalendarStream> {
        let mut streams: Vec<CalendarStream> = self
            .civilizations
            .iter()
            .flat_map(|c| c.calendar_streams().iter().copied())
            .collect();
        streams.sort_unstable();
        streams.dedup();
        streams
    }

    /// Unknown streams are always allowed.
    pub fn allows_stream(&self, stream: Option<CalendarStream>) -> bool {
        match stream {
            None => true,
            Some(s) => self.civilizations.iter().any(|c| c.calendar_streams().contains(&s)),
        }
    }

    pub fn within_bounds(&self, year: i32) -> bool {
        (self.tpq..=self.taq).contains(&year)
    }
}
