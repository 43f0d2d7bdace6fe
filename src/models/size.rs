// src/models/size.rs

//! Frame size labels, availability statuses and the per-document size map.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One of the seven frame sizes offered on a product page.
///
/// Variant order is the canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SizeLabel {
    #[serde(rename = "2XS")]
    Xxs,
    #[serde(rename = "XS")]
    Xs,
    S,
    M,
    L,
    #[serde(rename = "XL")]
    Xl,
    #[serde(rename = "2XL")]
    Xxl,
}

impl SizeLabel {
    /// All labels in canonical order.
    pub const ALL: [SizeLabel; 7] = [
        SizeLabel::Xxs,
        SizeLabel::Xs,
        SizeLabel::S,
        SizeLabel::M,
        SizeLabel::L,
        SizeLabel::Xl,
        SizeLabel::Xxl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeLabel::Xxs => "2XS",
            SizeLabel::Xs => "XS",
            SizeLabel::S => "S",
            SizeLabel::M => "M",
            SizeLabel::L => "L",
            SizeLabel::Xl => "XL",
            SizeLabel::Xxl => "2XL",
        }
    }
}

impl fmt::Display for SizeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizeLabel {
    type Err = AppError;

    /// Exact match against the label text; no case folding.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| AppError::parse("size label", s))
    }
}

/// Purchasability of a size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Available,
    Unavailable,
    Unknown,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Available => "available",
            Status::Unavailable => "unavailable",
            Status::Unknown => "unknown",
        }
    }

    /// Whether the status came from an explicit purchasable/unpurchasable marker.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Status::Unknown)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "available" => Ok(Status::Available),
            "unavailable" => Ok(Status::Unavailable),
            "unknown" => Ok(Status::Unknown),
            _ => Err(AppError::parse("status", s)),
        }
    }
}

/// Size → status mapping extracted from a single document.
///
/// Labels never seen in the document are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityMap {
    statuses: BTreeMap<SizeLabel, Status>,
}

impl AvailabilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, label: SizeLabel) -> Option<Status> {
        self.statuses.get(&label).copied()
    }

    /// Status of `label`, treating an absent label as unknown.
    pub fn status_of(&self, label: SizeLabel) -> Status {
        self.get(label).unwrap_or(Status::Unknown)
    }

    /// Record one observation of `label`.
    ///
    /// The first resolved status for a label is kept; later observations
    /// only fill in labels that are absent or still unknown.
    pub fn observe(&mut self, label: SizeLabel, status: Status) {
        let keep_existing = self
            .statuses
            .get(&label)
            .is_some_and(|existing| existing.is_resolved() || !status.is_resolved());

        if !keep_existing {
            self.statuses.insert(label, status);
        }
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Entries in canonical label order.
    pub fn iter(&self) -> impl Iterator<Item = (SizeLabel, Status)> + '_ {
        self.statuses.iter().map(|(label, status)| (*label, *status))
    }
}

impl FromIterator<(SizeLabel, Status)> for AvailabilityMap {
    fn from_iter<I: IntoIterator<Item = (SizeLabel, Status)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (label, status) in iter {
            map.observe(label, status);
        }
        map
    }
}
