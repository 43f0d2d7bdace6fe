// src/services/extractor.rs

//! Availability extraction service.
//!
//! Reads the size-selector controls of a product page and turns their
//! class markers into an [`AvailabilityMap`].

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{AvailabilityMap, ExtractorConfig, SizeLabel, Status};
use crate::utils::normalize_whitespace;

/// Service for extracting size availability from product pages.
#[derive(Debug, Clone)]
pub struct AvailabilityExtractor {
    control_sel: Selector,
    size_attribute: String,
    purchasable_class: String,
    unpurchasable_class: String,
}

impl AvailabilityExtractor {
    /// Create an extractor, rejecting an invalid control selector.
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        Ok(Self {
            control_sel: Self::parse_selector(&config.control_selector)?,
            size_attribute: config.size_attribute.clone(),
            purchasable_class: config.purchasable_class.clone(),
            unpurchasable_class: config.unpurchasable_class.clone(),
        })
    }

    /// Parse `html` and extract the size map.
    pub fn extract(&self, html: &str) -> AvailabilityMap {
        let document = Html::parse_document(html);
        self.extract_document(&document)
    }

    /// Extract the size map from an already parsed document.
    ///
    /// Controls without a recognizable size label are skipped.
    pub fn extract_document(&self, document: &Html) -> AvailabilityMap {
        let mut statuses = AvailabilityMap::new();

        for control in document.select(&self.control_sel) {
            let Some(label) = self.size_label(&control) else {
                log::debug!("Skipping size control without a known label");
                continue;
            };
            statuses.observe(label, self.status(&control));
        }

        statuses
    }

    /// Label from the size attribute, falling back to the visible text.
    fn size_label(&self, control: &ElementRef) -> Option<SizeLabel> {
        let from_attr = control
            .value()
            .attr(&self.size_attribute)
            .and_then(|value| value.trim().parse().ok());

        from_attr.or_else(|| {
            let text = normalize_whitespace(&control.text().collect::<Vec<_>>().join(" "));
            text.parse().ok()
        })
    }

    fn status(&self, control: &ElementRef) -> Status {
        let has_class = |marker: &str| {
            control
                .value()
                .classes()
                .any(|class| class.eq_ignore_ascii_case(marker))
        };

        if has_class(self.purchasable_class.as_str()) {
            Status::Available
        } else if has_class(self.unpurchasable_class.as_str()) {
            Status::Unavailable
        } else {
            Status::Unknown
        }
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}
