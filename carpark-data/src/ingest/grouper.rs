//! Folds flat facility rows into one document per facility code.
//!
//! The facility feed repeats a facility once per vehicle category and rate
//! period. [`FacilityGrouper`] walks the rows in source order, fixes each
//! facility's identity from the first row seen for its code, and accumulates
//! rate slots per vehicle category.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap, HashSet};

use carpark_core::{FacilityDocument, RawFacilityRow};
use log::{debug, info, warn};

use super::geometry::{GeometryError, locate};

/// Facility codes skipped unless the caller overrides the exclusion set.
pub const DEFAULT_EXCLUDED_CODES: &[&str] = &["K0025"];

/// Facility codes that are never materialised.
///
/// # Examples
/// ```
/// use carpark_data::ingest::ExclusionSet;
///
/// let defaults = ExclusionSet::default();
/// assert!(defaults.contains("K0025"));
///
/// let custom: ExclusionSet = ["A0001", "B0002"].into_iter().collect();
/// assert!(!custom.contains("K0025"));
/// assert_eq!(custom.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionSet {
    codes: BTreeSet<String>,
}

impl Default for ExclusionSet {
    fn default() -> Self {
        DEFAULT_EXCLUDED_CODES.iter().copied().collect()
    }
}

impl ExclusionSet {
    /// An exclusion set that admits every code.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            codes: BTreeSet::new(),
        }
    }

    /// Whether `code` is excluded.
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    /// Number of excluded codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether no codes are excluded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Excluded codes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            codes: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// What the grouper did with one row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// The row carried a blank facility code.
    MissingCode,
    /// The code is in the exclusion set.
    Excluded,
    /// The code was rejected earlier in this run.
    Rejected,
    /// The row carried no usable geometry. On first sight the code is
    /// rejected for the rest of the run.
    MissingGeometry,
    /// The first row for the code carried geometry that could not be
    /// located; the code is rejected for the rest of the run.
    InvalidGeometry(GeometryError),
    /// The row contributed a rate slot.
    Accepted {
        /// Whether this row created the facility document.
        created: bool,
    },
}

/// Row counts gathered while grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupingSummary {
    /// Rows that contributed a rate slot.
    pub accepted: usize,
    /// Rows skipped because their code is excluded.
    pub excluded: usize,
    /// Rows skipped because their code is blank.
    pub missing_code: usize,
    /// Rows without usable geometry.
    pub missing_geometry: usize,
    /// First rows whose geometry could not be located.
    pub invalid_geometry: usize,
    /// Rows skipped because their code was rejected on first sight.
    pub rejected: usize,
}

impl GroupingSummary {
    fn record(&mut self, outcome: &RowOutcome) {
        match outcome {
            RowOutcome::MissingCode => self.missing_code += 1,
            RowOutcome::Excluded => self.excluded += 1,
            RowOutcome::Rejected => self.rejected += 1,
            RowOutcome::MissingGeometry => self.missing_geometry += 1,
            RowOutcome::InvalidGeometry(_) => self.invalid_geometry += 1,
            RowOutcome::Accepted { .. } => self.accepted += 1,
        }
    }

    /// Total rows seen.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.accepted
            + self.excluded
            + self.missing_code
            + self.missing_geometry
            + self.invalid_geometry
            + self.rejected
    }
}

/// Incremental facility grouper.
///
/// # Examples
/// ```
/// use carpark_core::RawFacilityRow;
/// use carpark_data::ingest::{ExclusionSet, FacilityGrouper, RowOutcome};
/// use serde_json::json;
///
/// let row: RawFacilityRow = serde_json::from_value(json!({
///     "ppCode": "A0004",
///     "ppName": "ALIWAL STREET",
///     "vehCat": "Car",
///     "geometries": [{"coordinates": "31045.6165,31694.0055"}]
/// }))
/// .expect("valid row");
///
/// let mut grouper = FacilityGrouper::new(ExclusionSet::default());
/// assert_eq!(grouper.push(&row), RowOutcome::Accepted { created: true });
/// assert_eq!(grouper.push(&row), RowOutcome::Accepted { created: false });
///
/// let grouped = grouper.finish();
/// assert_eq!(grouped.len(), 1);
/// assert_eq!(grouped.get("A0004").map(|doc| doc.rate_slot_count()), Some(2));
/// ```
#[derive(Debug)]
pub struct FacilityGrouper {
    exclusions: ExclusionSet,
    facilities: HashMap<String, FacilityDocument>,
    order: Vec<String>,
    rejected: HashSet<String>,
    summary: GroupingSummary,
}

impl FacilityGrouper {
    /// Create a grouper that skips the codes in `exclusions`.
    #[must_use]
    pub fn new(exclusions: ExclusionSet) -> Self {
        Self {
            exclusions,
            facilities: HashMap::new(),
            order: Vec::new(),
            rejected: HashSet::new(),
            summary: GroupingSummary::default(),
        }
    }

    /// Fold one row into the grouped facilities.
    pub fn push(&mut self, row: &RawFacilityRow) -> RowOutcome {
        let outcome = self.classify(row);
        self.summary.record(&outcome);
        outcome
    }

    fn classify(&mut self, row: &RawFacilityRow) -> RowOutcome {
        let code = row.pp_code.trim();
        if code.is_empty() {
            warn!("skipping facility row without a code");
            return RowOutcome::MissingCode;
        }
        if self.exclusions.contains(code) {
            info!("skipping excluded facility {code}");
            return RowOutcome::Excluded;
        }
        if self.rejected.contains(code) {
            debug!("skipping row for rejected facility {code}");
            return RowOutcome::Rejected;
        }

        let coordinates = row.first_coordinates();
        match self.facilities.entry(code.to_owned()) {
            Entry::Occupied(entry) => {
                if coordinates.is_none() {
                    debug!("skipping row without geometry for facility {code}");
                    return RowOutcome::MissingGeometry;
                }
                entry.into_mut().record_rate(
                    row.veh_cat.as_deref(),
                    row.park_capacity,
                    row.rate.clone(),
                );
                RowOutcome::Accepted { created: false }
            }
            Entry::Vacant(entry) => {
                let Some(raw) = coordinates else {
                    warn!("facility {code} has no geometry on its first row; skipping it");
                    self.rejected.insert(code.to_owned());
                    return RowOutcome::MissingGeometry;
                };
                let located = match locate(raw) {
                    Ok(located) => located,
                    Err(err) => {
                        warn!("facility {code} has unusable geometry; skipping it: {err}");
                        self.rejected.insert(code.to_owned());
                        return RowOutcome::InvalidGeometry(err);
                    }
                };
                let mut document = FacilityDocument::new(
                    code,
                    row.pp_name.as_deref().unwrap_or_default(),
                    row.parking_system.clone(),
                    located.location,
                    located.spatial_hash,
                );
                document.record_rate(row.veh_cat.as_deref(), row.park_capacity, row.rate.clone());
                entry.insert(document);
                self.order.push(code.to_owned());
                RowOutcome::Accepted { created: true }
            }
        }
    }

    /// Counts gathered so far.
    #[must_use]
    pub const fn summary(&self) -> &GroupingSummary {
        &self.summary
    }

    /// Finish grouping and hand over the facilities.
    #[must_use]
    pub fn finish(self) -> GroupedFacilities {
        GroupedFacilities {
            facilities: self.facilities,
            order: self.order,
            summary: self.summary,
        }
    }
}

/// Facilities produced by a [`FacilityGrouper`], in first-sight order.
#[derive(Debug, Clone, Default)]
pub struct GroupedFacilities {
    facilities: HashMap<String, FacilityDocument>,
    order: Vec<String>,
    summary: GroupingSummary,
}

impl GroupedFacilities {
    /// Look up the facility for `code`.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&FacilityDocument> {
        self.facilities.get(code)
    }

    /// Iterate facilities in first-sight order.
    pub fn iter(&self) -> impl Iterator<Item = &FacilityDocument> {
        self.order.iter().filter_map(|code| self.facilities.get(code))
    }

    /// Number of facilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no facility was materialised.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Row counts gathered while grouping.
    #[must_use]
    pub const fn summary(&self) -> &GroupingSummary {
        &self.summary
    }

    /// Consume the grouping, yielding documents in first-sight order.
    #[must_use]
    pub fn into_documents(self) -> Vec<FacilityDocument> {
        let Self {
            mut facilities,
            order,
            ..
        } = self;
        order
            .iter()
            .filter_map(|code| facilities.remove(code))
            .collect()
    }
}

/// Group `rows` in one pass.
pub fn group_facilities<'a, I>(rows: I, exclusions: &ExclusionSet) -> GroupedFacilities
where
    I: IntoIterator<Item = &'a RawFacilityRow>,
{
    let mut grouper = FacilityGrouper::new(exclusions.clone());
    for row in rows {
        grouper.push(row);
    }
    grouper.finish()
}
