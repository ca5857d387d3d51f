use failure::Fail;
use std::collections::BTreeSet;
use std::fmt;

/// Unique location strings; ordered so lookups happen in a stable sequence.
pub type LocationSet = BTreeSet<String>;

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyRecord {
    pub name: String,
    pub location: String,
    pub website: String,
    pub description: String,
}

/// Row classes the directory uses for company listings, in extraction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerClass {
    Sponsor,
    Even,
    Odd,
}

pub const MARKER_CLASSES: [MarkerClass; 3] = [MarkerClass::Sponsor, MarkerClass::Even, MarkerClass::Odd];

impl MarkerClass {
    pub fn css_class(self) -> &'static str {
        match self {
            MarkerClass::Sponsor => "sponsor",
            MarkerClass::Even => "even",
            MarkerClass::Odd => "odd",
        }
    }
}

impl fmt::Display for MarkerClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.css_class())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    SponsorLogo,
    SponsorAltText,
    CompanyCell,
    LocationCell,
    Link,
    DescriptionCell,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let what = match self {
            MissingField::SponsorLogo => "no img.database element",
            MissingField::SponsorAltText => "img.database has no alt attribute",
            MissingField::CompanyCell => "no td.company cell",
            MissingField::LocationCell => "no td.location cell",
            MissingField::Link => "no hyperlink",
            MissingField::DescriptionCell => "no td.description cell",
        };
        f.write_str(what)
    }
}

/// A matched row that could not be turned into a record.
/// `position` is 1 based, counted within the row's marker class.
#[derive(Debug, Clone, PartialEq, Fail)]
#[fail(display = "Skipping '{}' row {}: {}", marker, position, missing)]
pub struct RowError {
    pub marker: MarkerClass,
    pub position: usize,
    pub missing: MissingField,
}

#[derive(Debug, Default)]
pub struct Extraction {
    pub records: Vec<CompanyRecord>,
    pub row_errors: Vec<RowError>,
}

impl Extraction {
    pub fn locations(&self) -> LocationSet {
        self.records.iter().map(|r| r.location.clone()).collect()
    }
}
