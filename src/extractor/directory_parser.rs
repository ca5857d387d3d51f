use failure::Fail;
use log::{debug, info};
use scraper::{ElementRef, Html, Selector};

use super::company_types::{CompanyRecord, Extraction, MarkerClass, MissingField, RowError, MARKER_CLASSES};

#[derive(Debug, Fail)]
pub enum ExtractError {
    #[fail(display = "Invalid CSS selector: {}", _0)]
    InvalidSelector(&'static str),
}

fn selector(css: &'static str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|_| ExtractError::InvalidSelector(css))
}

struct DirectorySelectors {
    sponsor_rows: Selector,
    even_rows: Selector,
    odd_rows: Selector,
    sponsor_logo: Selector,
    company: Selector,
    location: Selector,
    description: Selector,
    link: Selector,
}

impl DirectorySelectors {
    fn new() -> Result<DirectorySelectors, ExtractError> {
        Ok(DirectorySelectors {
            sponsor_rows: selector("tr.sponsor")?,
            even_rows: selector("tr.even")?,
            odd_rows: selector("tr.odd")?,
            sponsor_logo: selector("img.database")?,
            company: selector("td.company")?,
            location: selector("td.location")?,
            description: selector("td.description")?,
            link: selector("a")?,
        })
    }

    fn rows(&self, marker: MarkerClass) -> &Selector {
        match marker {
            MarkerClass::Sponsor => &self.sponsor_rows,
            MarkerClass::Even => &self.even_rows,
            MarkerClass::Odd => &self.odd_rows,
        }
    }
}

/// Every text node trimmed, blanks dropped, the rest concatenated.
fn stripped_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

fn first<'a>(row: ElementRef<'a>, selector: &Selector, missing: MissingField) -> Result<ElementRef<'a>, MissingField> {
    row.select(selector).next().ok_or(missing)
}

fn parse_row(row: ElementRef, marker: MarkerClass, selectors: &DirectorySelectors) -> Result<CompanyRecord, MissingField> {
    let name = match marker {
        MarkerClass::Sponsor => first(row, &selectors.sponsor_logo, MissingField::SponsorLogo)?
            .value()
            .attr("alt")
            .ok_or(MissingField::SponsorAltText)?
            .to_owned(),
        MarkerClass::Even | MarkerClass::Odd => {
            stripped_text(first(row, &selectors.company, MissingField::CompanyCell)?)
        }
    };

    let location = stripped_text(first(row, &selectors.location, MissingField::LocationCell)?);

    // Sponsor rows link the logo first and the company site second.
    let links: Vec<ElementRef> = row.select(&selectors.link).collect();
    let website_link = if links.len() == 2 {
        links[1]
    } else {
        *links.first().ok_or(MissingField::Link)?
    };
    let website = website_link.value().attr("href").unwrap_or_default().to_owned();

    let description: String = first(row, &selectors.description, MissingField::DescriptionCell)?
        .text()
        .collect();

    Ok(CompanyRecord {
        name,
        location,
        website,
        description,
    })
}

/// Pulls company rows out of the directory page, sponsor rows first, then
/// even and odd rows, each in document order. Malformed rows are collected
/// as `RowError`s instead of aborting the whole page.
pub fn extract_companies(html: &str) -> Result<Extraction, ExtractError> {
    let selectors = DirectorySelectors::new()?;
    let document = Html::parse_document(html);

    let mut extraction = Extraction::default();

    for &marker in MARKER_CLASSES.iter() {
        for (idx, row) in document.select(selectors.rows(marker)).enumerate() {
            match parse_row(row, marker, &selectors) {
                Ok(record) => {
                    debug!("{} row {}: {}", marker, idx + 1, record.name);
                    extraction.records.push(record);
                }
                Err(missing) => extraction.row_errors.push(RowError {
                    marker,
                    position: idx + 1,
                    missing,
                }),
            }
        }
    }

    info!(
        "Gathered {} companies ({} malformed rows)",
        extraction.records.len(),
        extraction.row_errors.len()
    );

    Ok(extraction)
}
