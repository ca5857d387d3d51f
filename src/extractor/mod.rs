mod company_types;
mod directory_parser;

pub use company_types::{CompanyRecord, LocationSet};
pub use directory_parser::{extract_companies, ExtractError};
