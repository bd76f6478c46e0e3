pub mod aggregate;
pub mod crawler;
pub mod dates;
mod parser;
pub mod rows;
pub mod scraper;
pub mod store;
pub mod text;
pub mod types;
pub mod utils;

pub use crawler::{CrawlConfig, CrawlReport, Crawler};
pub use parser::{BlockKind, ParseError, classify_block};
pub use scraper::{Fetch, ScraperError, WebScraper};
pub use store::{DocumentStore, StoreError};

/// The "view members as a table" index page.
pub(crate) const INDEX_URL: &str =
    "http://democracy.cityoflondon.gov.uk/mgMemberIndex.aspx?VW=TABLE&PIC=1&FN=";

/// A member's profile page; `{id}` is replaced by the member's UID.
pub(crate) const MEMBER_INFO_URL: &str =
    "http://democracy.cityoflondon.gov.uk/mgUserInfo.aspx?UID={id}";
