//! The crawl: list members from the index page, then fetch, extract and save
//! each one in turn, then rebuild the summaries.
//!
//! Members are fetched strictly one after another with a pause between them.
//! The site is a public council service, so the pause is part of the crawl's
//! contract with it rather than a tuning knob.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};

use crate::aggregate::{AggregateReport, aggregate};
use crate::parser::{parse_member_index, parse_member_page, parse_register};
use crate::scraper::{Fetch, ScraperError};
use crate::store::DocumentStore;
use crate::text::base_url;
use crate::types::{Member, MemberDocument, MemberSummary, Meta, Profile, Register, Role, Section};
use crate::utils::SeedFilter;

pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    /// The member index, in its table view.
    pub index_url: String,
    /// Profile page URL with an `{id}` placeholder for the member's UID.
    pub member_url: String,
    /// Minimum spacing between consecutive member fetches.
    pub delay: Duration,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            index_url: crate::INDEX_URL.to_string(),
            member_url: crate::MEMBER_INFO_URL.to_string(),
            delay: DEFAULT_DELAY,
        }
    }
}

impl CrawlConfig {
    pub fn member_url(&self, id: u32) -> String {
        self.member_url.replace("{id}", &id.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Idle,
    Listing,
    PerMember(u32),
    Done,
}

/// Spaces out calls to [`Throttle::wait`] by at least `delay`.
#[derive(Debug)]
pub struct Throttle {
    delay: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self { delay, last: None }
    }

    pub async fn wait(&mut self) {
        if let Some(last) = self.last {
            sleep_until(last + self.delay).await;
        }
        self.last = Some(Instant::now());
    }
}

#[derive(Debug)]
pub struct CrawlReport {
    /// Members whose documents were written during this crawl, in index order.
    pub roster: Vec<MemberSummary>,
    /// Members skipped this run; their previous documents are untouched.
    pub failures: Vec<(u32, ScraperError)>,
    pub summaries: AggregateReport,
}

pub struct Crawler<'a, F: Fetch> {
    fetcher: &'a F,
    store: &'a DocumentStore,
    config: CrawlConfig,
    base: String,
    state: CrawlState,
    throttle: Throttle,
}

impl<'a, F: Fetch> Crawler<'a, F> {
    pub fn new(
        fetcher: &'a F,
        store: &'a DocumentStore,
        config: CrawlConfig,
    ) -> Result<Self, ScraperError> {
        let base = base_url(&config.index_url)?;
        let throttle = Throttle::new(config.delay);

        Ok(Self {
            fetcher,
            store,
            config,
            base,
            state: CrawlState::Idle,
            throttle,
        })
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub async fn fetch_index(&mut self) -> Result<Vec<MemberSummary>, ScraperError> {
        self.state = CrawlState::Listing;
        log::info!("Fetching member index from {}...", self.config.index_url);

        let html = self.fetcher.get_html(&self.config.index_url).await?;
        let seeds = parse_member_index(&html, &self.base)?;

        log::info!("Found {} member(s) in the index", seeds.len());
        Ok(seeds)
    }

    /// Fetches a member's profile (and register of interests, if linked) and
    /// builds their document. Nothing is written.
    pub async fn extract_member(
        &self,
        seed: &MemberSummary,
    ) -> Result<MemberDocument, ScraperError> {
        log::info!("Fetching member {}: {}", seed.id, seed.url);
        let html = self.fetcher.get_html(&seed.url).await?;
        let page = parse_member_page(&html, &self.base)?;

        let committees = match page.committees {
            Section::Found(committees) => committees,
            Section::Absent => {
                log::debug!("Member {} lists no committees", seed.id);
                Vec::new()
            }
        };

        let register = match page.register_url {
            Section::Found(url) => {
                log::debug!("Fetching register of interests: {}", url);
                let html = self.fetcher.get_html(&url).await?;
                parse_register(&html)?
            }
            Section::Absent => {
                log::info!("Member {} has no register of interests link", seed.id);
                Register::default()
            }
        };

        Ok(MemberDocument {
            meta: Meta::now(),
            member: build_member(seed, page.profile),
            committees,
            interests: register.interests,
            gifts: register.gifts,
        })
    }

    /// Extracts one member and replaces their document on disk.
    pub async fn crawl_member(
        &mut self,
        seed: &MemberSummary,
    ) -> Result<MemberDocument, ScraperError> {
        self.state = CrawlState::PerMember(seed.id);
        self.throttle.wait().await;

        let document = self.extract_member(seed).await?;
        let path = self.store.write_member(&document)?;

        log::info!("Saved member {} to {}", seed.id, path.display());
        Ok(document)
    }

    /// Crawls a single member by UID, without consulting the index.
    pub async fn crawl_single(&mut self, id: u32) -> Result<MemberDocument, ScraperError> {
        let seed = MemberSummary {
            id,
            name: String::new(),
            role: Role::Member,
            party: String::new(),
            ward: String::new(),
            url: self.config.member_url(id),
        };
        self.crawl_member(&seed).await
    }

    /// Runs the whole crawl and rebuilds the summaries.
    ///
    /// Only a failure to read the index (or to write the summaries) aborts the
    /// run; a member that fails is logged, reported and skipped.
    pub async fn run(&mut self, filter: SeedFilter) -> Result<CrawlReport, ScraperError> {
        let seeds = filter.apply(self.fetch_index().await?);

        let mut roster = Vec::with_capacity(seeds.len());
        let mut failures = Vec::new();

        for seed in &seeds {
            match self.crawl_member(seed).await {
                Ok(document) => roster.push(MemberSummary::from(&document.member)),
                Err(e) => {
                    log::warn!("Skipping member {} ({}): {}", seed.id, seed.name, e);
                    failures.push((seed.id, e));
                }
            }
        }

        self.state = CrawlState::Done;
        log::info!("Saved data for {} of {} member(s)", roster.len(), seeds.len());

        let summaries = aggregate(self.store, &Meta::now())?;

        Ok(CrawlReport {
            roster,
            failures,
            summaries,
        })
    }
}

/// The profile page wins over the index row wherever it has a value.
fn build_member(seed: &MemberSummary, profile: Profile) -> Member {
    let or_seed = |fresh: String, seeded: &str| {
        if fresh.is_empty() {
            seeded.to_string()
        } else {
            fresh
        }
    };

    let role = if profile.role == Role::Member {
        seed.role
    } else {
        profile.role
    };

    Member {
        id: seed.id,
        url: seed.url.clone(),
        name: or_seed(profile.name, &seed.name),
        role,
        ward: or_seed(profile.ward, &seed.ward),
        party: or_seed(profile.party, &seed.party),
    }
}
