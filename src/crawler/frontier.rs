//! Crawl frontier: the pages still to visit and the pages already visited
//!
//! The frontier is created per crawl and enforces three invariants:
//! - no more than `budget` URLs are ever marked visited
//! - a URL is visited at most once
//! - the queue never holds a URL that is already visited or already queued

use crate::url::{extract_domain, is_same_site, normalize_url, registrable_domain};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// FIFO queue of URLs bounded by a page budget
#[derive(Debug, Clone)]
pub struct Frontier {
    /// Registrable domain that discovered URLs must belong to
    site_domain: String,

    /// URLs waiting to be visited, in discovery order
    queue: VecDeque<Url>,

    /// Mirror of `queue` for constant-time membership checks
    queued: HashSet<String>,

    visited: HashSet<String>,

    /// Maximum number of distinct pages visited
    budget: usize,
}

impl Frontier {
    /// Creates an empty frontier scoped to `site_domain`
    ///
    /// # Arguments
    ///
    /// * `site_domain` - Host of the site; reduced to its registrable domain
    /// * `budget` - Maximum number of pages to visit
    pub fn new(site_domain: &str, budget: usize) -> Self {
        Self {
            site_domain: registrable_domain(site_domain),
            queue: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
            budget,
        }
    }

    /// Appends URLs that are neither visited nor queued
    ///
    /// Seeds are not scope-checked. Returns the number of URLs added.
    pub fn seed<I>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = Url>,
    {
        urls.into_iter().filter(|url| self.enqueue(url.clone())).count()
    }

    /// Appends newly found in-scope URLs
    ///
    /// Each candidate is normalized first. Unparseable URLs, URLs on other
    /// sites, and URLs already visited or queued are skipped.
    ///
    /// # Returns
    ///
    /// The number of URLs added to the queue
    pub fn discover<I, S>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;

        for candidate in urls {
            let url = match normalize_url(candidate.as_ref()) {
                Ok(url) => url,
                Err(e) => {
                    tracing::trace!("Skipping link {}: {}", candidate.as_ref(), e);
                    continue;
                }
            };

            if !self.in_scope(&url) {
                continue;
            }

            if self.enqueue(url) {
                added += 1;
            }
        }

        added
    }

    /// Pops the oldest queued URL
    pub fn next(&mut self) -> Option<Url> {
        let url = self.queue.pop_front()?;
        self.queued.remove(url.as_str());
        Some(url)
    }

    /// Records a URL as visited
    ///
    /// Marking the same URL twice is a no-op. A URL that is still queued is
    /// removed from the queue. Returns false if the URL could not be marked
    /// because the budget is already spent.
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        if self.visited.contains(url.as_str()) {
            return true;
        }
        if !self.has_budget() {
            return false;
        }

        if self.queued.remove(url.as_str()) {
            self.queue.retain(|queued| queued != url);
        }
        self.visited.insert(url.to_string());
        true
    }

    /// Returns true while fewer than `budget` pages have been visited
    pub fn has_budget(&self) -> bool {
        self.visited.len() < self.budget
    }

    /// Checks the budget, pops the next URL and marks it visited in one step
    ///
    /// Returns None once the budget is spent or the queue is empty. The budget
    /// is checked before anything is dequeued.
    pub fn claim_next(&mut self) -> Option<Url> {
        if !self.has_budget() {
            return None;
        }

        let url = self.next()?;
        self.visited.insert(url.to_string());
        Some(url)
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }

    /// Returns true if `url` belongs to the crawled site
    pub fn in_scope(&self, url: &Url) -> bool {
        extract_domain(url).is_some_and(|host| is_same_site(&self.site_domain, &host))
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn site_domain(&self) -> &str {
        &self.site_domain
    }

    fn enqueue(&mut self, url: Url) -> bool {
        if self.visited.contains(url.as_str()) || self.queued.contains(url.as_str()) {
            return false;
        }

        self.queued.insert(url.to_string());
        self.queue.push_back(url);
        true
    }
}
