use crate::browser::Session;
use crate::config::UalbertaConfig;
use crate::error::{Result, ScrapeError};
use crate::export::{self, join_field};
use crate::pagination;
use crate::utils::{collapse_ws, dedup_preserving_order, element_text, is_placeholder};
pub use crate::{log_error, log_info, log_warn};
use chrono::Local;
use scraper::{ElementRef, Html, Node, Selector};
use std::path::Path;
use std::time::Duration;
use url::Url;

// Coveo renders either result cards or an explicit no-results block.
const RESULTS_OR_EMPTY: &str = ".CoveoResult, .coveo-no-results";
const OFFSET_KEY: &str = "first";
const NO_POSITION: &str = "Position information not available";

pub const HEADERS: [&str; 7] = [
    "name",
    "profile_link",
    "staff_positions",
    "email",
    "keywords",
    "bio",
    "import_time",
];

#[derive(Debug, Clone)]
pub struct FacultyRecord {
    pub name: String,
    pub profile_link: String,
    pub staff_positions: Vec<String>,
    pub email: String,
    pub keywords: Vec<String>,
    pub bio: String,
    pub import_time: String,
}

impl FacultyRecord {
    pub fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.profile_link.clone(),
            join_field(&self.staff_positions, "; "),
            self.email.clone(),
            join_field(&self.keywords, "; "),
            self.bio.clone(),
            self.import_time.clone(),
        ]
    }
}

pub async fn run(session: &Session, config: &UalbertaConfig) -> Result<usize> {
    let mut scraper = DirectoryScraper::new(session, config);
    let outcome = scraper.crawl().await;

    // Partial results survive a failed crawl.
    scraper.save(Path::new(&config.output));

    outcome?;
    Ok(scraper.records.len())
}

struct DirectoryScraper<'a> {
    session: &'a Session,
    config: &'a UalbertaConfig,
    records: Vec<FacultyRecord>,
}

impl<'a> DirectoryScraper<'a> {
    fn new(session: &'a Session, config: &'a UalbertaConfig) -> Self {
        Self {
            session,
            config,
            records: Vec::new(),
        }
    }

    async fn crawl(&mut self) -> Result<()> {
        let mut start_url = Url::parse(&self.config.start_url)
            .map_err(|e| ScrapeError::InvalidUrl(format!("{}: {}", self.config.start_url, e)))?;

        if self.config.start_page > 1 {
            let offset = ((self.config.start_page - 1) * self.config.results_per_page) as u64;
            start_url = pagination::with_fragment_offset(&start_url, OFFSET_KEY, offset);
        }

        log_info!("[ualberta] Navigating to: {}", start_url);
        self.session
            .goto(start_url.as_str())
            .await
            .map_err(|e| ScrapeError::StartPage(e.to_string()))?;
        self.session
            .wait_for(RESULTS_OR_EMPTY)
            .await
            .map_err(|e| ScrapeError::StartPage(e.to_string()))?;

        let mut page_count = self.config.start_page;
        let mut empty_pages = 0u32;
        let mut total_scraped = 0usize;

        loop {
            log_info!("[ualberta] Scraping page {}...", page_count);

            let scraped = match self.scrape_current_page().await {
                Ok(count) => count,
                Err(e) => {
                    log_error!("[ualberta] Error scraping page {}: {}", page_count, e);
                    0
                }
            };
            total_scraped += scraped;

            if scraped == 0 {
                empty_pages += 1;
                if empty_pages >= self.config.empty_page_threshold {
                    log_info!("[ualberta] Reached empty page threshold - stopping");
                    break;
                }
            } else {
                empty_pages = 0;
            }

            if self.config.max_pages > 0 && page_count >= self.config.max_pages {
                log_info!(
                    "[ualberta] Reached max pages limit ({})",
                    self.config.max_pages
                );
                break;
            }

            if page_count % self.config.checkpoint_interval == 0 {
                let checkpoint = export::checkpoint_path(Path::new(&self.config.output), page_count);
                self.save(&checkpoint);
            }

            if let Err(e) = self.next_page().await {
                log_warn!("[ualberta] Failed to go to next page: {}", e);
                log_info!("[ualberta] No more pages available");
                break;
            }

            page_count += 1;
            let pause = if page_count % 10 == 0 { 3 } else { 1 };
            tokio::time::sleep(Duration::from_secs(pause)).await;
        }

        log_info!(
            "[ualberta] Scraping complete. Total records: {}",
            total_scraped
        );
        Ok(())
    }

    async fn scrape_current_page(&mut self) -> Result<usize> {
        let html = self.session.html().await?;
        let records = parse_cards(&html);

        for record in &records {
            log_info!(
                "[ualberta] Scraped: {} | Email: {} | Positions: {} | Keywords: {}",
                record.name,
                record.email,
                record.staff_positions.len(),
                record.keywords.len()
            );
        }

        let count = records.len();
        self.records.extend(records);
        log_info!("[ualberta] Scraped {} faculty cards on current page", count);
        Ok(count)
    }

    async fn next_page(&self) -> Result<()> {
        let current = self.session.current_url().await?;
        let current = Url::parse(&current)
            .map_err(|e| ScrapeError::InvalidUrl(format!("{}: {}", current, e)))?;

        let next = pagination::shift_fragment_offset(
            &current,
            OFFSET_KEY,
            self.config.results_per_page as u64,
            true,
        );
        self.session.goto(next.as_str()).await?;
        self.session.wait_for(RESULTS_OR_EMPTY).await?;
        Ok(())
    }

    fn save(&self, path: &Path) {
        if self.records.is_empty() {
            log_warn!("[ualberta] No data to save - skipping CSV write");
            return;
        }

        let rows = self.records.iter().map(FacultyRecord::row);
        if let Err(e) = export::write_csv(path, &HEADERS, rows) {
            log_error!(&e => "[ualberta] Error saving to CSV");
        }
    }
}

pub fn parse_cards(html: &str) -> Vec<FacultyRecord> {
    let document = Html::parse_document(html);
    let card_selector = Selector::parse("div.CoveoResult").unwrap();
    document
        .select(&card_selector)
        .map(parse_card)
        .collect()
}

fn parse_card(card: ElementRef) -> FacultyRecord {
    let link_selector = Selector::parse("div.col-12 a.CoveoResultLink").unwrap();
    let (name, profile_link) = match card.select(&link_selector).next() {
        Some(link) => (
            element_text(&link),
            link.value().attr("href").unwrap_or("N/A").to_string(),
        ),
        None => ("N/A".to_string(), "N/A".to_string()),
    };

    let email_selector = Selector::parse("div.col-12 a[href^='mailto:']").unwrap();
    let email = card
        .select(&email_selector)
        .next()
        .map(|el| element_text(&el))
        .unwrap_or_else(|| "N/A".to_string());

    let keyword_selector = Selector::parse("span.CoveoFieldValue").unwrap();
    let keywords = dedup_preserving_order(
        card.select(&keyword_selector)
            .map(|el| element_text(&el))
            .filter(|text| !text.is_empty())
            .collect(),
    );

    let bio_selector = Selector::parse("p.CoveoExcerpt").unwrap();
    let bio = card
        .select(&bio_selector)
        .next()
        .map(|el| element_text(&el))
        .unwrap_or_else(|| "N/A".to_string());

    FacultyRecord {
        name,
        profile_link,
        staff_positions: parse_staff_positions(card),
        email,
        keywords,
        bio,
        import_time: Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
    }
}

// Positions come in three markup shapes: separated by <br>, in child
// <span>s, or as plain text.
fn parse_staff_positions(card: ElementRef) -> Vec<String> {
    let position_selector = Selector::parse("p.staff-position").unwrap();
    let br_selector = Selector::parse("br").unwrap();
    let span_selector = Selector::parse("span").unwrap();

    let mut positions = Vec::new();
    for position in card.select(&position_selector) {
        if position.select(&br_selector).next().is_some() {
            positions.extend(split_on_br(position));
        } else if position.select(&span_selector).next().is_some() {
            positions.extend(
                position
                    .select(&span_selector)
                    .map(|span| element_text(&span)),
            );
        } else {
            positions.push(element_text(&position));
        }
    }

    let positions = dedup_preserving_order(
        positions
            .into_iter()
            .map(|text| text.trim().to_string())
            .filter(|text| !is_placeholder(text))
            .collect(),
    );

    if positions.is_empty() {
        vec![NO_POSITION.to_string()]
    } else {
        positions
    }
}

fn split_on_br(position: ElementRef) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    for child in position.children() {
        match child.value() {
            Node::Element(el) if el.name() == "br" => {
                parts.push(std::mem::take(&mut current));
            }
            Node::Text(text) => current.push_str(text),
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    current.push(' ');
                    current.push_str(&element_text(&el));
                }
            }
            _ => {}
        }
    }
    parts.push(current);

    parts
        .into_iter()
        .map(|part| collapse_ws(&part))
        .filter(|part| !part.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD_BR: &str = r#"
        <div class="CoveoResult">
          <div class="col-12">
            <a class="CoveoResultLink" href="https://example.edu/jdoe">Jane Doe</a>
            <a href="mailto:jdoe@example.edu">jdoe@example.edu</a>
          </div>
          <p class="staff-position">Professor<br>Department Chair<br>N/A</p>
          <span class="CoveoFieldValue">Algebra</span>
          <span class="CoveoFieldValue">Topology</span>
          <span class="CoveoFieldValue">Algebra</span>
          <p class="CoveoExcerpt">Jane studies
            algebraic    structures.</p>
        </div>"#;

    const CARD_SPANS: &str = r#"
        <div class="CoveoResult">
          <div class="col-12">
            <a class="CoveoResultLink" href="/profiles/rroe">Richard Roe</a>
          </div>
          <p class="staff-position"><span>Associate Professor</span><span>Associate Professor</span><span></span></p>
        </div>"#;

    const CARD_PLAIN: &str = r#"
        <div class="CoveoResult">
          <div class="col-12">
            <a class="CoveoResultLink" href="/profiles/asmith">Alice Smith</a>
          </div>
          <p class="staff-position">  Lecturer  </p>
        </div>"#;

    const CARD_BARE: &str = r#"<div class="CoveoResult"><p>nothing useful</p></div>"#;

    #[test]
    fn parses_br_separated_positions() {
        let records = parse_cards(CARD_BR);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.name, "Jane Doe");
        assert_eq!(record.profile_link, "https://example.edu/jdoe");
        assert_eq!(record.email, "jdoe@example.edu");
        assert_eq!(record.staff_positions, vec!["Professor", "Department Chair"]);
        assert_eq!(record.keywords, vec!["Algebra", "Topology"]);
        assert_eq!(record.bio, "Jane studies algebraic structures.");
        assert!(!record.import_time.is_empty());
    }

    #[test]
    fn parses_span_positions_and_dedups() {
        let records = parse_cards(CARD_SPANS);
        assert_eq!(records[0].staff_positions, vec!["Associate Professor"]);
    }

    #[test]
    fn parses_plain_text_position() {
        let records = parse_cards(CARD_PLAIN);
        assert_eq!(records[0].staff_positions, vec!["Lecturer"]);
    }

    #[test]
    fn bare_card_gets_placeholders() {
        let records = parse_cards(CARD_BARE);
        let record = &records[0];
        assert_eq!(record.name, "N/A");
        assert_eq!(record.profile_link, "N/A");
        assert_eq!(record.email, "N/A");
        assert_eq!(record.bio, "N/A");
        assert_eq!(record.staff_positions, vec![NO_POSITION]);
        assert!(record.keywords.is_empty());
    }

    #[test]
    fn multiple_cards_in_page_order() {
        let page = format!("<html><body>{}{}</body></html>", CARD_BR, CARD_PLAIN);
        let records = parse_cards(&page);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Jane Doe");
        assert_eq!(records[1].name, "Alice Smith");
    }

    #[test]
    fn row_joins_list_fields() {
        let record = FacultyRecord {
            name: "Jane Doe".to_string(),
            profile_link: "https://example.edu/jdoe".to_string(),
            staff_positions: vec!["Professor".to_string(), "Chair".to_string()],
            email: "jdoe@example.edu".to_string(),
            keywords: vec!["Algebra".to_string()],
            bio: "Bio".to_string(),
            import_time: "2025-01-01T00:00:00".to_string(),
        };
        let row = record.row();
        assert_eq!(row.len(), HEADERS.len());
        assert_eq!(row[2], "Professor; Chair");
        assert_eq!(row[4], "Algebra");
    }
}
