use crate::browser::Session;
use crate::config::UmanitobaConfig;
use crate::error::{Result, ScrapeError};
use crate::export::{self, join_field};
use crate::utils::{element_text, first_text_line};
pub use crate::{log_error, log_info, log_warn};
use scraper::{Html, Selector};
use std::time::{Duration, Instant};

// Drupal field wrappers; the class chains are the only stable hooks.
const CONTENT_BLOCK: &str = "div.clearfix.wysiwyg.field.field--name-field-basic-text-content.field--type-text-long.field--label-hidden.field__item";
const RESEARCH_SECTION: &str = "#research-and-teaching-interests";
const RESEARCH_BODY: &str = "div.clearfix.wysiwyg.field.field--name-body.field--type-text-with-summary.field--label-hidden.field__item";

const COOKIE_WAIT: Duration = Duration::from_secs(10);

pub const HEADERS: [&str; 4] = ["Name", "H2 Headings", "Paragraphs", "Research Interests"];

#[derive(Debug, Clone)]
pub struct MemberRecord {
    pub name: String,
    pub headings: Vec<String>,
    pub paragraphs: Vec<String>,
    pub research_interests: Vec<String>,
}

impl MemberRecord {
    pub fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            join_field(&self.headings, " | "),
            join_field(&self.paragraphs, " | "),
            join_field(&self.research_interests, " | "),
        ]
    }
}

pub async fn run(session: &Session, config: &UmanitobaConfig) -> Result<usize> {
    log_info!("[umanitoba] Navigating to: {}", config.url);
    session
        .goto(&config.url)
        .await
        .map_err(|e| ScrapeError::StartPage(e.to_string()))?;

    accept_cookies(session).await;

    let members = faculty_links(&session.html().await?);
    log_info!("[umanitoba] Found {} faculty members", members.len());

    let mut records = Vec::new();
    for (name, link) in members {
        log_info!("[umanitoba] Scraping: {} => {}", name, link);
        match scrape_member(session, &name, &link).await {
            Ok(record) => records.push(record),
            Err(e) => log_error!("[umanitoba] Error scraping {}: {}", name, e),
        }
    }

    export::write_csv(&config.output, &HEADERS, records.iter().map(MemberRecord::row))?;
    log_info!("[umanitoba] All data saved to {}", config.output);
    Ok(records.len())
}

async fn accept_cookies(session: &Session) {
    let deadline = Instant::now() + COOKIE_WAIT;
    loop {
        if let Ok(true) = session.click_containing("button", "OK, I agree").await {
            log_info!("[umanitoba] Dismissed cookie popup");
            return;
        }
        if Instant::now() >= deadline {
            log_info!("[umanitoba] No cookie popup or it already disappeared");
            return;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}

async fn scrape_member(session: &Session, name: &str, link: &str) -> Result<MemberRecord> {
    session.goto(link).await?;
    tokio::time::sleep(Duration::from_secs(1)).await;

    if session
        .wait_for_with(CONTENT_BLOCK, Duration::from_secs(10))
        .await
        .is_err()
    {
        log_warn!("[umanitoba] Could not find main content div for {}", name);
    }

    // The interests section sits below the fold.
    let _ = session.scroll_into_view(RESEARCH_SECTION).await;

    let html = session.html().await?;
    Ok(parse_member(&html, name))
}

pub fn faculty_links(html: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let block_selector = Selector::parse(CONTENT_BLOCK).unwrap();
    let anchor_selector = Selector::parse("a").unwrap();

    let mut members = Vec::new();
    for block in document.select(&block_selector) {
        let Some(link) = block
            .select(&anchor_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            continue;
        };
        members.push((first_text_line(&block), link.to_string()));
    }
    members
}

pub fn parse_member(html: &str, name: &str) -> MemberRecord {
    let document = Html::parse_document(html);
    let block_selector = Selector::parse(CONTENT_BLOCK).unwrap();
    let heading_selector = Selector::parse("h2").unwrap();
    let paragraph_selector = Selector::parse("p").unwrap();

    let (headings, paragraphs) = match document.select(&block_selector).next() {
        Some(block) => (
            block
                .select(&heading_selector)
                .map(|el| element_text(&el))
                .filter(|text| !text.is_empty())
                .collect(),
            block
                .select(&paragraph_selector)
                .map(|el| element_text(&el))
                .filter(|text| !text.is_empty())
                .collect(),
        ),
        None => (Vec::new(), Vec::new()),
    };

    let research_selector =
        Selector::parse(&format!("{} {} li", RESEARCH_SECTION, RESEARCH_BODY)).unwrap();
    let research_interests: Vec<String> = document
        .select(&research_selector)
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty())
        .collect();
    if research_interests.is_empty() {
        log_info!("[umanitoba] No research section found for {}", name);
    }

    MemberRecord {
        name: name.to_string(),
        headings,
        paragraphs,
        research_interests,
    }
}
