use crate::browser::Session;
use crate::config::VitConfig;
use crate::error::{Result, ScrapeError};
use crate::export::{self, join_field};
use crate::utils::element_text;
pub use crate::{log_error, log_info, log_warn};
use scraper::{Html, Selector};
use std::time::Duration;

const CARD_BUTTON: &str = ".view-more-button";
const MODAL: &str = ".lightbox_course";
const MODAL_CLOSE: &str = ".fancybox-close-small";
const NOT_FOUND: &str = "Not Found";

pub const HEADERS: [&str; 3] = ["Name", "Designation", "Research Interests"];

#[derive(Debug, Clone)]
pub struct StaffRecord {
    pub name: String,
    pub designation: String,
    pub research_interests: Vec<String>,
}

impl StaffRecord {
    pub fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.designation.clone(),
            join_field(&self.research_interests, "; "),
        ]
    }
}

pub async fn run(session: &Session, config: &VitConfig) -> Result<usize> {
    let load_timeout = Duration::from_secs(config.load_timeout);

    log_info!("[vit] Navigating to: {}", config.url);
    session
        .goto(&config.url)
        .await
        .map_err(|e| ScrapeError::StartPage(e.to_string()))?;
    session
        .wait_until_ready(load_timeout)
        .await
        .map_err(|e| ScrapeError::StartPage(format!("document not ready: {}", e)))?;

    // Cards load lazily as the page scrolls.
    let _ = session.scroll_to_bottom().await;
    tokio::time::sleep(Duration::from_secs(2)).await;

    session
        .wait_for_with(CARD_BUTTON, load_timeout)
        .await
        .map_err(|e| ScrapeError::StartPage(e.to_string()))?;

    let total = session.count(CARD_BUTTON).await?;
    log_info!("[vit] Found {} faculty cards", total);

    let mut records = Vec::new();
    for index in 0..total {
        match scrape_card(session, index).await {
            Ok(record) => {
                log_info!(
                    "[vit] Faculty #{}: {} | {} | {} interests",
                    index + 1,
                    record.name,
                    record.designation,
                    record.research_interests.len()
                );
                records.push(record);
            }
            Err(e) => {
                log_error!("[vit] Error on faculty #{}: {}", index + 1, e);
                continue;
            }
        }
    }

    export::write_csv(&config.output, &HEADERS, records.iter().map(StaffRecord::row))?;
    log_info!("[vit] Data saved to {}", config.output);
    Ok(records.len())
}

// Buttons are re-queried inside the click script each pass, so a reopened
// modal never leaves a stale handle behind.
async fn scrape_card(session: &Session, index: u64) -> Result<StaffRecord> {
    if !session.click(CARD_BUTTON, index).await? {
        return Err(
            ScrapeError::MissingElement(format!("view-more button #{}", index + 1)).into(),
        );
    }
    tokio::time::sleep(Duration::from_secs(2)).await;

    session.wait_for(MODAL).await?;
    session.scroll_element_to_bottom(MODAL).await?;
    tokio::time::sleep(Duration::from_secs(2)).await;

    let html = session
        .inner_html(MODAL)
        .await?
        .ok_or_else(|| ScrapeError::MissingElement(MODAL.to_string()))?;
    let record = parse_modal(&html);

    if !session.click(MODAL_CLOSE, 0).await? {
        log_warn!("[vit] Close button not found for faculty #{}", index + 1);
    }
    tokio::time::sleep(Duration::from_secs(1)).await;

    Ok(record)
}

pub fn parse_modal(html: &str) -> StaffRecord {
    let fragment = Html::parse_fragment(html);
    let resume_selector = Selector::parse("div.resume-section-content").unwrap();
    let name_selector = Selector::parse("div.text-primary").unwrap();
    let subheading_selector = Selector::parse("div.subheading.mb-5").unwrap();

    let (name, designation) = match fragment.select(&resume_selector).next() {
        Some(section) => (
            section
                .select(&name_selector)
                .next()
                .map(|el| element_text(&el))
                .unwrap_or_else(|| NOT_FOUND.to_string()),
            section
                .select(&subheading_selector)
                .next()
                .map(|el| element_text(&el))
                .unwrap_or_else(|| NOT_FOUND.to_string()),
        ),
        None => (NOT_FOUND.to_string(), NOT_FOUND.to_string()),
    };

    let interests_selector =
        Selector::parse("div.resume-section-content.table-responsive-sm ul.fa-ul.mb-0 li").unwrap();
    let research_interests: Vec<String> = fragment
        .select(&interests_selector)
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty())
        .collect();
    let research_interests = if research_interests.is_empty() {
        vec![NOT_FOUND.to_string()]
    } else {
        research_interests
    };

    StaffRecord {
        name,
        designation,
        research_interests,
    }
}
