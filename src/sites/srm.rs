use crate::browser::Session;
use crate::config::SrmConfig;
use crate::error::{Result, ScrapeError};
use crate::export::{self, join_field};
use crate::utils::{element_text, extract_email};
pub use crate::{log_error, log_info, log_warn};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

pub const HEADERS: [&str; 6] = [
    "Name",
    "Designation",
    "Email",
    "Bio",
    "Research Interests",
    "Profile URL",
];

#[derive(Debug, Clone, Default)]
pub struct ProfileRecord {
    pub name: String,
    pub designation: String,
    pub email: String,
    pub bio: String,
    pub research_interests: Vec<String>,
    pub profile_url: String,
}

impl ProfileRecord {
    pub fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.designation.clone(),
            self.email.clone(),
            self.bio.clone(),
            join_field(&self.research_interests, "; "),
            self.profile_url.clone(),
        ]
    }
}

pub async fn run(session: &Session, config: &SrmConfig) -> Result<usize> {
    log_info!("[srm] Navigating to: {}", config.base_url);
    session
        .goto(&config.base_url)
        .await
        .map_err(|e| ScrapeError::StartPage(e.to_string()))?;

    let mut records: Vec<ProfileRecord> = Vec::new();
    for page_num in config.start_page..=config.end_page {
        log_info!("[srm] Moving to page {}...", page_num);
        if let Err(e) = scrape_page(session, page_num, &mut records).await {
            log_error!("[srm] Unexpected error on page {}: {}", page_num, e);
        }
    }

    if records.is_empty() {
        log_warn!("[srm] No data to save - skipping CSV write");
    } else {
        export::write_csv(&config.output, &HEADERS, records.iter().map(ProfileRecord::row))?;
        log_info!("[srm] All data saved to {}", config.output);
    }
    Ok(records.len())
}

async fn scrape_page(
    session: &Session,
    page_num: usize,
    records: &mut Vec<ProfileRecord>,
) -> Result<()> {
    session.wait_for("div.pagination-nav").await?;
    tokio::time::sleep(Duration::from_secs(1)).await;

    let clicked = session
        .click_where_attr("div.pagination-link li", "p", &page_num.to_string())
        .await?;
    if !clicked {
        log_warn!("[srm] Pagination button for page {} not found", page_num);
        return Ok(());
    }

    session.wait_for("h3.post-title a").await?;
    tokio::time::sleep(Duration::from_secs(2)).await;

    let links = profile_links(&session.html().await?);
    log_info!("[srm] Found {} profiles on page {}", links.len(), page_num);

    for (index, link) in links.iter().enumerate() {
        log_info!(
            "[srm] Scraping profile {} on page {}: {}",
            index + 1,
            page_num,
            link
        );
        match scrape_profile(session, link).await {
            Ok(record) => {
                log_info!(
                    "[srm] Name: {} | Designation: {} | Email: {} | Interests: {}",
                    record.name,
                    record.designation,
                    record.email,
                    record.research_interests.len()
                );
                records.push(record);
            }
            Err(e) => log_error!("[srm] Error processing profile: {}", e),
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    Ok(())
}

// Detail pages open in their own tab so the listing keeps its pagination state.
async fn scrape_profile(session: &Session, link: &str) -> Result<ProfileRecord> {
    let tab = session.open_tab(link).await?;
    tokio::time::sleep(Duration::from_secs(2)).await;

    let html = tab.html().await;
    if let Err(e) = tab.close().await {
        log_warn!("[srm] Failed to close profile tab: {}", e);
    }

    let mut record = parse_profile(&html?);
    record.profile_url = link.to_string();
    Ok(record)
}

pub fn profile_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse("h3.post-title a").unwrap();
    document
        .select(&link_selector)
        .filter_map(|el| el.value().attr("href"))
        .map(str::to_string)
        .collect()
}

// Field extraction is heuristic: the profile pages share a page builder
// but not a fixed layout.
pub fn parse_profile(html: &str) -> ProfileRecord {
    let document = Html::parse_document(html);

    let name_selector =
        Selector::parse("h1.elementor-heading-title, h2.elementor-heading-title").unwrap();
    let name = document
        .select(&name_selector)
        .next()
        .map(|el| element_text(&el))
        .unwrap_or_default();

    let heading_selector = Selector::parse("h2, h3, h4").unwrap();
    let designation = document
        .select(&heading_selector)
        .find(|el| {
            let text = element_text(el);
            text.contains("Professor") || text.contains("Head")
        })
        .map(|el| element_text(&el))
        .unwrap_or_default();

    // Fall back to a regex sweep only when there is no mailto link at all.
    let email_selector = Selector::parse("a[href^='mailto:']").unwrap();
    let email = match document.select(&email_selector).next() {
        Some(el) => element_text(&el),
        None => {
            let page_text = document.root_element().text().collect::<String>();
            extract_email(&page_text).unwrap_or_default()
        }
    };

    let skip_re = Regex::new(r"(?i)@|research|course").unwrap();
    let paragraph_selector = Selector::parse("p").unwrap();
    let bio = document
        .select(&paragraph_selector)
        .map(|el| element_text(&el))
        .find(|text| text.chars().count() > 100 && !skip_re.is_match(text))
        .unwrap_or_default();

    ProfileRecord {
        name,
        designation,
        email,
        bio,
        research_interests: parse_research_interests(&document),
        profile_url: String::new(),
    }
}

// Interests follow a "Research Interests" heading as sibling lists or
// paragraphs, until another element kind ends the run.
fn parse_research_interests(document: &Html) -> Vec<String> {
    let heading_selector = Selector::parse("h2, h3, h4").unwrap();
    let item_selector = Selector::parse("li").unwrap();

    let Some(heading) = document
        .select(&heading_selector)
        .find(|el| element_text(el).to_lowercase().contains("research interest"))
    else {
        return Vec::new();
    };

    let mut interests = Vec::new();
    for sibling in heading.next_siblings() {
        let Some(element) = ElementRef::wrap(sibling) else {
            continue;
        };
        match element.value().name() {
            "ul" | "ol" => interests.extend(
                element
                    .select(&item_selector)
                    .map(|li| element_text(&li))
                    .filter(|text| !text.is_empty()),
            ),
            "p" => {
                let text = element_text(&element);
                if !text.is_empty() {
                    interests.push(text);
                }
            }
            _ => break,
        }
    }
    interests
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r#"
        <html><body>
          <h2 class="elementor-heading-title">Dr. Priya Raman</h2>
          <h3>Professor and Head</h3>
          <p>Short note.</p>
          <p>Dr. Raman has taught graduate seminars for over two decades and supervised
             a large number of doctoral candidates across several collaborating departments,
             publishing extensively along the way.</p>
          <a href="mailto:priya.r@univ.edu">priya.r@univ.edu</a>
          <h4>Research Interests</h4>
          <ul><li>Number theory</li><li>Cryptography</li></ul>
          <p>Applications to coding theory.</p>
          <div>Unrelated footer</div>
          <p>This trailing paragraph is long enough to qualify as a biography but it mentions
             research funding and therefore must never be selected by the bio heuristic.</p>
        </body></html>"#;

    const PROFILE_NO_MAILTO: &str = r#"
        <html><body>
          <h1 class="elementor-heading-title">Dr. Anand Kumar</h1>
          <h3>Associate Professor</h3>
          <p>Reach him at anand.kumar@univ.edu during office hours.</p>
        </body></html>"#;

    const LISTING: &str = r#"
        <html><body>
          <h3 class="post-title"><a href="https://univ.edu/staff/a">A</a></h3>
          <h3 class="post-title"><a href="https://univ.edu/staff/b">B</a></h3>
          <h3 class="other"><a href="https://univ.edu/ignored">x</a></h3>
        </body></html>"#;

    #[test]
    fn parses_full_profile() {
        let record = parse_profile(PROFILE);
        assert_eq!(record.name, "Dr. Priya Raman");
        assert_eq!(record.designation, "Professor and Head");
        assert_eq!(record.email, "priya.r@univ.edu");
        assert!(record.bio.starts_with("Dr. Raman has taught"));
        assert_eq!(
            record.research_interests,
            vec![
                "Number theory",
                "Cryptography",
                "Applications to coding theory."
            ]
        );
    }

    #[test]
    fn email_falls_back_to_page_text() {
        let record = parse_profile(PROFILE_NO_MAILTO);
        assert_eq!(record.email, "anand.kumar@univ.edu");
    }

    #[test]
    fn bio_skips_short_and_filtered_paragraphs() {
        let record = parse_profile(PROFILE);
        assert!(!record.bio.contains("funding"));
        assert!(!record.bio.contains("Short note"));
    }

    #[test]
    fn missing_fields_stay_empty() {
        let record = parse_profile("<html><body><p>bare</p></body></html>");
        assert_eq!(record.name, "");
        assert_eq!(record.designation, "");
        assert_eq!(record.email, "");
        assert_eq!(record.bio, "");
        assert!(record.research_interests.is_empty());
    }

    #[test]
    fn collects_profile_links_from_post_titles() {
        assert_eq!(
            profile_links(LISTING),
            vec!["https://univ.edu/staff/a", "https://univ.edu/staff/b"]
        );
    }

    #[test]
    fn interests_stop_at_non_list_element() {
        let record = parse_profile(PROFILE);
        assert!(!record.research_interests.iter().any(|i| i.contains("footer")));
    }
}
