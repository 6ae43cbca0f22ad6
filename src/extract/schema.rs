//! Declarative extraction schema
//!
//! Ordered selector-fallback chains per field, versioned separately from the
//! crawl control flow so the target site's DOM can evolve without touching
//! the handlers. Each chain is tried in order; the first candidate that
//! matches wins.

fn chain(selectors: &[&str]) -> Vec<String> {
    selectors.iter().map(|s| s.to_string()).collect()
}

/// Selector chains for the structured hiring-team tier
#[derive(Debug, Clone)]
pub struct HiringTeamSelectors {
    /// Profile card containers, walked one by one.
    pub cards: Vec<String>,
    /// Name element within one card.
    pub name: Vec<String>,
    /// Role element within one card.
    pub title: Vec<String>,
    /// Profile anchor within one card.
    pub profile_link: Vec<String>,
}

/// Everything the handlers need to know about the target site's DOM
#[derive(Debug, Clone)]
pub struct ExtractionSchema {
    /// Bumped whenever the selector set is revised for a site layout change.
    pub version: u32,

    // Search surface
    pub listing_card: Vec<String>,
    pub job_link: Vec<String>,
    pub next_page: Vec<String>,

    // Diagnostic markers for empty search pages
    pub sign_in_form: Vec<String>,
    pub challenge_form: Vec<String>,
    pub results_container: Vec<String>,

    // Detail fields; chains cover both top-card layout variants
    pub title: Vec<String>,
    pub company: Vec<String>,
    pub location: Vec<String>,
    pub location_type: Vec<String>,
    pub seniority: Vec<String>,
    pub employment_type: Vec<String>,
    pub description: Vec<String>,
    pub salary: Vec<String>,
    pub criteria: Vec<String>,
    pub posted_date: Vec<String>,

    pub hiring_team: HiringTeamSelectors,
    /// Generic list items scanned when the structured tier yields nothing.
    pub hiring_team_fallback: Vec<String>,
}

impl ExtractionSchema {
    /// The selector set matching the current production DOM.
    pub fn builtin() -> Self {
        Self {
            version: 1,

            listing_card: chain(&[".base-card", ".job-search-card"]),
            job_link: chain(&[
                "a.base-card__full-link",
                ".jobs-search__results-list li a.base-card__full-link",
            ]),
            next_page: chain(&[
                "a[aria-label=\"View next page\"]",
                "a[aria-label=\"Next\"]",
            ]),

            sign_in_form: chain(&["form[data-id=\"sign-in-form\"]"]),
            challenge_form: chain(&["[data-test-id=\"challenge\"]"]),
            results_container: chain(&[".jobs-search__results-list"]),

            title: chain(&["[data-test=\"top-card-title\"]", ".top-card-layout__title"]),
            company: chain(&[
                "a[data-test=\"top-card-org-name-link\"]",
                ".topcard__org-name-link",
            ]),
            location: chain(&[
                "[data-test=\"top-card-location\"]",
                ".topcard__flavor--bullet",
            ]),
            location_type: chain(&["[data-test=\"job-details-location-type-label\"]"]),
            seniority: chain(&["[data-test=\"job-criteria-seniority-level-skill-label\"]"]),
            employment_type: chain(&["[data-test=\"job-details-employment-type-label\"]"]),
            description: chain(&[
                "[data-test=\"job-details-jobs-details__main-content\"]",
                ".description__text",
            ]),
            salary: chain(&["[data-test=\"job-details-compensation-label\"]"]),
            criteria: chain(&["[data-test=\"job-details-job-criteria-item-subtitle\"]"]),
            posted_date: chain(&["span[aria-label*=\"ago\"]", ".posted-time-ago__text"]),

            hiring_team: HiringTeamSelectors {
                cards: chain(&["[data-section-id=\"hiring_team\"] [data-entity-index]"]),
                name: chain(&["[data-test*=\"entity-profile-title\"]"]),
                title: chain(&["[data-test*=\"entity-profile-subtitle\"]"]),
                profile_link: chain(&["a[data-test*=\"profile-link\"]"]),
            },
            hiring_team_fallback: chain(&["[data-section-id=\"hiring_team\"] li"]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_chains_are_populated() {
        let schema = ExtractionSchema::builtin();
        assert_eq!(schema.version, 1);
        assert!(!schema.listing_card.is_empty());
        assert!(!schema.job_link.is_empty());
        assert!(!schema.next_page.is_empty());
        assert!(!schema.title.is_empty());
        assert!(!schema.hiring_team.cards.is_empty());
        assert!(!schema.hiring_team_fallback.is_empty());
    }

    #[test]
    fn test_layout_variants_ordered_primary_first() {
        let schema = ExtractionSchema::builtin();
        assert!(schema.title[0].contains("data-test"));
        assert!(schema.title.len() > 1);
    }
}
