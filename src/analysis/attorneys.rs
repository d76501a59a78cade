//! Curated attorney directory.
//!
//! Sample listings keyed by state and practice area. Lookups never fail:
//! unknown areas fall back to the first area listed for the state, and
//! unknown states fall back to the reference state.

use serde::{Deserialize, Serialize};

/// Maximum recommendations returned per analysis.
pub const MAX_ATTORNEYS: usize = 5;

const REFERENCE_STATE: &str = "california";
const SOURCE: &str = "State Bar Directory";
const DISCLAIMER: &str = "Verify credentials independently";

const POSTAL_CODES: [(&str, &str); 4] = [
    ("ca", "california"),
    ("ny", "new york"),
    ("tx", "texas"),
    ("fl", "florida"),
];

/// Attorney recommendation attached to an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttorneyRecommendation {
    pub name: String,
    /// The case's legal area, not the attorney's listed practice key.
    pub specialty: String,
    pub location: String,
    pub rating: Option<f32>,
    pub years_experience: u32,
    pub bar_number: String,
    pub profile_url: Option<String>,
    pub source: String,
    pub disclaimer: String,
}

/// One curated listing.
#[derive(Debug, Clone)]
pub struct AttorneyRecord {
    pub name: String,
    pub location: String,
    pub years_experience: u32,
    pub bar_number: String,
}

impl AttorneyRecord {
    fn new(name: &str, location: &str, years_experience: u32, bar_number: &str) -> Self {
        Self {
            name: name.to_string(),
            location: location.to_string(),
            years_experience,
            bar_number: bar_number.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct PracticeArea {
    area: String,
    attorneys: Vec<AttorneyRecord>,
}

#[derive(Debug, Clone)]
struct StateListing {
    state: String,
    areas: Vec<PracticeArea>,
}

/// State → practice area → attorneys, kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct AttorneyDirectory {
    states: Vec<StateListing>,
}

impl AttorneyDirectory {
    /// Empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listing. State and area keys are stored lowercase.
    pub fn with_attorney(mut self, state: &str, area: &str, record: AttorneyRecord) -> Self {
        let state = state.trim().to_lowercase();
        let area = area.trim().to_lowercase();

        let listing = match self.states.iter().position(|s| s.state == state) {
            Some(i) => &mut self.states[i],
            None => {
                self.states.push(StateListing {
                    state,
                    areas: Vec::new(),
                });
                let last = self.states.len() - 1;
                &mut self.states[last]
            }
        };

        match listing.areas.iter_mut().find(|a| a.area == area) {
            Some(practice) => practice.attorneys.push(record),
            None => listing.areas.push(PracticeArea {
                area,
                attorneys: vec![record],
            }),
        }
        self
    }

    /// Bundled sample directory.
    pub fn builtin() -> Self {
        let entries: [(&str, &str, &str, &str, u32, &str); 16] = [
            ("california", "personal injury", "Marisol Avendano", "Los Angeles, CA", 18, "CA-208114"),
            ("california", "personal injury", "Desmond Whitlock", "San Diego, CA", 12, "CA-241877"),
            ("california", "employment", "Priya Raghunathan", "San Francisco, CA", 15, "CA-219305"),
            ("california", "employment", "Owen Castellano", "Oakland, CA", 9, "CA-276410"),
            ("california", "criminal", "Harriet Okonkwo", "Sacramento, CA", 22, "CA-183552"),
            ("california", "family", "Lucia Ferreira-Baines", "San Jose, CA", 14, "CA-230981"),
            ("california", "landlord tenant", "Theo Marchetti", "Los Angeles, CA", 11, "CA-259064"),
            ("new york", "personal injury", "Grant Abernathy", "New York, NY", 20, "NY-4417720"),
            ("new york", "employment", "Naomi Szewczyk", "Brooklyn, NY", 13, "NY-5103348"),
            ("new york", "criminal", "Calvin Oduya", "Bronx, NY", 17, "NY-4729915"),
            ("texas", "personal injury", "Rosalind Treviño", "Houston, TX", 16, "TX-24077315"),
            ("texas", "criminal", "Bennett Haraway", "Dallas, TX", 21, "TX-24011862"),
            ("texas", "family", "Ines Calloway", "Austin, TX", 10, "TX-24093547"),
            ("florida", "personal injury", "Marcus Delacroix", "Miami, FL", 19, "FL-0871204"),
            ("florida", "employment", "Eleanor Vasquez-Hart", "Orlando, FL", 8, "FL-1093376"),
            ("florida", "criminal", "Felix Andrade", "Tampa, FL", 14, "FL-0958821"),
        ];

        entries.iter().fold(
            Self::new(),
            |directory, (state, area, name, location, years, bar)| {
                directory.with_attorney(state, area, AttorneyRecord::new(name, location, *years, bar))
            },
        )
    }

    /// Recommend up to [`MAX_ATTORNEYS`] attorneys for a legal area and jurisdiction.
    pub fn recommend(&self, legal_area: &str, jurisdiction: &str) -> Vec<AttorneyRecommendation> {
        let area = normalize_area(legal_area);

        let listing = self
            .find_state(jurisdiction)
            .or_else(|| self.states.iter().find(|s| s.state == REFERENCE_STATE));

        let Some(listing) = listing else {
            return Vec::new();
        };

        let practice = listing
            .areas
            .iter()
            .find(|p| p.area == area)
            .or_else(|| listing.areas.first());

        practice
            .map(|p| {
                p.attorneys
                    .iter()
                    .take(MAX_ATTORNEYS)
                    .map(|record| AttorneyRecommendation {
                        name: record.name.clone(),
                        specialty: legal_area.to_string(),
                        location: record.location.clone(),
                        rating: None,
                        years_experience: record.years_experience,
                        bar_number: record.bar_number.clone(),
                        profile_url: None,
                        source: SOURCE.to_string(),
                        disclaimer: DISCLAIMER.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Resolve a free-text jurisdiction: last comma-separated component first
    /// (postal codes expanded), then any known state named anywhere in it.
    fn find_state(&self, jurisdiction: &str) -> Option<&StateListing> {
        let lower = jurisdiction.to_lowercase();
        let last = lower
            .rsplit(',')
            .next()
            .unwrap_or("")
            .trim()
            .trim_end_matches('.');
        let key = POSTAL_CODES
            .iter()
            .find(|(code, _)| *code == last)
            .map(|(_, state)| *state)
            .unwrap_or(last);

        self.states
            .iter()
            .find(|s| s.state == key)
            .or_else(|| self.states.iter().find(|s| lower.contains(&s.state)))
    }
}

fn normalize_area(legal_area: &str) -> String {
    let lower = legal_area.trim().to_lowercase();
    lower
        .strip_suffix(" law")
        .unwrap_or(&lower)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(recs: &[AttorneyRecommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_exact_match() {
        let dir = AttorneyDirectory::builtin();
        let recs = dir.recommend("Employment Law", "Brooklyn, New York");
        assert_eq!(names(&recs), vec!["Naomi Szewczyk"]);
        assert_eq!(recs[0].specialty, "Employment Law");
        assert_eq!(recs[0].source, "State Bar Directory");
        assert_eq!(recs[0].disclaimer, "Verify credentials independently");
        assert!(recs[0].rating.is_none());
    }

    #[test]
    fn test_postal_code_expansion() {
        let dir = AttorneyDirectory::builtin();
        let recs = dir.recommend("Criminal", "Dallas, TX");
        assert_eq!(names(&recs), vec!["Bennett Haraway"]);
    }

    #[test]
    fn test_unknown_area_uses_first_area_of_state() {
        let dir = AttorneyDirectory::builtin();
        let recs = dir.recommend("Maritime", "Florida");
        assert_eq!(names(&recs), vec!["Marcus Delacroix"]);
        assert_eq!(recs[0].specialty, "Maritime");
    }

    #[test]
    fn test_unknown_state_uses_reference_state() {
        let dir = AttorneyDirectory::builtin();
        let recs = dir.recommend("Family Law", "Your area");
        assert_eq!(names(&recs), vec!["Lucia Ferreira-Baines"]);
    }

    #[test]
    fn test_state_named_inside_jurisdiction() {
        let dir = AttorneyDirectory::builtin();
        let recs = dir.recommend("Personal Injury", "Houston, Texas, USA");
        assert_eq!(names(&recs), vec!["Rosalind Treviño"]);
    }

    #[test]
    fn test_capped_at_five() {
        let dir = (0..8).fold(AttorneyDirectory::new(), |d, i| {
            d.with_attorney(
                "california",
                "personal injury",
                AttorneyRecord::new(&format!("Attorney {}", i), "Fresno, CA", 5, "CA-1"),
            )
        });
        let recs = dir.recommend("Personal Injury", "California");
        assert_eq!(recs.len(), MAX_ATTORNEYS);
        assert_eq!(recs[0].name, "Attorney 0");
    }

    #[test]
    fn test_empty_directory() {
        let recs = AttorneyDirectory::new().recommend("Employment", "California");
        assert!(recs.is_empty());
    }

    #[test]
    fn test_serialization_is_camel_case() {
        let recs = AttorneyDirectory::builtin().recommend("Criminal", "California");
        let json = serde_json::to_value(&recs[0]).unwrap();
        assert_eq!(json["yearsExperience"], 22);
        assert_eq!(json["barNumber"], "CA-183552");
        assert!(json["profileUrl"].is_null());
    }
}
