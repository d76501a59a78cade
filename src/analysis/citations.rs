//! Citation to URL resolution.
//!
//! Pure functions of the citation text. Specific statute patterns are tried
//! first, then jurisdiction indexes, then a generic legal search.

use once_cell::sync::Lazy;
use regex::Regex;
use url::form_urlencoded;

static USC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\s*u\.?\s*s\.?\s*c\.?\s*(?:§+\s*)?(\d+[a-z]?)").expect("valid USC regex")
});

static CFR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\s*c\.?\s*f\.?\s*r\.?\s*(?:§+\s*)?(\d+)(?:\.(\d+))?")
        .expect("valid CFR regex")
});

static SECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"§?\s*(\d+)").expect("valid section regex"));

static CHAPTER_SECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\.(\d+)").expect("valid chapter.section regex"));

const CORNELL_SEARCH: &str = "https://www.law.cornell.edu/search/site/";

const CALIFORNIA_PENAL: [&str; 3] = ["california penal code", "ca penal code", "cal. pen. code"];
const CALIFORNIA_CIVIL: [&str; 3] = ["california civil code", "ca civil code", "cal. civ. code"];
const NEW_YORK: [&str; 3] = ["new york", "n.y.", "nys"];
const TEXAS: [&str; 2] = ["texas", "tex."];
const FLORIDA: [&str; 3] = ["florida", "fla. stat", "f.s."];
const FEDERAL: [&str; 3] = ["u.s.c", "united states code", "federal"];

/// Statute index pages by state keyword, checked in order.
const STATE_INDEXES: [(&str, &str); 10] = [
    ("california", "https://leginfo.legislature.ca.gov/faces/codes.xhtml"),
    ("new york", "https://www.nysenate.gov/legislation/laws"),
    ("texas", "https://statutes.capitol.texas.gov/"),
    ("florida", "http://www.leg.state.fl.us/statutes/"),
    ("illinois", "https://www.ilga.gov/legislation/ilcs/ilcs.asp"),
    (
        "pennsylvania",
        "https://www.legis.state.pa.us/cfdocs/legis/LI/consCheck.cfm?txtType=HTM&ttl=00",
    ),
    ("ohio", "https://codes.ohio.gov/ohio-revised-code"),
    (
        "michigan",
        "https://www.legislature.mi.gov/documents/publications/manual.pdf",
    ),
    ("georgia", "https://law.justia.com/codes/georgia/"),
    (
        "north carolina",
        "https://www.ncleg.gov/Laws/GeneralStatuteSections",
    ),
];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn encode(text: &str) -> String {
    form_urlencoded::byte_serialize(text.trim().as_bytes()).collect()
}

fn first_section(lower: &str) -> Option<&str> {
    SECTION_RE
        .captures(lower)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

fn chapter_section(lower: &str) -> Option<(&str, &str)> {
    let caps = CHAPTER_SECTION_RE.captures(lower)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// Generic legal search URL for a citation.
pub fn search_url(citation: &str) -> String {
    format!("{}{}", CORNELL_SEARCH, encode(citation))
}

/// Resolve a statute or regulation citation to an official or reference URL.
///
/// Never fails: citations that match nothing resolve to [`search_url`].
pub fn law_url(citation: &str) -> String {
    let lower = citation.to_lowercase();

    if let Some(caps) = USC_RE.captures(&lower) {
        return format!(
            "https://www.law.cornell.edu/uscode/text/{}/{}",
            &caps[1], &caps[2]
        );
    }

    if let Some(caps) = CFR_RE.captures(&lower) {
        let title = &caps[1];
        let part = &caps[2];
        return match caps.get(3) {
            Some(section) => format!(
                "https://www.law.cornell.edu/cfr/text/{}/{}.{}",
                title,
                part,
                section.as_str()
            ),
            None => format!("https://www.law.cornell.edu/cfr/text/{}/part-{}", title, part),
        };
    }

    if let Some(url) = state_statute_url(&lower) {
        return url;
    }

    if contains_any(&lower, &FEDERAL) {
        return search_url(citation);
    }

    STATE_INDEXES
        .iter()
        .find(|(state, _)| lower.contains(state))
        .map(|(_, url)| url.to_string())
        .unwrap_or_else(|| search_url(citation))
}

fn state_statute_url(lower: &str) -> Option<String> {
    if contains_any(lower, &CALIFORNIA_PENAL) || contains_any(lower, &CALIFORNIA_CIVIL) {
        let code = if contains_any(lower, &CALIFORNIA_PENAL) {
            "PEN"
        } else {
            "CIV"
        };
        let section = first_section(lower)?;
        return Some(format!(
            "https://leginfo.legislature.ca.gov/faces/codes_displaySection.xhtml?lawCode={}&sectionNum={}",
            code, section
        ));
    }

    if contains_any(lower, &NEW_YORK) {
        let law = if lower.contains("penal") {
            "PEN"
        } else if lower.contains("civil") || lower.contains("cplr") {
            "CVP"
        } else {
            return None;
        };
        let section = first_section(lower)?;
        return Some(format!(
            "https://www.nysenate.gov/legislation/laws/{}/{}",
            law, section
        ));
    }

    if contains_any(lower, &TEXAS) {
        let code = if lower.contains("penal") {
            "PE"
        } else if lower.contains("civil") || lower.contains("civ.") {
            "CP"
        } else {
            return None;
        };
        let (chapter, _) = chapter_section(lower)?;
        return Some(format!(
            "https://statutes.capitol.texas.gov/Docs/{code}/htm/{code}.{chapter}.htm",
            code = code,
            chapter = chapter
        ));
    }

    if contains_any(lower, &FLORIDA) {
        let (chapter, section) = chapter_section(lower)?;
        let chapter_num: u32 = chapter.parse().ok()?;
        let range_start = chapter_num / 100 * 100;
        return Some(format!(
            "http://www.leg.state.fl.us/statutes/index.cfm?App_mode=Display_Statute&URL={:04}-{:04}/{:04}/Sections/{:04}.{}.html",
            range_start,
            range_start + 99,
            chapter_num,
            chapter_num,
            section
        ));
    }

    None
}

/// Resolve a case citation to a scholarly case-law search URL.
pub fn case_url(citation: &str) -> String {
    format!(
        "https://scholar.google.com/scholar?q={}&hl=en&as_sdt=6",
        encode(citation)
    )
}
