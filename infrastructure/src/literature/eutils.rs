//! NCBI E-utilities request terms and response parsing.
//!
//! Kept free of HTTP so the parsing is testable without the `pubmed` feature.

use chrono::Datelike;
use interconsult_application::Citation;
use serde_json::Value;

/// Publication types preferred for clinical evidence
const EVIDENCE_FILTER: &str = "(Clinical Trial[PT] OR Meta-Analysis[PT] OR Systematic Review[PT] OR Review[PT] OR Practice Guideline[PT])";

const LANGUAGE_FILTER: &str = "(English[LA] OR Spanish[LA])";

/// Full esearch term: the query restricted to evidence-bearing publication types
pub fn search_term(query: &str) -> String {
    format!("({}) AND {} AND {}", query.trim(), EVIDENCE_FILTER, LANGUAGE_FILTER)
}

/// Publication-date window as `(mindate, maxdate)` years
pub fn date_window(years_back: u32) -> (String, String) {
    let current = chrono::Utc::now().year();
    (
        (current - years_back as i32).to_string(),
        current.to_string(),
    )
}

/// PMIDs from an esearch JSON response
pub fn parse_esearch(body: &Value) -> Vec<String> {
    body["esearchresult"]["idlist"]
        .as_array()
        .map(|ids| {
            ids.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Leading four-digit year of an E-utilities date ("2021 Mar 4")
fn parse_year(date: &str) -> Option<i32> {
    date.get(..4).and_then(|y| y.parse().ok())
}

/// Citations from an esummary JSON response, in `uids` order
pub fn parse_esummary(body: &Value) -> Vec<Citation> {
    let result = &body["result"];
    let Some(uids) = result["uids"].as_array() else {
        return Vec::new();
    };
    uids.iter()
        .filter_map(Value::as_str)
        .filter_map(|pmid| {
            let doc = &result[pmid];
            let title = doc["title"].as_str()?.trim().trim_end_matches('.').to_string();
            let authors = doc["authors"]
                .as_array()
                .map(|list| {
                    list.iter()
                        .filter_map(|a| a["name"].as_str())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            let journal = doc["fulljournalname"]
                .as_str()
                .or_else(|| doc["source"].as_str())
                .unwrap_or_default()
                .to_string();
            Some(Citation {
                pmid: pmid.to_string(),
                title,
                authors,
                journal,
                year: doc["pubdate"].as_str().and_then(parse_year),
                url: format!("https://pubmed.ncbi.nlm.nih.gov/{}/", pmid),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_term_filters() {
        let term = search_term(" heart failure beta blockers ");
        assert!(term.starts_with("(heart failure beta blockers) AND"));
        assert!(term.contains("Meta-Analysis[PT]"));
    }

    #[test]
    fn test_date_window() {
        let (min, max) = date_window(5);
        let max: i32 = max.parse().unwrap();
        assert_eq!(max - min.parse::<i32>().unwrap(), 5);
    }

    #[test]
    fn test_parse_esearch() {
        let body = json!({"esearchresult": {"count": "2", "idlist": ["32860505", "34447992"]}});
        assert_eq!(parse_esearch(&body), vec!["32860505", "34447992"]);
        assert!(parse_esearch(&json!({"esearchresult": {"idlist": []}})).is_empty());
        assert!(parse_esearch(&json!({})).is_empty());
    }

    #[test]
    fn test_parse_esummary() {
        let body = json!({
            "result": {
                "uids": ["32860505", "999"],
                "32860505": {
                    "title": "2020 ESC Guidelines for the diagnosis and management of atrial fibrillation.",
                    "authors": [{"name": "Hindricks G"}, {"name": "Potpara T"}],
                    "fulljournalname": "European heart journal",
                    "pubdate": "2021 Feb 1"
                },
                "999": {"error": "cannot get document summary"}
            }
        });

        let citations = parse_esummary(&body);
        assert_eq!(citations.len(), 1);
        let c = &citations[0];
        assert_eq!(c.year, Some(2021));
        assert_eq!(c.authors.len(), 2);
        assert_eq!(c.url, "https://pubmed.ncbi.nlm.nih.gov/32860505/");
        assert_eq!(
            c.reference(),
            "Hindricks G et al. 2020 ESC Guidelines for the diagnosis and management of atrial fibrillation. European heart journal 2021. PMID: 32860505"
        );
    }
}
