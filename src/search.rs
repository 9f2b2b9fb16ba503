//! Keyword search over the catalog.
//!
//! Scoring is additive hit counting: a filename hit is worth
//! [`TITLE_HIT_SCORE`], an excerpt hit [`CONTENT_HIT_SCORE`]. The score only
//! decides inclusion; hits keep catalog order.
//!
//! Filename matching ignores case while excerpt matching does not.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogEntry;

pub const TITLE_HIT_SCORE: u32 = 10;
pub const CONTENT_HIT_SCORE: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Match file names only.
    TitleOnly,
    /// Match file names and content excerpts.
    #[default]
    FullText,
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" | "title_only" | "title-only" => Ok(SearchMode::TitleOnly),
            "full" | "full_text" | "full-text" => Ok(SearchMode::FullText),
            other => Err(format!("unknown search mode: {other}")),
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::TitleOnly => f.write_str("title-only"),
            SearchMode::FullText => f.write_str("full-text"),
        }
    }
}

/// Static query expansions, keyed by the exact query string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SynonymTable(BTreeMap<String, Vec<String>>);

impl SynonymTable {
    pub fn new(map: BTreeMap<String, Vec<String>>) -> Self {
        Self(map)
    }

    /// Expansions for `query`. Lookup is case-sensitive and not recursive.
    pub fn expansions(&self, query: &str) -> &[String] {
        self.0.get(query).map(Vec::as_slice).unwrap_or(&[])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for SynonymTable {
    fn default() -> Self {
        let mut map = BTreeMap::new();
        map.insert(
            "登革热".to_string(),
            vec!["伊蚊".into(), "白纹伊蚊".into(), "蚊媒传染病".into()],
        );
        map.insert(
            "高血压".to_string(),
            vec!["慢性病".into(), "心血管".into(), "血压".into()],
        );
        Self(map)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub entry: &'a CatalogEntry,
    pub score: u32,
}

#[derive(Debug, Clone)]
pub struct SearchResults<'a> {
    /// The query followed by its expansions.
    pub terms: Vec<String>,
    /// Synonyms that were added to the query, if any.
    pub expansions: Vec<String>,
    pub hits: Vec<SearchHit<'a>>,
}

impl SearchResults<'_> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

pub struct SearchScorer<'a> {
    synonyms: &'a SynonymTable,
}

impl<'a> SearchScorer<'a> {
    pub fn new(synonyms: &'a SynonymTable) -> Self {
        Self { synonyms }
    }

    /// `[query]` plus its synonyms; nothing for an empty query.
    pub fn terms(&self, query: &str) -> Vec<String> {
        if query.is_empty() {
            return Vec::new();
        }
        let mut terms = vec![query.to_string()];
        terms.extend(self.synonyms.expansions(query).iter().cloned());
        terms
    }

    pub fn score(&self, entry: &CatalogEntry, terms: &[String], mode: SearchMode) -> u32 {
        let name_lower = entry.name.to_lowercase();
        let mut score = 0;
        for term in terms {
            if name_lower.contains(&term.to_lowercase()) {
                score += TITLE_HIT_SCORE;
            }
            if mode == SearchMode::FullText && entry.content_excerpt.contains(term.as_str()) {
                score += CONTENT_HIT_SCORE;
            }
        }
        score
    }

    pub fn search<'c>(
        &self,
        entries: &'c [CatalogEntry],
        query: &str,
        mode: SearchMode,
    ) -> SearchResults<'c> {
        let terms = self.terms(query);
        let hits = entries
            .iter()
            .filter_map(|entry| {
                let score = self.score(entry, &terms, mode);
                (score > 0).then_some(SearchHit { entry, score })
            })
            .collect();

        SearchResults {
            expansions: terms.iter().skip(1).cloned().collect(),
            terms,
            hits,
        }
    }
}

/// Wrap every case-insensitive occurrence of `query` in `open`/`close`,
/// keeping the matched text as written.
pub fn highlight(text: &str, query: &str, open: &str, close: &str) -> String {
    if query.is_empty() {
        return text.to_string();
    }
    let Ok(re) = RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
    else {
        return text.to_string();
    };
    re.replace_all(text, |caps: &regex::Captures<'_>| {
        format!("{open}{}{close}", &caps[0])
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DocType;
    use std::path::PathBuf;

    fn entry(name: &str, content: &str) -> CatalogEntry {
        CatalogEntry {
            name: name.to_string(),
            path: PathBuf::from("/data").join(name),
            doc_type: DocType::from_path(std::path::Path::new(name)).unwrap_or(DocType::Pdf),
            department: "通用资源".into(),
            year: "----".into(),
            category_path: String::new(),
            content_excerpt: content.to_string(),
        }
    }

    #[test]
    fn test_empty_query_matches_nothing() {
        let synonyms = SynonymTable::default();
        let scorer = SearchScorer::new(&synonyms);
        let entries = vec![entry("a.pdf", "anything"), entry("b.docx", "")];
        let results = scorer.search(&entries, "", SearchMode::FullText);
        assert!(results.terms.is_empty());
        assert!(results.is_empty());
    }

    #[test]
    fn test_synonym_expansion() {
        let synonyms = SynonymTable::default();
        let scorer = SearchScorer::new(&synonyms);
        assert_eq!(
            scorer.terms("登革热"),
            vec!["登革热", "伊蚊", "白纹伊蚊", "蚊媒传染病"]
        );
        // Only the literal query is looked up.
        assert_eq!(scorer.terms("登革热 "), vec!["登革热 "]);
        assert_eq!(scorer.terms("伊蚊"), vec!["伊蚊"]);
    }

    #[test]
    fn test_scoring_is_additive() {
        let synonyms = SynonymTable::default();
        let scorer = SearchScorer::new(&synonyms);
        let doc = entry("2024年登革热防控方案.pdf", "做好白纹伊蚊监测");
        let terms = scorer.terms("登革热");

        // name: 登革热; content: 伊蚊, 白纹伊蚊
        assert_eq!(scorer.score(&doc, &terms, SearchMode::FullText), 10 + 5 + 5);
        assert_eq!(scorer.score(&doc, &terms, SearchMode::TitleOnly), 10);
    }

    #[test]
    fn test_title_only_ignores_content() {
        let synonyms = SynonymTable::default();
        let scorer = SearchScorer::new(&synonyms);
        let entries = vec![entry("report.pdf", "关于蚊媒传染病的报告")];

        let title = scorer.search(&entries, "蚊媒传染病", SearchMode::TitleOnly);
        assert_eq!(title.len(), 0);

        let full = scorer.search(&entries, "蚊媒传染病", SearchMode::FullText);
        assert_eq!(full.len(), 1);
        assert_eq!(full.hits[0].score, CONTENT_HIT_SCORE);
    }

    #[test]
    fn test_case_asymmetry() {
        let synonyms = SynonymTable::default();
        let scorer = SearchScorer::new(&synonyms);
        let entries = vec![entry("Annual-REPORT.pdf", "Budget summary")];

        assert_eq!(scorer.search(&entries, "report", SearchMode::TitleOnly).len(), 1);
        assert_eq!(scorer.search(&entries, "budget", SearchMode::FullText).len(), 0);
        assert_eq!(scorer.search(&entries, "Budget", SearchMode::FullText).len(), 1);
    }

    #[test]
    fn test_results_keep_catalog_order() {
        let synonyms = SynonymTable::default();
        let scorer = SearchScorer::new(&synonyms);
        let entries = vec![
            entry("plan.pdf", "高血压"),
            entry("other.pdf", "nothing"),
            entry("高血压管理.docx", "高血压 慢性病 血压"),
        ];
        let results = scorer.search(&entries, "高血压", SearchMode::FullText);

        let names: Vec<&str> = results.hits.iter().map(|h| h.entry.name.as_str()).collect();
        assert_eq!(names, vec!["plan.pdf", "高血压管理.docx"]);
        assert!(results.hits[1].score > results.hits[0].score);
        assert_eq!(results.expansions, vec!["慢性病", "心血管", "血压"]);
    }

    #[test]
    fn test_search_mode_parse() {
        assert_eq!("title".parse::<SearchMode>().unwrap(), SearchMode::TitleOnly);
        assert_eq!("full-text".parse::<SearchMode>().unwrap(), SearchMode::FullText);
        assert!("fuzzy".parse::<SearchMode>().is_err());
    }

    #[test]
    fn test_highlight_preserves_case() {
        assert_eq!(
            highlight("Annual Report report", "REPORT", "[", "]"),
            "Annual [Report] [report]"
        );
        assert_eq!(highlight("a+b.pdf", "a+b", "<", ">"), "<a+b>.pdf");
        assert_eq!(highlight("text", "", "<", ">"), "text");
    }
}
