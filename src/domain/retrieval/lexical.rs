//! Tokenization and BM25 scoring

use std::collections::HashMap;

use unicode_segmentation::UnicodeSegmentation;

/// Lowercased Unicode words
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words().map(|w| w.to_lowercase()).collect()
}

/// Term frequencies of a tokenized text
pub fn term_frequencies(tokens: &[String]) -> HashMap<String, u32> {
    let mut freqs = HashMap::new();
    for token in tokens {
        *freqs.entry(token.clone()).or_insert(0) += 1;
    }
    freqs
}

#[derive(Debug, Clone, Copy)]
pub struct Bm25Params {
    pub k1: f32,
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

/// Corpus-wide statistics BM25 needs
#[derive(Debug, Clone, Default)]
pub struct LexicalStats {
    doc_count: usize,
    total_len: usize,
    doc_freq: HashMap<String, usize>,
}

impl LexicalStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn doc_count(&self) -> usize {
        self.doc_count
    }

    pub fn vocabulary_size(&self) -> usize {
        self.doc_freq.len()
    }

    pub fn avg_doc_len(&self) -> f32 {
        if self.doc_count == 0 {
            return 0.0;
        }
        self.total_len as f32 / self.doc_count as f32
    }

    pub fn doc_freq(&self, term: &str) -> usize {
        self.doc_freq.get(term).copied().unwrap_or(0)
    }

    pub fn add(&mut self, term_freqs: &HashMap<String, u32>, doc_len: usize) {
        self.doc_count += 1;
        self.total_len += doc_len;
        for term in term_freqs.keys() {
            *self.doc_freq.entry(term.clone()).or_insert(0) += 1;
        }
    }

    pub fn remove(&mut self, term_freqs: &HashMap<String, u32>, doc_len: usize) {
        self.doc_count = self.doc_count.saturating_sub(1);
        self.total_len = self.total_len.saturating_sub(doc_len);
        for term in term_freqs.keys() {
            if let Some(df) = self.doc_freq.get_mut(term) {
                *df -= 1;
                if *df == 0 {
                    self.doc_freq.remove(term);
                }
            }
        }
    }

    /// Non-negative IDF, `ln(1 + (N - df + 0.5) / (df + 0.5))`
    pub fn idf(&self, term: &str) -> f32 {
        let n = self.doc_count as f32;
        let df = self.doc_freq(term) as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }
}

/// Raw (unnormalized) BM25 score of one document for a query
pub fn bm25_score(
    query_terms: &[String],
    doc_term_freqs: &HashMap<String, u32>,
    doc_len: usize,
    stats: &LexicalStats,
    params: Bm25Params,
) -> f32 {
    let avg_len = stats.avg_doc_len();
    if avg_len == 0.0 {
        return 0.0;
    }

    let length_norm = 1.0 - params.b + params.b * (doc_len as f32 / avg_len);

    query_terms
        .iter()
        .filter_map(|term| doc_term_freqs.get(term).map(|tf| (term, *tf as f32)))
        .map(|(term, tf)| {
            let idf = stats.idf(term);
            idf * (tf * (params.k1 + 1.0)) / (tf + params.k1 * length_norm)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(texts: &[&str]) -> (LexicalStats, Vec<(HashMap<String, u32>, usize)>) {
        let mut stats = LexicalStats::new();
        let docs: Vec<_> = texts
            .iter()
            .map(|t| {
                let tokens = tokenize(t);
                let freqs = term_frequencies(&tokens);
                stats.add(&freqs, tokens.len());
                (freqs, tokens.len())
            })
            .collect();
        (stats, docs)
    }

    #[test]
    fn test_tokenize_lowercases_and_strips_punctuation() {
        assert_eq!(
            tokenize("Is this call a Deepfake?"),
            vec!["is", "this", "call", "a", "deepfake"]
        );
    }

    #[test]
    fn test_matching_document_scores_higher() {
        let (stats, docs) = index(&["alpha", "beta"]);
        let query = tokenize("alpha");

        let a = bm25_score(&query, &docs[0].0, docs[0].1, &stats, Bm25Params::default());
        let b = bm25_score(&query, &docs[1].0, docs[1].1, &stats, Bm25Params::default());

        assert!(a > 0.0);
        assert_eq!(b, 0.0);
    }

    #[test]
    fn test_rare_terms_weigh_more() {
        let (stats, _) = index(&["fraud call", "fraud email", "fraud voice clone"]);
        assert!(stats.idf("clone") > stats.idf("fraud"));
    }

    #[test]
    fn test_remove_restores_stats() {
        let (mut stats, docs) = index(&["alpha beta", "beta gamma"]);
        assert_eq!(stats.vocabulary_size(), 3);

        stats.remove(&docs[0].0, docs[0].1);

        assert_eq!(stats.doc_count(), 1);
        assert_eq!(stats.doc_freq("alpha"), 0);
        assert_eq!(stats.doc_freq("beta"), 1);
        assert_eq!(stats.vocabulary_size(), 2);
        assert_eq!(stats.avg_doc_len(), 2.0);
    }

    #[test]
    fn test_empty_corpus_scores_zero() {
        let stats = LexicalStats::new();
        let freqs = term_frequencies(&tokenize("alpha"));
        assert_eq!(
            bm25_score(&tokenize("alpha"), &freqs, 1, &stats, Bm25Params::default()),
            0.0
        );
    }
}
