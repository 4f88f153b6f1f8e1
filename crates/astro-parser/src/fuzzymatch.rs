//! Nearest-name suggestion for misspelled meta tags.
//!
//! A compact port of the FuzzySet scheme: candidates are indexed by 2- and
//! 3-gram counts, query matches are scored by cosine similarity, and the
//! survivors are re-ranked by Levenshtein edit distance. Only matches
//! scoring above 0.7 are suggested.

use rustc_hash::FxHashMap;

const GRAM_SIZE_LOWER: usize = 2;
const GRAM_SIZE_UPPER: usize = 3;
const MATCH_THRESHOLD: f64 = 0.7;

/// Returns the candidate most similar to `name`, if any scores above the
/// suggestion threshold.
pub fn fuzzymatch<'a>(name: &str, names: &[&'a str]) -> Option<&'a str> {
    let query = name.to_lowercase();
    if let Some(&exact) = names.iter().find(|n| n.to_lowercase() == query) {
        return Some(exact);
    }
    // high gram size first, falling back to lower sizes when nothing hits
    for gram_size in (GRAM_SIZE_LOWER..=GRAM_SIZE_UPPER).rev() {
        if let Some(best) = best_match(&query, names, gram_size) {
            return Some(best);
        }
    }
    None
}

fn best_match<'a>(query: &str, names: &[&'a str], gram_size: usize) -> Option<&'a str> {
    let query_grams = gram_counter(query, gram_size);
    let query_norm = vector_norm(&query_grams);

    let mut best: Option<(f64, &str)> = None;
    for &candidate in names {
        let normalized = candidate.to_lowercase();
        let grams = gram_counter(&normalized, gram_size);
        let dot: f64 = query_grams
            .iter()
            .filter_map(|(gram, &count)| grams.get(gram).map(|&c| (count * c) as f64))
            .sum();
        if dot == 0.0 {
            continue;
        }
        let cosine = dot / (query_norm * vector_norm(&grams));
        if cosine <= 0.0 {
            continue;
        }
        // cosine found a plausible candidate; rank it by edit distance
        let score = distance(&normalized, query);
        if best.map_or(true, |(s, _)| score > s) {
            best = Some((score, candidate));
        }
    }
    best.and_then(|(score, name)| (score > MATCH_THRESHOLD).then_some(name))
}

/// Formats a name list for diagnostics: `a`, `a or b`, `a, b or c`.
pub fn list_names(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [only] => (*only).to_string(),
        [init @ .., last] => format!("{} or {}", init.join(", "), last),
    }
}

/// Edit-distance similarity in `[0, 1]`.
fn distance(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut current: Vec<usize> = (0..=a.len()).collect();
    for (i, &bc) in b.iter().enumerate() {
        let mut prev = current[0];
        current[0] = i + 1;
        for (j, &ac) in a.iter().enumerate() {
            let value = if ac == bc {
                prev
            } else {
                prev.min(current[j]).min(current[j + 1]) + 1
            };
            prev = current[j + 1];
            current[j + 1] = value;
        }
    }
    current[a.len()]
}

/// Counts the `gram_size`-grams of `value`, padded with `-` sentinels and
/// stripped of non-word characters.
fn gram_counter(value: &str, gram_size: usize) -> FxHashMap<String, u32> {
    let simplified: String = value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == ',' || *c == ' ')
        .collect();
    let padded: Vec<char> = std::iter::once('-')
        .chain(simplified.chars())
        .chain(std::iter::once('-'))
        .collect();
    let mut counts = FxHashMap::default();
    if padded.len() < gram_size {
        return counts;
    }
    for window in padded.windows(gram_size) {
        *counts.entry(window.iter().collect::<String>()).or_insert(0) += 1;
    }
    counts
}

fn vector_norm(grams: &FxHashMap<String, u32>) -> f64 {
    (grams.values().map(|&c| (c * c) as f64).sum::<f64>()).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_misspelling_matches() {
        assert_eq!(fuzzymatch("astro:haed", &["astro:head"]), Some("astro:head"));
    }

    #[test]
    fn test_exact_match_ignores_case() {
        assert_eq!(fuzzymatch("ASTRO:HEAD", &["astro:head"]), Some("astro:head"));
    }

    #[test]
    fn test_distant_name_is_rejected() {
        assert_eq!(fuzzymatch("onmousewheel", &["astro:head"]), None);
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }
}
