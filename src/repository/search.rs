//! Free-text module search

use regex::Regex;

use crate::feed::{ModuleMap, ModuleRecord};

/// Split text into lowercase ASCII-alphanumeric words.
///
/// Punctuation inside a word is dropped ("Photo-Blog!" becomes
/// "photoblog"); words left empty are skipped.
pub fn patternize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect()
}

/// Rank `modules` against `query`.
///
/// Each module scores the number of query-word matches found in its id,
/// name and description. Modules with a positive score are returned with
/// `accuracy` set, best first; ties keep their order in `modules`. A query
/// without any alphanumeric word matches nothing.
pub fn search(modules: &ModuleMap, query: &str) -> ModuleMap {
    let patterns = patternize(query);
    if patterns.is_empty() {
        return ModuleMap::new();
    }

    let alternation = patterns
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");
    let Ok(matcher) = Regex::new(&format!("({alternation})")) else {
        return ModuleMap::new();
    };

    let mut results: Vec<(u32, &String, &ModuleRecord)> = modules
        .iter()
        .filter_map(|(id, module)| {
            let score = score(&matcher, module);
            (score > 0).then_some((score, id, module))
        })
        .collect();

    // Stable: equal scores keep the snapshot order
    results.sort_by(|(a, _, _), (b, _, _)| b.cmp(a));

    results
        .into_iter()
        .map(|(score, id, module)| {
            let mut module = module.clone();
            module.accuracy = Some(score);
            (id.clone(), module)
        })
        .collect()
}

fn score(matcher: &Regex, module: &ModuleRecord) -> u32 {
    [&module.id, &module.name, &module.description]
        .into_iter()
        .map(|field| {
            let subjects = patternize(field);
            if subjects.is_empty() {
                return 0;
            }
            matcher.find_iter(&subjects.join(" ")).count() as u32
        })
        .sum()
}
