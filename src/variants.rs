//! Password variation generation
//!
//! Expands a base word into candidate passwords via character substitutions
//! (leetspeak-style), casing variants, and complexity enhancement. Generation
//! is pure: given the same word, rules, and RNG seed it produces the same set.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

/// Default cap on the per-word substitution product. Words whose product would
/// exceed this are truncated rather than allowed to blow up memory.
pub const DEFAULT_MAX_PRODUCT: usize = 65_536;

/// Substitution and enhancement rules for variation generation.
#[derive(Debug, Clone)]
pub struct RuleSet {
    /// Per-character replacement options (keyed by lowercase char)
    pub substitutions: HashMap<char, Vec<char>>,
    /// Pool of digits used to repair candidates lacking a digit
    pub digits: Vec<char>,
    /// Pool of symbols used to repair candidates lacking a symbol
    pub symbols: Vec<char>,
    /// Whether complexity enhancement runs at all
    pub enhance: bool,
    /// Cap on the substitution product size per word
    pub max_product: usize,
}

impl RuleSet {
    /// The classic leetspeak table plus digit/symbol pools.
    pub fn defaults() -> Self {
        let mut substitutions = HashMap::new();
        substitutions.insert('a', vec!['@', '4']);
        substitutions.insert('b', vec!['8']);
        substitutions.insert('e', vec!['3']);
        substitutions.insert('g', vec!['9']);
        substitutions.insert('i', vec!['1', '!']);
        substitutions.insert('o', vec!['0']);
        substitutions.insert('s', vec!['$', '5']);
        substitutions.insert('t', vec!['7']);

        Self {
            substitutions,
            digits: "0123456789".chars().collect(),
            symbols: "!@#$%&".chars().collect(),
            enhance: true,
            max_product: DEFAULT_MAX_PRODUCT,
        }
    }

    /// Parse a substitution table like `"a:@4,b:8,e:3"`.
    ///
    /// Each comma-separated entry maps one character to its replacement
    /// characters. Malformed entries are rejected up front so a bad table
    /// never reaches the generation hot path.
    pub fn parse_substitutions(table: &str) -> anyhow::Result<HashMap<char, Vec<char>>> {
        let mut parsed = HashMap::new();

        for entry in table.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }

            let Some((key, replacements)) = entry.split_once(':') else {
                anyhow::bail!(
                    "Invalid substitution entry '{}'. Use format: CHAR:REPLACEMENTS (e.g., a:@4)",
                    entry
                );
            };

            let mut keys = key.chars();
            let (Some(ch), None) = (keys.next(), keys.next()) else {
                anyhow::bail!("Substitution key must be a single character: '{}'", entry);
            };

            if replacements.is_empty() {
                anyhow::bail!("Substitution entry '{}' has no replacements", entry);
            }

            parsed.insert(ch.to_ascii_lowercase(), replacements.chars().collect());
        }

        Ok(parsed)
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Expand a word into its substitution product.
///
/// Each character position independently keeps the original character or takes
/// one of its configured replacements, so the result size is the product of
/// `1 + replacements` over all positions, capped at `rules.max_product`.
pub fn substitution_product(word: &str, rules: &RuleSet) -> Vec<String> {
    if word.is_empty() {
        return Vec::new();
    }

    let options: Vec<Vec<char>> = word
        .chars()
        .map(|c| {
            let mut opts = vec![c];
            if let Some(subs) = rules.substitutions.get(&c.to_ascii_lowercase()) {
                opts.extend(subs.iter().copied());
            }
            opts
        })
        .collect();

    let product_size = options
        .iter()
        .fold(1usize, |acc, o| acc.saturating_mul(o.len()));
    if product_size > rules.max_product {
        log::debug!(
            "Substitution product for '{}' ({} variants) exceeds cap {}, truncating",
            word,
            product_size,
            rules.max_product
        );
    }

    // Odometer iteration over the per-position options
    let mut indices = vec![0usize; options.len()];
    let mut out = Vec::with_capacity(product_size.min(rules.max_product));

    'outer: loop {
        let variant: String = indices
            .iter()
            .zip(&options)
            .map(|(&i, opts)| opts[i])
            .collect();
        out.push(variant);

        if out.len() >= rules.max_product {
            break;
        }

        let mut pos = options.len();
        loop {
            if pos == 0 {
                break 'outer;
            }
            pos -= 1;
            indices[pos] += 1;
            if indices[pos] < options[pos].len() {
                break;
            }
            indices[pos] = 0;
        }
    }

    out
}

/// Repair a candidate that lacks an uppercase letter, digit, or symbol.
///
/// Insert positions are drawn from the injected RNG, never index 0, so the
/// leading character is preserved. A candidate already satisfying all three
/// classes passes through unchanged.
///
/// Uppercase repair is best-effort: it uppercases an existing lowercase
/// letter, so a fully substituted candidate with no letters left (e.g.
/// `$4$$`) keeps its missing class.
pub fn enhance<R: Rng>(candidate: &str, rules: &RuleSet, rng: &mut R) -> String {
    let mut chars: Vec<char> = candidate.chars().collect();
    if chars.is_empty() {
        return String::new();
    }

    if !chars.iter().any(|c| c.is_ascii_uppercase()) {
        let alpha: Vec<usize> = chars
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_ascii_lowercase())
            .map(|(i, _)| i)
            .collect();
        if let Some(&idx) = alpha.as_slice().choose(rng) {
            chars[idx] = chars[idx].to_ascii_uppercase();
        }
    }

    if !chars.iter().any(|c| c.is_ascii_digit()) {
        if let Some(&digit) = rules.digits.as_slice().choose(rng) {
            let pos = rng.gen_range(1..=chars.len());
            chars.insert(pos, digit);
        }
    }

    if !chars.iter().any(|c| rules.symbols.contains(c)) {
        if let Some(&symbol) = rules.symbols.as_slice().choose(rng) {
            let pos = rng.gen_range(1..=chars.len());
            chars.insert(pos, symbol);
        }
    }

    chars.into_iter().collect()
}

/// Generate the full candidate set for one word: substitution product, an
/// all-uppercase variant of each product string, then enhancement (when
/// enabled). Output is deduplicated preserving first-seen order.
///
/// Never fails: a word the rules cannot handle simply contributes fewer
/// candidates.
pub fn generate<R: Rng>(word: &str, rules: &RuleSet, rng: &mut R) -> Vec<String> {
    let mut seen = hashbrown::HashSet::with_hasher(ahash::RandomState::new());
    let mut out = Vec::new();

    for base in substitution_product(word, rules) {
        let upper = base.to_uppercase();
        for variant in [base, upper] {
            let candidate = if rules.enhance {
                enhance(&variant, rules, rng)
            } else {
                variant
            };
            if candidate.is_empty() {
                continue;
            }
            if seen.insert(candidate.clone()) {
                out.push(candidate);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bare_rules(substitutions: HashMap<char, Vec<char>>) -> RuleSet {
        RuleSet {
            substitutions,
            digits: "0123456789".chars().collect(),
            symbols: "!@#$%&".chars().collect(),
            enhance: false,
            max_product: DEFAULT_MAX_PRODUCT,
        }
    }

    #[test]
    fn test_substitution_product_no_rules() {
        let rules = bare_rules(HashMap::new());
        let variants = substitution_product("word", &rules);
        assert_eq!(variants, vec!["word".to_string()]);
    }

    #[test]
    fn test_substitution_product_empty_word() {
        let rules = RuleSet::defaults();
        assert!(substitution_product("", &rules).is_empty());
        let mut rng = StdRng::seed_from_u64(0);
        assert!(generate("", &rules, &mut rng).is_empty());
    }

    #[test]
    fn test_classic_leetspeak_scenario() {
        // "test" with {t: [7], e: [3]}: both 't' positions substitute
        // independently, giving 2*2*1*2 = 8 product strings, doubled by the
        // uppercase variants.
        let mut subs = HashMap::new();
        subs.insert('t', vec!['7']);
        subs.insert('e', vec!['3']);
        let rules = bare_rules(subs);

        let mut rng = StdRng::seed_from_u64(0);
        let candidates = generate("test", &rules, &mut rng);

        for expected in [
            "test", "7est", "t3st", "73st", "TEST", "7EST", "T3ST", "73ST",
        ] {
            assert!(
                candidates.iter().any(|c| c == expected),
                "missing expected candidate '{}'",
                expected
            );
        }
        assert_eq!(candidates.len(), 16);
    }

    #[test]
    fn test_product_size_bound() {
        let rules = RuleSet::defaults();
        let variants = substitution_product("sassafras", &rules);
        // s:2, a:2 replacements -> each such position has 3 options
        let expected: usize = "sassafras"
            .chars()
            .map(|c| 1 + rules.substitutions.get(&c).map_or(0, |s| s.len()))
            .product();
        assert_eq!(variants.len(), expected.min(rules.max_product));
    }

    #[test]
    fn test_product_cap_truncates() {
        let mut rules = RuleSet::defaults();
        rules.max_product = 10;
        let variants = substitution_product("sassafras", &rules);
        assert_eq!(variants.len(), 10);
    }

    #[test]
    fn test_generation_is_deterministic_with_seed() {
        let rules = RuleSet::defaults();

        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        let a = generate("password", &rules, &mut rng_a);
        let b = generate("password", &rules, &mut rng_b);

        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_enhance_repairs_missing_classes() {
        let rules = RuleSet::defaults();
        let mut rng = StdRng::seed_from_u64(7);

        let enhanced = enhance("word", &rules, &mut rng);
        assert!(enhanced.chars().any(|c| c.is_ascii_uppercase()));
        assert!(enhanced.chars().any(|c| c.is_ascii_digit()));
        assert!(enhanced.chars().any(|c| rules.symbols.contains(&c)));
    }

    #[test]
    fn test_enhance_keeps_satisfied_candidate() {
        let rules = RuleSet::defaults();
        let mut rng = StdRng::seed_from_u64(7);

        // Already has uppercase, digit, and symbol
        let enhanced = enhance("Word1!", &rules, &mut rng);
        assert_eq!(enhanced, "Word1!");
    }

    #[test]
    fn test_enhance_letterless_candidate_skips_uppercase_repair() {
        let rules = RuleSet::defaults();
        let mut rng = StdRng::seed_from_u64(7);

        // Nothing to uppercase; digit and symbol classes are already covered
        let enhanced = enhance("$4$$", &rules, &mut rng);
        assert_eq!(enhanced, "$4$$");
    }

    #[test]
    fn test_enhance_preserves_leading_char() {
        let rules = RuleSet::defaults();
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let enhanced = enhance("WORD", &rules, &mut rng);
            assert!(enhanced.starts_with('W'), "got '{}'", enhanced);
        }
    }

    #[test]
    fn test_enhancement_never_multiplies_output() {
        let rules = RuleSet::defaults();
        let mut rng = StdRng::seed_from_u64(1);

        let bound: usize = "test"
            .chars()
            .map(|c| 1 + rules.substitutions.get(&c).map_or(0, |s| s.len()))
            .product::<usize>()
            * 2;
        let candidates = generate("test", &rules, &mut rng);
        assert!(candidates.len() <= bound);
    }

    #[test]
    fn test_parse_substitutions() {
        let table = RuleSet::parse_substitutions("a:@4,e:3").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&'a'), Some(&vec!['@', '4']));
        assert_eq!(table.get(&'e'), Some(&vec!['3']));

        // Whitespace and empty entries are tolerated, keys are lowercased
        let table = RuleSet::parse_substitutions(" T:7 ,, E:3 ").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(&'t'), Some(&vec!['7']));
        assert_eq!(table.get(&'e'), Some(&vec!['3']));
    }

    #[test]
    fn test_parse_substitutions_rejects_malformed() {
        assert!(RuleSet::parse_substitutions("a").is_err());
        assert!(RuleSet::parse_substitutions("a:").is_err());
        assert!(RuleSet::parse_substitutions("ab:@").is_err());
    }

    #[test]
    fn test_no_duplicate_candidates_per_word() {
        let rules = RuleSet::defaults();
        let mut rng = StdRng::seed_from_u64(3);
        let candidates = generate("boss", &rules, &mut rng);

        let unique: hashbrown::HashSet<_> = candidates.iter().collect();
        assert_eq!(unique.len(), candidates.len());
    }
}
