/*!
 * Channel Classification
 * ======================
 *
 * Purpose:
 *   Sort admitted `name,url` lines into the three fixed output categories and
 *   give CCTV and satellite channels a canonical display name.
 *
 * Rules (first match wins):
 *   1. CCTV: `CCTV[-\s]?(4K|8K|UHD|HD|\d{1,2}\+?)`, case-insensitive. Numeric
 *      tokens render as `CCTV-{n}`, quality tags as `CCTV{tag}`.
 *   2. Satellite: a 2-4 character CJK region followed by `卫视`, with any
 *      `高清`/`标清`/`+`/`台` suffix dropped.
 *   3. Everything else is passed through as Other.
 *
 * Buckets:
 *   - CCTV sorted by channel number; quality-tag channels sort after all
 *     numbered ones. Not deduplicated.
 *   - Satellite and Other sorted by full line and deduplicated.
 *
 * Quality tags are tried before digits so that `CCTV-4K` is not read as
 * channel 4.
 */

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

use crate::models::{Category, CategoryBucket};

/// Sort key for CCTV tokens with no channel number
const NON_NUMERIC_SORT_KEY: u32 = 999;

fn cctv_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)CCTV[-\s]?([4-8]K|UHD|HD|\d{1,2}\+?)").expect("CCTV pattern is valid")
    })
}

fn satellite_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([\x{4e00}-\x{9fa5}]{2,4}卫视)(?:高清|标清|\+?)?台?")
            .expect("satellite pattern is valid")
    })
}

/// Result of classifying one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub category: Category,
    pub display_name: String,
    pub url: String,
}

impl Classified {
    pub fn render_line(&self) -> String {
        format!("{},{}", self.display_name, self.url)
    }
}

/// One ordered classification rule
pub trait ClassificationRule: Send + Sync {
    fn category(&self) -> Category;

    /// Canonical display name when the rule matches `name`
    fn display_name(&self, name: &str) -> Option<String>;
}

struct CctvRule;

impl ClassificationRule for CctvRule {
    fn category(&self) -> Category {
        Category::Cctv
    }

    fn display_name(&self, name: &str) -> Option<String> {
        let captures = cctv_regex().captures(name)?;
        let token = captures.get(1)?.as_str().to_uppercase();
        if is_numeric_token(&token) {
            Some(format!("CCTV-{token}"))
        } else {
            Some(format!("CCTV{token}"))
        }
    }
}

struct SatelliteRule;

impl ClassificationRule for SatelliteRule {
    fn category(&self) -> Category {
        Category::Satellite
    }

    fn display_name(&self, name: &str) -> Option<String> {
        satellite_regex()
            .captures(name)
            .and_then(|captures| captures.get(1))
            .map(|core| core.as_str().to_string())
    }
}

/// Digits with an optional trailing `+`
fn is_numeric_token(token: &str) -> bool {
    let digits = token.strip_suffix('+').unwrap_or(token);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Channel number of a CCTV display name, or the sentinel for quality tags
fn cctv_sort_key(display_name: &str) -> u32 {
    display_name
        .strip_prefix("CCTV-")
        .map(|token| token.trim_end_matches('+'))
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(NON_NUMERIC_SORT_KEY)
}

pub struct Classifier {
    rules: Vec<Box<dyn ClassificationRule>>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(Self::default_rules())
    }
}

impl Classifier {
    pub fn new(rules: Vec<Box<dyn ClassificationRule>>) -> Self {
        Self { rules }
    }

    pub fn default_rules() -> Vec<Box<dyn ClassificationRule>> {
        vec![Box::new(CctvRule), Box::new(SatelliteRule)]
    }

    /// Classify one `name,url` line; a line without a comma is kept whole as Other
    pub fn classify(&self, line: &str) -> Classified {
        let Some((name, url)) = line.split_once(',') else {
            return Classified {
                category: Category::Other,
                display_name: line.to_string(),
                url: String::new(),
            };
        };

        for rule in &self.rules {
            if let Some(display_name) = rule.display_name(name) {
                return Classified {
                    category: rule.category(),
                    display_name,
                    url: url.to_string(),
                };
            }
        }

        Classified {
            category: Category::Other,
            display_name: name.to_string(),
            url: url.to_string(),
        }
    }

    /// Classify every line and return the CCTV, Satellite and Other buckets in that order
    pub fn bucketize<'a, I>(&self, lines: I) -> [CategoryBucket; 3]
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut cctv: Vec<Classified> = Vec::new();
        let mut satellite: BTreeSet<String> = BTreeSet::new();
        let mut other: BTreeSet<String> = BTreeSet::new();

        for line in lines {
            let classified = self.classify(line);
            match classified.category {
                Category::Cctv => cctv.push(classified),
                Category::Satellite => {
                    satellite.insert(classified.render_line());
                }
                Category::Other => {
                    // registry line kept verbatim
                    other.insert(line.to_string());
                }
            }
        }

        cctv.sort_by(|a, b| {
            cctv_sort_key(&a.display_name)
                .cmp(&cctv_sort_key(&b.display_name))
                .then_with(|| a.display_name.cmp(&b.display_name))
                .then_with(|| a.url.cmp(&b.url))
        });

        [
            CategoryBucket {
                category: Category::Cctv,
                lines: cctv.iter().map(Classified::render_line).collect(),
            },
            CategoryBucket {
                category: Category::Satellite,
                lines: satellite.into_iter().collect(),
            },
            CategoryBucket {
                category: Category::Other,
                lines: other.into_iter().collect(),
            },
        ]
    }
}
