//! Pick the element most likely to be the site's logo.
//!
//! Every candidate gets nine independent sub-scores in `[0, 1]`, combined as
//! a weighted sum. The highest total wins; ties go to the element discovered
//! first. There is no pixel analysis: all signals come from attributes,
//! geometry and document position.

use crate::error::Result;
use crate::renderer::RenderContext;
use crate::types::{ExtractedLogo, VisualElement, Viewport};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;

/// Elements at or below this many pixels in any dimension are ignored.
pub const MIN_CANDIDATE_SIZE: f64 = 4.0;

/// Fallback when the renderer reports a nonsensical root font size.
const DEFAULT_ROOT_FONT_SIZE: f64 = 16.0;

/// Second-level labels that sit under a two-letter country code TLD.
const COUNTRY_SECOND_LEVELS: &[&str] = &["co", "com", "org", "net", "ac", "gov", "edu", "ne", "or"];

/// Weight of each sub-score in the total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoWeights {
    pub above_the_fold: f64,
    pub dom_tree_location: f64,
    pub id: f64,
    pub alt_text: f64,
    pub class: f64,
    pub filename: f64,
    pub size: f64,
    pub screen_position: f64,
    pub aspect_ratio: f64,
}

impl Default for LogoWeights {
    fn default() -> Self {
        Self {
            above_the_fold: 24.0,
            dom_tree_location: 14.0,
            id: 10.0,
            alt_text: 10.0,
            class: 10.0,
            filename: 10.0,
            size: 6.0,
            screen_position: 3.0,
            aspect_ratio: 4.0,
        }
    }
}

/// Breakpoints for the above-the-fold signal, as fractions of viewport height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoldPolicy {
    /// Elements whose top is above this line get at least 0.5.
    pub upper_fraction: f64,
    /// Fully visible, but below `upper_fraction`.
    pub lower_visible_score: f64,
    /// Top edge must be above this line for `past_fold_score`.
    pub past_fold_fraction: f64,
    pub past_fold_score: f64,
}

impl Default for FoldPolicy {
    fn default() -> Self {
        Self {
            upper_fraction: 0.5,
            lower_visible_score: 0.4,
            past_fold_fraction: 1.05,
            past_fold_score: 0.1,
        }
    }
}

/// Rendered-height breakpoints for the size signal, in root font sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizePolicy {
    pub min_multiple: f64,
    pub full_multiple: f64,
}

impl Default for SizePolicy {
    fn default() -> Self {
        Self {
            min_multiple: 2.5,
            full_multiple: 7.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoScoringConfig {
    pub weights: LogoWeights,
    pub fold: FoldPolicy,
    pub size: SizePolicy,
}

/// Page-level facts the sub-scores are measured against.
#[derive(Debug, Clone, PartialEq)]
pub struct PageMetrics {
    pub viewport: Viewport,
    pub root_font_size: f64,
    /// Host of the current page, e.g. `www.example.com`.
    pub host: String,
}

/// Per-signal scores for one candidate, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LogoScore {
    pub above_the_fold: f64,
    pub dom_tree_location: f64,
    pub id: f64,
    pub alt_text: f64,
    pub class: f64,
    pub filename: f64,
    pub size: f64,
    pub screen_position: f64,
    pub aspect_ratio: f64,
}

impl LogoScore {
    pub fn total(&self, w: &LogoWeights) -> f64 {
        self.above_the_fold * w.above_the_fold
            + self.dom_tree_location * w.dom_tree_location
            + self.id * w.id
            + self.alt_text * w.alt_text
            + self.class * w.class
            + self.filename * w.filename
            + self.size * w.size
            + self.screen_position * w.screen_position
            + self.aspect_ratio * w.aspect_ratio
    }
}

/// A candidate with its score.
#[derive(Debug, Clone)]
pub struct ScoredCandidate<'a> {
    pub element: &'a VisualElement,
    pub breakdown: LogoScore,
    pub score: f64,
}

/// Weighted multi-signal logo ranking.
#[derive(Debug, Clone, Default)]
pub struct LogoScorer {
    config: LogoScoringConfig,
}

impl LogoScorer {
    pub fn new(config: LogoScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LogoScoringConfig {
        &self.config
    }

    /// Query the settled page and pick its logo.
    pub async fn extract(&self, context: &dyn RenderContext) -> Result<Option<ExtractedLogo>> {
        let elements = context.query_visual_elements().await?;
        let viewport = context.viewport_size().await?;
        let root_font_size = context.root_font_size().await?;
        let host = context
            .current_url()
            .await?
            .as_deref()
            .and_then(|u| url::Url::parse(u).ok())
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
            .unwrap_or_default();

        let metrics = PageMetrics {
            viewport,
            root_font_size,
            host,
        };
        Ok(self.pick(&elements, &metrics))
    }

    /// Best candidate in output shape, or `None` if nothing qualifies.
    pub fn pick(&self, elements: &[VisualElement], page: &PageMetrics) -> Option<ExtractedLogo> {
        let ranked = self.rank(elements, page);
        for candidate in ranked.iter().take(3) {
            let el = candidate.element.element();
            debug!(
                tag = %el.tag,
                id = el.id.as_deref().unwrap_or(""),
                score = candidate.score,
                breakdown = ?candidate.breakdown,
                "logo candidate"
            );
        }

        let winner = ranked.first()?.element;
        if let Some(raw_svg) = winner.raw_svg() {
            return Some(ExtractedLogo::InlinedSvg {
                raw_svg: raw_svg.to_string(),
            });
        }
        winner.src().map(|src| ExtractedLogo::HostedImage {
            src: src.to_string(),
        })
    }

    /// Eligible candidates, highest score first, discovery order on ties.
    pub fn rank<'a>(
        &self,
        elements: &'a [VisualElement],
        page: &PageMetrics,
    ) -> Vec<ScoredCandidate<'a>> {
        let mut scored: Vec<ScoredCandidate<'a>> = collect_candidates(elements)
            .map(|element| {
                let breakdown = self.score(element, page);
                ScoredCandidate {
                    element,
                    breakdown,
                    score: breakdown.total(&self.config.weights),
                }
            })
            .collect();

        // sort_by is stable, which keeps first-seen order among equal scores
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored
    }

    pub fn score(&self, element: &VisualElement, page: &PageMetrics) -> LogoScore {
        let el = element.element();
        LogoScore {
            above_the_fold: above_the_fold_score(
                el.y,
                el.height,
                page.viewport.height,
                &self.config.fold,
            ),
            dom_tree_location: if el.in_navigation { 1.0 } else { 0.0 },
            id: keyword_score(el.id.as_deref()),
            alt_text: alt_text_score(el.alt.as_deref(), &page.host),
            class: keyword_score(el.class_name.as_deref()),
            filename: filename_score(element.src()),
            size: size_score(el.height, page.root_font_size, &self.config.size),
            screen_position: screen_position_score(el.x, el.y, &page.viewport),
            aspect_ratio: aspect_ratio_score(el.width, el.height),
        }
    }
}

/// Candidates outside interactive controls that pass the size filter.
pub fn collect_candidates(elements: &[VisualElement]) -> impl Iterator<Item = &VisualElement> {
    elements
        .iter()
        .filter(|e| !e.element().in_interactive_control)
        .filter(|e| passes_size_filter(e))
}

/// Drops tracking pixels and collapsed elements.
pub fn passes_size_filter(element: &VisualElement) -> bool {
    let el = element.element();
    let (natural_width, natural_height) = element.natural_size();
    natural_width > MIN_CANDIDATE_SIZE
        && natural_height > MIN_CANDIDATE_SIZE
        && el.width > MIN_CANDIDATE_SIZE
        && el.height > MIN_CANDIDATE_SIZE
}

pub fn above_the_fold_score(y: f64, height: f64, viewport_height: f64, policy: &FoldPolicy) -> f64 {
    if viewport_height <= 0.0 || y + height <= 0.0 {
        return 0.0;
    }
    let top = y.max(0.0);
    let bottom = y + height;
    let upper = viewport_height * policy.upper_fraction;

    if bottom <= upper {
        return 1.0;
    }
    if top <= upper && upper > 0.0 {
        return 0.5 + 0.5 * (1.0 - top / upper);
    }
    if bottom <= viewport_height {
        return policy.lower_visible_score;
    }
    if top <= viewport_height * policy.past_fold_fraction {
        return policy.past_fold_score;
    }
    0.0
}

/// `0.5 + 0.5 * len(keyword) / len(value)` for "logo", else "brand".
pub fn keyword_score(value: Option<&str>) -> f64 {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return 0.0;
    };
    ["logo", "brand"]
        .iter()
        .find(|kw| value.contains(*kw))
        .map(|kw| 0.5 + 0.5 * ratio(kw.len(), value.chars().count()))
        .unwrap_or(0.0)
}

pub fn alt_text_score(alt: Option<&str>, host: &str) -> f64 {
    let Some(alt) = alt.map(str::trim).filter(|a| !a.is_empty()) else {
        return 0.0;
    };
    let host = host.to_ascii_lowercase();

    let label = registrable_label(&host);
    if !label.is_empty() && alt.eq_ignore_ascii_case(label) {
        return 1.0;
    }

    if let Some(kw) = ["logo", "brand"].iter().find(|kw| alt.contains(*kw)) {
        return 0.3 * ratio(kw.len(), alt.chars().count());
    }

    if host.is_empty() {
        return 0.0;
    }
    let lowered = alt.to_lowercase();
    let token_matches = lowered
        .split_whitespace()
        .any(|token| host.contains(token) || token.contains(host.as_str()));
    if token_matches {
        0.3
    } else {
        0.0
    }
}

/// The label a brand is usually named after: `example` for
/// `www.example.com` and for `shop.example.co.uk`.
pub fn registrable_label(host: &str) -> &str {
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    match labels.as_slice() {
        [] => "",
        [only] => *only,
        [.., third, second, tld] if tld.len() == 2 && COUNTRY_SECOND_LEVELS.contains(second) => {
            *third
        }
        [.., second, _tld] => *second,
    }
}

fn filename_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"/?([^/.]+)(\.[a-zA-Z0-9]+)$").expect("filename regex is valid")
    })
}

/// Credit for a resource with a recognizable file name; shorter names that
/// leave room for "logo" score higher.
pub fn filename_score(src: Option<&str>) -> f64 {
    let Some(src) = src.filter(|s| !s.starts_with("data:")) else {
        return 0.0;
    };
    let path = url::Url::parse(src)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| src.to_string());

    filename_pattern()
        .captures(&path)
        .and_then(|caps| caps.get(1))
        .map(|basename| {
            let score = 0.5 + 0.5 * ratio("logo".len(), basename.as_str().chars().count());
            score.min(1.0)
        })
        .unwrap_or(0.0)
}

pub fn size_score(height: f64, root_font_size: f64, policy: &SizePolicy) -> f64 {
    let font = if root_font_size.is_finite() && root_font_size > 0.0 {
        root_font_size
    } else {
        DEFAULT_ROOT_FONT_SIZE
    };
    let min = policy.min_multiple * font;
    let full = policy.full_multiple * font;

    if height >= full {
        1.0
    } else if height < min || full <= min {
        0.0
    } else {
        (height - min) / (full - min)
    }
}

pub fn screen_position_score(x: f64, y: f64, viewport: &Viewport) -> f64 {
    let axis = |coord: f64, extent: f64| {
        if extent > 0.0 && (0.0..=extent).contains(&coord) {
            (extent - coord) / extent
        } else {
            0.0
        }
    };
    (axis(x, viewport.width) + axis(y, viewport.height)) / 2.0
}

pub fn aspect_ratio_score(width: f64, height: f64) -> f64 {
    if height <= 0.0 {
        return 0.0;
    }
    let ratio = width / height;
    if ratio > 2.0 {
        1.0
    } else if ratio > 1.2 {
        0.85
    } else if ratio > 1.0 {
        0.4
    } else if ratio > 0.8 {
        0.2
    } else {
        0.0
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
