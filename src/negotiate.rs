//! Media type negotiation.
//!
//! Exactly one branch applies:
//!   1. no override and no `Accept` → the table's default type
//!   2. `_mediatype` override → must be in the table verbatim (wins over `Accept`)
//!   3. `Accept` only → best match between the header and the table
//!
//! Best match follows the usual HTTP rules: each supported type takes the
//! quality of the most specific range that matches it (`type/subtype` beats
//! `type/*` beats `*/*`), `q=0` means "not acceptable", and ties go to the more
//! specific range, then header order, then table order.

use mime::Mime;
use thiserror::Error;

use crate::media_type::{MediaTypeEntry, MediaTypeTable};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("Unsupported media type")]
    UnsupportedMediaType,
}

/// Resolve the effective media type for a request. Empty strings count as
/// absent.
pub fn negotiate<'t>(
    table: &'t MediaTypeTable,
    explicit: Option<&str>,
    accept: Option<&str>,
) -> Result<&'t MediaTypeEntry, NegotiationError> {
    let explicit = explicit.filter(|s| !s.is_empty());
    let accept = accept.filter(|s| !s.trim().is_empty());

    match (explicit, accept) {
        (None, None) => Ok(table.default_entry()),
        (Some(name), _) => table
            .get(name)
            .ok_or(NegotiationError::UnsupportedMediaType),
        (None, Some(header)) => {
            best_match(table, header).ok_or(NegotiationError::UnsupportedMediaType)
        }
    }
}

/// One range from an `Accept` header.
#[derive(Debug)]
struct AcceptRange {
    mime: Mime,
    quality: f32,
    position: usize,
}

impl AcceptRange {
    /// 2 for `type/subtype`, 1 for `type/*`, 0 for `*/*`; `None` if no match.
    fn specificity(&self, candidate: &Mime) -> Option<u8> {
        let type_ = self.mime.type_();
        let subtype = self.mime.subtype();
        if type_ == mime::STAR && subtype == mime::STAR {
            Some(0)
        } else if type_ == candidate.type_() && subtype == mime::STAR {
            Some(1)
        } else if type_ == candidate.type_() && range_subtype(&self.mime) == range_subtype(candidate)
        {
            Some(2)
        } else {
            None
        }
    }
}

/// Subtype including any `+suffix`, e.g. `schema+json`.
fn range_subtype(mime: &Mime) -> String {
    match mime.suffix() {
        Some(suffix) => format!("{}+{}", mime.subtype(), suffix),
        None => mime.subtype().to_string(),
    }
}

fn parse_accept(header: &str) -> Vec<AcceptRange> {
    header
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .enumerate()
        .filter_map(|(position, part)| {
            let mime: Mime = part.parse().ok()?;
            let quality = mime
                .get_param("q")
                .map(|q| q.as_str().parse::<f32>().unwrap_or(0.0))
                .unwrap_or(1.0)
                .clamp(0.0, 1.0);
            Some(AcceptRange {
                mime,
                quality,
                position,
            })
        })
        .collect()
}

fn best_match<'t>(table: &'t MediaTypeTable, header: &str) -> Option<&'t MediaTypeEntry> {
    let ranges = parse_accept(header);

    let mut best: Option<(&MediaTypeEntry, f32, u8, usize)> = None;
    for entry in table.entries() {
        let Ok(candidate) = entry.name.parse::<Mime>() else {
            continue;
        };

        // The most specific matching range decides this candidate's quality.
        let Some((range, specificity)) = ranges
            .iter()
            .filter_map(|r| r.specificity(&candidate).map(|s| (r, s)))
            .max_by(|(a, sa), (b, sb)| sa.cmp(sb).then(b.position.cmp(&a.position)))
        else {
            continue;
        };
        if range.quality <= 0.0 {
            continue;
        }

        let better = match best {
            None => true,
            Some((_, q, s, pos)) => {
                range.quality > q
                    || (range.quality == q && specificity > s)
                    || (range.quality == q && specificity == s && range.position < pos)
            }
        };
        if better {
            best = Some((entry, range.quality, specificity, range.position));
        }
    }

    best.map(|(entry, ..)| entry)
}
