//! Name canonicalization for FIO matching.
//!
//! Turns a raw personal name into a set of comparable variants:
//! - Unicode NFKC fold and lowercase conversion
//! - Latin look-alikes of Cyrillic capitals mapped to Cyrillic
//! - Kazakh-specific letters folded to base Cyrillic
//! - Punctuation and digit stripping, whitespace collapsing
//! - Full, initials and compact encodings of the parsed components

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    /// Glyphs folded onto one Cyrillic letter for comparison
    static ref GLYPH_FOLDS: HashMap<char, char> = {
        let mut m = HashMap::new();
        // Latin letters whose capitals OCR confuses with Cyrillic ones
        m.insert('a', 'а');
        m.insert('b', 'в');
        m.insert('c', 'с');
        m.insert('e', 'е');
        m.insert('h', 'н');
        m.insert('i', 'и');
        m.insert('k', 'к');
        m.insert('m', 'м');
        m.insert('o', 'о');
        m.insert('p', 'р');
        m.insert('t', 'т');
        m.insert('x', 'х');
        m.insert('y', 'у');
        // Kazakh letters
        m.insert('ә', 'а');
        m.insert('ғ', 'г');
        m.insert('қ', 'к');
        m.insert('ң', 'н');
        m.insert('ө', 'о');
        m.insert('ұ', 'у');
        m.insert('ү', 'у');
        m.insert('һ', 'х');
        m.insert('і', 'и');
        m.insert('ё', 'е');
        m
    };
}

/// Characters that glue the surrounding letters together instead of
/// splitting the token (hyphenated surnames, apostrophes).
const JOINERS: &[char] = &['-', '‐', '‑', '–', '\'', '’', '`', 'ʼ'];

/// Which transformation produced a variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariantKind {
    /// "family given patronymic"
    Full,
    /// "family g p"
    Initials,
    /// "familygp", initials glued to the family name
    CompactInitials,
    /// The whole name with every space removed
    Compact,
}

impl VariantKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariantKind::Full => "full",
            VariantKind::Initials => "initials",
            VariantKind::CompactInitials => "compact-initials",
            VariantKind::Compact => "compact",
        }
    }
}

impl std::fmt::Display for VariantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NameVariant {
    pub kind: VariantKind,
    pub value: String,
}

/// How much a name is trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRole {
    /// Typed by the applicant. Always yields full, initials and compact-initials.
    Applicant,
    /// Read off a scan. Yields initials only when at least one given-name
    /// or patronymic token is already truncated, plus a compact form for
    /// merged glyphs.
    Document,
}

/// Canonical variants of one name, with the raw input kept for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSet {
    original: String,
    variants: BTreeSet<NameVariant>,
}

impl VariantSet {
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn variants(&self) -> &BTreeSet<NameVariant> {
        &self.variants
    }

    pub fn get(&self, kind: VariantKind) -> Option<&str> {
        self.variants
            .iter()
            .find(|v| v.kind == kind)
            .map(|v| v.value.as_str())
    }

    pub fn full(&self) -> Option<&str> {
        self.get(VariantKind::Full)
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }
}

/// Passes allowed for `normalize_text` to settle. Dropping joiners can bring
/// two letters together that NFKC then composes, so one pass is not always
/// a fixed point.
const MAX_NORMALIZE_PASSES: usize = 8;

/// Normalize raw text into lowercase base-Cyrillic tokens separated by
/// single spaces. Applying it to its own output changes nothing.
pub fn normalize_text(raw: &str) -> String {
    let mut current = normalize_pass(raw);
    for _ in 1..MAX_NORMALIZE_PASSES {
        let next = normalize_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn normalize_pass(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());

    for c in raw.nfkc() {
        if JOINERS.contains(&c) || c.is_numeric() {
            continue;
        }
        if c.is_alphabetic() {
            // 'İ' lowercases to 'i' plus a combining dot; keep letters only
            for lower in c.to_lowercase().filter(|l| l.is_alphabetic()) {
                out.push(*GLYPH_FOLDS.get(&lower).unwrap_or(&lower));
            }
        } else {
            out.push(' ');
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonicalize a name in the applicant role.
pub fn canonicalize(raw: &str) -> VariantSet {
    canonicalize_as(raw, NameRole::Applicant)
}

/// Canonicalize a name for the given role. Input without letters yields an
/// empty set.
pub fn canonicalize_as(raw: &str, role: NameRole) -> VariantSet {
    let normalized = normalize_text(raw);
    let mut tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();

    if role == NameRole::Document && has_leading_initials(&tokens) {
        // "и и иванов" → "иванов и и"
        tokens.rotate_right(1);
    }

    let mut variants = BTreeSet::new();
    if !tokens.is_empty() {
        let full = tokens.join(" ");
        match role {
            NameRole::Applicant => {
                if tokens.len() >= 2 {
                    let initials = initials_of(&tokens);
                    variants.insert(NameVariant {
                        kind: VariantKind::Initials,
                        value: format!("{} {}", tokens[0], initials.join(" ")),
                    });
                    variants.insert(NameVariant {
                        kind: VariantKind::CompactInitials,
                        value: format!("{}{}", tokens[0], initials.concat()),
                    });
                }
            }
            NameRole::Document => {
                if tokens.len() >= 2 && tokens[1..].iter().any(|t| t.chars().count() == 1) {
                    variants.insert(NameVariant {
                        kind: VariantKind::Initials,
                        value: format!("{} {}", tokens[0], initials_of(&tokens).join(" ")),
                    });
                }
                variants.insert(NameVariant {
                    kind: VariantKind::Compact,
                    value: tokens.concat(),
                });
            }
        }
        variants.insert(NameVariant {
            kind: VariantKind::Full,
            value: full,
        });
    }

    VariantSet {
        original: raw.to_string(),
        variants,
    }
}

/// First letters of the given name and of the patronymic. Tokens past the
/// third belong to the patronymic (e.g. "кызы", "улы").
fn initials_of(tokens: &[&str]) -> Vec<String> {
    tokens[1..]
        .iter()
        .take(2)
        .filter_map(|t| t.chars().next())
        .map(String::from)
        .collect()
}

fn has_leading_initials(tokens: &[&str]) -> bool {
    match tokens.split_last() {
        Some((last, rest)) => {
            !rest.is_empty()
                && last.chars().count() > 1
                && rest.iter().all(|t| t.chars().count() == 1)
        }
        None => false,
    }
}
