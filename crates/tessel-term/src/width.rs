// SPDX-License-Identifier: MIT
//
// Display width classification.
//
// Every column decision in the crate goes through here: how far the
// screen cursor advances after a write, whether a cell needs a
// continuation placeholder, and how text-laying code truncates or pads.
//
//   0 columns  C0/C1 controls, DEL, combining marks, zero-width
//              joiners/spaces, variation selectors
//   2 columns  East Asian Wide and Fullwidth (CJK, Hangul, fullwidth
//              forms) and emoji with default emoji presentation
//   1 column   everything else
//
// The tables are `unicode-width` (UAX #11). Controls and variation
// selectors are classified before consulting it, so the answer for them
// does not depend on how a given crate version treats control characters.

use std::borrow::Cow;

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

/// VARIATION SELECTOR-16: requests emoji presentation for the preceding
/// character, which makes it two columns wide.
const EMOJI_PRESENTATION: char = '\u{FE0F}';

/// Width of a raw Unicode scalar value.
///
/// Values that are not scalar values (surrogates, > U+10FFFF) are 0.
///
/// ```
/// use tessel_term::width::width;
///
/// assert_eq!(width(u32::from('A')), 1);
/// assert_eq!(width(0x09), 0);
/// assert_eq!(width(0x4E00), 2);
/// assert_eq!(width(0x0301), 0);
/// ```
#[inline]
#[must_use]
pub fn width(cp: u32) -> u8 {
    char::from_u32(cp).map_or(0, char_width)
}

/// Width of a `char` in terminal columns: 0, 1, or 2.
#[must_use]
pub fn char_width(ch: char) -> u8 {
    if ch.is_control() || is_variation_selector(ch) {
        return 0;
    }
    match ch.width() {
        None | Some(0) => 0,
        Some(1) => 1,
        Some(_) => 2,
    }
}

/// Whether `ch` is one of the variation selectors (VS1–VS256).
#[inline]
#[must_use]
pub const fn is_variation_selector(ch: char) -> bool {
    matches!(ch, '\u{FE00}'..='\u{FE0F}' | '\u{E0100}'..='\u{E01EF}')
}

/// Width of one grapheme cluster.
///
/// The cluster takes the width of its first visible scalar. A base that
/// is normally narrow becomes wide when the cluster asks for emoji
/// presentation (`☺` + VS16). The result never exceeds 2.
#[must_use]
pub fn grapheme_width(cluster: &str) -> u8 {
    let base = cluster
        .chars()
        .map(char_width)
        .find(|&w| w > 0)
        .unwrap_or(0);
    if base == 1 && cluster.contains(EMOJI_PRESENTATION) {
        2
    } else {
        base
    }
}

/// Width of a string, summed over its grapheme clusters.
///
/// ```
/// use tessel_term::width::str_width;
///
/// assert_eq!(str_width("hello"), 5);
/// assert_eq!(str_width("中文"), 4);
/// assert_eq!(str_width("e\u{301}"), 1);
/// ```
#[must_use]
pub fn str_width(s: &str) -> usize {
    s.graphemes(true).map(|g| usize::from(grapheme_width(g))).sum()
}

/// The longest prefix of `s` that fits in `max` columns.
///
/// Never splits a grapheme cluster. A wide cluster that would straddle
/// the limit is left out entirely.
#[must_use]
pub fn truncate_to_width(s: &str, max: usize) -> &str {
    let mut used = 0;
    for (idx, g) in s.grapheme_indices(true) {
        let w = usize::from(grapheme_width(g));
        if used + w > max {
            return &s[..idx];
        }
        used += w;
    }
    s
}

/// `s` truncated to `target` columns, then right-padded with spaces to
/// exactly `target` columns.
#[must_use]
pub fn pad_to_width(s: &str, target: usize) -> Cow<'_, str> {
    let fitted = truncate_to_width(s, target);
    let w = str_width(fitted);
    if w == target {
        Cow::Borrowed(fitted)
    } else {
        let mut out = String::with_capacity(fitted.len() + target - w);
        out.push_str(fitted);
        out.extend(std::iter::repeat_n(' ', target - w));
        Cow::Owned(out)
    }
}
