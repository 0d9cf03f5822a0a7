//! Locale-aware numeric formatting.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

const KB: f64 = 1024.0;
const MB: f64 = 1024.0 * 1024.0;
const GB: f64 = 1024.0 * 1024.0 * 1024.0;
const TB: f64 = 1024.0 * 1024.0 * 1024.0 * 1024.0;

/// Sentinel rendered for NaN / missing values.
const NOT_AVAILABLE: &str = "N/A";

/// Separator pairs for the locales the dashboard configuration accepts.
static LOCALES: Lazy<HashMap<&'static str, NumberFormat>> = Lazy::new(|| {
    HashMap::from([
        ("en", NumberFormat { group_separator: ',', decimal_separator: '.' }),
        ("de", NumberFormat { group_separator: '.', decimal_separator: ',' }),
        ("es", NumberFormat { group_separator: '.', decimal_separator: ',' }),
        ("fr", NumberFormat { group_separator: '\u{202f}', decimal_separator: ',' }),
    ])
});

/// Decimal rendering style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecimalStyle {
    /// Plain decimal, e.g. `"1,234.5"`.
    Decimal,
    /// Value is a ratio; render scaled by 100 with a percent sign,
    /// e.g. `0.125` -> `"12.5%"`.
    Percent,
}

/// Locale configuration for numeric output.
///
/// Only the separators vary between the locales the dashboard supports,
/// so this carries exactly those.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormat {
    pub group_separator: char,
    pub decimal_separator: char,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::en()
    }
}

impl NumberFormat {
    /// The `en` locale: `1,234.5`.
    pub fn en() -> Self {
        Self {
            group_separator: ',',
            decimal_separator: '.',
        }
    }

    /// Separators for a configured locale tag; unknown tags fall back
    /// to `en`.
    pub fn for_locale(locale: &str) -> Self {
        LOCALES.get(locale).copied().unwrap_or_else(Self::en)
    }

    /// Format a value with digit grouping. NaN renders as `"N/A"`.
    ///
    /// Fractional parts are kept to at most three digits with trailing
    /// zeros trimmed, matching the browser default the original UI
    /// relied on for counts.
    pub fn number(&self, v: f64) -> String {
        if v.is_nan() {
            return NOT_AVAILABLE.to_string();
        }
        let rounded = (v * 1000.0).round() / 1000.0;
        let mut s = format!("{:.3}", rounded.abs());
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
        self.assemble(v.is_sign_negative() && rounded != 0.0, &s)
    }

    /// Format with a fixed number of fraction digits.
    pub fn decimal(&self, v: f64, places: u8, style: DecimalStyle) -> String {
        if v.is_nan() {
            return NOT_AVAILABLE.to_string();
        }
        let scaled = match style {
            DecimalStyle::Decimal => v,
            DecimalStyle::Percent => v * 100.0,
        };
        let s = format!("{:.*}", places as usize, scaled.abs());
        let out = self.assemble(scaled < 0.0, &s);
        match style {
            DecimalStyle::Decimal => out,
            DecimalStyle::Percent => format!("{out}%"),
        }
    }

    /// Shorthand for [`Self::decimal`] with [`DecimalStyle::Percent`].
    pub fn percent(&self, v: f64, places: u8) -> String {
        self.decimal(v, places, DecimalStyle::Percent)
    }

    /// Byte count in human-readable form, scaled to the largest 1024-power
    /// unit with a scaled value >= 1. Plain byte counts render with no
    /// fraction digits and no suffix; scaled values get a single-letter
    /// suffix, e.g. `human_size(1536, 1)` -> `"1.5K"`.
    pub fn human_size(&self, v: f64, places: u8) -> String {
        if v.is_nan() {
            return NOT_AVAILABLE.to_string();
        }
        let (unit, suffix) = if v >= TB {
            (TB, "T")
        } else if v >= GB {
            (GB, "G")
        } else if v >= MB {
            (MB, "M")
        } else if v >= KB {
            (KB, "K")
        } else {
            return self.decimal(v, 0, DecimalStyle::Decimal);
        };
        let factor = 10f64.powi(places as i32);
        let scaled = (v / unit * factor).round() / factor;
        format!("{}{}", self.decimal(scaled, places, DecimalStyle::Decimal), suffix)
    }

    /// Insert group separators into an unsigned decimal string and apply
    /// the locale separators and sign.
    fn assemble(&self, negative: bool, unsigned: &str) -> String {
        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (unsigned, None),
        };
        let mut grouped = String::new();
        let digits = int_part.len();
        for (idx, ch) in int_part.chars().enumerate() {
            if idx > 0 && (digits - idx) % 3 == 0 {
                grouped.push(self.group_separator);
            }
            grouped.push(ch);
        }
        let mut out = String::new();
        if negative {
            out.push('-');
        }
        out.push_str(&grouped);
        if let Some(frac) = frac_part {
            if !frac.is_empty() {
                out.push(self.decimal_separator);
                out.push_str(frac);
            }
        }
        out
    }
}
