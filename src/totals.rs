// ∑ Totals - running sums over the two lists
// Recomputed on every call, never cached.

use crate::session::{LineItem, Session};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub total_add: f64,
    pub total_omit: f64,
    /// total_add - total_omit
    pub net_change: f64,
}

impl Totals {
    pub fn compute(session: &Session) -> Self {
        let total_add = sum(&session.adds);
        let total_omit = sum(&session.omits);

        Totals {
            total_add,
            total_omit,
            net_change: total_add - total_omit,
        }
    }

    /// (total_add, total_omit, net_change)
    pub fn as_tuple(&self) -> (f64, f64, f64) {
        (self.total_add, self.total_omit, self.net_change)
    }
}

fn sum(items: &[LineItem]) -> f64 {
    items.iter().map(|item| item.total_carbon).sum()
}

/// Format kg CO2e with thousands separators and two decimals: `1,234.50`.
pub fn format_kg(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.2}", value.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // -0.001 rounds to 0.00 and shouldn't print a sign
    let sign = if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };

    format!("{}{}.{}", sign, grouped, frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(total: f64) -> LineItem {
        LineItem {
            reference_name: "x".to_string(),
            quantity: 1.0,
            carbon_per_unit: total,
            total_carbon: total,
        }
    }

    #[test]
    fn test_empty_session_totals_zero() {
        let totals = Totals::compute(&Session::default());
        assert_eq!(totals.as_tuple(), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_totals_match_lists() {
        let mut session = Session::default();
        session.adds = vec![line(10.0), line(2.5), line(0.25)];
        session.omits = vec![line(4.0), line(1.0)];

        let totals = session.totals();
        assert_eq!(totals.total_add, 12.75);
        assert_eq!(totals.total_omit, 5.0);
        assert_eq!(totals.net_change, 7.75);
    }

    #[test]
    fn test_net_change_can_be_negative() {
        let mut session = Session::default();
        session.adds = vec![line(1.0)];
        session.omits = vec![line(3.0)];

        assert_eq!(session.totals().net_change, -2.0);
    }

    #[test]
    fn test_totals_follow_mutation() {
        let mut session = Session::default();
        session.adds.push(line(5.0));
        assert_eq!(session.totals().total_add, 5.0);

        session.adds.clear();
        assert_eq!(session.totals().total_add, 0.0);
    }

    #[test]
    fn test_format_kg() {
        assert_eq!(format_kg(0.0), "0.00");
        assert_eq!(format_kg(12.0), "12.00");
        assert_eq!(format_kg(999.999), "1,000.00");
        assert_eq!(format_kg(1234.5), "1,234.50");
        assert_eq!(format_kg(1234567.25), "1,234,567.25");
        assert_eq!(format_kg(-98765.5), "-98,765.50");
        assert_eq!(format_kg(-0.001), "0.00");
    }
}
