use std::cmp::Ordering;

use xcg_xsd::{Facet, WhiteSpaceValue};

/// A derived facet that would widen the value space of its base.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FacetConflict {
    pub facet: &'static str,
    pub detail: String,
}

/// Overlays the facets of a restriction onto those of its base (pt. 2, §4.1.6 Simple Type
/// Restriction (Facets)).
///
/// A derived facet replaces the base facet of the same kind, except for `pattern`, whose
/// restrictions all apply and are therefore kept side by side. A derived facet that loosens
/// its base is not applied; the base facet stays and a conflict is returned for it.
pub(crate) fn narrow_facets(base: &[Facet], derived: &[Facet]) -> (Vec<Facet>, Vec<FacetConflict>) {
    let mut facets = base.to_vec();
    let mut conflicts = Vec::new();

    for facet in derived {
        if matches!(facet, Facet::Pattern(_)) {
            facets.push(facet.clone());
            continue;
        }

        if let Some(detail) = base.iter().find_map(|b| conflict(b, facet)) {
            conflicts.push(FacetConflict {
                facet: facet.name(),
                detail,
            });
            continue;
        }

        match facets.iter_mut().find(|f| f.is_of_same_kind_as(facet)) {
            Some(existing) => *existing = facet.clone(),
            None => facets.push(facet.clone()),
        }
    }

    (facets, conflicts)
}

/// Describes how `derived` loosens `base`, if it does.
fn conflict(base: &Facet, derived: &Facet) -> Option<String> {
    use Facet::*;
    match (base, derived) {
        (Length(b), Length(d)) if b != d => Some(format!("length {d} differs from {b}")),
        (MinLength(b), MinLength(d)) if d < b => Some(format!("minLength {d} is below {b}")),
        (MaxLength(b), MaxLength(d)) if d > b => Some(format!("maxLength {d} exceeds {b}")),
        (Length(b), MaxLength(d)) if d < b => Some(format!("maxLength {d} is below length {b}")),
        (Length(b), MinLength(d)) if d > b => Some(format!("minLength {d} exceeds length {b}")),
        (TotalDigits(b), TotalDigits(d)) if d > b => Some(format!("totalDigits {d} exceeds {b}")),
        (FractionDigits(b), FractionDigits(d)) if d > b => {
            Some(format!("fractionDigits {d} exceeds {b}"))
        }
        (MaxInclusive(b), MaxInclusive(d)) | (MaxExclusive(b), MaxExclusive(d))
            if compare(d, b) == Some(Ordering::Greater) =>
        {
            Some(format!("upper bound {d} exceeds {b}"))
        }
        (MaxExclusive(b), MaxInclusive(d))
            if matches!(compare(d, b), Some(Ordering::Greater | Ordering::Equal)) =>
        {
            Some(format!("maxInclusive {d} is not below maxExclusive {b}"))
        }
        (MinInclusive(b), MinInclusive(d)) | (MinExclusive(b), MinExclusive(d))
            if compare(d, b) == Some(Ordering::Less) =>
        {
            Some(format!("lower bound {d} is below {b}"))
        }
        (MinExclusive(b), MinInclusive(d))
            if matches!(compare(d, b), Some(Ordering::Less | Ordering::Equal)) =>
        {
            Some(format!("minInclusive {d} is not above minExclusive {b}"))
        }
        (Enumeration(b), Enumeration(d)) => d
            .iter()
            .find(|value| !b.iter().any(|base| base.value == value.value))
            .map(|value| format!("value {:?} is not allowed by the base", value.value)),
        (WhiteSpace(b), WhiteSpace(d)) if rank(*d) < rank(*b) => Some(format!(
            "whiteSpace {} is weaker than {}",
            d.as_str(),
            b.as_str()
        )),
        _ => None,
    }
}

/// Orders two bound literals numerically. Bounds of non-numeric types (dates, durations) are
/// not compared.
fn compare(a: &str, b: &str) -> Option<Ordering> {
    let a = a.trim().parse::<f64>().ok()?;
    let b = b.trim().parse::<f64>().ok()?;
    a.partial_cmp(&b)
}

fn rank(value: WhiteSpaceValue) -> u8 {
    match value {
        WhiteSpaceValue::Preserve => 0,
        WhiteSpaceValue::Replace => 1,
        WhiteSpaceValue::Collapse => 2,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use xcg_xsd::EnumerationValue;

    use super::*;

    fn enumeration(values: &[&str]) -> Facet {
        Facet::Enumeration(
            values
                .iter()
                .map(|v| EnumerationValue {
                    value: v.to_string(),
                    documentation: Vec::new(),
                })
                .collect(),
        )
    }

    #[test]
    fn tighter_facets_replace_the_base() {
        let base = [Facet::MaxLength(10), Facet::Pattern("[a-z]+".into())];
        let derived = [
            Facet::MaxLength(5),
            Facet::MinLength(1),
            Facet::Pattern("a.*".into()),
        ];
        let (facets, conflicts) = narrow_facets(&base, &derived);
        assert!(conflicts.is_empty());
        assert_eq!(
            facets,
            vec![
                Facet::MaxLength(5),
                Facet::Pattern("[a-z]+".into()),
                Facet::MinLength(1),
                Facet::Pattern("a.*".into()),
            ]
        );
    }

    #[test]
    fn widening_keeps_the_base_facet() {
        let base = [Facet::MaxInclusive("100".into()), enumeration(&["a", "b"])];
        let derived = [Facet::MaxInclusive("200".into()), enumeration(&["a", "c"])];
        let (facets, conflicts) = narrow_facets(&base, &derived);
        assert_eq!(facets, base.to_vec());
        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0].facet, "maxInclusive");
        assert_eq!(conflicts[1].facet, "enumeration");
    }

    #[test]
    fn enumeration_subset_and_non_numeric_bounds_are_accepted() {
        let base = [
            enumeration(&["a", "b", "c"]),
            Facet::MaxInclusive("2020-01-01".into()),
        ];
        let derived = [
            enumeration(&["c", "a"]),
            Facet::MaxInclusive("2030-01-01".into()),
        ];
        let (facets, conflicts) = narrow_facets(&base, &derived);
        assert!(conflicts.is_empty());
        assert_eq!(facets, derived.to_vec());
    }

    #[test]
    fn whitespace_can_only_get_stricter() {
        let base = [Facet::WhiteSpace(WhiteSpaceValue::Collapse)];
        let (_, conflicts) =
            narrow_facets(&base, &[Facet::WhiteSpace(WhiteSpaceValue::Preserve)]);
        assert_eq!(conflicts.len(), 1);
    }
}
