//! Schema classification for an unknown header set
//!
//! Classification is best-effort. Exact header matches decide when one
//! schema clearly wins; otherwise two keyword heuristics are tried and
//! anything still ambiguous is `Unknown`.

use super::SchemaType;
use crate::mapping::count_exact_matches;

const COST_CATEGORY_KEYWORDS: &[&str] = &["category"];
const PER_CLAIMANT_KEYWORDS: &[&str] = &["claimant", "member id", "member_id", "memberid"];

/// Classify observed headers as one of the known schemas
pub fn detect_schema_type<S: AsRef<str>>(observed: &[S]) -> SchemaType {
    let cost_matches = count_exact_matches(observed, SchemaType::CostCategory);
    let claimant_matches = count_exact_matches(observed, SchemaType::PerClaimant);

    log::debug!(
        "schema detection: cost_category={} per_claimant={} exact matches",
        cost_matches,
        claimant_matches
    );

    if cost_matches > claimant_matches {
        return SchemaType::CostCategory;
    }
    if claimant_matches > cost_matches {
        return SchemaType::PerClaimant;
    }

    // Claimant ids outrank "category", which per-claimant files carry as a service category
    if any_header_contains(observed, PER_CLAIMANT_KEYWORDS) {
        SchemaType::PerClaimant
    } else if any_header_contains(observed, COST_CATEGORY_KEYWORDS) {
        SchemaType::CostCategory
    } else {
        SchemaType::Unknown
    }
}

fn any_header_contains<S: AsRef<str>>(observed: &[S], keywords: &[&str]) -> bool {
    observed.iter().any(|h| {
        let h = h.as_ref().trim().to_lowercase();
        keywords.iter().any(|k| h.contains(k))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_matches_decide() {
        let headers = ["month", "category", "amount", "Notes"];
        assert_eq!(detect_schema_type(&headers), SchemaType::CostCategory);

        let headers = ["CLAIMANT_ID", "claim_date", "medical_amount"];
        assert_eq!(detect_schema_type(&headers), SchemaType::PerClaimant);
    }

    #[test]
    fn test_tie_falls_back_to_category_keyword() {
        let headers = ["Reporting Period", "Cost Category", "Dollars"];
        assert_eq!(detect_schema_type(&headers), SchemaType::CostCategory);
    }

    #[test]
    fn test_tie_falls_back_to_claimant_keyword() {
        let headers = ["Claim Date", "Claimant ID", "Medical", "Rx"];
        assert_eq!(detect_schema_type(&headers), SchemaType::PerClaimant);

        let headers = ["Member ID", "DOS", "Paid"];
        assert_eq!(detect_schema_type(&headers), SchemaType::PerClaimant);
    }

    #[test]
    fn test_claimant_keyword_checked_first() {
        let headers = ["Claim Date", "Member ID", "Service Category", "Paid"];
        assert_eq!(detect_schema_type(&headers), SchemaType::PerClaimant);

        let headers = ["Claimant", "Service Category"];
        assert_eq!(detect_schema_type(&headers), SchemaType::PerClaimant);
    }

    #[test]
    fn test_unknown_when_nothing_resolves() {
        let headers = ["foo", "bar", "baz"];
        assert_eq!(detect_schema_type(&headers), SchemaType::Unknown);
        let empty: [&str; 0] = [];
        assert_eq!(detect_schema_type(&empty), SchemaType::Unknown);
    }
}
