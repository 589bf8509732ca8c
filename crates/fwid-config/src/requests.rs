use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Request types the agent hands to its worker.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AcceptedRequests {
    /// Status queries and re-authentication requests.
    #[default]
    Broad,
    /// Status queries only; re-authentication is rejected at intake.
    QueryOnly,
}

/// Errors encountered while parsing [`AcceptedRequests`] from text.
pub type AcceptedRequestsParseError = strum::ParseError;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("broad", AcceptedRequests::Broad)]
    #[case("query_only", AcceptedRequests::QueryOnly)]
    #[case("QUERY_ONLY", AcceptedRequests::QueryOnly)]
    fn parses_case_insensitively(#[case] input: &str, #[case] expected: AcceptedRequests) {
        let parsed: AcceptedRequests = input.parse().expect("set should parse");
        assert_eq!(parsed, expected);
    }

    #[test]
    fn rejects_unknown_set() {
        assert!("everything".parse::<AcceptedRequests>().is_err());
    }
}
