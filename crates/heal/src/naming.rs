//! Deterministic healing-branch naming (§6.3). Must match exactly between
//! a client-side preview and this server, so the transform is a single
//! pure function with no locale- or platform-dependent behavior.

/// Uppercase, drop every char outside `[A-Z0-9 ]`, collapse whitespace runs
/// to `_`, trim.
#[must_use]
pub fn sanitize(input: &str) -> String {
    let upper = input.to_uppercase();
    let filtered: String = upper
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();

    let collapsed = filtered
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");

    collapsed.trim_matches('_').to_string()
}

/// `sanitize(team) + "_" + sanitize(leader) + "_AI_Fix"`.
#[must_use]
pub fn healing_branch_name(team_name: &str, leader_name: &str) -> String {
    format!("{}_{}_AI_Fix", sanitize(team_name), sanitize(leader_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_punctuation_and_collapses_whitespace() {
        assert_eq!(sanitize("team-alpha!!  rocks"), "TEAMALPHA_ROCKS");
    }

    #[test]
    fn drops_disallowed_characters_without_introducing_separators() {
        assert_eq!(sanitize("team-alpha"), "TEAMALPHA");
    }

    #[test]
    fn branch_name_matches_convention() {
        assert_eq!(
            healing_branch_name("Team Alpha", "Jane Doe"),
            "TEAM_ALPHA_JANE_DOE_AI_Fix"
        );
    }

    #[test]
    fn deterministic_across_calls() {
        assert_eq!(
            healing_branch_name("x", "y"),
            healing_branch_name("x", "y")
        );
    }
}
