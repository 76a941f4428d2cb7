//! Captured prototype bodies (spec §4.7): an immutable, unparsed
//! sequence of source lines keyed by lowercased name, replayed at each
//! `protoinstance` site against a fresh sub-context.

/// A named sub-model definition captured between `protobegin`/`protoend`.
/// `lines` is never parsed at capture time — only at replay.
#[derive(Debug, Clone)]
pub struct PrototypeDefinition {
    pub name: String,
    pub lines: Vec<String>,
    /// Pre-scanned at capture time: does the body contain its own
    /// top-level `transform` directive? Resolves spec §9's Open
    /// Question 3 by recording a boolean once, rather than re-deriving
    /// it with a substring search at every instance site.
    pub has_own_transform: bool,
}

impl PrototypeDefinition {
    #[must_use]
    pub fn capture(name: String, lines: Vec<String>) -> Self {
        let has_own_transform = lines.iter().any(|line| {
            line.split_whitespace()
                .next()
                .is_some_and(|tok| tok.eq_ignore_ascii_case("transform"))
        });
        Self {
            name,
            lines,
            has_own_transform,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_own_transform_directive() {
        let proto = PrototypeDefinition::capture(
            "p".to_string(),
            vec!["color 1 0 0".to_string(), "transform 1 0 0 0 0 1 0 0 0 0 1 0 0 0 0 1".to_string()],
        );
        assert!(proto.has_own_transform);
    }

    #[test]
    fn ignores_transformbegin_as_a_distinct_token() {
        let proto = PrototypeDefinition::capture(
            "p".to_string(),
            vec!["transformbegin".to_string(), "translate 1 0 0".to_string(), "transformend".to_string()],
        );
        assert!(!proto.has_own_transform);
    }
}
