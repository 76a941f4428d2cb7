//! RWX Directive Parser (spec §4.5): turns a normalized line stream into
//! a finished [`crate::scene::ModelPrefab`] by threading every line
//! through a shared [`ParseContext`].

mod context;
mod directives;
mod normalize;

pub use context::ParseContext;

use crate::scene::ModelPrefab;

/// Parses a full RWX source text into a prefab. Never fails outright —
/// per spec §7 the parser's contract is best-effort: a partially-built
/// tree for broken input rather than a hard error.
#[must_use]
pub fn parse_model(source: &str) -> ModelPrefab {
    let mut ctx = ParseContext::new();
    for raw_line in source.lines() {
        if let Some(line) = normalize::normalize_line(raw_line) {
            ctx.feed_line(&line);
        }
    }
    if !ctx.stacks_are_empty() {
        log::warn!("rwx_forge: model ended with unbalanced begin/end directives");
    }
    ctx.into_prefab()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_end_to_end() {
        let source = "modelbegin\nclumpbegin\nvertex 0 0 0\nvertex 1 0 0\nvertex 1 1 0\nvertex 0 1 0\nquad 1 2 3 4\nclumpend\nmodelend";
        let prefab = parse_model(source);
        let clump = prefab.nodes.iter().find(|n| !n.submeshes.is_empty()).unwrap();
        let sub = &clump.submeshes[0];
        assert_eq!(sub.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(sub.vertices[0].position, glam::Vec3::ZERO);
        assert_eq!(sub.vertices[1].position, glam::Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn well_formed_model_leaves_every_stack_empty() {
        let source = "clumpbegin\ntransformbegin\ntransformend\nclumpend";
        let mut ctx = ParseContext::new();
        for line in source.lines() {
            ctx.feed_line(line);
        }
        assert!(ctx.stacks_are_empty());
    }
}
