//! Directive dispatch (spec §4.5): a linear match over the fixed
//! directive set, case-insensitive on the directive token. Unrecognized
//! directives are silently ignored (forward-compat); malformed numeric
//! tokens abort just that directive, logged, and the parse continues.

use glam::{Mat4, Vec3};

use crate::material::{GeometrySampling, LightSampling, MaterialMode, TextureModeFlags};
use crate::mesh::Primitive;
use crate::parser::context::ParseContext;
use crate::transform;

/// Parses the first `n` whitespace tokens of `tokens` as `f32`. Returns
/// `None` (directive aborted) if there are too few tokens or any fails to
/// parse — spec §7, "malformed numeric token".
fn floats(tokens: &[&str], n: usize) -> Option<Vec<f32>> {
    if tokens.len() < n {
        return None;
    }
    tokens[..n].iter().map(|t| t.parse::<f32>().ok()).collect()
}

fn ints(tokens: &[&str], n: usize) -> Option<Vec<i64>> {
    if tokens.len() < n {
        return None;
    }
    tokens[..n].iter().map(|t| t.parse::<i64>().ok()).collect()
}

fn warn_malformed(directive: &str) {
    log::warn!("rwx_forge: malformed or incomplete `{directive}` directive, aborting it");
}

/// Emits one primitive under the current material key, routing any
/// flushed sub-mesh onto the current node.
fn emit_and_route(ctx: &mut ParseContext, primitive: &Primitive) {
    let key = ctx.material.current().mesh_commit_key();
    if let Some(flushed) = ctx.mesh.emit(key, primitive) {
        ctx.prefab.nodes[ctx.current_node].submeshes.push(flushed);
    }
}

/// Finds a `<clause> <value>` pair (case-insensitive clause name) inside
/// `tokens`, returning `value` verbatim.
fn find_clause<'a>(tokens: &[&'a str], clause: &str) -> Option<&'a str> {
    tokens
        .iter()
        .position(|t| t.eq_ignore_ascii_case(clause))
        .and_then(|i| tokens.get(i + 1).copied())
}

pub fn dispatch(ctx: &mut ParseContext, line: &str) {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(&head) = tokens.first() else {
        return;
    };
    let directive = head.to_ascii_lowercase();
    let rest = &tokens[1..];

    match directive.as_str() {
        "vertex" | "vertexext" => dispatch_vertex(ctx, rest),
        "triangle" => dispatch_triangle(ctx, rest),
        "quad" => dispatch_quad(ctx, rest),
        "polygon" => dispatch_polygon(ctx, rest),

        "color" => {
            let Some(v) = floats(rest, 3) else {
                return warn_malformed("color");
            };
            ctx.material.current_mut().color = [v[0], v[1], v[2]];
        }
        "opacity" => {
            let Some(v) = floats(rest, 1) else {
                return warn_malformed("opacity");
            };
            ctx.material.current_mut().opacity = v[0];
        }
        "surface" => {
            let Some(v) = floats(rest, 3) else {
                return warn_malformed("surface");
            };
            let surface = &mut ctx.material.current_mut().surface;
            surface.ambient = v[0];
            surface.diffuse = v[1];
            surface.specular = v[2];
        }
        "ambient" => {
            let Some(v) = floats(rest, 1) else {
                return warn_malformed("ambient");
            };
            ctx.material.current_mut().surface.ambient = v[0];
        }
        "diffuse" => {
            let Some(v) = floats(rest, 1) else {
                return warn_malformed("diffuse");
            };
            ctx.material.current_mut().surface.diffuse = v[0];
        }
        "specular" => {
            let Some(v) = floats(rest, 1) else {
                return warn_malformed("specular");
            };
            ctx.material.current_mut().surface.specular = v[0];
        }
        "texture" => dispatch_texture(ctx, rest),

        "materialmode" | "materialmodes" | "addmaterialmode" | "addmaterialmodes" => {
            let Some(&mode) = rest.first() else {
                return warn_malformed("materialmode");
            };
            ctx.material.current_mut().material_mode = match mode.to_ascii_lowercase().as_str() {
                "none" => MaterialMode::None,
                "null" => MaterialMode::Null,
                "double" => MaterialMode::Double,
                _ => return warn_malformed("materialmode"),
            };
        }
        "lightsampling" => {
            let Some(&mode) = rest.first() else {
                return warn_malformed("lightsampling");
            };
            ctx.material.current_mut().light_sampling = match mode.to_ascii_lowercase().as_str() {
                "facet" => LightSampling::Facet,
                "vertex" => LightSampling::Vertex,
                _ => return warn_malformed("lightsampling"),
            };
        }
        "geometrysampling" => {
            let Some(&mode) = rest.first() else {
                return warn_malformed("geometrysampling");
            };
            ctx.material.current_mut().geometry_sampling = match mode.to_ascii_lowercase().as_str()
            {
                "pointcloud" => GeometrySampling::Pointcloud,
                "wireframe" => GeometrySampling::Wireframe,
                "solid" => GeometrySampling::Solid,
                _ => return warn_malformed("geometrysampling"),
            };
        }
        "texturemode" | "texturemodes" => {
            if rest.first().is_some_and(|t| t.eq_ignore_ascii_case("null")) {
                ctx.material.current_mut().texture_mode = TextureModeFlags::empty();
                return;
            }
            let mut flags = TextureModeFlags::empty();
            for token in rest {
                match token.to_ascii_lowercase().as_str() {
                    "lit" => flags |= TextureModeFlags::LIT,
                    "foreshorten" => flags |= TextureModeFlags::FORESHORTEN,
                    "filter" => flags |= TextureModeFlags::FILTER,
                    _ => {}
                }
            }
            ctx.material.current_mut().texture_mode = flags;
        }

        "clumpbegin" => ctx.clump_begin(),
        "clumpend" => ctx.clump_end(),

        "transformbegin" => ctx.transform_stack.push(ctx.current_transform),
        "transformend" => match ctx.transform_stack.pop() {
            Some(t) => ctx.current_transform = t,
            None => {
                log::warn!("rwx_forge: unmatched transformend, resetting to identity");
                ctx.current_transform = Mat4::IDENTITY;
                ctx.transform_stack.reset();
            }
        },
        "identity" => ctx.current_transform = Mat4::IDENTITY,
        "translate" => {
            let Some(v) = floats(rest, 3) else {
                return warn_malformed("translate");
            };
            ctx.current_transform =
                transform::translate(ctx.current_transform, Vec3::new(v[0], v[1], v[2]));
        }
        "rotate" => {
            let Some(v) = floats(rest, 4) else {
                return warn_malformed("rotate");
            };
            ctx.current_transform = transform::rotate_axis_angle(
                ctx.current_transform,
                Vec3::new(v[0], v[1], v[2]),
                v[3],
            );
        }
        "scale" => {
            let Some(v) = floats(rest, 3) else {
                return warn_malformed("scale");
            };
            ctx.current_transform =
                transform::scale(ctx.current_transform, Vec3::new(v[0], v[1], v[2]));
        }
        "transform" => {
            let Some(v) = floats(rest, 16) else {
                return warn_malformed("transform");
            };
            let values: [f32; 16] = v.try_into().expect("checked length 16");
            ctx.current_transform = transform::mat4_from_rwx_tokens(&values);
        }

        "jointtransformbegin" => ctx.joint_stack.push(ctx.joint_transform),
        "jointtransformend" => match ctx.joint_stack.pop() {
            Some(t) => ctx.joint_transform = t,
            None => {
                log::warn!("rwx_forge: unmatched jointtransformend, resetting to identity");
                ctx.joint_transform = Mat4::IDENTITY;
                ctx.joint_stack.reset();
            }
        },
        "identityjoint" => ctx.joint_transform = Mat4::IDENTITY,
        "rotatejointtm" => {
            let Some(v) = floats(rest, 4) else {
                return warn_malformed("rotatejointtm");
            };
            ctx.joint_transform =
                transform::rotate_axis_angle(ctx.joint_transform, Vec3::new(v[0], v[1], v[2]), v[3]);
        }

        "protobegin" => {
            let Some(&name) = rest.first() else {
                return warn_malformed("protobegin");
            };
            ctx.begin_prototype_capture(name);
        }
        "protoend" => {
            log::warn!("rwx_forge: unmatched protoend outside any protobegin capture");
        }
        "protoinstance" => {
            let Some(&name) = rest.first() else {
                return warn_malformed("protoinstance");
            };
            let key = name.to_ascii_lowercase();
            let Some(proto) = ctx.prototypes.get(&key).cloned() else {
                log::warn!("rwx_forge: protoinstance `{name}` references an undefined prototype");
                return;
            };
            ctx.instantiate_prototype(&proto);
        }

        // `modelbegin`/`modelend` bracket the whole stream but carry no
        // per-directive state of their own; unrecognized directives are
        // silently ignored (spec §4.5).
        _ => {}
    }
}

fn dispatch_vertex(ctx: &mut ParseContext, rest: &[&str]) {
    let Some(xyz) = floats(rest, 3) else {
        return warn_malformed("vertex");
    };
    let mut position = Vec3::new(xyz[0], xyz[1], xyz[2]);
    if ctx.in_prototype_body {
        position = ctx.current_transform.transform_point3(position);
    }

    let (u, v) = match find_clause(rest, "uv") {
        Some(_) => {
            let uv_start = rest.iter().position(|t| t.eq_ignore_ascii_case("uv")).unwrap() + 1;
            match floats(&rest[uv_start..], 2) {
                Some(uv) => (uv[0], uv[1]),
                None => {
                    warn_malformed("vertex uv clause");
                    (0.0, 0.0)
                }
            }
        }
        None => (0.0, 0.0),
    };

    ctx.mesh.push_vertex(position, u, v);
}

fn dispatch_triangle(ctx: &mut ParseContext, rest: &[&str]) {
    let Some(v) = ints(rest, 3) else {
        return warn_malformed("triangle");
    };
    emit_and_route(ctx, &Primitive::Triangle([v[0], v[1], v[2]]));
}

fn dispatch_quad(ctx: &mut ParseContext, rest: &[&str]) {
    let Some(v) = ints(rest, 4) else {
        return warn_malformed("quad");
    };
    emit_and_route(ctx, &Primitive::Quad([v[0], v[1], v[2], v[3]]));
}

fn dispatch_polygon(ctx: &mut ParseContext, rest: &[&str]) {
    let Some(count_tok) = rest.first() else {
        return warn_malformed("polygon");
    };
    let Ok(count) = count_tok.parse::<usize>() else {
        return warn_malformed("polygon");
    };
    let Some(indices) = ints(&rest[1..], count) else {
        return warn_malformed("polygon");
    };
    emit_and_route(ctx, &Primitive::Polygon(indices));
}

fn dispatch_texture(ctx: &mut ParseContext, rest: &[&str]) {
    let Some(&name) = rest.first() else {
        return warn_malformed("texture");
    };
    let mask = find_clause(rest, "mask").map(str::to_string);
    let normal = find_clause(rest, "normal").map(str::to_string);
    let specular = find_clause(rest, "specular").map(str::to_string);

    let mat = ctx.material.current_mut();
    mat.set_texture(Some(name));
    mat.mask = mask;
    mat.normal_map = normal;
    mat.specular_map = specular;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::context::ParseContext;

    fn run(ctx: &mut ParseContext, lines: &[&str]) {
        for line in lines {
            dispatch(ctx, line);
        }
    }

    #[test]
    fn cube_quad_produces_expected_mesh() {
        let mut ctx = ParseContext::new();
        run(
            &mut ctx,
            &[
                "clumpbegin",
                "vertex 0 0 0",
                "vertex 1 0 0",
                "vertex 1 1 0",
                "vertex 0 1 0",
                "quad 1 2 3 4",
                "clumpend",
            ],
        );
        let prefab = ctx.into_prefab();
        let clump = prefab.nodes.iter().find(|n| !n.submeshes.is_empty()).unwrap();
        let sub = &clump.submeshes[0];
        assert_eq!(sub.vertices.len(), 4);
        assert_eq!(sub.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn uv_flip_applies_on_vertex_directive() {
        let mut ctx = ParseContext::new();
        dispatch(&mut ctx, "vertex 0 0 0 uv 0.25 0.75");
        assert_eq!(ctx.mesh.vertex_count(), 1);
    }

    #[test]
    fn material_split_produces_two_submeshes() {
        let mut ctx = ParseContext::new();
        run(
            &mut ctx,
            &[
                "vertex 0 0 0",
                "vertex 1 0 0",
                "vertex 1 1 0",
                "vertex 0 1 0",
                "color 1 0 0",
                "triangle 1 2 3",
                "color 0 1 0",
                "triangle 2 3 4",
            ],
        );
        let prefab = ctx.into_prefab();
        assert_eq!(prefab.nodes[0].submeshes.len(), 2);
        assert_ne!(
            prefab.nodes[0].submeshes[0].material,
            prefab.nodes[0].submeshes[1].material
        );
    }

    #[test]
    fn unmatched_clumpend_recovers_to_identity() {
        let mut ctx = ParseContext::new();
        dispatch(&mut ctx, "clumpend");
        assert_eq!(ctx.current_transform, Mat4::IDENTITY);
    }

    #[test]
    fn malformed_directive_is_skipped_without_aborting_parse() {
        let mut ctx = ParseContext::new();
        run(&mut ctx, &["translate 1 2", "translate 1 2 3"]);
        assert_eq!(
            ctx.current_transform,
            transform::translate(Mat4::IDENTITY, Vec3::new(1.0, 2.0, 3.0))
        );
    }

    #[test]
    fn protoinstance_of_undefined_prototype_emits_nothing() {
        let mut ctx = ParseContext::new();
        dispatch(&mut ctx, "protoinstance Ghost");
        assert_eq!(ctx.prefab.node_count(), 1);
    }

    #[test]
    fn prototype_reuse_produces_identical_geometry_at_distinct_positions() {
        let mut ctx = ParseContext::new();
        run(
            &mut ctx,
            &[
                "protobegin P",
                "vertex 0 0 0",
                "vertex 1 0 0",
                "vertex 0 1 0",
                "triangle 1 2 3",
                "protoend",
                "translate 5 0 0",
                "protoinstance P",
                "translate 5 0 0",
                "protoinstance P",
            ],
        );
        let prefab = ctx.into_prefab();
        let proto_nodes: Vec<_> = prefab
            .nodes
            .iter()
            .filter(|n| n.name.starts_with("Proto_"))
            .collect();
        assert_eq!(proto_nodes.len(), 2);
        let first: Vec<Vec3> = proto_nodes[0].submeshes[0]
            .vertices
            .iter()
            .map(|v| v.position)
            .collect();
        // The second instance is baked 5 units further along RWX-space
        // +x than the first; the display-space x flip negates that
        // offset, so it shows up as -5 here.
        let second_relative: Vec<Vec3> = proto_nodes[1].submeshes[0]
            .vertices
            .iter()
            .map(|v| v.position - Vec3::new(-5.0, 0.0, 0.0))
            .collect();
        assert_eq!(first, second_relative);
    }
}
