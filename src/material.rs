//! Material Record and Material State (spec §3, §4.5).
//!
//! Material records are value types — clone on assignment, as the spec
//! requires — so the sub-mesh splitting logic in [`crate::mesh`] can keep a
//! cheap owned snapshot per emitted primitive run.

use bitflags::bitflags;

bitflags! {
    /// Texture-mode flag set; `texturemode null` clears it, a
    /// `texturemode <flag>+` directive replaces it wholesale (spec §4.5).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextureModeFlags: u8 {
        const LIT         = 0b001;
        const FORESHORTEN = 0b010;
        const FILTER      = 0b100;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialMode {
    None,
    Null,
    Double,
}

impl Default for MaterialMode {
    fn default() -> Self {
        MaterialMode::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightSampling {
    Facet,
    Vertex,
}

impl Default for LightSampling {
    fn default() -> Self {
        LightSampling::Facet
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometrySampling {
    Pointcloud,
    Wireframe,
    Solid,
}

impl Default for GeometrySampling {
    fn default() -> Self {
        GeometrySampling::Solid
    }
}

/// Surface reflectance triple set by `surface`/`ambient`/`diffuse`/`specular`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            ambient: 1.0,
            diffuse: 1.0,
            specular: 0.0,
        }
    }
}

/// The tuple of surface parameters RWX tracks for the material currently
/// in effect. Value type: clone freely, compare by [`MaterialKey`] for
/// mesh-commit purposes.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialRecord {
    pub color: [f32; 3],
    pub opacity: f32,
    pub surface: Surface,
    pub texture: Option<String>,
    pub mask: Option<String>,
    pub normal_map: Option<String>,
    pub specular_map: Option<String>,
    pub material_mode: MaterialMode,
    pub light_sampling: LightSampling,
    pub geometry_sampling: GeometrySampling,
    pub texture_mode: TextureModeFlags,
    pub tint_enabled: bool,
}

impl Default for MaterialRecord {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            opacity: 1.0,
            surface: Surface::default(),
            texture: None,
            mask: None,
            normal_map: None,
            specular_map: None,
            material_mode: MaterialMode::default(),
            light_sampling: LightSampling::default(),
            geometry_sampling: GeometrySampling::default(),
            texture_mode: TextureModeFlags::empty(),
            tint_enabled: false,
        }
    }
}

/// Replaces the texture slot, clearing all per-map slots first — matches
/// the `texture` directive's documented behavior of resetting
/// mask/normal/specular on every invocation, even when the clauses that
/// would repopulate them are absent.
impl MaterialRecord {
    pub fn set_texture(&mut self, name: Option<&str>) {
        self.texture = match name {
            Some(n) if !n.eq_ignore_ascii_case("null") => Some(n.to_string()),
            _ => None,
        };
        self.mask = None;
        self.normal_map = None;
        self.specular_map = None;
    }

    /// Identity for mesh partitioning (spec §3's "Mesh Commit Key").
    #[must_use]
    pub fn mesh_commit_key(&self) -> MaterialKey {
        MaterialKey {
            color: self.color.map(f32::to_bits),
            opacity: self.opacity.to_bits(),
            ambient: self.surface.ambient.to_bits(),
            diffuse: self.surface.diffuse.to_bits(),
            specular: self.surface.specular.to_bits(),
            texture: self.texture.clone().unwrap_or_default(),
            mask: self.mask.clone().unwrap_or_default(),
            material_mode: self.material_mode,
            light_sampling: self.light_sampling,
            geometry_sampling: self.geometry_sampling,
            texture_mode: self.texture_mode,
        }
    }
}

/// The tuple two primitives must share to land in the same sub-mesh.
/// `f32` fields are keyed on `to_bits()` since `f32` is neither `Eq` nor
/// `Hash`; the spec's material identity includes `color`/`opacity`/
/// `surface` alongside texture and sampling/mode state, so a color-only
/// change still forces a new sub-mesh.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaterialKey {
    pub color: [u32; 3],
    pub opacity: u32,
    pub ambient: u32,
    pub diffuse: u32,
    pub specular: u32,
    pub texture: String,
    pub mask: String,
    pub material_mode: MaterialMode,
    pub light_sampling: LightSampling,
    pub geometry_sampling: GeometrySampling,
    pub texture_mode: TextureModeFlags,
}

/// Tracks the material currently in effect plus the clone-on-push stack
/// used by `clumpbegin`/`clumpend` (spec §4.5): entering a clump snapshots
/// the parent's material so directives inside the clump can mutate freely
/// without leaking back out once the clump closes.
#[derive(Debug, Clone, Default)]
pub struct MaterialState {
    current: MaterialRecord,
    stack: Vec<MaterialRecord>,
}

impl MaterialState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current(&self) -> &MaterialRecord {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut MaterialRecord {
        &mut self.current
    }

    /// `clumpbegin`: snapshot the parent material onto the stack.
    pub fn push_clone(&mut self) {
        self.stack.push(self.current.clone());
    }

    /// `clumpend`: restore the snapshot taken at the matching `clumpbegin`.
    /// An unmatched `clumpend` resets to a fresh default record rather than
    /// underflowing (spec §7, "unmatched `*end`").
    pub fn pop(&mut self) {
        self.current = self.stack.pop().unwrap_or_default();
    }

    #[must_use]
    pub fn is_stack_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn reset(&mut self) {
        self.stack.clear();
        self.current = MaterialRecord::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_restores_parent_material() {
        let mut state = MaterialState::new();
        state.current_mut().color = [1.0, 0.0, 0.0];
        state.push_clone();
        state.current_mut().color = [0.0, 1.0, 0.0];
        assert_eq!(state.current().color, [0.0, 1.0, 0.0]);
        state.pop();
        assert_eq!(state.current().color, [1.0, 0.0, 0.0]);
        assert!(state.is_stack_empty());
    }

    #[test]
    fn set_texture_clears_maps() {
        let mut mat = MaterialRecord::default();
        mat.mask = Some("foo.bmp".to_string());
        mat.set_texture(Some("brick"));
        assert_eq!(mat.texture.as_deref(), Some("brick"));
        assert_eq!(mat.mask, None);
    }

    #[test]
    fn set_texture_null_clears_texture() {
        let mut mat = MaterialRecord::default();
        mat.set_texture(Some("brick"));
        mat.set_texture(Some("null"));
        assert_eq!(mat.texture, None);
    }

    #[test]
    fn commit_key_defaults_to_empty_strings() {
        let mat = MaterialRecord::default();
        let key = mat.mesh_commit_key();
        assert_eq!(key.texture, "");
        assert_eq!(key.mask, "");
    }

    #[test]
    fn commit_key_changes_with_color() {
        let mut mat = MaterialRecord::default();
        let red = mat.mesh_commit_key();
        mat.color = [0.0, 1.0, 0.0];
        let green = mat.mesh_commit_key();
        assert_ne!(red, green);
    }
}
