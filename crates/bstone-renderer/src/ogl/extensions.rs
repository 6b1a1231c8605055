// extensions.rs -- extension registry
//
// An extension counts as available only when its name is advertised AND the
// entry points it needs were resolved.

use super::api::{get_integer, get_string};
use super::gl::*;
use super::version::OglVersion;
use log::debug;
use std::collections::{BTreeSet, HashMap};
use std::ffi::CStr;
use std::os::raw::c_char;

/// Groups of optional entry points that are used together.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OglEntryPoints {
    FixedFunction,
    Multitexture,
    Buffer,
    Shader,
    Mipmap,
    Framebuffer,
    FramebufferMultisample,
    Sampler,
    VertexArray,
    BufferStorage,
    DirectStateAccess,
    SeparateShaderObjects,
    Robustness,
    StringI,
}

impl OglEntryPoints {
    /// True if every entry point of the group resolved.
    pub fn are_resolved(self, gl: &GlFns) -> bool {
        match self {
            OglEntryPoints::FixedFunction => {
                gl.matrix_mode.is_some()
                    && gl.load_matrixf.is_some()
                    && gl.load_identity.is_some()
                    && gl.enable_client_state.is_some()
                    && gl.disable_client_state.is_some()
                    && gl.vertex_pointer.is_some()
                    && gl.color_pointer.is_some()
                    && gl.tex_coord_pointer.is_some()
                    && gl.tex_envi.is_some()
                    && gl.color4f.is_some()
            }
            OglEntryPoints::Multitexture => gl.active_texture.is_some(),
            OglEntryPoints::Buffer => {
                gl.gen_buffers.is_some()
                    && gl.delete_buffers.is_some()
                    && gl.bind_buffer.is_some()
                    && gl.buffer_data.is_some()
                    && gl.buffer_sub_data.is_some()
            }
            OglEntryPoints::Shader => {
                gl.create_shader.is_some()
                    && gl.delete_shader.is_some()
                    && gl.shader_source.is_some()
                    && gl.compile_shader.is_some()
                    && gl.get_shaderiv.is_some()
                    && gl.get_shader_info_log.is_some()
                    && gl.create_program.is_some()
                    && gl.delete_program.is_some()
                    && gl.attach_shader.is_some()
                    && gl.detach_shader.is_some()
                    && gl.link_program.is_some()
                    && gl.get_programiv.is_some()
                    && gl.get_program_info_log.is_some()
                    && gl.use_program.is_some()
                    && gl.bind_attrib_location.is_some()
                    && gl.get_active_attrib.is_some()
                    && gl.get_active_uniform.is_some()
                    && gl.get_attrib_location.is_some()
                    && gl.get_uniform_location.is_some()
                    && gl.uniform1i.is_some()
                    && gl.uniform1f.is_some()
                    && gl.uniform2fv.is_some()
                    && gl.uniform4fv.is_some()
                    && gl.uniform_matrix4fv.is_some()
                    && gl.enable_vertex_attrib_array.is_some()
                    && gl.disable_vertex_attrib_array.is_some()
                    && gl.vertex_attrib_pointer.is_some()
                    && gl.vertex_attrib4fv.is_some()
            }
            OglEntryPoints::Mipmap => gl.generate_mipmap.is_some(),
            OglEntryPoints::Framebuffer => {
                gl.gen_framebuffers.is_some()
                    && gl.delete_framebuffers.is_some()
                    && gl.bind_framebuffer.is_some()
                    && gl.check_framebuffer_status.is_some()
                    && gl.framebuffer_renderbuffer.is_some()
                    && gl.gen_renderbuffers.is_some()
                    && gl.delete_renderbuffers.is_some()
                    && gl.bind_renderbuffer.is_some()
            }
            OglEntryPoints::FramebufferMultisample => {
                gl.renderbuffer_storage_multisample.is_some() && gl.blit_framebuffer.is_some()
            }
            OglEntryPoints::Sampler => {
                gl.gen_samplers.is_some()
                    && gl.delete_samplers.is_some()
                    && gl.bind_sampler.is_some()
                    && gl.sampler_parameteri.is_some()
                    && gl.sampler_parameterf.is_some()
            }
            OglEntryPoints::VertexArray => {
                gl.gen_vertex_arrays.is_some()
                    && gl.delete_vertex_arrays.is_some()
                    && gl.bind_vertex_array.is_some()
            }
            OglEntryPoints::BufferStorage => gl.buffer_storage.is_some(),
            OglEntryPoints::DirectStateAccess => {
                gl.create_buffers.is_some()
                    && gl.named_buffer_storage.is_some()
                    && gl.named_buffer_sub_data.is_some()
                    && gl.create_textures.is_some()
                    && gl.texture_parameteri.is_some()
                    && gl.texture_sub_image_2d.is_some()
                    && gl.generate_texture_mipmap.is_some()
            }
            OglEntryPoints::SeparateShaderObjects => {
                gl.gen_program_pipelines.is_some()
                    && gl.delete_program_pipelines.is_some()
                    && gl.bind_program_pipeline.is_some()
                    && gl.use_program_stages.is_some()
            }
            OglEntryPoints::Robustness => gl.get_graphics_reset_status.is_some(),
            OglEntryPoints::StringI => gl.get_stringi.is_some(),
        }
    }
}

/// Extensions the renderer knows how to use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OglExtensionId {
    ArbBufferStorage,
    ArbDirectStateAccess,
    ArbFramebufferObject,
    ArbMultitexture,
    ArbRobustness,
    ArbSamplerObjects,
    ArbSeparateShaderObjects,
    ArbTextureFilterAnisotropic,
    ArbTextureNonPowerOfTwo,
    ArbVertexArrayObject,
    ArbVertexBufferObject,
    ExtBufferStorage,
    ExtFramebufferBlit,
    ExtFramebufferMultisample,
    ExtFramebufferObject,
    ExtTextureFilterAnisotropic,
    KhrRobustness,
    OesTextureNpot,
    OesVertexArrayObject,
    SgisGenerateMipmap,
}

impl OglExtensionId {
    pub const ALL: [OglExtensionId; 20] = [
        OglExtensionId::ArbBufferStorage,
        OglExtensionId::ArbDirectStateAccess,
        OglExtensionId::ArbFramebufferObject,
        OglExtensionId::ArbMultitexture,
        OglExtensionId::ArbRobustness,
        OglExtensionId::ArbSamplerObjects,
        OglExtensionId::ArbSeparateShaderObjects,
        OglExtensionId::ArbTextureFilterAnisotropic,
        OglExtensionId::ArbTextureNonPowerOfTwo,
        OglExtensionId::ArbVertexArrayObject,
        OglExtensionId::ArbVertexBufferObject,
        OglExtensionId::ExtBufferStorage,
        OglExtensionId::ExtFramebufferBlit,
        OglExtensionId::ExtFramebufferMultisample,
        OglExtensionId::ExtFramebufferObject,
        OglExtensionId::ExtTextureFilterAnisotropic,
        OglExtensionId::KhrRobustness,
        OglExtensionId::OesTextureNpot,
        OglExtensionId::OesVertexArrayObject,
        OglExtensionId::SgisGenerateMipmap,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OglExtensionId::ArbBufferStorage => "GL_ARB_buffer_storage",
            OglExtensionId::ArbDirectStateAccess => "GL_ARB_direct_state_access",
            OglExtensionId::ArbFramebufferObject => "GL_ARB_framebuffer_object",
            OglExtensionId::ArbMultitexture => "GL_ARB_multitexture",
            OglExtensionId::ArbRobustness => "GL_ARB_robustness",
            OglExtensionId::ArbSamplerObjects => "GL_ARB_sampler_objects",
            OglExtensionId::ArbSeparateShaderObjects => "GL_ARB_separate_shader_objects",
            OglExtensionId::ArbTextureFilterAnisotropic => "GL_ARB_texture_filter_anisotropic",
            OglExtensionId::ArbTextureNonPowerOfTwo => "GL_ARB_texture_non_power_of_two",
            OglExtensionId::ArbVertexArrayObject => "GL_ARB_vertex_array_object",
            OglExtensionId::ArbVertexBufferObject => "GL_ARB_vertex_buffer_object",
            OglExtensionId::ExtBufferStorage => "GL_EXT_buffer_storage",
            OglExtensionId::ExtFramebufferBlit => "GL_EXT_framebuffer_blit",
            OglExtensionId::ExtFramebufferMultisample => "GL_EXT_framebuffer_multisample",
            OglExtensionId::ExtFramebufferObject => "GL_EXT_framebuffer_object",
            OglExtensionId::ExtTextureFilterAnisotropic => "GL_EXT_texture_filter_anisotropic",
            OglExtensionId::KhrRobustness => "GL_KHR_robustness",
            OglExtensionId::OesTextureNpot => "GL_OES_texture_npot",
            OglExtensionId::OesVertexArrayObject => "GL_OES_vertex_array_object",
            OglExtensionId::SgisGenerateMipmap => "GL_SGIS_generate_mipmap",
        }
    }

    /// Entry points the extension must provide to be usable.
    pub fn entry_points(self) -> Option<OglEntryPoints> {
        match self {
            OglExtensionId::ArbBufferStorage | OglExtensionId::ExtBufferStorage => {
                Some(OglEntryPoints::BufferStorage)
            }
            OglExtensionId::ArbDirectStateAccess => Some(OglEntryPoints::DirectStateAccess),
            OglExtensionId::ArbFramebufferObject | OglExtensionId::ExtFramebufferObject => {
                Some(OglEntryPoints::Framebuffer)
            }
            OglExtensionId::ExtFramebufferBlit | OglExtensionId::ExtFramebufferMultisample => {
                Some(OglEntryPoints::FramebufferMultisample)
            }
            OglExtensionId::ArbMultitexture => Some(OglEntryPoints::Multitexture),
            OglExtensionId::ArbRobustness | OglExtensionId::KhrRobustness => {
                Some(OglEntryPoints::Robustness)
            }
            OglExtensionId::ArbSamplerObjects => Some(OglEntryPoints::Sampler),
            OglExtensionId::ArbSeparateShaderObjects => Some(OglEntryPoints::SeparateShaderObjects),
            OglExtensionId::ArbVertexArrayObject | OglExtensionId::OesVertexArrayObject => {
                Some(OglEntryPoints::VertexArray)
            }
            OglExtensionId::ArbVertexBufferObject => Some(OglEntryPoints::Buffer),
            OglExtensionId::ArbTextureFilterAnisotropic
            | OglExtensionId::ExtTextureFilterAnisotropic
            | OglExtensionId::ArbTextureNonPowerOfTwo
            | OglExtensionId::OesTextureNpot
            | OglExtensionId::SgisGenerateMipmap => None,
        }
    }
}

#[derive(Default)]
pub struct OglExtensionMgr {
    names: BTreeSet<String>,
    probed: HashMap<OglExtensionId, bool>,
}

impl OglExtensionMgr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the advertised extension names.
    pub fn initialize(&mut self, gl: &GlFns, version: &OglVersion) {
        self.uninitialize();

        let use_indexed = version.get_major() >= 3 && OglEntryPoints::StringI.are_resolved(gl);

        if use_indexed {
            self.names = get_indexed_names(gl);
        } else if let Some(list) = get_string(gl, GL_EXTENSIONS) {
            self.names = list.split_ascii_whitespace().map(str::to_string).collect();
        }

        debug!("[OGL] {} extension(s) advertised.", self.names.len());
    }

    pub fn uninitialize(&mut self) {
        self.names.clear();
        self.probed.clear();
    }

    pub fn get_count(&self) -> usize {
        self.names.len()
    }

    pub fn get_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Check an extension once and remember the answer.
    pub fn probe(&mut self, gl: &GlFns, id: OglExtensionId) -> bool {
        if let Some(&is_available) = self.probed.get(&id) {
            return is_available;
        }

        let is_available = self.has_name(id.name())
            && id.entry_points().map_or(true, |ep| ep.are_resolved(gl));

        debug!(
            "[OGL] Extension \"{}\": {}",
            id.name(),
            if is_available { "available" } else { "not available" }
        );

        self.probed.insert(id, is_available);
        is_available
    }

    /// Result of an earlier `probe`, false if never probed.
    pub fn has(&self, id: OglExtensionId) -> bool {
        self.probed.get(&id).copied().unwrap_or(false)
    }
}

fn get_indexed_names(gl: &GlFns) -> BTreeSet<String> {
    let mut names = BTreeSet::new();

    let get_stringi = match gl.get_stringi {
        Some(f) => f,
        None => return names,
    };

    let count = get_integer(gl, GL_NUM_EXTENSIONS).max(0) as GLuint;

    for i in 0..count {
        // SAFETY: index is below GL_NUM_EXTENSIONS; result is null or a static string.
        let name = unsafe {
            let ptr = get_stringi(GL_EXTENSIONS, i);
            if ptr.is_null() {
                continue;
            }
            CStr::from_ptr(ptr as *const c_char).to_string_lossy().into_owned()
        };
        names.insert(name);
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_gl::{self, FakeLoader};
    use crate::ogl::api::OglApi;

    fn init_api() -> OglApi {
        let mut api = OglApi::new();
        assert!(api.initialize(&mut FakeLoader::new()));
        api
    }

    #[test]
    fn test_string_list_on_legacy_context() {
        fake_gl::reset();
        fake_gl::with(|s| {
            s.set_version("2.1 Fake");
            s.set_extensions(&["GL_ARB_vertex_buffer_object", "GL_EXT_texture_filter_anisotropic"]);
        });

        let api = init_api();
        let mut mgr = OglExtensionMgr::new();
        mgr.initialize(api.gl().unwrap(), api.get_version());
        assert_eq!(mgr.get_count(), 2);
        assert!(mgr.has_name("GL_EXT_texture_filter_anisotropic"));
        assert!(!fake_gl::with(|s| s.calls.contains(&"glGetStringi")));
    }

    #[test]
    fn test_indexed_list_on_3x_context() {
        fake_gl::reset();
        fake_gl::with(|s| {
            s.set_version("3.3 Fake");
            s.set_extensions(&["GL_ARB_sampler_objects", "GL_ARB_robustness", "GL_KHR_robustness"]);
        });

        let api = init_api();
        let mut mgr = OglExtensionMgr::new();
        mgr.initialize(api.gl().unwrap(), api.get_version());
        assert_eq!(mgr.get_count(), 3);
        assert!(fake_gl::with(|s| s.calls.contains(&"glGetStringi")));
    }

    #[test]
    fn test_probe_requires_entry_points() {
        fake_gl::reset();
        fake_gl::with(|s| {
            s.set_extensions(&["GL_ARB_vertex_array_object", "GL_ARB_sampler_objects"]);
            s.hide_symbol("glBindVertexArray");
            s.hide_symbol("glBindVertexArrayOES");
            s.hide_symbol("glBindVertexArrayAPPLE");
        });

        let api = init_api();
        let gl = api.gl().unwrap();
        let mut mgr = OglExtensionMgr::new();
        mgr.initialize(gl, api.get_version());

        assert!(!mgr.probe(gl, OglExtensionId::ArbVertexArrayObject));
        assert!(mgr.probe(gl, OglExtensionId::ArbSamplerObjects));
        assert!(!mgr.probe(gl, OglExtensionId::SgisGenerateMipmap));
        assert!(mgr.has(OglExtensionId::ArbSamplerObjects));
        assert!(!mgr.has(OglExtensionId::ArbDirectStateAccess));
    }

    #[test]
    fn test_extension_names_are_unique() {
        let names: BTreeSet<_> = OglExtensionId::ALL.iter().map(|id| id.name()).collect();
        assert_eq!(names.len(), OglExtensionId::ALL.len());
    }
}
