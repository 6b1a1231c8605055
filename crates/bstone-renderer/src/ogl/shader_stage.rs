//! Linked shader programs.
//!
//! A stage pairs one vertex and one fragment shader. Attribute locations
//! requested by the caller are bound before linking; after linking every
//! active attribute and uniform is introspected into an `OglShaderVar`,
//! addressed by its position in the stage's variable list.

use super::gl::*;
use super::handle::{self, OglHandle};
use super::shader::{program_info_log, OglShader};
use super::state::OglState;
use crate::r3r::*;
use log::{debug, error};
use std::collections::{BTreeMap, HashSet};
use std::ffi::CString;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
pub struct OglShaderVar {
    pub kind: R3rShaderVarKind,
    pub type_id: R3rShaderVarTypeId,
    pub value_size: usize,
    pub name: String,
    /// Attribute location, or -1 for uniforms.
    pub input_index: i32,
    pub gl_location: GLint,
    pub stage: R3rShaderStageId,
    cached_value: Option<R3rShaderVarValue>,
}

/// Map a GL type enum onto the engine's variable types.
pub fn var_type_id(gl_type: GLenum) -> Option<R3rShaderVarTypeId> {
    match gl_type {
        GL_INT => Some(R3rShaderVarTypeId::Int32),
        GL_FLOAT => Some(R3rShaderVarTypeId::Float32),
        GL_FLOAT_VEC2 => Some(R3rShaderVarTypeId::Vec2),
        GL_FLOAT_VEC3 => Some(R3rShaderVarTypeId::Vec3),
        GL_FLOAT_VEC4 => Some(R3rShaderVarTypeId::Vec4),
        GL_FLOAT_MAT4 => Some(R3rShaderVarTypeId::Mat4),
        GL_SAMPLER_2D => Some(R3rShaderVarTypeId::Sampler2d),
        _ => None,
    }
}

/// Check requested attribute bindings before any GL work.
///
/// Names must be unique, indices must be unique and non-negative.
pub fn validate_input_bindings(bindings: &[R3rShaderStageInputBinding]) -> R3rResult<()> {
    let mut names = HashSet::with_capacity(bindings.len());
    let mut indices = HashSet::with_capacity(bindings.len());

    for binding in bindings {
        if binding.name.is_empty() {
            return Err(R3rError::InvalidBinding("Empty input name.".to_string()));
        }

        if binding.index < 0 {
            return Err(R3rError::InvalidBinding(format!(
                "Negative index {} for \"{}\".",
                binding.index, binding.name
            )));
        }

        if !names.insert(binding.name.as_str()) {
            return Err(R3rError::InvalidBinding(format!("Duplicate input name \"{}\".", binding.name)));
        }

        if !indices.insert(binding.index) {
            return Err(R3rError::InvalidBinding(format!("Duplicate input index {}.", binding.index)));
        }
    }

    Ok(())
}

pub struct OglShaderStage {
    id: R3rShaderStageId,
    vertex_shader: R3rShaderId,
    fragment_shader: R3rShaderId,
    input_bindings: Vec<R3rShaderStageInputBinding>,
    vars: Vec<OglShaderVar>,
    handle: OglHandle,
}

impl OglShaderStage {
    pub fn new(
        gl: &Rc<GlFns>,
        id: R3rShaderStageId,
        shaders: &BTreeMap<u32, OglShader>,
        param: &R3rShaderStageInitParam,
    ) -> R3rResult<Self> {
        lookup_shader(shaders, param.vertex_shader, R3rShaderType::Vertex)?;
        lookup_shader(shaders, param.fragment_shader, R3rShaderType::Fragment)?;
        validate_input_bindings(&param.input_bindings)?;

        let mut stage = Self {
            id,
            vertex_shader: param.vertex_shader,
            fragment_shader: param.fragment_shader,
            input_bindings: param.input_bindings.clone(),
            vars: Vec::new(),
            handle: OglHandle::new(gl, 0, handle::delete_program),
        };

        stage.link(gl, shaders)?;
        Ok(stage)
    }

    pub fn id(&self) -> R3rShaderStageId {
        self.id
    }

    pub fn gl_name(&self) -> GLuint {
        self.handle.get()
    }

    pub fn vars(&self) -> &[OglShaderVar] {
        &self.vars
    }

    pub fn uses_shader(&self, shader: R3rShaderId) -> bool {
        self.vertex_shader == shader || self.fragment_shader == shader
    }

    pub fn find_var(&self, name: &str) -> Option<R3rShaderVarId> {
        self.vars.iter().position(|v| v.name == name).map(|index| R3rShaderVarId {
            stage: self.id,
            index: index as u32,
        })
    }

    pub fn var(&self, id: R3rShaderVarId) -> Option<&OglShaderVar> {
        if id.stage != self.id {
            return None;
        }
        self.vars.get(id.index as usize)
    }

    /// Type-check and store a uniform value.
    ///
    /// The stage is made current for the call and the previous program is
    /// restored afterwards. A value equal to the cached one is skipped.
    pub fn set_uniform(
        &mut self,
        state: &mut OglState,
        id: R3rShaderVarId,
        value: R3rShaderVarValue,
    ) -> R3rResult<()> {
        if id.stage != self.id {
            return Err(R3rError::UnknownResource(R3rShaderVarId::KIND, id.index));
        }

        let program = self.handle.get();
        let gl = self.handle.gl();

        let var = self
            .vars
            .get_mut(id.index as usize)
            .ok_or(R3rError::UnknownResource(R3rShaderVarId::KIND, id.index))?;

        if var.kind == R3rShaderVarKind::Attribute {
            return Err(mismatch(format!("\"{}\" is an attribute.", var.name)));
        }

        if value.type_id() != var.type_id || value.value_size() != var.value_size {
            return Err(mismatch(format!(
                "\"{}\" expects {:?} ({} bytes), got {:?} ({} bytes).",
                var.name,
                var.type_id,
                var.value_size,
                value.type_id(),
                value.value_size()
            )));
        }

        if var.cached_value == Some(value) {
            return Ok(());
        }

        let previous = state.program();
        state.use_program(gl, program);

        let location = var.gl_location;

        // SAFETY: array arguments point at exactly one value of the checked type.
        unsafe {
            match value {
                R3rShaderVarValue::Int32(v) | R3rShaderVarValue::Sampler2d(v) => {
                    if let Some(f) = gl.uniform1i {
                        f(location, v);
                    }
                }
                R3rShaderVarValue::Float32(v) => {
                    if let Some(f) = gl.uniform1f {
                        f(location, v);
                    }
                }
                R3rShaderVarValue::Vec2(v) => {
                    if let Some(f) = gl.uniform2fv {
                        f(location, 1, v.as_ptr());
                    }
                }
                R3rShaderVarValue::Vec4(v) => {
                    if let Some(f) = gl.uniform4fv {
                        f(location, 1, v.as_ptr());
                    }
                }
                R3rShaderVarValue::Mat4(v) => {
                    if let Some(f) = gl.uniform_matrix4fv {
                        f(location, 1, GL_FALSE, v.as_ptr());
                    }
                }
            }
        }

        var.cached_value = Some(value);

        if let Some(previous) = previous {
            state.use_program(gl, previous);
        }

        Ok(())
    }

    /// Relink against the (already recreated) shaders.
    ///
    /// Variables keep their positions, so previously handed out variable
    /// ids stay valid.
    pub fn recreate(&mut self, gl: &Rc<GlFns>, shaders: &BTreeMap<u32, OglShader>) -> R3rResult<()> {
        let old_names: Vec<String> = self.vars.iter().map(|v| v.name.clone()).collect();

        self.link(gl, shaders)?;

        if old_names.is_empty() {
            return Ok(());
        }

        let mut reordered = Vec::with_capacity(self.vars.len());
        for name in &old_names {
            let position = self
                .vars
                .iter()
                .position(|v| &v.name == name)
                .ok_or_else(|| R3rError::contract(format!("Variable \"{}\" vanished after relink.", name)))?;
            reordered.push(self.vars.swap_remove(position));
        }
        reordered.append(&mut self.vars);
        self.vars = reordered;
        Ok(())
    }

    pub fn release(&mut self) {
        self.handle.reset();
    }

    pub fn abandon(&mut self) {
        self.handle.abandon();
    }

    fn link(&mut self, gl: &Rc<GlFns>, shaders: &BTreeMap<u32, OglShader>) -> R3rResult<()> {
        self.handle.reset();
        self.vars.clear();

        let vertex = lookup_shader(shaders, self.vertex_shader, R3rShaderType::Vertex)?.gl_name();
        let fragment = lookup_shader(shaders, self.fragment_shader, R3rShaderType::Fragment)?.gl_name();

        let (create, attach, detach, bind_location, link, get_iv) = match (
            gl.create_program,
            gl.attach_shader,
            gl.detach_shader,
            gl.bind_attrib_location,
            gl.link_program,
            gl.get_programiv,
        ) {
            (Some(a), Some(b), Some(c), Some(d), Some(e), Some(f)) => (a, b, c, d, e, f),
            _ => return Err(R3rError::contract("Shader programs not available.")),
        };

        // SAFETY: no arguments.
        let program = unsafe { create() };
        if program == 0 {
            return Err(R3rError::contract("Failed to create a program object."));
        }

        let handle = OglHandle::new(gl, program, handle::delete_program);

        let mut status: GLint = 0;

        // SAFETY: names are live objects; strings are NUL-terminated.
        unsafe {
            attach(program, vertex);
            attach(program, fragment);

            for binding in &self.input_bindings {
                let c_name = CString::new(binding.name.as_str())
                    .map_err(|_| R3rError::InvalidBinding(format!("Bad input name \"{}\".", binding.name)))?;
                bind_location(program, binding.index as GLuint, c_name.as_ptr());
            }

            link(program);
            get_iv(program, GL_LINK_STATUS, &mut status);

            detach(program, vertex);
            detach(program, fragment);
        }

        if status == 0 {
            return Err(R3rError::ShaderLink {
                message: "Failed to link a program.".to_string(),
                info_log: program_info_log(gl, program),
            });
        }

        let mut vars = introspect(gl, program, self.id, R3rShaderVarKind::Attribute)?;
        vars.extend(introspect(gl, program, self.id, R3rShaderVarKind::Uniform)?);

        for binding in &self.input_bindings {
            match vars.iter().find(|v| v.name == binding.name) {
                Some(v) if v.kind == R3rShaderVarKind::Attribute => {}
                Some(_) => {
                    return Err(R3rError::InvalidBinding(format!(
                        "\"{}\" is not an attribute.",
                        binding.name
                    )))
                }
                None => {
                    return Err(R3rError::InvalidBinding(format!(
                        "Attribute \"{}\" not found.",
                        binding.name
                    )))
                }
            }
        }

        debug!("[OGL] Linked program {} with {} variable(s).", program, vars.len());

        self.vars = vars;
        self.handle = handle;
        Ok(())
    }
}

fn mismatch(message: String) -> R3rError {
    error!("[OGL] {}", message);
    R3rError::UniformMismatch(message)
}

fn lookup_shader(
    shaders: &BTreeMap<u32, OglShader>,
    id: R3rShaderId,
    kind: R3rShaderType,
) -> R3rResult<&OglShader> {
    let shader = shaders
        .get(&id.get())
        .ok_or(R3rError::UnknownResource(R3rShaderId::KIND, id.get()))?;

    if shader.kind() != kind {
        return Err(R3rError::contract(format!("Expected a {} shader for {}.", kind.name(), id)));
    }

    Ok(shader)
}

fn introspect(
    gl: &GlFns,
    program: GLuint,
    stage: R3rShaderStageId,
    kind: R3rShaderVarKind,
) -> R3rResult<Vec<OglShaderVar>> {
    let (count_enum, max_length_enum) = match kind {
        R3rShaderVarKind::Attribute => (GL_ACTIVE_ATTRIBUTES, GL_ACTIVE_ATTRIBUTE_MAX_LENGTH),
        _ => (GL_ACTIVE_UNIFORMS, GL_ACTIVE_UNIFORM_MAX_LENGTH),
    };

    let (get_iv, get_active, get_location) = match kind {
        R3rShaderVarKind::Attribute => (gl.get_programiv, gl.get_active_attrib, gl.get_attrib_location),
        _ => (gl.get_programiv, gl.get_active_uniform, gl.get_uniform_location),
    };

    let (get_iv, get_active, get_location) = match (get_iv, get_active, get_location) {
        (Some(a), Some(b), Some(c)) => (a, b, c),
        _ => return Err(R3rError::contract("Program introspection not available.")),
    };

    let mut count: GLint = 0;
    let mut max_length: GLint = 0;

    // SAFETY: one integer is written per call.
    unsafe {
        get_iv(program, count_enum, &mut count);
        get_iv(program, max_length_enum, &mut max_length);
    }

    let mut vars = Vec::with_capacity(count.max(0) as usize);
    let mut name_buffer = vec![0u8; max_length.max(1) as usize];

    for i in 0..count.max(0) as GLuint {
        let mut length: GLsizei = 0;
        let mut size: GLint = 0;
        let mut gl_type: GLenum = 0;

        // SAFETY: `name_buffer` holds `max_length` bytes.
        unsafe {
            get_active(
                program,
                i,
                name_buffer.len() as GLsizei,
                &mut length,
                &mut size,
                &mut gl_type,
                name_buffer.as_mut_ptr() as *mut GLchar,
            );
        }

        let length = length.clamp(0, name_buffer.len() as GLsizei) as usize;
        let name = String::from_utf8_lossy(&name_buffer[..length]).into_owned();

        if name.starts_with("gl_") {
            continue;
        }

        if size != 1 {
            return Err(R3rError::contract(format!("Array variable \"{}\" not supported.", name)));
        }

        let type_id = var_type_id(gl_type)
            .ok_or_else(|| R3rError::contract(format!("Unsupported type 0x{:04X} of \"{}\".", gl_type, name)))?;

        let c_name = CString::new(name.as_str())
            .map_err(|_| R3rError::contract(format!("Bad variable name \"{}\".", name)))?;
        // SAFETY: NUL-terminated name.
        let location = unsafe { get_location(program, c_name.as_ptr()) };

        let var_kind = match (kind, type_id) {
            (R3rShaderVarKind::Attribute, _) => R3rShaderVarKind::Attribute,
            (_, R3rShaderVarTypeId::Sampler2d) => R3rShaderVarKind::Sampler,
            _ => R3rShaderVarKind::Uniform,
        };

        vars.push(OglShaderVar {
            kind: var_kind,
            type_id,
            value_size: type_id.value_size(),
            name,
            input_index: if var_kind == R3rShaderVarKind::Attribute { location } else { -1 },
            gl_location: location,
            stage,
            cached_value: None,
        });
    }

    Ok(vars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_gl::{self, FakeLoader, FakeVar};
    use crate::ogl::api::OglApi;

    fn gl() -> Rc<GlFns> {
        let mut api = OglApi::new();
        assert!(api.initialize(&mut FakeLoader::new()));
        api.gl().unwrap().clone()
    }

    fn shaders(gl: &Rc<GlFns>) -> BTreeMap<u32, OglShader> {
        let mut map = BTreeMap::new();
        let vs = R3rShaderInitParam {
            kind: R3rShaderType::Vertex,
            source: "vs",
        };
        let fs = R3rShaderInitParam {
            kind: R3rShaderType::Fragment,
            source: "fs",
        };
        map.insert(1, OglShader::new(gl, &vs).unwrap());
        map.insert(2, OglShader::new(gl, &fs).unwrap());
        map
    }

    fn param(bindings: Vec<R3rShaderStageInputBinding>) -> R3rShaderStageInitParam {
        R3rShaderStageInitParam {
            vertex_shader: R3rShaderId(1),
            fragment_shader: R3rShaderId(2),
            input_bindings: bindings,
        }
    }

    fn default_bindings() -> Vec<R3rShaderStageInputBinding> {
        vec![
            R3rShaderStageInputBinding::new(0, "a_position"),
            R3rShaderStageInputBinding::new(1, "a_color"),
        ]
    }

    fn program_vars() {
        fake_gl::with(|s| {
            s.next_attributes = vec![
                FakeVar::new("a_position", GL_FLOAT_VEC3),
                FakeVar::new("a_color", GL_FLOAT_VEC4),
            ];
            s.next_uniforms = vec![
                FakeVar::new("u_model_view_projection", GL_FLOAT_MAT4),
                FakeVar::new("u_sampler", GL_SAMPLER_2D),
                FakeVar::new("u_shading_mode", GL_INT),
            ];
        });
    }

    // ============================================================
    // Binding validation
    // ============================================================

    #[test]
    fn test_validate_duplicate_name() {
        let bindings = vec![
            R3rShaderStageInputBinding::new(0, "a"),
            R3rShaderStageInputBinding::new(1, "a"),
        ];
        assert!(matches!(validate_input_bindings(&bindings), Err(R3rError::InvalidBinding(_))));
    }

    #[test]
    fn test_validate_duplicate_index() {
        let bindings = vec![
            R3rShaderStageInputBinding::new(2, "a"),
            R3rShaderStageInputBinding::new(2, "b"),
        ];
        assert!(matches!(validate_input_bindings(&bindings), Err(R3rError::InvalidBinding(_))));
    }

    #[test]
    fn test_validate_negative_index() {
        let bindings = vec![R3rShaderStageInputBinding::new(-1, "a")];
        assert!(matches!(validate_input_bindings(&bindings), Err(R3rError::InvalidBinding(_))));
    }

    #[test]
    fn test_invalid_bindings_create_no_program() {
        fake_gl::reset();
        let gl = gl();
        let shaders = shaders(&gl);

        let bindings = vec![
            R3rShaderStageInputBinding::new(0, "a_position"),
            R3rShaderStageInputBinding::new(0, "a_color"),
        ];
        let result = OglShaderStage::new(&gl, R3rShaderStageId(1), &shaders, &param(bindings));
        assert!(matches!(result, Err(R3rError::InvalidBinding(_))));
        assert!(!fake_gl::with(|s| s.calls.contains(&"glCreateProgram")));
    }

    // ============================================================
    // Linking and introspection
    // ============================================================

    #[test]
    fn test_link_and_introspect() {
        fake_gl::reset();
        program_vars();
        let gl = gl();
        let shaders = shaders(&gl);

        let stage = OglShaderStage::new(&gl, R3rShaderStageId(1), &shaders, &param(default_bindings())).unwrap();

        assert_eq!(stage.vars().len(), 5);
        let position = stage.var(stage.find_var("a_position").unwrap()).unwrap();
        assert_eq!(position.kind, R3rShaderVarKind::Attribute);
        assert_eq!(position.type_id, R3rShaderVarTypeId::Vec3);
        assert_eq!(position.input_index, 0);

        let sampler = stage.var(stage.find_var("u_sampler").unwrap()).unwrap();
        assert_eq!(sampler.kind, R3rShaderVarKind::Sampler);

        let mvp = stage.var(stage.find_var("u_model_view_projection").unwrap()).unwrap();
        assert_eq!(mvp.kind, R3rShaderVarKind::Uniform);
        assert_eq!(mvp.value_size, 64);

        let bound = fake_gl::with(|s| s.programs[&stage.gl_name()].bound_attribs.clone());
        assert_eq!(bound.get("a_color"), Some(&1));
    }

    #[test]
    fn test_link_failure_carries_log() {
        fake_gl::reset();
        program_vars();
        let gl = gl();
        let shaders = shaders(&gl);
        fake_gl::with(|s| s.link_fails = true);

        match OglShaderStage::new(&gl, R3rShaderStageId(1), &shaders, &param(default_bindings())) {
            Err(R3rError::ShaderLink { info_log, .. }) => assert_eq!(info_log, fake_gl::FAKE_LINK_LOG),
            _ => panic!("expected a link error"),
        }
    }

    #[test]
    fn test_binding_must_name_an_attribute() {
        fake_gl::reset();
        program_vars();
        let gl = gl();
        let shaders = shaders(&gl);

        let bindings = vec![R3rShaderStageInputBinding::new(0, "u_sampler")];
        let result = OglShaderStage::new(&gl, R3rShaderStageId(1), &shaders, &param(bindings));
        assert!(matches!(result, Err(R3rError::InvalidBinding(_))));

        let bindings = vec![R3rShaderStageInputBinding::new(0, "a_missing")];
        let result = OglShaderStage::new(&gl, R3rShaderStageId(1), &shaders, &param(bindings));
        assert!(matches!(result, Err(R3rError::InvalidBinding(_))));
    }

    #[test]
    fn test_swapped_shader_kinds_rejected() {
        fake_gl::reset();
        let gl = gl();
        let shaders = shaders(&gl);

        let p = R3rShaderStageInitParam {
            vertex_shader: R3rShaderId(2),
            fragment_shader: R3rShaderId(1),
            input_bindings: Vec::new(),
        };
        assert!(matches!(
            OglShaderStage::new(&gl, R3rShaderStageId(1), &shaders, &p),
            Err(R3rError::Contract(_))
        ));
    }

    // ============================================================
    // Uniforms
    // ============================================================

    #[test]
    fn test_set_uniform_checks_type() {
        fake_gl::reset();
        program_vars();
        let gl = gl();
        let shaders = shaders(&gl);
        let mut state = OglState::new();

        let mut stage = OglShaderStage::new(&gl, R3rShaderStageId(1), &shaders, &param(default_bindings())).unwrap();
        let mode = stage.find_var("u_shading_mode").unwrap();

        let result = stage.set_uniform(&mut state, mode, R3rShaderVarValue::Float32(1.0));
        assert!(matches!(result, Err(R3rError::UniformMismatch(_))));

        let position = stage.find_var("a_position").unwrap();
        let result = stage.set_uniform(&mut state, position, R3rShaderVarValue::Vec4([0.0; 4]));
        assert!(matches!(result, Err(R3rError::UniformMismatch(_))));
    }

    #[test]
    fn test_set_uniform_is_cached_and_restores_program() {
        fake_gl::reset();
        program_vars();
        let gl = gl();
        let shaders = shaders(&gl);
        let mut state = OglState::new();

        let mut stage = OglShaderStage::new(&gl, R3rShaderStageId(1), &shaders, &param(default_bindings())).unwrap();
        let mode = stage.find_var("u_shading_mode").unwrap();

        state.use_program(&gl, 77);
        stage.set_uniform(&mut state, mode, R3rShaderVarValue::Int32(1)).unwrap();
        stage.set_uniform(&mut state, mode, R3rShaderVarValue::Int32(1)).unwrap();

        assert_eq!(fake_gl::with(|s| s.uniform_calls.len()), 1);
        assert_eq!(state.program(), Some(77));
        assert_eq!(fake_gl::with(|s| s.current_program), 77);
    }

    #[test]
    fn test_recreate_keeps_variable_ids() {
        fake_gl::reset();
        program_vars();
        let gl = gl();
        let mut shaders = shaders(&gl);

        let mut stage = OglShaderStage::new(&gl, R3rShaderStageId(1), &shaders, &param(default_bindings())).unwrap();
        let sampler = stage.find_var("u_sampler").unwrap();

        // The driver reports variables in a different order after relinking.
        fake_gl::with(|s| {
            s.next_uniforms.reverse();
            s.next_attributes.reverse();
        });

        for shader in shaders.values_mut() {
            shader.recreate(&gl).unwrap();
        }
        stage.recreate(&gl, &shaders).unwrap();

        assert_eq!(stage.var(sampler).unwrap().name, "u_sampler");
    }
}
