// vertex_input.rs -- vertex layouts
//
// A vertex input names an index buffer and one attribute description per
// location. With vertex array objects the layout is recorded once; otherwise
// it is re-applied whenever the input is used for drawing.

use super::api::check_errors;
use super::buffer::OglBuffer;
use super::device_features::OglDeviceFeatures;
use super::gl::*;
use super::handle::{self, OglHandle};
use super::state::OglState;
use crate::r3r::*;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Which attribute model the current backend drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OglAttribModel {
    /// glVertexPointer/glColorPointer/glTexCoordPointer.
    FixedFunction,
    /// glVertexAttribPointer.
    Generic,
}

fn gl_component_type(format: R3rVertexAttribFormat) -> (GLenum, GLboolean) {
    match format {
        R3rVertexAttribFormat::Rgba8Unorm => (GL_UNSIGNED_BYTE, GL_TRUE),
        R3rVertexAttribFormat::Rg32Sfloat | R3rVertexAttribFormat::Rgb32Sfloat => (GL_FLOAT, GL_FALSE),
    }
}

fn client_array(location: R3rVertexAttribLocation) -> GLenum {
    match location {
        R3rVertexAttribLocation::Position => GL_VERTEX_ARRAY,
        R3rVertexAttribLocation::Color => GL_COLOR_ARRAY,
        R3rVertexAttribLocation::TexCoords => GL_TEXTURE_COORD_ARRAY,
    }
}

pub struct OglVertexInput {
    index_buffer: Option<R3rBufferId>,
    attrib_descrs: Vec<R3rVertexAttribDescr>,
    vao: Option<OglHandle>,
}

impl OglVertexInput {
    pub fn new(
        gl: &Rc<GlFns>,
        r3r_features: &R3rDeviceFeatures,
        ogl_features: &OglDeviceFeatures,
        state: &mut OglState,
        model: OglAttribModel,
        buffers: &BTreeMap<u32, OglBuffer>,
        param: &R3rVertexInputInitParam,
    ) -> R3rResult<Self> {
        validate_param(r3r_features, buffers, param)?;

        let mut input = Self {
            index_buffer: param.index_buffer,
            attrib_descrs: param.attrib_descrs.clone(),
            vao: None,
        };

        input.recreate(gl, ogl_features, state, model, buffers)?;
        Ok(input)
    }

    pub fn index_buffer(&self) -> Option<R3rBufferId> {
        self.index_buffer
    }

    pub fn attrib_descrs(&self) -> &[R3rVertexAttribDescr] {
        &self.attrib_descrs
    }

    /// True if the input refers to `buffer`.
    pub fn uses_buffer(&self, buffer: R3rBufferId) -> bool {
        self.index_buffer == Some(buffer) || self.attrib_descrs.iter().any(|d| d.vertex_buffer == Some(buffer))
    }

    /// Make this input current for drawing.
    pub fn bind(
        &self,
        gl: &GlFns,
        state: &mut OglState,
        model: OglAttribModel,
        buffers: &BTreeMap<u32, OglBuffer>,
    ) -> R3rResult<()> {
        match self.vao.as_ref() {
            Some(vao) => {
                state.bind_vertex_array(gl, vao.get());
                // Current attribute values are context state, not array state.
                self.apply_defaults(gl, model);
                Ok(())
            }
            None => self.apply(gl, state, model, buffers),
        }
    }

    pub fn recreate(
        &mut self,
        gl: &Rc<GlFns>,
        features: &OglDeviceFeatures,
        state: &mut OglState,
        model: OglAttribModel,
        buffers: &BTreeMap<u32, OglBuffer>,
    ) -> R3rResult<()> {
        self.vao = None;

        if !features.is_vao_available {
            return Ok(());
        }

        let gen = gl
            .gen_vertex_arrays
            .ok_or_else(|| R3rError::contract("Vertex array objects not available."))?;

        let name = handle::gen_name(gen);
        if name == 0 {
            return Err(R3rError::contract("Failed to create a vertex array object."));
        }

        self.vao = Some(OglHandle::new(gl, name, handle::delete_vertex_array));
        state.bind_vertex_array(gl, name);
        self.apply(gl, state, model, buffers)?;
        state.bind_vertex_array(gl, 0);
        check_errors(gl, "glBindVertexArray")
    }

    pub fn release(&mut self) {
        self.vao = None;
    }

    pub fn abandon(&mut self) {
        if let Some(vao) = self.vao.as_mut() {
            vao.abandon();
        }
    }

    fn apply(
        &self,
        gl: &GlFns,
        state: &mut OglState,
        model: OglAttribModel,
        buffers: &BTreeMap<u32, OglBuffer>,
    ) -> R3rResult<()> {
        for descr in &self.attrib_descrs {
            if descr.is_default {
                disable_array(gl, model, descr.location);
                continue;
            }

            let buffer = descr
                .vertex_buffer
                .and_then(|id| buffers.get(&id.get()))
                .ok_or_else(|| R3rError::contract("Vertex buffer of an attribute was destroyed."))?;

            buffer.bind(gl, state);
            let ptr = buffer.data_pointer(descr.offset);
            let components = descr.format.component_count();
            let (kind, normalized) = gl_component_type(descr.format);
            let stride = descr.stride as GLsizei;

            // SAFETY: `ptr` is an offset into the bound buffer, or an address
            // into a shadow copy that outlives the draw.
            unsafe {
                match model {
                    OglAttribModel::Generic => {
                        let index = descr.location.index();
                        if let (Some(enable), Some(pointer)) = (gl.enable_vertex_attrib_array, gl.vertex_attrib_pointer) {
                            enable(index);
                            pointer(index, components, kind, normalized, stride, ptr);
                        }
                    }
                    OglAttribModel::FixedFunction => {
                        if let Some(enable) = gl.enable_client_state {
                            enable(client_array(descr.location));
                        }

                        let pointer = match descr.location {
                            R3rVertexAttribLocation::Position => gl.vertex_pointer,
                            R3rVertexAttribLocation::Color => gl.color_pointer,
                            R3rVertexAttribLocation::TexCoords => gl.tex_coord_pointer,
                        };

                        if let Some(pointer) = pointer {
                            pointer(components, kind, stride, ptr);
                        }
                    }
                }
            }
        }

        self.apply_defaults(gl, model);

        match self.index_buffer.and_then(|id| buffers.get(&id.get())) {
            Some(buffer) => buffer.bind(gl, state),
            None => state.bind_buffer(gl, GL_ELEMENT_ARRAY_BUFFER, 0),
        }

        Ok(())
    }

    fn apply_defaults(&self, gl: &GlFns, model: OglAttribModel) {
        for descr in self.attrib_descrs.iter().filter(|d| d.is_default) {
            let value = descr.default_value;

            // SAFETY: `value` holds four floats.
            unsafe {
                match model {
                    OglAttribModel::Generic => {
                        if let Some(f) = gl.vertex_attrib4fv {
                            f(descr.location.index(), value.as_ptr());
                        }
                    }
                    OglAttribModel::FixedFunction => {
                        if descr.location == R3rVertexAttribLocation::Color {
                            if let Some(f) = gl.color4f {
                                f(value[0], value[1], value[2], value[3]);
                            }
                        }
                    }
                }
            }
        }
    }
}

fn disable_array(gl: &GlFns, model: OglAttribModel, location: R3rVertexAttribLocation) {
    // SAFETY: plain index/enum arguments.
    unsafe {
        match model {
            OglAttribModel::Generic => {
                if let Some(f) = gl.disable_vertex_attrib_array {
                    f(location.index());
                }
            }
            OglAttribModel::FixedFunction => {
                if let Some(f) = gl.disable_client_state {
                    f(client_array(location));
                }
            }
        }
    }
}

fn validate_param(
    features: &R3rDeviceFeatures,
    buffers: &BTreeMap<u32, OglBuffer>,
    param: &R3rVertexInputInitParam,
) -> R3rResult<()> {
    if let Some(id) = param.index_buffer {
        match buffers.get(&id.get()) {
            Some(b) if b.kind() == R3rBufferType::Index => {}
            Some(_) => return Err(R3rError::contract(format!("{} is not an index buffer.", id))),
            None => return Err(R3rError::UnknownResource(R3rBufferId::KIND, id.get())),
        }
    }

    let mut used_locations = Vec::with_capacity(param.attrib_descrs.len());

    for descr in &param.attrib_descrs {
        let index = descr.location.index();

        if index as i32 >= features.max_vertex_input_locations {
            return Err(R3rError::contract(format!("Attribute location {} out of range.", index)));
        }

        if used_locations.contains(&index) {
            return Err(R3rError::contract(format!("Duplicate attribute location {}.", index)));
        }
        used_locations.push(index);

        if descr.is_default {
            continue;
        }

        let id = descr
            .vertex_buffer
            .ok_or_else(|| R3rError::contract(format!("No vertex buffer for attribute location {}.", index)))?;

        let buffer = buffers
            .get(&id.get())
            .ok_or(R3rError::UnknownResource(R3rBufferId::KIND, id.get()))?;

        if buffer.kind() != R3rBufferType::Vertex {
            return Err(R3rError::contract(format!("{} is not a vertex buffer.", id)));
        }

        if descr.offset + descr.format.size() > buffer.size() {
            return Err(R3rError::contract(format!("Attribute location {} offset out of range.", index)));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_gl::{self, FakeLoader};
    use crate::ogl::api::OglApi;

    struct Setup {
        gl: Rc<GlFns>,
        r3r: R3rDeviceFeatures,
        ogl: OglDeviceFeatures,
        state: OglState,
        buffers: BTreeMap<u32, OglBuffer>,
    }

    fn setup(is_vao_available: bool) -> Setup {
        let mut api = OglApi::new();
        assert!(api.initialize(&mut FakeLoader::new()));
        let gl = api.gl().unwrap().clone();
        let r3r = R3rDeviceFeatures {
            max_vertex_input_locations: 16,
            ..R3rDeviceFeatures::default()
        };
        let ogl = OglDeviceFeatures {
            is_buffer_available: true,
            is_vao_available,
            ..OglDeviceFeatures::default()
        };
        let mut state = OglState::new();
        let mut buffers = BTreeMap::new();

        let init = |size| R3rBufferInitParam {
            usage: R3rBufferUsage::StaticDraw,
            size,
        };
        buffers.insert(1, OglBuffer::new(&gl, &ogl, &mut state, R3rBufferType::Index, &init(12)).unwrap());
        buffers.insert(2, OglBuffer::new(&gl, &ogl, &mut state, R3rBufferType::Vertex, &init(96)).unwrap());

        Setup { gl, r3r, ogl, state, buffers }
    }

    fn descr(location: R3rVertexAttribLocation, format: R3rVertexAttribFormat, offset: usize) -> R3rVertexAttribDescr {
        R3rVertexAttribDescr {
            is_default: false,
            location,
            format,
            vertex_buffer: Some(R3rBufferId(2)),
            offset,
            stride: 24,
            default_value: [0.0; 4],
        }
    }

    fn param() -> R3rVertexInputInitParam {
        R3rVertexInputInitParam {
            index_buffer: Some(R3rBufferId(1)),
            attrib_descrs: vec![
                descr(R3rVertexAttribLocation::Position, R3rVertexAttribFormat::Rgb32Sfloat, 0),
                descr(R3rVertexAttribLocation::Color, R3rVertexAttribFormat::Rgba8Unorm, 12),
                descr(R3rVertexAttribLocation::TexCoords, R3rVertexAttribFormat::Rg32Sfloat, 16),
            ],
        }
    }

    #[test]
    fn test_generic_layout_without_vao() {
        fake_gl::reset();
        let mut s = setup(false);

        let input = OglVertexInput::new(&s.gl, &s.r3r, &s.ogl, &mut s.state, OglAttribModel::Generic, &s.buffers, &param())
            .unwrap();
        input.bind(&s.gl, &mut s.state, OglAttribModel::Generic, &s.buffers).unwrap();

        let pointers = fake_gl::with(|st| st.attrib_pointers.clone());
        assert_eq!(pointers[&0].size, 3);
        assert_eq!(pointers[&1].offset, 12);
        assert!(pointers[&1].normalized);
        assert_eq!(pointers[&2].stride, 24);
    }

    #[test]
    fn test_vao_records_layout_once() {
        fake_gl::reset();
        let mut s = setup(true);

        let input = OglVertexInput::new(&s.gl, &s.r3r, &s.ogl, &mut s.state, OglAttribModel::Generic, &s.buffers, &param())
            .unwrap();

        let pointer_calls = fake_gl::with(|st| st.calls.iter().filter(|c| **c == "glVertexAttribPointer").count());
        input.bind(&s.gl, &mut s.state, OglAttribModel::Generic, &s.buffers).unwrap();
        let after = fake_gl::with(|st| st.calls.iter().filter(|c| **c == "glVertexAttribPointer").count());
        assert_eq!(pointer_calls, 3);
        assert_eq!(after, 3);
    }

    #[test]
    fn test_fixed_function_layout() {
        fake_gl::reset();
        let mut s = setup(false);

        let mut p = param();
        p.attrib_descrs[1] = R3rVertexAttribDescr {
            is_default: true,
            vertex_buffer: None,
            default_value: [1.0, 0.5, 0.25, 1.0],
            ..p.attrib_descrs[1].clone()
        };

        let input =
            OglVertexInput::new(&s.gl, &s.r3r, &s.ogl, &mut s.state, OglAttribModel::FixedFunction, &s.buffers, &p)
                .unwrap();
        input.bind(&s.gl, &mut s.state, OglAttribModel::FixedFunction, &s.buffers).unwrap();

        fake_gl::with(|st| {
            assert!(st.client_states.contains(&GL_VERTEX_ARRAY));
            assert!(st.client_states.contains(&GL_TEXTURE_COORD_ARRAY));
            assert!(!st.client_states.contains(&GL_COLOR_ARRAY));
            assert_eq!(st.current_color, [1.0, 0.5, 0.25, 1.0]);
        });
    }

    #[test]
    fn test_duplicate_location_rejected() {
        fake_gl::reset();
        let mut s = setup(false);

        let mut p = param();
        p.attrib_descrs[2].location = R3rVertexAttribLocation::Position;
        let result = OglVertexInput::new(&s.gl, &s.r3r, &s.ogl, &mut s.state, OglAttribModel::Generic, &s.buffers, &p);
        assert!(matches!(result, Err(R3rError::Contract(_))));
    }

    #[test]
    fn test_wrong_buffer_kind_rejected() {
        fake_gl::reset();
        let mut s = setup(false);

        let mut p = param();
        p.index_buffer = Some(R3rBufferId(2));
        assert!(OglVertexInput::new(&s.gl, &s.r3r, &s.ogl, &mut s.state, OglAttribModel::Generic, &s.buffers, &p).is_err());

        let mut p = param();
        p.attrib_descrs[0].vertex_buffer = Some(R3rBufferId(9));
        let result = OglVertexInput::new(&s.gl, &s.r3r, &s.ogl, &mut s.state, OglAttribModel::Generic, &s.buffers, &p);
        assert_eq!(result.err(), Some(R3rError::UnknownResource("buffer", 9)));
    }
}
