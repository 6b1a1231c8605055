// buffer.rs -- index and vertex buffers
//
// Every buffer keeps a CPU shadow of its contents. It is the source for
// restoring the GL buffer after a device reset, and it is the storage itself
// on 1.x contexts without buffer objects, where draws read client memory.

use super::api::check_errors;
use super::device_features::OglDeviceFeatures;
use super::gl::*;
use super::handle::{self, OglHandle};
use super::state::OglState;
use crate::r3r::*;
use log::debug;
use std::os::raw::c_void;
use std::rc::Rc;

pub fn gl_usage(usage: R3rBufferUsage) -> GLenum {
    match usage {
        R3rBufferUsage::StreamDraw => GL_STREAM_DRAW,
        R3rBufferUsage::StaticDraw => GL_STATIC_DRAW,
        R3rBufferUsage::DynamicDraw => GL_DYNAMIC_DRAW,
    }
}

pub fn gl_target(kind: R3rBufferType) -> GLenum {
    match kind {
        R3rBufferType::Index => GL_ELEMENT_ARRAY_BUFFER,
        R3rBufferType::Vertex => GL_ARRAY_BUFFER,
    }
}

pub struct OglBuffer {
    kind: R3rBufferType,
    usage: R3rBufferUsage,
    shadow: Vec<u8>,
    handle: Option<OglHandle>,
    is_dsa: bool,
}

impl OglBuffer {
    pub fn new(
        gl: &Rc<GlFns>,
        features: &OglDeviceFeatures,
        state: &mut OglState,
        kind: R3rBufferType,
        param: &R3rBufferInitParam,
    ) -> R3rResult<Self> {
        if param.size == 0 {
            return Err(R3rError::contract(format!("Zero {} buffer size.", kind.name())));
        }

        if param.size > GLsizeiptr::MAX as usize {
            return Err(R3rError::contract(format!("{} buffer size out of range.", kind.name())));
        }

        let mut buffer = Self {
            kind,
            usage: param.usage,
            shadow: vec![0; param.size],
            handle: None,
            is_dsa: false,
        };

        buffer.recreate(gl, features, state)?;
        Ok(buffer)
    }

    pub fn kind(&self) -> R3rBufferType {
        self.kind
    }

    pub fn usage(&self) -> R3rBufferUsage {
        self.usage
    }

    pub fn size(&self) -> usize {
        self.shadow.len()
    }

    pub fn shadow(&self) -> &[u8] {
        &self.shadow
    }

    /// GL name, or zero for a client-memory buffer.
    pub fn gl_name(&self) -> GLuint {
        self.handle.as_ref().map_or(0, OglHandle::get)
    }

    pub fn gl_target(&self) -> GLenum {
        gl_target(self.kind)
    }

    /// Pointer argument for gl*Pointer/glDrawElements at byte `offset`.
    ///
    /// An offset into the bound buffer object, or a real address into the
    /// shadow copy for client-memory buffers.
    pub fn data_pointer(&self, offset: usize) -> *const c_void {
        if self.handle.is_some() {
            offset as *const c_void
        } else {
            self.shadow[offset.min(self.shadow.len())..].as_ptr() as *const c_void
        }
    }

    /// Bind to the buffer's target; client-memory buffers bind zero.
    pub fn bind(&self, gl: &GlFns, state: &mut OglState) {
        state.bind_buffer(gl, self.gl_target(), self.gl_name());
    }

    pub fn update(
        &mut self,
        features: &OglDeviceFeatures,
        state: &mut OglState,
        param: &R3rBufferUpdateParam<'_>,
    ) -> R3rResult<()> {
        let end = param
            .offset
            .checked_add(param.data.len())
            .ok_or_else(|| R3rError::contract("Buffer update range overflow."))?;

        if end > self.shadow.len() {
            return Err(R3rError::contract(format!(
                "{} buffer update out of range ({}..{} of {}).",
                self.kind.name(),
                param.offset,
                end,
                self.shadow.len()
            )));
        }

        if param.data.is_empty() {
            return Ok(());
        }

        self.shadow[param.offset..end].copy_from_slice(param.data);

        let handle = match self.handle.as_ref() {
            Some(h) => h,
            None => return Ok(()),
        };

        let gl = handle.gl();
        let name = handle.get();
        let ptr = param.data.as_ptr() as *const c_void;
        let offset = param.offset as GLintptr;
        let len = param.data.len() as GLsizeiptr;

        if self.is_dsa {
            if let Some(f) = gl.named_buffer_sub_data {
                // SAFETY: `ptr` covers `len` bytes for the duration of the call.
                unsafe { f(name, offset, len, ptr) };
                return check_errors(gl, "glNamedBufferSubData");
            }
        }

        if self.kind == R3rBufferType::Index && features.is_vao_available {
            // Keep the element binding of the current vertex array intact.
            state.bind_vertex_array(gl, 0);
        }

        state.bind_buffer(gl, self.gl_target(), name);

        if let Some(f) = gl.buffer_sub_data {
            // SAFETY: `ptr` covers `len` bytes for the duration of the call.
            unsafe { f(self.gl_target(), offset, len, ptr) };
        }

        check_errors(gl, "glBufferSubData")
    }

    /// (Re)create the GL object and upload the shadow contents.
    pub fn recreate(&mut self, gl: &Rc<GlFns>, features: &OglDeviceFeatures, state: &mut OglState) -> R3rResult<()> {
        self.handle = None;
        self.is_dsa = false;

        if !features.is_buffer_available {
            debug!("[OGL] {} buffer kept in client memory.", self.kind.name());
            return Ok(());
        }

        let size = self.shadow.len() as GLsizeiptr;
        let data = self.shadow.as_ptr() as *const c_void;

        if features.is_dsa_available {
            if let (Some(create), Some(storage)) = (gl.create_buffers, gl.named_buffer_storage) {
                let name = handle::gen_name(create);
                if name == 0 {
                    return Err(R3rError::contract("Failed to create a buffer object."));
                }

                self.handle = Some(OglHandle::new(gl, name, handle::delete_buffer));
                self.is_dsa = true;
                // SAFETY: `data` covers `size` bytes.
                unsafe { storage(name, size, data, GL_DYNAMIC_STORAGE_BIT) };
                return check_errors(gl, "glNamedBufferStorage");
            }
        }

        let gen = gl
            .gen_buffers
            .ok_or_else(|| R3rError::contract("Buffer objects not available."))?;

        let name = handle::gen_name(gen);
        if name == 0 {
            return Err(R3rError::contract("Failed to create a buffer object."));
        }

        self.handle = Some(OglHandle::new(gl, name, handle::delete_buffer));

        if self.kind == R3rBufferType::Index && features.is_vao_available {
            state.bind_vertex_array(gl, 0);
        }

        let target = self.gl_target();
        state.bind_buffer(gl, target, name);

        match (features.is_buffer_storage_available, gl.buffer_storage, gl.buffer_data) {
            (true, Some(storage), _) => {
                // SAFETY: `data` covers `size` bytes.
                unsafe { storage(target, size, data, GL_DYNAMIC_STORAGE_BIT) };
                check_errors(gl, "glBufferStorage")
            }
            (_, _, Some(buffer_data)) => {
                // SAFETY: `data` covers `size` bytes.
                unsafe { buffer_data(target, size, data, gl_usage(self.usage)) };
                check_errors(gl, "glBufferData")
            }
            _ => Err(R3rError::contract("Buffer objects not available.")),
        }
    }

    /// Delete the GL object now; the shadow copy stays.
    pub fn release(&mut self) {
        self.handle = None;
    }

    pub fn abandon(&mut self) {
        if let Some(handle) = self.handle.as_mut() {
            handle.abandon();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_gl::{self, FakeLoader};
    use crate::ogl::api::OglApi;

    fn setup() -> (Rc<GlFns>, OglDeviceFeatures) {
        let mut api = OglApi::new();
        assert!(api.initialize(&mut FakeLoader::new()));
        let features = OglDeviceFeatures {
            is_buffer_available: true,
            ..OglDeviceFeatures::default()
        };
        (api.gl().unwrap().clone(), features)
    }

    fn init_param(size: usize) -> R3rBufferInitParam {
        R3rBufferInitParam {
            usage: R3rBufferUsage::StaticDraw,
            size,
        }
    }

    #[test]
    fn test_create_and_update() {
        fake_gl::reset();
        let (gl, features) = setup();
        let mut state = OglState::new();

        let mut buffer = OglBuffer::new(&gl, &features, &mut state, R3rBufferType::Vertex, &init_param(8)).unwrap();
        assert_ne!(buffer.gl_name(), 0);

        buffer
            .update(&features, &mut state, &R3rBufferUpdateParam { offset: 2, data: &[1, 2, 3] })
            .unwrap();

        assert_eq!(buffer.shadow(), &[0, 0, 1, 2, 3, 0, 0, 0]);
        let stored = fake_gl::with(|s| s.buffers[&buffer.gl_name()].clone());
        assert_eq!(stored, vec![0, 0, 1, 2, 3, 0, 0, 0]);
    }

    #[test]
    fn test_update_out_of_range_fails() {
        fake_gl::reset();
        let (gl, features) = setup();
        let mut state = OglState::new();

        let mut buffer = OglBuffer::new(&gl, &features, &mut state, R3rBufferType::Index, &init_param(4)).unwrap();
        let result = buffer.update(&features, &mut state, &R3rBufferUpdateParam { offset: 3, data: &[1, 2] });
        assert!(matches!(result, Err(R3rError::Contract(_))));
        assert_eq!(buffer.shadow(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_zero_size_fails() {
        fake_gl::reset();
        let (gl, features) = setup();
        let mut state = OglState::new();
        assert!(OglBuffer::new(&gl, &features, &mut state, R3rBufferType::Vertex, &init_param(0)).is_err());
    }

    #[test]
    fn test_client_memory_without_buffer_objects() {
        fake_gl::reset();
        let (gl, _) = setup();
        let features = OglDeviceFeatures::default();
        let mut state = OglState::new();

        let mut buffer = OglBuffer::new(&gl, &features, &mut state, R3rBufferType::Vertex, &init_param(4)).unwrap();
        assert_eq!(buffer.gl_name(), 0);
        buffer
            .update(&features, &mut state, &R3rBufferUpdateParam { offset: 0, data: &[9] })
            .unwrap();
        assert_eq!(buffer.data_pointer(0), buffer.shadow().as_ptr() as *const c_void);
        assert!(!fake_gl::with(|s| s.calls.contains(&"glGenBuffers")));
    }

    #[test]
    fn test_recreate_restores_contents() {
        fake_gl::reset();
        let (gl, features) = setup();
        let mut state = OglState::new();

        let mut buffer = OglBuffer::new(&gl, &features, &mut state, R3rBufferType::Vertex, &init_param(3)).unwrap();
        buffer
            .update(&features, &mut state, &R3rBufferUpdateParam { offset: 0, data: &[7, 8, 9] })
            .unwrap();

        let old_name = buffer.gl_name();
        buffer.abandon();
        state.reset();
        buffer.recreate(&gl, &features, &mut state).unwrap();

        assert_ne!(buffer.gl_name(), old_name);
        assert!(fake_gl::with(|s| s.deleted_buffers.is_empty()));
        let stored = fake_gl::with(|s| s.buffers[&buffer.gl_name()].clone());
        assert_eq!(stored, vec![7, 8, 9]);
    }
}
