//! OpenGL entry point loader.
//!
//! `OglApi` resolves the `GlFns` table for the current context and reads the
//! driver identification strings. Missing required symbols are a hard
//! failure; missing optional ones are left for the feature probe.

use super::gl::*;
use super::version::OglVersion;
use crate::r3r::{R3rError, R3rResult};
use crate::sys::GlSymbolLoader;
use log::{error, info};
use std::ffi::CStr;
use std::os::raw::c_char;
use std::rc::Rc;

#[derive(Default)]
pub struct OglApi {
    gl: Option<Rc<GlFns>>,
    vendor: String,
    renderer: String,
    version: OglVersion,
    missing_symbols: Vec<&'static str>,
}

impl OglApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every entry point for the context current on this thread.
    pub fn initialize<L: GlSymbolLoader + ?Sized>(&mut self, loader: &mut L) -> bool {
        self.uninitialize();

        if !loader.has_current_context() {
            error!("[OGL] No current OpenGL context.");
            return false;
        }

        let mut missing = Vec::new();

        let fns = match GlFns::load(loader, &mut missing) {
            Some(fns) => fns,
            None => {
                error!("[OGL] Missing OpenGL symbols:");
                for symbol in &missing {
                    error!("[OGL]     {}", symbol);
                }
                self.missing_symbols = missing;
                return false;
            }
        };

        let vendor = match get_string(&fns, GL_VENDOR) {
            Some(s) => s,
            None => {
                error!("[OGL] Failed to get a vendor.");
                return false;
            }
        };

        let renderer = match get_string(&fns, GL_RENDERER) {
            Some(s) => s,
            None => {
                error!("[OGL] Failed to get a renderer.");
                return false;
            }
        };

        let version_string = match get_string(&fns, GL_VERSION) {
            Some(s) => s,
            None => {
                error!("[OGL] Failed to get a version.");
                return false;
            }
        };

        if !self.version.set(&version_string) {
            info!("[OGL] Unrecognized version string \"{}\".", version_string);
        }

        self.vendor = vendor;
        self.renderer = renderer;
        self.gl = Some(Rc::new(fns));
        true
    }

    /// Drop the table and strings. Safe to call any number of times.
    pub fn uninitialize(&mut self) {
        self.gl = None;
        self.vendor.clear();
        self.renderer.clear();
        self.version.reset();
        self.missing_symbols.clear();
    }

    pub fn is_initialized(&self) -> bool {
        self.gl.is_some()
    }

    pub fn gl(&self) -> Option<&Rc<GlFns>> {
        self.gl.as_ref()
    }

    /// Required symbols that failed to resolve on the last attempt.
    pub fn get_missing_symbols(&self) -> &[&'static str] {
        &self.missing_symbols
    }

    pub fn get_vendor(&self) -> &str {
        &self.vendor
    }

    pub fn get_renderer(&self) -> &str {
        &self.renderer
    }

    pub fn get_version(&self) -> &OglVersion {
        &self.version
    }
}

/// `glGetString` as an owned string; None for a null result.
pub fn get_string(gl: &GlFns, name: GLenum) -> Option<String> {
    // SAFETY: glGetString returns null or a static NUL-terminated string.
    unsafe {
        let ptr = (gl.get_string)(name);
        if ptr.is_null() {
            None
        } else {
            Some(CStr::from_ptr(ptr as *const c_char).to_string_lossy().into_owned())
        }
    }
}

/// `glGetIntegerv` for a single value.
pub fn get_integer(gl: &GlFns, name: GLenum) -> GLint {
    let mut value: GLint = 0;
    // SAFETY: `value` outlives the call and holds one integer.
    unsafe { (gl.get_integerv)(name, &mut value) };
    value
}

/// Report a pending GL error after `call`. Only checks in debug builds.
pub fn check_errors(gl: &GlFns, call: &'static str) -> R3rResult<()> {
    if !cfg!(debug_assertions) {
        return Ok(());
    }

    let code = gl.take_error();
    if code == GL_NO_ERROR {
        return Ok(());
    }

    // Drain anything else queued so the next check starts clean.
    while gl.take_error() != GL_NO_ERROR {}

    error!("[OGL] {} raised {}.", call, error_name(code));
    Err(R3rError::Gl { call, code })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_gl::{self, FakeLoader};

    #[test]
    fn test_initialize_reads_strings() {
        fake_gl::reset();
        fake_gl::with(|s| s.set_version("3.3.0 Mesa 23.1"));

        let mut api = OglApi::new();
        assert!(api.initialize(&mut FakeLoader::new()));
        assert!(api.is_initialized());
        assert_eq!(api.get_vendor(), fake_gl::FAKE_VENDOR);
        assert_eq!(api.get_renderer(), fake_gl::FAKE_RENDERER);
        assert_eq!(api.get_version().get_major(), 3);
        assert_eq!(api.get_version().get_vendor(), "Mesa 23.1");
        assert!(api.gl().unwrap().gen_buffers.is_some());
    }

    #[test]
    fn test_initialize_without_context_fails() {
        fake_gl::reset();
        let mut loader = FakeLoader::new();
        loader.has_context = false;

        let mut api = OglApi::new();
        assert!(!api.initialize(&mut loader));
        assert!(!api.is_initialized());
    }

    #[test]
    fn test_missing_required_symbol_fails() {
        fake_gl::reset();
        fake_gl::with(|s| {
            s.hide_symbol("glTexSubImage2D");
            s.hide_symbol("glViewport");
        });

        let mut api = OglApi::new();
        assert!(!api.initialize(&mut FakeLoader::new()));
        assert!(!api.is_initialized());
        assert!(api.gl().is_none());
        assert_eq!(api.get_missing_symbols(), &["glTexSubImage2D", "glViewport"]);
    }

    #[test]
    fn test_missing_optional_symbol_is_not_fatal() {
        fake_gl::reset();
        fake_gl::with(|s| s.hide_symbol("glGenVertexArrays"));

        let mut api = OglApi::new();
        assert!(api.initialize(&mut FakeLoader::new()));
        assert!(api.gl().unwrap().gen_vertex_arrays.is_none());
    }

    #[test]
    fn test_alias_is_used_when_core_name_is_missing() {
        fake_gl::reset();
        fake_gl::with(|s| s.hide_symbol("glActiveTexture"));

        let mut api = OglApi::new();
        assert!(api.initialize(&mut FakeLoader::new()));
        // The fake exports "glActiveTextureARB" as well.
        assert!(api.gl().unwrap().active_texture.is_some());
    }

    #[test]
    fn test_null_vendor_fails() {
        fake_gl::reset();
        fake_gl::with(|s| s.null_strings = true);

        let mut api = OglApi::new();
        assert!(!api.initialize(&mut FakeLoader::new()));
        assert!(!api.is_initialized());
    }

    #[test]
    fn test_uninitialize_is_idempotent() {
        fake_gl::reset();
        let mut api = OglApi::new();
        assert!(api.initialize(&mut FakeLoader::new()));
        api.uninitialize();
        api.uninitialize();
        assert!(!api.is_initialized());
        assert!(api.gl().is_none());
        assert_eq!(api.get_vendor(), "");
        assert!(api.get_version().is_unknown());
    }

    #[test]
    fn test_check_errors_reports_pending_error() {
        fake_gl::reset();
        let mut api = OglApi::new();
        assert!(api.initialize(&mut FakeLoader::new()));
        let gl = api.gl().unwrap();

        assert!(check_errors(gl, "glEnable").is_ok());

        fake_gl::with(|s| s.pending_error = GL_INVALID_ENUM);
        let err = check_errors(gl, "glEnable").unwrap_err();
        assert_eq!(err, R3rError::Gl { call: "glEnable", code: GL_INVALID_ENUM });
        assert!(check_errors(gl, "glEnable").is_ok());
    }
}
