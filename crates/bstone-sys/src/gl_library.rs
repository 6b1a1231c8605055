// gl_library.rs -- system OpenGL library opened at runtime
//
// Some platforms only hand out extension entry points through the context
// loader (wglGetProcAddress returns null for the 1.1 functions exported by
// opengl32.dll). The system library covers those symbols.

use libloading::Library;
use std::ffi::c_void;

use bstone_renderer::sys::GlContextProfile;

#[cfg(target_os = "windows")]
const DESKTOP_NAMES: &[&str] = &["opengl32.dll"];
#[cfg(target_os = "macos")]
const DESKTOP_NAMES: &[&str] = &["/System/Library/Frameworks/OpenGL.framework/OpenGL"];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const DESKTOP_NAMES: &[&str] = &["libGL.so.1", "libGL.so"];

#[cfg(target_os = "windows")]
const ES_NAMES: &[&str] = &["libGLESv2.dll"];
#[cfg(target_os = "macos")]
const ES_NAMES: &[&str] = &["libGLESv2.dylib"];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const ES_NAMES: &[&str] = &["libGLESv2.so.2", "libGLESv2.so"];

/// Candidate file names for a context profile, most specific first.
pub fn library_names(profile: GlContextProfile) -> &'static [&'static str] {
    match profile {
        GlContextProfile::Es => ES_NAMES,
        GlContextProfile::Compatibility | GlContextProfile::Core => DESKTOP_NAMES,
    }
}

pub struct GlLibrary {
    name: &'static str,
    library: Library,
}

impl GlLibrary {
    /// Open the first library that loads for `profile`.
    pub fn open(profile: GlContextProfile) -> Result<Self, String> {
        let mut errors = Vec::new();

        for &name in library_names(profile) {
            // SAFETY: the system GL library has no initialization routines
            // with preconditions beyond being loaded once per process.
            match unsafe { Library::new(name) } {
                Ok(library) => return Ok(Self { name, library }),
                Err(e) => errors.push(format!("{}: {}", name, e)),
            }
        }

        Err(format!("Failed to load the GL library ({}).", errors.join("; ")))
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// Address of an exported symbol, or null.
    pub fn get(&self, symbol: &str) -> *const c_void {
        let mut name = Vec::with_capacity(symbol.len() + 1);
        name.extend_from_slice(symbol.as_bytes());
        name.push(0);

        // SAFETY: the symbol is read as an opaque address and never called here;
        // callers cast it to the signature the GL registry gives it.
        match unsafe { self.library.get::<*mut c_void>(&name) } {
            Ok(address) => *address as *const c_void,
            Err(_) => std::ptr::null(),
        }
    }
}
