// version.rs -- GL_VERSION string parser
//
// Accepted grammar: ["OpenGL ES "]MAJOR.MINOR[.RELEASE][ VENDOR]
// Anything else leaves the version at its zero/empty defaults.

use std::cmp::Ordering;
use std::fmt;

const ES_PREFIX: &str = "OpenGL ES ";

#[derive(Clone, Debug, Default)]
pub struct OglVersion {
    is_es: bool,
    major: i32,
    minor: i32,
    release: i32,
    vendor: String,
    original_string: String,
}

impl OglVersion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a version string. Returns false and resets on malformed input.
    pub fn set(&mut self, version_string: &str) -> bool {
        self.reset();

        match parse(version_string) {
            Some(parsed) => {
                *self = parsed;
                self.original_string = version_string.to_string();
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_es(&self) -> bool {
        self.is_es
    }

    pub fn get_major(&self) -> i32 {
        self.major
    }

    pub fn get_minor(&self) -> i32 {
        self.minor
    }

    pub fn get_release(&self) -> i32 {
        self.release
    }

    pub fn get_vendor(&self) -> &str {
        &self.vendor
    }

    pub fn get_original_string(&self) -> &str {
        &self.original_string
    }

    /// True if nothing was parsed.
    pub fn is_unknown(&self) -> bool {
        self.original_string.is_empty() || (self.major == 0 && self.minor == 0 && self.release == 0)
    }

    /// True for a desktop context of at least `major.minor`.
    pub fn is_desktop_at_least(&self, major: i32, minor: i32) -> bool {
        !self.is_es && (self.major, self.minor) >= (major, minor)
    }

    /// True for an ES context of at least `major.minor`.
    pub fn is_es_at_least(&self, major: i32, minor: i32) -> bool {
        self.is_es && (self.major, self.minor) >= (major, minor)
    }

    fn key(&self) -> (i32, i32, i32) {
        (self.major, self.minor, self.release)
    }
}

fn parse_number(bytes: &[u8], pos: &mut usize) -> Option<i32> {
    let start = *pos;
    let mut value = 0i32;

    while *pos < bytes.len() && bytes[*pos].is_ascii_digit() {
        value = value
            .checked_mul(10)?
            .checked_add((bytes[*pos] - b'0') as i32)?;
        *pos += 1;
    }

    if *pos == start {
        None
    } else {
        Some(value)
    }
}

fn parse(version_string: &str) -> Option<OglVersion> {
    let (is_es, rest) = match version_string.strip_prefix(ES_PREFIX) {
        Some(rest) => (true, rest),
        None => (false, version_string),
    };

    let bytes = rest.as_bytes();
    let mut pos = 0usize;

    let major = parse_number(bytes, &mut pos)?;

    if bytes.get(pos) != Some(&b'.') {
        return None;
    }
    pos += 1;

    let minor = parse_number(bytes, &mut pos)?;

    let mut release = 0;
    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        release = parse_number(bytes, &mut pos)?;
    }

    let vendor = match bytes.get(pos) {
        None => String::new(),
        Some(&b' ') => rest[pos + 1..].to_string(),
        Some(_) => return None,
    };

    Some(OglVersion {
        is_es,
        major,
        minor,
        release,
        vendor,
        original_string: String::new(),
    })
}

impl PartialEq for OglVersion {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for OglVersion {}

impl PartialOrd for OglVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OglVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for OglVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_es {
            f.write_str(ES_PREFIX)?;
        }

        write!(f, "{}.{}", self.major, self.minor)?;

        if self.release != 0 {
            write!(f, ".{}", self.release)?;
        }

        if !self.vendor.is_empty() {
            write!(f, " {}", self.vendor)?;
        }

        Ok(())
    }
}
