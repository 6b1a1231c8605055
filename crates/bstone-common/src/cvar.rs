// cvar.rs -- console variables
//
// Configuration for the video subsystem lives in cvars ("vid_*"). Values are
// strings with a cached float; latched cvars only take effect when the
// owning subsystem restarts.

use bitflags::bitflags;
use log::{debug, info};
use parking_lot::Mutex;
use std::collections::HashMap;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct CvarFlags: u32 {
        /// Saved to the configuration file.
        const ARCHIVE = 0x01;
        /// Read-only from the console.
        const NOSET   = 0x02;
        /// Changes are held until `apply_latched`.
        const LATCH   = 0x04;
    }
}

pub const CVAR_ZERO: CvarFlags = CvarFlags::empty();
pub const CVAR_ARCHIVE: CvarFlags = CvarFlags::ARCHIVE;
pub const CVAR_NOSET: CvarFlags = CvarFlags::NOSET;
pub const CVAR_LATCH: CvarFlags = CvarFlags::LATCH;

/// A console variable.
#[derive(Clone, Debug)]
pub struct Cvar {
    pub name: String,
    pub string: String,
    pub latched_string: Option<String>,
    pub flags: CvarFlags,
    pub modified: bool,
    pub value: f32,
}

fn parse_value(s: &str) -> f32 {
    s.trim().parse::<f32>().unwrap_or(0.0)
}

/// The cvar table.
pub struct CvarContext {
    pub cvar_vars: Vec<Cvar>,
    /// Name -> index in `cvar_vars`.
    cvar_index: HashMap<String, usize>,
}

impl CvarContext {
    pub fn new() -> Self {
        Self {
            cvar_vars: Vec::new(),
            cvar_index: HashMap::new(),
        }
    }

    pub fn find_var_index(&self, name: &str) -> Option<usize> {
        self.cvar_index.get(name).copied()
    }

    pub fn find_var(&self, name: &str) -> Option<&Cvar> {
        self.cvar_index.get(name).map(|&idx| &self.cvar_vars[idx])
    }

    /// Float value of a cvar, 0 if it does not exist.
    pub fn variable_value(&self, name: &str) -> f32 {
        self.find_var(name).map_or(0.0, |var| var.value)
    }

    /// Integer value of a cvar, 0 if it does not exist.
    pub fn variable_int(&self, name: &str) -> i32 {
        self.variable_value(name) as i32
    }

    /// String value of a cvar, "" if it does not exist.
    pub fn variable_string(&self, name: &str) -> &str {
        self.find_var(name).map_or("", |var| var.string.as_str())
    }

    /// Get or create a cvar. An existing cvar keeps its value; the flags are OR'd in.
    pub fn get(&mut self, name: &str, value: &str, flags: CvarFlags) -> usize {
        if let Some(&idx) = self.cvar_index.get(name) {
            self.cvar_vars[idx].flags |= flags;
            return idx;
        }

        let idx = self.cvar_vars.len();
        self.cvar_vars.push(Cvar {
            name: name.to_string(),
            string: value.to_string(),
            latched_string: None,
            flags,
            modified: true,
            value: parse_value(value),
        });
        self.cvar_index.insert(name.to_string(), idx);
        idx
    }

    fn set2(&mut self, name: &str, value: &str, force: bool) -> usize {
        let idx = match self.find_var_index(name) {
            Some(idx) => idx,
            None => return self.get(name, value, CVAR_ZERO),
        };

        let var = &mut self.cvar_vars[idx];

        if !force {
            if var.flags.contains(CvarFlags::NOSET) {
                info!("{} is write protected.", name);
                return idx;
            }

            if var.flags.contains(CvarFlags::LATCH) {
                let pending = var.latched_string.as_deref().unwrap_or(&var.string);
                if value == pending {
                    return idx;
                }

                if value == var.string {
                    var.latched_string = None;
                } else {
                    info!("{} will be changed upon restart.", name);
                    var.latched_string = Some(value.to_string());
                }
                return idx;
            }
        } else {
            var.latched_string = None;
        }

        if value == var.string {
            return idx;
        }

        var.modified = true;
        var.string = value.to_string();
        var.value = parse_value(value);
        idx
    }

    /// Set a cvar, honoring NOSET and LATCH.
    pub fn set(&mut self, name: &str, value: &str) -> usize {
        self.set2(name, value, false)
    }

    /// Set a cvar, ignoring NOSET and LATCH.
    pub fn force_set(&mut self, name: &str, value: &str) -> usize {
        self.set2(name, value, true)
    }

    pub fn set_value(&mut self, name: &str, value: f32) -> usize {
        let val_str = if value == (value as i32) as f32 {
            format!("{}", value as i32)
        } else {
            format!("{}", value)
        };
        self.set(name, &val_str)
    }

    /// Move latched values into place. Returns the names that changed.
    pub fn apply_latched(&mut self) -> Vec<String> {
        let mut changed = Vec::new();

        for var in &mut self.cvar_vars {
            if let Some(latched) = var.latched_string.take() {
                var.string = latched;
                var.value = parse_value(&var.string);
                var.modified = true;
                changed.push(var.name.clone());
            }
        }

        changed
    }

    /// True if any cvar with the given prefix has a pending latched value.
    pub fn has_latched(&self, prefix: &str) -> bool {
        self.cvar_vars
            .iter()
            .any(|v| v.latched_string.is_some() && v.name.starts_with(prefix))
    }

    /// Clear the modified flags of every cvar with the given prefix and
    /// report whether any of them was set.
    pub fn check_modified(&mut self, prefix: &str) -> bool {
        let mut any = false;

        for var in &mut self.cvar_vars {
            if var.modified && var.name.starts_with(prefix) {
                var.modified = false;
                any = true;
                debug!("var = \"{}\"; modified", var.name);
            }
        }

        any
    }

    /// Apply `+set <name> <value>` pairs from a command line.
    ///
    /// Returns the arguments that were not consumed.
    pub fn parse_command_line<I, S>(&mut self, args: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rest = Vec::new();
        let mut iter = args.into_iter().map(|s| s.as_ref().to_string());

        while let Some(arg) = iter.next() {
            if arg == "+set" {
                match (iter.next(), iter.next()) {
                    (Some(name), Some(value)) => {
                        self.force_set(&name, &value);
                    }
                    _ => info!("usage: +set <variable> <value>"),
                }
            } else {
                rest.push(arg);
            }
        }

        rest
    }

    /// Write all archived cvars as "set" lines.
    pub fn write_variables(&self, writer: &mut dyn std::io::Write) -> std::io::Result<()> {
        for var in &self.cvar_vars {
            if var.flags.contains(CvarFlags::ARCHIVE) {
                let value = var.latched_string.as_deref().unwrap_or(&var.string);
                writeln!(writer, "set {} \"{}\"", var.name, value)?;
            }
        }
        Ok(())
    }

    /// Print cvars whose name starts with `prefix`.
    pub fn list(&self, prefix: &str) -> usize {
        let mut matching = 0;

        for var in self.cvar_vars.iter().filter(|v| v.name.starts_with(prefix)) {
            matching += 1;
            let archive = if var.flags.contains(CvarFlags::ARCHIVE) { '*' } else { ' ' };
            let noset = if var.flags.contains(CvarFlags::NOSET) {
                '-'
            } else if var.flags.contains(CvarFlags::LATCH) {
                'L'
            } else {
                ' '
            };
            info!("{}{} {} \"{}\"", archive, noset, var.name, var.string);
        }

        info!("{} cvars, {} matching", self.cvar_vars.len(), matching);
        matching
    }
}

impl Default for CvarContext {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================
// Global table and free-function wrappers
// ============================================================

static CVAR_CTX: Mutex<Option<CvarContext>> = parking_lot::const_mutex(None);

pub fn cvar_init() {
    *CVAR_CTX.lock() = Some(CvarContext::new());
}

pub fn cvar_shutdown() {
    *CVAR_CTX.lock() = None;
}

pub fn cvar_get(name: &str, value: &str, flags: CvarFlags) -> Option<usize> {
    CVAR_CTX.lock().as_mut().map(|c| c.get(name, value, flags))
}

pub fn cvar_set(name: &str, value: &str) {
    if let Some(ref mut c) = *CVAR_CTX.lock() {
        c.set(name, value);
    }
}

pub fn cvar_force_set(name: &str, value: &str) {
    if let Some(ref mut c) = *CVAR_CTX.lock() {
        c.force_set(name, value);
    }
}

pub fn cvar_variable_value(name: &str) -> f32 {
    CVAR_CTX.lock().as_ref().map_or(0.0, |c| c.variable_value(name))
}

pub fn cvar_variable_int(name: &str) -> i32 {
    CVAR_CTX.lock().as_ref().map_or(0, |c| c.variable_int(name))
}

pub fn cvar_variable_string(name: &str) -> String {
    CVAR_CTX
        .lock()
        .as_ref()
        .map_or(String::new(), |c| c.variable_string(name).to_string())
}

/// Run a closure against the global table. None if `cvar_init` was not called.
pub fn with_cvar_ctx<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut CvarContext) -> R,
{
    CVAR_CTX.lock().as_mut().map(f)
}

// ============================================================
// Tests
// ============================================================
