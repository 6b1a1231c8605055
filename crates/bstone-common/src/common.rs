// common.rs -- build constants shared by every crate

pub const DISTNAME: &str = "bstone-rs";
pub const DISTVER: &str = env!("CARGO_PKG_VERSION");

/// Title used for the main window when none is configured.
pub const DEFAULT_WINDOW_TITLE: &str = "BStone";

/// Logical screen size of the original VGA mode.
pub const VGA_WIDTH: usize = 320;
pub const VGA_HEIGHT: usize = 200;

/// Entries in a VGA palette.
pub const PALETTE_SIZE: usize = 256;

/// Largest component value of a VGA DAC register (6 bits).
pub const VGA_MAX_COMPONENT: u8 = 63;

/// Full version banner, e.g. "bstone-rs 1.0.0".
pub fn version_string() -> String {
    format!("{} {}", DISTNAME, DISTVER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string() {
        let v = version_string();
        assert!(v.starts_with("bstone-rs "));
        assert!(v.ends_with(DISTVER));
    }
}
