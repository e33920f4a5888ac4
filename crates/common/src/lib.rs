//! Shared value types used by the project loader and the renderer.

pub mod parse;
pub mod types;

pub use parse::{ParseValueError, parse_bool, parse_color, parse_vec3};
pub use types::Transform;

pub fn crate_info() -> &'static str {
    "tessera-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
