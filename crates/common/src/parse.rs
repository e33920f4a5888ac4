//! Parsing of the small scalar formats used in project files.
//!
//! Vectors and colours are whitespace separated (`"0 1.5 -2"`), booleans accept
//! `true`/`false`/`1`/`0`/`yes`/`no`.

use glam::Vec3;

/// A scalar or vector attribute could not be parsed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseValueError {
    #[error("expected {expected} numbers, found {found} in `{input}`")]
    Arity {
        expected: usize,
        found: usize,
        input: String,
    },
    #[error("`{0}` is not a number")]
    Number(String),
    #[error("`{0}` is not a boolean")]
    Bool(String),
    #[error("component {value} is outside 0..=1 in `{input}`")]
    Range { value: f32, input: String },
}

fn parse_floats<const N: usize>(input: &str) -> Result<[f32; N], ParseValueError> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    if parts.len() != N {
        return Err(ParseValueError::Arity {
            expected: N,
            found: parts.len(),
            input: input.to_string(),
        });
    }
    let mut out = [0.0f32; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|_| ParseValueError::Number(part.to_string()))?;
    }
    Ok(out)
}

/// Parse `"x y z"`.
pub fn parse_vec3(input: &str) -> Result<Vec3, ParseValueError> {
    parse_floats::<3>(input).map(Vec3::from_array)
}

/// Parse `"r g b a"`. Every component must lie in 0..=1.
pub fn parse_color(input: &str) -> Result<[f32; 4], ParseValueError> {
    let color = parse_floats::<4>(input)?;
    if let Some(&value) = color.iter().find(|c| !(0.0..=1.0).contains(*c)) {
        return Err(ParseValueError::Range {
            value,
            input: input.to_string(),
        });
    }
    Ok(color)
}

pub fn parse_bool(input: &str) -> Result<bool, ParseValueError> {
    match input.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ParseValueError::Bool(input.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec3_parses_whitespace_separated() {
        assert_eq!(parse_vec3(" 1 2.5  -3 ").unwrap(), Vec3::new(1.0, 2.5, -3.0));
    }

    #[test]
    fn vec3_rejects_wrong_arity() {
        let err = parse_vec3("1 2").unwrap_err();
        assert!(matches!(err, ParseValueError::Arity { expected: 3, found: 2, .. }));
    }

    #[test]
    fn color_rejects_garbage() {
        assert_eq!(
            parse_color("0 0 x 1").unwrap_err(),
            ParseValueError::Number("x".into())
        );
    }

    #[test]
    fn color_components_must_be_normalised() {
        assert_eq!(parse_color("0 0.5 1 1").unwrap(), [0.0, 0.5, 1.0, 1.0]);
        assert!(matches!(
            parse_color("0 0 255 1").unwrap_err(),
            ParseValueError::Range { value, .. } if value == 255.0
        ));
        assert!(matches!(
            parse_color("-0.1 0 0 1").unwrap_err(),
            ParseValueError::Range { .. }
        ));
        assert!(matches!(
            parse_color("NaN 0 0 1").unwrap_err(),
            ParseValueError::Range { .. }
        ));
    }

    #[test]
    fn bool_variants() {
        assert!(parse_bool("Yes").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }
}
