use anyhow::{Result, anyhow, bail};
use tagwalk::{PrimitiveKind, TypeDescriptor};

/// Parses a destination type written the way it prints: `i32`, `Option<string>`,
/// `Vec<Option<f64>>`, `Map<string, Vec<u8>>`, `any`.
pub fn parse_type_expr(input: &str) -> Result<TypeDescriptor> {
    let input = input.trim();
    if input == "any" {
        return Ok(TypeDescriptor::Dynamic);
    }
    if let Some(kind) = PrimitiveKind::from_name(input) {
        return Ok(TypeDescriptor::Primitive(kind));
    }
    if let Some(inner) = generic_args(input, "Option") {
        return Ok(TypeDescriptor::optional(parse_type_expr(inner)?));
    }
    if let Some(inner) = generic_args(input, "Vec") {
        return Ok(TypeDescriptor::sequence(parse_type_expr(inner)?));
    }
    if let Some(inner) = generic_args(input, "Map") {
        let (key, value) = split_top_level(inner).ok_or_else(|| anyhow!("expected Map<K, V>, got {input:?}"))?;
        return Ok(TypeDescriptor::mapping(parse_type_expr(key)?, parse_type_expr(value)?));
    }
    bail!("unknown type {input:?}")
}

fn generic_args<'a>(input: &'a str, head: &str) -> Option<&'a str> {
    input.strip_prefix(head)?.trim_start().strip_prefix('<')?.strip_suffix('>')
}

/// Splits `K, V` on the comma that is not nested inside angle brackets.
fn split_top_level(input: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (i, c) in input.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => return Some((&input[..i], &input[i + 1..])),
            _ => {}
        }
    }
    None
}
