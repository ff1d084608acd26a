/// Outputs of the `GlifVariable` node
#[derive(Debug, Clone, PartialEq)]
pub struct VariableValue {
    pub string: String,
    pub int: i64,
    pub float: f64,
}

/// An unfilled template slot such as `{prompt}`
fn is_placeholder(value: &str) -> bool {
    value.starts_with('{') && value.ends_with('}')
}

/// Substitute `fallback` for an empty or unfilled variable.
///
/// The result is also parsed as an integer and a float; values that don't
/// parse come out as zero.
#[must_use]
pub fn resolve_variable(variable: &str, fallback: &str) -> VariableValue {
    let variable = variable.trim();
    let value = if variable.is_empty() || is_placeholder(variable) {
        fallback.trim()
    } else {
        variable
    };

    VariableValue {
        string: value.to_string(),
        int: value.parse().unwrap_or(0),
        float: value.parse().unwrap_or(0.0),
    }
}
