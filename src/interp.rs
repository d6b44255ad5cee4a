//! `${key}` interpolation for step arguments.

use crate::schema::Value;
use std::collections::HashMap;

/// Expand `${key}` references in a string against a context value map.
///
/// Keys not present in the map fall back to process environment
/// variables, so specs can reference e.g. `${HOME}` without declaring it.
/// Returns an error message for an unknown key or an unclosed reference.
pub fn expand(input: &str, values: &HashMap<String, Value>) -> Result<String, String> {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut key = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(c) => key.push(c),
                    None => {
                        return Err(format!("unclosed reference: ${{{key}"));
                    }
                }
            }
            let value = values
                .get(&key)
                .map(Value::to_string)
                .or_else(|| std::env::var(&key).ok())
                .ok_or_else(|| format!("'{key}' is not set"))?;
            result.push_str(&value);
        } else {
            result.push(c);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn expands_context_keys() {
        let vars = values(&[("basedir", Value::from("/spec")), ("depth", Value::Int(3))]);
        assert_eq!(expand("${basedir}/tmp", &vars).unwrap(), "/spec/tmp");
        assert_eq!(expand("--depth ${depth}", &vars).unwrap(), "--depth 3");
        assert_eq!(expand("no refs here", &vars).unwrap(), "no refs here");
        assert_eq!(expand("", &vars).unwrap(), "");
    }

    #[test]
    fn adjacent_and_repeated_refs() {
        let vars = values(&[("a", Value::from("x")), ("b", Value::from("y"))]);
        assert_eq!(expand("${a}${b}${a}", &vars).unwrap(), "xyx");
    }

    #[test]
    fn falls_back_to_environment() {
        // SAFETY: single-threaded test, variable name is unique to it
        unsafe {
            std::env::set_var("BINSPEC_INTERP_TEST", "fallback");
        }
        assert_eq!(
            expand("${BINSPEC_INTERP_TEST}", &HashMap::new()).unwrap(),
            "fallback"
        );
    }

    #[test]
    fn context_shadows_environment() {
        // SAFETY: single-threaded test, variable name is unique to it
        unsafe {
            std::env::set_var("BINSPEC_SHADOW_TEST", "env");
        }
        let vars = values(&[("BINSPEC_SHADOW_TEST", Value::from("ctx"))]);
        assert_eq!(expand("${BINSPEC_SHADOW_TEST}", &vars).unwrap(), "ctx");
    }

    #[test]
    fn unknown_key_errors() {
        let result = expand("${nope_12345}", &HashMap::new());
        assert!(result.unwrap_err().contains("nope_12345"));
    }

    #[test]
    fn unclosed_reference_errors() {
        let result = expand("${unclosed", &HashMap::new());
        assert!(result.unwrap_err().contains("unclosed"));
    }

    #[test]
    fn bare_dollar_passes_through() {
        assert_eq!(expand("cost $5", &HashMap::new()).unwrap(), "cost $5");
    }
}
