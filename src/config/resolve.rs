//! Environment interpolation for configuration files.
//!
//! String values may reference process environment variables with
//! `${environ.NAME}`. Use `$$` to escape a literal `$`, so `$${environ.HOME}`
//! becomes `${environ.HOME}`.
//!
//! `script-marker` values are left as written, so script bodies may contain `${`.

use super::handler::SCRIPT_MARKER;
use super::ConfigError;
use toml::{Table, Value};

/// Name the process environment is bound under inside references.
pub const ENVIRON: &str = "environ";

/// Replaces every `${environ.NAME}` reference in the table's string values,
/// looking names up with `lookup`.
pub fn interpolate_environ<F>(table: &mut Table, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    for (key, value) in table.iter_mut() {
        if key == SCRIPT_MARKER {
            continue;
        }
        interpolate_value(value, lookup)?;
    }
    Ok(())
}

fn interpolate_value<F>(value: &mut Value, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        Value::String(s) => interpolate_string(s, lookup),
        Value::Table(t) => interpolate_environ(t, lookup),
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                interpolate_value(item, lookup)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn interpolate_string<F>(s: &mut String, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if !s.contains('$') {
        return Ok(());
    }

    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }
        match chars.peek() {
            Some('$') => {
                chars.next();
                result.push('$');
            }
            Some('{') => {
                chars.next();
                let reference =
                    consume_until(&mut chars, '}').ok_or(ConfigError::UnclosedReference)?;
                let name = reference
                    .strip_prefix(ENVIRON)
                    .and_then(|rest| rest.strip_prefix('.'))
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| ConfigError::InvalidReference(reference.clone()))?;
                let resolved =
                    lookup(name).ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))?;
                result.push_str(&resolved);
            }
            _ => result.push('$'),
        }
    }

    *s = result;
    Ok(())
}

fn consume_until(chars: &mut std::iter::Peekable<std::str::Chars>, delim: char) -> Option<String> {
    let mut result = String::new();
    for ch in chars.by_ref() {
        if ch == delim {
            return Some(result);
        }
        result.push(ch);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_table(toml_str: &str) -> Table {
        toml::from_str(toml_str).unwrap()
    }

    fn fake_env(name: &str) -> Option<String> {
        match name {
            "HOME" => Some("/home/dragon".into()),
            "PORT" => Some("5432".into()),
            _ => None,
        }
    }

    #[test]
    fn test_simple_reference() {
        let mut table = make_table(r#"dir = "${environ.HOME}/data""#);
        interpolate_environ(&mut table, &fake_env).unwrap();
        assert_eq!(table["dir"].as_str().unwrap(), "/home/dragon/data");
    }

    #[test]
    fn test_nested_and_arrays() {
        let mut table = make_table(
            r#"
            [db]
            url = "postgres://localhost:${environ.PORT}"
            paths = ["${environ.HOME}/a", "plain"]
            "#,
        );
        interpolate_environ(&mut table, &fake_env).unwrap();
        assert_eq!(
            table["db"]["url"].as_str().unwrap(),
            "postgres://localhost:5432"
        );
        assert_eq!(table["db"]["paths"][0].as_str().unwrap(), "/home/dragon/a");
        assert_eq!(table["db"]["paths"][1].as_str().unwrap(), "plain");
    }

    #[test]
    fn test_escape_sequence() {
        let mut table = make_table(r#"value = "use $${environ.HOME} literally, costs $5""#);
        interpolate_environ(&mut table, &fake_env).unwrap();
        assert_eq!(
            table["value"].as_str().unwrap(),
            "use ${environ.HOME} literally, costs $5"
        );
    }

    #[test]
    fn test_missing_variable() {
        let mut table = make_table(r#"x = "${environ.NOPE}""#);
        let result = interpolate_environ(&mut table, &fake_env);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(name)) if name == "NOPE"));
    }

    #[test]
    fn test_non_environ_reference() {
        let mut table = make_table(r#"x = "${server.host}""#);
        let result = interpolate_environ(&mut table, &fake_env);
        assert!(matches!(result, Err(ConfigError::InvalidReference(_))));
    }

    #[test]
    fn test_script_bodies_are_not_interpolated() {
        let mut table = make_table(
            r#"
            [setup]
            script-marker = ["greeting = '${name}'", "home = '${environ.HOME}'"]
            dir = "${environ.HOME}"
            "#,
        );
        interpolate_environ(&mut table, &fake_env).unwrap();

        let setup = &table["setup"];
        assert_eq!(setup["script-marker"][0].as_str().unwrap(), "greeting = '${name}'");
        assert_eq!(setup["script-marker"][1].as_str().unwrap(), "home = '${environ.HOME}'");
        assert_eq!(setup["dir"].as_str().unwrap(), "/home/dragon");
    }

    #[test]
    fn test_unclosed_reference() {
        let mut table = make_table(r#"x = "${environ.HOME""#);
        let result = interpolate_environ(&mut table, &fake_env);
        assert!(matches!(result, Err(ConfigError::UnclosedReference)));
    }
}
