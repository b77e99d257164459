//! Path templates compiled into typed matchers.
//!
//! A template such as `/car/{id}` is made of literal text and `{name}`
//! placeholders. Each placeholder must name a path parameter of the route, and
//! only matches text satisfying the rule of that parameter's type: an integer
//! `{id}` matches `/car/-7` but not `/car/abc`.

use crate::error::{DefinitionResult, RouteDefinitionError};
use crate::param::ParameterSpec;
use regex::Regex;
use std::collections::HashMap;

/// Literal or placeholder piece of a template
#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Placeholder(String),
}

/// Matchable form of a path template
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// Raw template string
    template: String,
    pieces: Vec<Piece>,
    regex: Regex,
}

impl CompiledPattern {
    /// Compile `template` against the route's path parameters.
    pub fn compile(template: &str, path_parameters: &[ParameterSpec]) -> DefinitionResult<Self> {
        let pieces = parse_template(template)?;

        let mut expression = String::from("^");
        let mut seen: Vec<&str> = Vec::new();

        for piece in &pieces {
            match piece {
                Piece::Literal(text) => expression.push_str(&regex::escape(text)),
                Piece::Placeholder(name) => {
                    if seen.contains(&name.as_str()) {
                        return Err(RouteDefinitionError::DuplicatePlaceholder {
                            path: template.to_string(),
                            name: name.clone(),
                        });
                    }
                    seen.push(name.as_str());

                    let parameter = path_parameters
                        .iter()
                        .find(|parameter| parameter.name() == name)
                        .ok_or_else(|| RouteDefinitionError::UnknownPlaceholder {
                            path: template.to_string(),
                            name: name.clone(),
                        })?;

                    expression.push_str(&format!(
                        "(?P<{}>{})",
                        name,
                        parameter.type_tag().pattern()
                    ));
                }
            }
        }
        expression.push('$');

        if let Some(missing) = path_parameters
            .iter()
            .find(|parameter| !seen.contains(&parameter.name()))
        {
            return Err(RouteDefinitionError::MissingPlaceholder {
                path: template.to_string(),
                name: missing.name().to_string(),
            });
        }

        let regex = Regex::new(&expression).map_err(|source| RouteDefinitionError::Pattern {
            path: template.to_string(),
            source,
        })?;

        Ok(Self {
            template: template.to_string(),
            pieces,
            regex,
        })
    }

    /// Get the template string
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Compiled regular expression
    pub fn as_regex(&self) -> &Regex {
        &self.regex
    }

    /// Placeholder names, in template order
    pub fn parameter_names(&self) -> Vec<&str> {
        self.pieces
            .iter()
            .filter_map(|piece| match piece {
                Piece::Placeholder(name) => Some(name.as_str()),
                Piece::Literal(_) => None,
            })
            .collect()
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Match a request path and extract the raw placeholder values
    pub fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let captures = self.regex.captures(path)?;

        let params = self
            .parameter_names()
            .into_iter()
            .filter_map(|name| {
                captures
                    .name(name)
                    .map(|value| (name.to_string(), value.as_str().to_string()))
            })
            .collect();

        Some(params)
    }
}

/// Split a template into literal text and placeholders
fn parse_template(template: &str) -> DefinitionResult<Vec<Piece>> {
    let mut pieces = Vec::new();
    let mut rest = template;

    while !rest.is_empty() {
        match rest.find(['{', '}']) {
            None => {
                pieces.push(Piece::Literal(rest.to_string()));
                break;
            }
            Some(start) => {
                if rest[start..].starts_with('}') {
                    return Err(RouteDefinitionError::UnbalancedBraces {
                        path: template.to_string(),
                    });
                }
                if start > 0 {
                    pieces.push(Piece::Literal(rest[..start].to_string()));
                }

                let after = &rest[start + 1..];
                let end = after.find('}').ok_or_else(|| RouteDefinitionError::UnbalancedBraces {
                    path: template.to_string(),
                })?;

                let name = &after[..end];
                if !is_identifier(name) {
                    return Err(RouteDefinitionError::InvalidPlaceholder {
                        path: template.to_string(),
                        name: name.to_string(),
                    });
                }

                pieces.push(Piece::Placeholder(name.to_string()));
                rest = &after[end + 1..];
            }
        }
    }

    Ok(pieces)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id_param() -> Vec<ParameterSpec> {
        vec![ParameterSpec::path::<i64>("id")]
    }

    #[test]
    fn test_static_template() {
        let pattern = CompiledPattern::compile("/api/v1/users", &[]).unwrap();

        let params = pattern.match_path("/api/v1/users");
        assert!(params.is_some());
        assert_eq!(params.unwrap().len(), 0);

        assert!(pattern.match_path("/api/v1/posts").is_none());
        assert!(pattern.match_path("/api/v1/users/").is_none());
    }

    #[test]
    fn test_integer_placeholder_boundaries() {
        let pattern = CompiledPattern::compile("/car/{id}", &id_param()).unwrap();

        for accepted in ["0", "-7", "+3", "42"] {
            let params = pattern.match_path(&format!("/car/{}", accepted)).unwrap();
            assert_eq!(params.get("id").map(String::as_str), Some(accepted));
        }
        for rejected in ["12.5", "abc", ""] {
            assert!(pattern.match_path(&format!("/car/{}", rejected)).is_none(), "{}", rejected);
        }
    }

    #[test]
    fn test_typed_placeholders() {
        let params = vec![
            ParameterSpec::path::<f64>("ratio"),
            ParameterSpec::path::<bool>("active"),
            ParameterSpec::path::<String>("slug"),
        ];
        let pattern = CompiledPattern::compile("/r/{ratio}/{active}/{slug}", &params).unwrap();

        assert!(pattern.is_match("/r/1.5/TRUE/some-thing"));
        assert!(pattern.is_match("/r/-2/0/x"));
        assert!(!pattern.is_match("/r/1./true/x"));
        assert!(!pattern.is_match("/r/1.5/yes/x"));
        assert!(!pattern.is_match("/r/1.5/true/a/b"));
    }

    #[test]
    fn test_multiple_parameters() {
        let params = vec![
            ParameterSpec::path::<i64>("post_id"),
            ParameterSpec::path::<i64>("comment_id"),
        ];
        let pattern =
            CompiledPattern::compile("/posts/{post_id}/comments/{comment_id}", &params).unwrap();

        let captured = pattern.match_path("/posts/456/comments/789").unwrap();
        assert_eq!(captured.get("post_id"), Some(&"456".to_string()));
        assert_eq!(captured.get("comment_id"), Some(&"789".to_string()));
        assert_eq!(pattern.parameter_names(), vec!["post_id", "comment_id"]);
    }

    #[test]
    fn test_literals_are_escaped() {
        let pattern = CompiledPattern::compile("/files/{id}.json", &id_param()).unwrap();
        assert!(pattern.is_match("/files/3.json"));
        assert!(!pattern.is_match("/files/3xjson"));
    }

    #[test]
    fn test_unknown_placeholder() {
        let err = CompiledPattern::compile("/car/{name}", &id_param()).unwrap_err();
        assert!(matches!(err, RouteDefinitionError::UnknownPlaceholder { .. }));
    }

    #[test]
    fn test_duplicate_placeholder() {
        let err = CompiledPattern::compile("/car/{id}/{id}", &id_param()).unwrap_err();
        assert!(matches!(err, RouteDefinitionError::DuplicatePlaceholder { .. }));
    }

    #[test]
    fn test_missing_placeholder() {
        let err = CompiledPattern::compile("/car", &id_param()).unwrap_err();
        assert!(matches!(err, RouteDefinitionError::MissingPlaceholder { .. }));
    }

    #[test]
    fn test_malformed_templates() {
        for template in ["/car/{id", "/car/id}", "/car/{}", "/car/{1d}"] {
            let err = CompiledPattern::compile(template, &id_param()).unwrap_err();
            assert!(
                matches!(
                    err,
                    RouteDefinitionError::UnbalancedBraces { .. }
                        | RouteDefinitionError::InvalidPlaceholder { .. }
                ),
                "{}: {}",
                template,
                err
            );
        }
    }

    #[test]
    fn test_untyped_placeholder() {
        let params = vec![ParameterSpec::untyped("name", None)];
        let pattern = CompiledPattern::compile("/brand/{name}", &params).unwrap();
        let captured = pattern.match_path("/brand/Toyota").unwrap();
        assert_eq!(captured.get("name").map(String::as_str), Some("Toyota"));
    }
}
