//! Picks a specification for parameters that do not declare one.

use super::registry::DependencyRegistry;
use crate::params::signature::{DefaultValue, Param};
use crate::params::spec::ParameterSpec;

/// What inference may look at besides the parameter itself.
#[derive(Debug, Clone, Copy)]
pub struct InferenceContext<'a> {
    /// Placeholder names of the URL template.
    pub path_params: &'a [String],
    pub dependencies: &'a DependencyRegistry,
}

impl<'a> InferenceContext<'a> {
    #[must_use]
    pub const fn new(path_params: &'a [String], dependencies: &'a DependencyRegistry) -> Self {
        Self {
            path_params,
            dependencies,
        }
    }
}

/// Returns the prepared specification for `param`.
///
/// First match wins: an explicit marker, a name matching a URL placeholder,
/// a registered dependency type, a body-like type, and finally query.
#[must_use]
pub fn infer(param: &Param, context: &InferenceContext<'_>) -> ParameterSpec {
    let spec = match &param.default {
        DefaultValue::Spec(explicit) => explicit.clone(),
        _ if context.path_params.iter().any(|p| *p == param.name) => {
            ParameterSpec::path().alias(param.name.clone())
        }
        _ => match context.dependencies.lookup(&param.annotation) {
            Some(handler) => ParameterSpec::depends(handler.clone()),
            None if param.annotation.is_body_like() => ParameterSpec::body(),
            None => ParameterSpec::query(),
        },
    };

    // Inferred specs take the parameter's plain default
    let spec = match param.plain_default() {
        Some(value) => ParameterSpec {
            default: Some(value.clone()),
            ..spec
        },
        None => spec,
    };

    spec.prepare(&param.name)
}

/// True when inference has something to go on: an explicit marker, a
/// placeholder name or an annotation.
#[must_use]
pub fn is_inferable(param: &Param, context: &InferenceContext<'_>) -> bool {
    matches!(param.default, DefaultValue::Spec(_))
        || context.path_params.iter().any(|p| *p == param.name)
        || !param.annotation.is_any()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::registry::Profile;
    use crate::di::Handler;
    use crate::invocation::Output;
    use crate::params::signature::{ClassRef, RecordType, Signature, TypeHint};
    use crate::params::spec::Destination;
    use serde_json::json;

    fn placeholders() -> Vec<String> {
        vec!["id".to_string()]
    }

    #[test]
    fn test_path_name_wins_over_query() {
        let registry = DependencyRegistry::new();
        let path = placeholders();
        let ctx = InferenceContext::new(&path, &registry);

        let spec = infer(&Param::new("id", TypeHint::Str), &ctx);
        assert!(matches!(spec.destination, Destination::Path { .. }));
        assert_eq!(spec.alias.as_deref(), Some("id"));

        let query = infer(&Param::new("page", TypeHint::Int), &ctx);
        assert_eq!(query.destination, Destination::Query);
    }

    #[test]
    fn test_path_name_wins_over_body_annotation() {
        let registry = DependencyRegistry::new();
        let path = placeholders();
        let ctx = InferenceContext::new(&path, &registry);
        let spec = infer(&Param::new("id", TypeHint::Mapping), &ctx);
        assert!(matches!(spec.destination, Destination::Path { .. }));
    }

    #[test]
    fn test_explicit_marker_is_used_and_prepared() {
        let registry = DependencyRegistry::new();
        let path = placeholders();
        let ctx = InferenceContext::new(&path, &registry);
        let param = Param::new("id", TypeHint::Str).spec(ParameterSpec::header());

        let spec = infer(&param, &ctx);
        assert!(matches!(spec.destination, Destination::Header { .. }));
        assert_eq!(spec.alias.as_deref(), Some("id"));
    }

    #[test]
    fn test_dependency_before_body() {
        let mut registry = DependencyRegistry::new();
        let record = TypeHint::Record(RecordType::new("Session"));
        let handler = Handler::new("session", Signature::new(), |_| Ok(Output::Nothing));
        registry.register(record.clone(), handler.clone());
        let ctx = InferenceContext::new(&[], &registry);

        let spec = infer(&Param::new("session", record), &ctx);
        assert_eq!(
            spec.destination,
            Destination::Dependency(crate::params::spec::Dependency {
                handler,
                use_cache: true
            })
        );
    }

    #[test]
    fn test_subclass_dependency_match() {
        let mut registry = DependencyRegistry::new();
        registry.register(
            TypeHint::Class(ClassRef::new("Admin").extends("User")),
            Handler::new("admin", Signature::new(), |_| Ok(Output::Nothing)),
        );
        let ctx = InferenceContext::new(&[], &registry);
        let spec = infer(
            &Param::new("user", TypeHint::Class(ClassRef::new("User"))),
            &ctx,
        );
        assert!(matches!(spec.destination, Destination::Dependency(_)));
    }

    #[test]
    fn test_body_like_and_fallback() {
        let registry = DependencyRegistry::with_builtins(Profile::Request);
        let ctx = InferenceContext::new(&[], &registry);

        let body = infer(&Param::new("item", TypeHint::Record(RecordType::new("Item"))), &ctx);
        assert_eq!(body.destination, Destination::Body { embed: false });

        let mapping = infer(&Param::new("extra", TypeHint::Mapping), &ctx);
        assert!(mapping.is_body());

        let color = infer(&Param::new("color", TypeHint::Class(ClassRef::new("Color"))), &ctx);
        assert_eq!(color.destination, Destination::Query);
    }

    #[test]
    fn test_plain_default_carries_over() {
        let registry = DependencyRegistry::new();
        let ctx = InferenceContext::new(&[], &registry);
        let spec = infer(&Param::new("q", TypeHint::Str).default_value(json!(null)), &ctx);
        assert_eq!(spec.get_default(), Some(&json!(null)));

        let required = infer(&Param::new("q", TypeHint::Str), &ctx);
        assert!(!required.has_default());
    }

    #[test]
    fn test_inferable_needs_some_signal() {
        let registry = DependencyRegistry::new();
        let path = placeholders();
        let ctx = InferenceContext::new(&path, &registry);
        assert!(!is_inferable(&Param::new("x", TypeHint::Any), &ctx));
        assert!(is_inferable(&Param::new("id", TypeHint::Any), &ctx));
        assert!(is_inferable(&Param::new("x", TypeHint::Str), &ctx));
    }
}
