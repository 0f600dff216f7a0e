//! Placeholder templates
//!
//! Templates use `{name}` placeholders. `{{` and `}}` render as literal braces.

use std::collections::HashMap;

use thiserror::Error;

/// Values substituted into a template, keyed by placeholder name
pub type TemplateFields = HashMap<String, String>;

/// Errors that can occur when rendering a template
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A placeholder has no value in the field set
    #[error("missing template variable '{0}'")]
    MissingVariable(String),

    /// A `{` is never closed
    #[error("unclosed placeholder at byte {0}")]
    UnclosedPlaceholder(usize),

    /// A `}` has no opening `{`
    #[error("unmatched '}}' at byte {0}")]
    UnmatchedBrace(usize),

    /// A `{}` placeholder with no name
    #[error("empty placeholder at byte {0}")]
    EmptyPlaceholder(usize),
}

/// A subject and body template pair
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    /// The subject template
    pub subject: String,

    /// The HTML body template
    pub body: String,

    /// Optional plain text body template; derived from the HTML body when absent
    pub plain_body: Option<String>,
}

/// A subject and body rendered for one recipient
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedTemplate {
    /// The rendered subject
    pub subject: String,

    /// The rendered HTML body
    pub body: String,

    /// The rendered plain text body, if a plain text template was given
    pub plain_body: Option<String>,
}

impl Template {
    /// Create a new template pair
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            plain_body: None,
        }
    }

    /// Sets a plain text body template
    pub fn with_plain_body(mut self, plain_body: impl Into<String>) -> Self {
        self.plain_body = Some(plain_body.into());
        self
    }

    /// Renders every part of the template. Nothing is returned unless all of
    /// them render completely.
    pub fn render(&self, fields: &TemplateFields) -> Result<RenderedTemplate, TemplateError> {
        Ok(RenderedTemplate {
            subject: render(&self.subject, fields)?,
            body: render(&self.body, fields)?,
            plain_body: self
                .plain_body
                .as_deref()
                .map(|plain| render(plain, fields))
                .transpose()?,
        })
    }
}

/// Substitutes every `{name}` placeholder in `template` with its value in `fields`.
///
/// # Returns
/// The rendered text, or a [`TemplateError`] naming the first placeholder
/// that could not be resolved. Partial output is never returned.
pub fn render(template: &str, fields: &TemplateFields) -> Result<String, TemplateError> {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;

    while let Some(index) = rest.find(['{', '}']) {
        rendered.push_str(&rest[..index]);

        let position = offset + index;
        let tail = &rest[index..];

        let consumed = if tail.starts_with("{{") {
            rendered.push('{');
            2
        } else if tail.starts_with("}}") {
            rendered.push('}');
            2
        } else if tail.starts_with('}') {
            return Err(TemplateError::UnmatchedBrace(position));
        } else {
            let close = tail
                .find('}')
                .ok_or(TemplateError::UnclosedPlaceholder(position))?;
            let name = &tail[1..close];

            if name.is_empty() {
                return Err(TemplateError::EmptyPlaceholder(position));
            }

            if name.contains('{') {
                return Err(TemplateError::UnclosedPlaceholder(position));
            }

            let value = fields
                .get(name)
                .ok_or_else(|| TemplateError::MissingVariable(name.to_string()))?;

            rendered.push_str(value);
            close + 1
        };

        rest = &tail[consumed..];
        offset = position + consumed;
    }

    rendered.push_str(rest);

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> TemplateFields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_substitutes_placeholders() -> TestResult {
        let rendered = render("Olá {nome}!", &fields(&[("nome", "Ana")]))?;

        assert_eq!(rendered, "Olá Ana!");

        Ok(())
    }

    #[test]
    fn test_render_preserves_literal_text() -> TestResult {
        let template = "<p>Seu e-mail é {email}. {proximo_passos}</p> ✉️";

        let rendered = render(
            template,
            &fields(&[
                ("email", "fulano@exemplo.com"),
                ("proximo_passos", "Entre em contato conosco."),
            ]),
        )?;

        assert_eq!(
            rendered,
            "<p>Seu e-mail é fulano@exemplo.com. Entre em contato conosco.</p> ✉️"
        );

        Ok(())
    }

    #[test]
    fn test_render_without_placeholders_is_identity() -> TestResult {
        assert_eq!(render("plain subject", &TemplateFields::new())?, "plain subject");
        assert_eq!(render("", &TemplateFields::new())?, "");

        Ok(())
    }

    #[test]
    fn test_render_repeated_placeholder() -> TestResult {
        let rendered = render("{nome} {nome}", &fields(&[("nome", "Ana")]))?;

        assert_eq!(rendered, "Ana Ana");

        Ok(())
    }

    #[test]
    fn test_render_does_not_expand_values() -> TestResult {
        let rendered = render("{nome}", &fields(&[("nome", "{email}")]))?;

        assert_eq!(rendered, "{email}");

        Ok(())
    }

    #[test]
    fn test_render_missing_variable() {
        let result = render("Olá {nome}, {cidade}", &fields(&[("nome", "Ana")]));

        assert_eq!(
            result,
            Err(TemplateError::MissingVariable("cidade".to_string()))
        );
    }

    #[test]
    fn test_render_escaped_braces() -> TestResult {
        let rendered = render("a {{literal}} {nome}", &fields(&[("nome", "Ana")]))?;

        assert_eq!(rendered, "a {literal} Ana");

        Ok(())
    }

    #[test]
    fn test_render_unclosed_placeholder() {
        assert_eq!(
            render("Olá {nome", &fields(&[("nome", "Ana")])),
            Err(TemplateError::UnclosedPlaceholder(5))
        );
    }

    #[test]
    fn test_render_nested_brace_is_unclosed() {
        assert!(matches!(
            render("{a{b}", &fields(&[("a{b", "x")])),
            Err(TemplateError::UnclosedPlaceholder(0))
        ));
    }

    #[test]
    fn test_render_unmatched_closing_brace() {
        assert_eq!(
            render("oops } here", &TemplateFields::new()),
            Err(TemplateError::UnmatchedBrace(5))
        );
    }

    #[test]
    fn test_render_empty_placeholder() {
        assert_eq!(
            render("x {} y", &TemplateFields::new()),
            Err(TemplateError::EmptyPlaceholder(2))
        );
    }

    #[test]
    fn test_template_pair_fails_if_either_part_fails() {
        let template = Template::new("Olá {nome}", "<p>{desconhecido}</p>");

        let result = template.render(&fields(&[("nome", "Ana")]));

        assert_eq!(
            result,
            Err(TemplateError::MissingVariable("desconhecido".to_string()))
        );
    }

    #[test]
    fn test_template_renders_plain_body() -> TestResult {
        let template =
            Template::new("Olá {nome}", "<p>Olá {nome}</p>").with_plain_body("Olá {nome}");

        let rendered = template.render(&fields(&[("nome", "Ana")]))?;

        assert_eq!(rendered.subject, "Olá Ana");
        assert_eq!(rendered.body, "<p>Olá Ana</p>");
        assert_eq!(rendered.plain_body.as_deref(), Some("Olá Ana"));

        Ok(())
    }
}
