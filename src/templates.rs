//! Tera template loading and rendering for pages and emails.

use std::path::Path;

use tera::{Context, Tera};

use crate::infra::{RejsError, Result};

/// Directory bundled with the crate.
pub const DEFAULT_TEMPLATE_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/templates");

pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// Load every template under `dir` (names are relative, e.g. `pages/index.html`).
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let glob = dir.as_ref().join("**").join("*");
        let glob = glob
            .to_str()
            .ok_or_else(|| RejsError::Configuration("template path is not UTF-8".to_string()))?;
        let tera = Tera::new(glob)?;
        tracing::debug!(count = tera.get_template_names().count(), "templates loaded");
        Ok(Self { tera })
    }

    pub fn from_tera(tera: Tera) -> Self {
        Self { tera }
    }

    pub fn render(&self, name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(name, context)?)
    }

    /// `Ok(None)` when `name` does not exist; other failures are errors.
    pub fn render_optional(&self, name: &str, context: &Context) -> Result<Option<String>> {
        match self.tera.render(name, context) {
            Ok(rendered) => Ok(Some(rendered)),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn is_not_found(err: &tera::Error) -> bool {
    matches!(err.kind, tera::ErrorKind::TemplateNotFound(_))
}

/// Flatten a tera error and its sources into one line.
pub fn describe_error(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates() -> Templates {
        let mut tera = Tera::default();
        tera.add_raw_template("hello.txt", "Cześć {{ name }}").unwrap();
        tera.add_raw_template("broken.txt", "{{ missing_var }}").unwrap();
        Templates::from_tera(tera)
    }

    #[test]
    fn renders_existing_template() {
        let mut ctx = Context::new();
        ctx.insert("name", "Jan");
        assert_eq!(templates().render("hello.txt", &ctx).unwrap(), "Cześć Jan");
    }

    #[test]
    fn missing_template_is_none() {
        let ctx = Context::new();
        assert_eq!(templates().render_optional("nope.html", &ctx).unwrap(), None);
    }

    #[test]
    fn render_errors_are_not_swallowed() {
        let ctx = Context::new();
        assert!(matches!(
            templates().render_optional("broken.txt", &ctx),
            Err(RejsError::Template(_))
        ));
    }

    #[test]
    fn bundled_templates_load() {
        let templates = Templates::load(DEFAULT_TEMPLATE_DIR).unwrap();
        let names: Vec<_> = templates.tera.get_template_names().collect();
        assert!(names.contains(&"pages/index.html"));
        assert!(names.contains(&"emails/registration_created.txt"));
    }
}
