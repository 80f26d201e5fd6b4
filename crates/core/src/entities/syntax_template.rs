use crate::versioning::{ItemKind, LibraryItemValue, ReferenceValidator};
use crate::{MdrError, MdrResult};
use serde::{Deserialize, Serialize};

/// A syntax template such as `"Percentage of [Population] with [Outcome]"`.
///
/// Bracketed segments are template parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyntaxTemplateVO {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidance_text: Option<String>,
}

impl SyntaxTemplateVO {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            guidance_text: None,
        }
    }

    /// Parameter names in order of appearance.
    ///
    /// # Errors
    ///
    /// Returns [`MdrError::BusinessLogic`] for nested, unbalanced or empty brackets.
    pub fn parameter_names(&self) -> MdrResult<Vec<String>> {
        let syntax_error = |detail: &str| {
            MdrError::BusinessLogic(format!(
                "Template string syntax error in '{}': {detail}.",
                self.name
            ))
        };

        let mut params = Vec::new();
        let mut current: Option<String> = None;
        for ch in self.name.chars() {
            match ch {
                '[' => {
                    if current.is_some() {
                        return Err(syntax_error("nested brackets"));
                    }
                    current = Some(String::new());
                }
                ']' => {
                    let param = current
                        .take()
                        .ok_or_else(|| syntax_error("unbalanced brackets"))?;
                    let name = param.trim();
                    if name.is_empty() {
                        return Err(syntax_error("empty parameter"));
                    }
                    params.push(name.to_string());
                }
                c => {
                    if let Some(param) = current.as_mut() {
                        param.push(c);
                    }
                }
            }
        }
        if current.is_some() {
            return Err(syntax_error("unbalanced brackets"));
        }
        Ok(params)
    }
}

impl LibraryItemValue for SyntaxTemplateVO {
    const KIND: ItemKind = ItemKind::SyntaxTemplate;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(
        &self,
        validator: &dyn ReferenceValidator,
        _previous: Option<&Self>,
    ) -> MdrResult<()> {
        if self.name.trim().is_empty() {
            return Err(MdrError::Validation("name must not be empty".into()));
        }
        for param in self.parameter_names()? {
            if !validator.template_parameter_exists(&param)? {
                return Err(MdrError::BusinessLogic(format!(
                    "Template parameter ({param}) does not exist."
                )));
            }
        }
        Ok(())
    }
}
