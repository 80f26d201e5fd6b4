use super::ensure_unique;
use crate::versioning::{ItemKind, LibraryItemValue, ReferenceValidator};
use crate::{MdrError, MdrResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An ODM form definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OdmFormVO {
    pub oid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdtm_version: Option<String>,
    #[serde(default)]
    pub repeating: bool,
    /// CT term describing the form's scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_uid: Option<String>,
}

impl OdmFormVO {
    pub fn new(name: &str) -> Self {
        Self {
            oid: default_oid(name),
            name: name.to_string(),
            sdtm_version: None,
            repeating: false,
            scope_uid: None,
        }
    }
}

fn default_oid(name: &str) -> String {
    format!("F.{name}")
}

impl LibraryItemValue for OdmFormVO {
    const KIND: ItemKind = ItemKind::OdmForm;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(
        &self,
        validator: &dyn ReferenceValidator,
        previous: Option<&Self>,
    ) -> MdrResult<()> {
        if self.name.trim().is_empty() {
            return Err(MdrError::Validation("name must not be empty".into()));
        }
        if self.oid.trim().is_empty() {
            return Err(MdrError::Validation("oid must not be empty".into()));
        }
        ensure_unique(
            validator,
            Self::KIND,
            "name",
            &self.name,
            previous.map(|p| p.name.as_str()),
        )?;
        ensure_unique(
            validator,
            Self::KIND,
            "oid",
            &self.oid,
            previous.map(|p| p.oid.as_str()),
        )?;

        if let Some(scope_uid) = &self.scope_uid {
            if !validator.item_exists(ItemKind::CtTerm, scope_uid)? {
                return Err(MdrError::BusinessLogic(format!(
                    "ODM Form tried to connect to non-existent CT Term ({scope_uid})."
                )));
            }
        }
        Ok(())
    }

    fn prepare_input(input: &mut Map<String, Value>) {
        let missing_oid = matches!(input.get("oid"), None | Some(Value::Null));
        if !missing_oid {
            return;
        }
        if let Some(Value::String(name)) = input.get("name") {
            let oid = default_oid(name);
            input.insert("oid".into(), Value::String(oid));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versioning::testing::FakeValidator;
    use serde_json::json;

    #[test]
    fn missing_oid_is_derived_from_name() {
        let mut input = json!({"name": "Vitals"}).as_object().cloned().unwrap();
        OdmFormVO::prepare_input(&mut input);
        assert_eq!(input["oid"], json!("F.Vitals"));

        let mut explicit = json!({"name": "Vitals", "oid": "F.VS"})
            .as_object()
            .cloned()
            .unwrap();
        OdmFormVO::prepare_input(&mut explicit);
        assert_eq!(explicit["oid"], json!("F.VS"));
    }

    #[test]
    fn scope_must_reference_ct_term() {
        let v = FakeValidator::default().with_item(ItemKind::CtTerm, "term-1", &[]);
        let mut form = OdmFormVO::new("Vitals");
        form.scope_uid = Some("term-1".into());
        assert!(form.validate(&v, None).is_ok());

        form.scope_uid = Some("term-2".into());
        assert!(matches!(
            form.validate(&v, None),
            Err(MdrError::BusinessLogic(_))
        ));
    }

    #[test]
    fn oid_must_be_unique() {
        let v = FakeValidator::default().with_item(ItemKind::OdmForm, "f1", &[("oid", "F.Vitals")]);
        let mut form = OdmFormVO::new("Vital signs");
        form.oid = "F.Vitals".into();
        assert!(matches!(
            form.validate(&v, None),
            Err(MdrError::AlreadyExists(_))
        ));
    }
}
