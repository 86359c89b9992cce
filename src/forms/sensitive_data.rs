use serde::Deserialize;

use super::{is_checked, parse_choice, FieldSpec, FieldView, FormView};
use crate::domain::{DocumentType, NewSensitiveData};
use crate::validation::{required_text, validate_pesel, FieldErrors, ValidationError};

pub const DOCUMENT_NUMBER_MAX_CHARS: usize = 50;

pub const CONSENT_REQUIRED: &str =
    "Musisz wyrazić zgodę na przetwarzanie danych wrażliwych, aby kontynuować.";

pub const PESEL: FieldSpec = FieldSpec {
    name: "pesel",
    label: "PESEL",
    help: Some("Podaj swój numer PESEL (11 cyfr)."),
    input_type: "text",
    attrs: &[
        ("aria-required", "true"),
        ("inputmode", "numeric"),
        ("maxlength", "11"),
        ("pattern", "[0-9]{11}"),
    ],
};
pub const DOCUMENT_TYPE: FieldSpec = FieldSpec {
    name: "document_type",
    label: "Typ dokumentu",
    help: Some("Wybierz dokument, który zgodnie z procedurami oddasz przy zaokrętowaniu."),
    input_type: "select",
    attrs: &[("aria-required", "true")],
};
pub const DOCUMENT_NUMBER: FieldSpec = FieldSpec {
    name: "document_number",
    label: "Numer dokumentu",
    help: Some("Podaj numer dokumentu, który oddasz przy zaokrętowaniu."),
    input_type: "text",
    attrs: &[("aria-required", "true")],
};
pub const CONSENT: FieldSpec = FieldSpec {
    name: "consent",
    label: "Zgoda na przetwarzanie danych",
    help: Some(
        "Wyrażam zgodę na przetwarzanie moich danych osobowych (PESEL, numer dokumentu) \
         w celu realizacji procedur zaokrętowania zgodnie z wymogami kapitana. \
         Dane zostaną usunięte w ciągu 30 dni po zakończeniu rejsu.",
    ),
    input_type: "checkbox",
    attrs: &[("aria-required", "true")],
};

/// Supplementary data form as posted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SensitiveDataForm {
    pub pesel: String,
    pub document_type: String,
    pub document_number: String,
    pub consent: Option<String>,
}

impl SensitiveDataForm {
    pub fn clean(&self) -> Result<NewSensitiveData, FieldErrors> {
        let mut errors = FieldErrors::new();

        let pesel = errors.check(
            PESEL.name,
            validate_pesel(&self.pesel).map_err(ValidationError::from),
        );
        let document_type = errors.check(
            DOCUMENT_TYPE.name,
            parse_choice::<DocumentType>(&self.document_type),
        );
        let document_number = errors.check(
            DOCUMENT_NUMBER.name,
            required_text(&self.document_number, DOCUMENT_NUMBER_MAX_CHARS),
        );
        let consent = errors.check(
            CONSENT.name,
            if is_checked(&self.consent) {
                Ok(true)
            } else {
                Err(ValidationError::new(CONSENT_REQUIRED))
            },
        );

        match (pesel, document_type, document_number, consent) {
            (Some(pesel), Some(document_type), Some(document_number), Some(consent)) => {
                Ok(NewSensitiveData {
                    pesel,
                    document_type,
                    document_number,
                    consent,
                })
            }
            _ => Err(errors),
        }
    }

    /// The PESEL is never echoed back into the page.
    pub fn view(&self, errors: &FieldErrors) -> FormView {
        FormView {
            fields: vec![
                FieldView::new(&PESEL, "", errors),
                FieldView::select::<DocumentType>(&DOCUMENT_TYPE, &self.document_type, errors),
                FieldView::new(&DOCUMENT_NUMBER, &self.document_number, errors),
                FieldView::checkbox(&CONSENT, is_checked(&self.consent), errors),
            ],
            non_field_errors: errors.non_field().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> SensitiveDataForm {
        SensitiveDataForm {
            pesel: "900-214 01384".to_string(),
            document_type: "dowod-osobisty".to_string(),
            document_number: "ABC123456".to_string(),
            consent: Some("on".to_string()),
        }
    }

    #[test]
    fn clean_normalizes_pesel() {
        let data = filled().clean().unwrap();
        assert_eq!(data.pesel, "90021401384");
        assert_eq!(data.document_type, DocumentType::IdCard);
        assert!(data.consent);
    }

    #[test]
    fn bad_checksum_and_missing_consent() {
        let form = SensitiveDataForm {
            pesel: "90021401385".to_string(),
            consent: None,
            ..filled()
        };
        let errors = form.clean().unwrap_err();
        assert_eq!(
            errors.get("pesel"),
            ["Nieprawidłowy numer PESEL - błędna suma kontrolna."]
        );
        assert_eq!(errors.get("consent"), [CONSENT_REQUIRED]);
    }

    #[test]
    fn every_field_has_a_hint() {
        let view = filled().view(&FieldErrors::new());
        assert!(view.fields.iter().all(|f| f.describedby.is_some()));
        assert_eq!(view.field("pesel").unwrap().value, "");
    }
}
