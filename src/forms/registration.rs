use serde::Deserialize;

use super::{is_checked, parse_choice, parse_date, FieldSpec, FieldView, FormView};
use crate::domain::{NewRegistration, PriorParticipation, TripId, VisionStatus};
use crate::validation::{
    normalize_email, normalize_phone, normalize_postal_code, required_text, FieldErrors,
    ValidationError,
};

pub const PERSON_NAME_MAX_CHARS: usize = 100;
pub const ADDRESS_MAX_CHARS: usize = 200;

const REQUIRED: (&str, &str) = ("aria-required", "true");

pub const FIRST_NAME: FieldSpec = FieldSpec {
    name: "first_name",
    label: "Imię",
    help: None,
    input_type: "text",
    attrs: &[("autocomplete", "given-name"), REQUIRED],
};
pub const LAST_NAME: FieldSpec = FieldSpec {
    name: "last_name",
    label: "Nazwisko",
    help: None,
    input_type: "text",
    attrs: &[("autocomplete", "family-name"), REQUIRED],
};
pub const EMAIL: FieldSpec = FieldSpec {
    name: "email",
    label: "Adres e-mail",
    help: None,
    input_type: "email",
    attrs: &[("autocomplete", "email"), REQUIRED],
};
pub const PHONE: FieldSpec = FieldSpec {
    name: "phone",
    label: "Numer telefonu",
    help: Some("Wpisz 9 cyfr numeru (bez prefiksu +48)"),
    input_type: "text",
    attrs: &[
        ("autocomplete", "tel"),
        ("inputmode", "numeric"),
        REQUIRED,
        ("maxlength", "11"),
        ("pattern", r"\d{3}\s?\d{3}\s?\d{3}"),
        ("title", "9 cyfr numeru telefonu"),
    ],
};
pub const BIRTH_DATE: FieldSpec = FieldSpec {
    name: "birth_date",
    label: "Data urodzenia",
    help: None,
    input_type: "date",
    attrs: &[("autocomplete", "bday"), REQUIRED],
};
pub const ADDRESS: FieldSpec = FieldSpec {
    name: "address",
    label: "Adres",
    help: None,
    input_type: "text",
    attrs: &[("autocomplete", "street-address"), REQUIRED],
};
pub const POSTAL_CODE: FieldSpec = FieldSpec {
    name: "postal_code",
    label: "Kod pocztowy",
    help: Some("Format: XX-XXX (np. 00-001)"),
    input_type: "text",
    attrs: &[
        ("autocomplete", "postal-code"),
        ("inputmode", "numeric"),
        REQUIRED,
        ("maxlength", "6"),
        ("pattern", r"\d{2}-\d{3}"),
        ("title", "Format: XX-XXX (np. 00-001)"),
    ],
};
pub const CITY: FieldSpec = FieldSpec {
    name: "city",
    label: "Miejscowość",
    help: None,
    input_type: "text",
    attrs: &[("autocomplete", "address-level2"), REQUIRED],
};
pub const VISION: FieldSpec = FieldSpec {
    name: "vision",
    label: "Status wzroku",
    help: Some("Wybierz opcję najbliższą Twojej sytuacji"),
    input_type: "select",
    attrs: &[REQUIRED],
};
pub const PRIOR_PARTICIPATION: FieldSpec = FieldSpec {
    name: "prior_participation",
    label: "Udział w poprzednich rejsach",
    help: Some("Czy brałeś/aś już udział w rejsach Zobaczyć Morze?"),
    input_type: "select",
    attrs: &[REQUIRED],
};
pub const GDPR_CONSENT: FieldSpec = FieldSpec {
    name: "gdpr_consent",
    label: "Wyrażam zgodę na przetwarzanie moich danych osobowych zgodnie z polityką prywatności Zobaczyć Morze",
    help: None,
    input_type: "checkbox",
    attrs: &[REQUIRED],
};

/// Registration form as posted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub vision: String,
    pub prior_participation: String,
    pub gdpr_consent: Option<String>,
}

impl RegistrationForm {
    /// Validate and normalize every field, collecting all errors.
    pub fn clean(&self, trip_id: TripId) -> Result<NewRegistration, FieldErrors> {
        let mut errors = FieldErrors::new();

        let first_name = errors.check(
            FIRST_NAME.name,
            required_text(&self.first_name, PERSON_NAME_MAX_CHARS),
        );
        let last_name = errors.check(
            LAST_NAME.name,
            required_text(&self.last_name, PERSON_NAME_MAX_CHARS),
        );
        let email = errors.check(EMAIL.name, normalize_email(&self.email));
        let phone = errors.check(PHONE.name, normalize_phone(&self.phone));
        let birth_date = errors.check(BIRTH_DATE.name, parse_date(&self.birth_date));
        let address = errors.check(ADDRESS.name, required_text(&self.address, ADDRESS_MAX_CHARS));
        let postal_code = errors.check(POSTAL_CODE.name, normalize_postal_code(&self.postal_code));
        let city = errors.check(CITY.name, required_text(&self.city, PERSON_NAME_MAX_CHARS));
        let vision = errors.check(VISION.name, parse_choice::<VisionStatus>(&self.vision));
        let prior_participation = errors.check(
            PRIOR_PARTICIPATION.name,
            parse_choice::<PriorParticipation>(&self.prior_participation),
        );
        let gdpr_consent = errors.check(
            GDPR_CONSENT.name,
            if is_checked(&self.gdpr_consent) {
                Ok(true)
            } else {
                Err(ValidationError::required())
            },
        );

        match (
            first_name,
            last_name,
            email,
            phone,
            birth_date,
            address,
            postal_code,
            city,
            vision,
            prior_participation,
            gdpr_consent,
        ) {
            (
                Some(first_name),
                Some(last_name),
                Some(email),
                Some(phone),
                Some(birth_date),
                Some(address),
                Some(postal_code),
                Some(city),
                Some(vision),
                Some(prior_participation),
                Some(gdpr_consent),
            ) => Ok(NewRegistration {
                trip_id,
                first_name,
                last_name,
                email,
                phone,
                birth_date,
                address,
                postal_code,
                city,
                vision,
                prior_participation,
                gdpr_consent,
            }),
            _ => Err(errors),
        }
    }

    pub fn view(&self, errors: &FieldErrors) -> FormView {
        FormView {
            fields: vec![
                FieldView::new(&FIRST_NAME, &self.first_name, errors),
                FieldView::new(&LAST_NAME, &self.last_name, errors),
                FieldView::new(&EMAIL, &self.email, errors),
                FieldView::new(&PHONE, &self.phone, errors),
                FieldView::new(&BIRTH_DATE, &self.birth_date, errors),
                FieldView::new(&ADDRESS, &self.address, errors),
                FieldView::new(&POSTAL_CODE, &self.postal_code, errors),
                FieldView::new(&CITY, &self.city, errors),
                FieldView::select::<VisionStatus>(&VISION, &self.vision, errors),
                FieldView::select::<PriorParticipation>(
                    &PRIOR_PARTICIPATION,
                    &self.prior_participation,
                    errors,
                ),
                FieldView::checkbox(&GDPR_CONSENT, is_checked(&self.gdpr_consent), errors),
            ],
            non_field_errors: errors.non_field().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn filled() -> RegistrationForm {
        RegistrationForm {
            first_name: " Jan ".to_string(),
            last_name: "Kowalski".to_string(),
            email: "jan.kowalski@example.com".to_string(),
            phone: "501 234 567".to_string(),
            birth_date: "1985-03-15".to_string(),
            address: "ul. Morska 12/5".to_string(),
            postal_code: "81350".to_string(),
            city: "Gdynia".to_string(),
            vision: "NIEWIDOMY".to_string(),
            prior_participation: "nie".to_string(),
            gdpr_consent: Some("on".to_string()),
        }
    }

    #[test]
    fn clean_normalizes() {
        let new = filled().clean(TripId(3)).unwrap();
        assert_eq!(new.trip_id, TripId(3));
        assert_eq!(new.first_name, "Jan");
        assert_eq!(new.phone, "+48501234567");
        assert_eq!(new.postal_code, "81-350");
        assert_eq!(new.birth_date, NaiveDate::from_ymd_opt(1985, 3, 15).unwrap());
        assert_eq!(new.vision, VisionStatus::Blind);
        assert_eq!(new.prior_participation, PriorParticipation::No);
        assert!(new.gdpr_consent);
    }

    #[test]
    fn empty_form_reports_every_field() {
        let errors = RegistrationForm::default().clean(TripId(1)).unwrap_err();
        for spec in [
            FIRST_NAME,
            LAST_NAME,
            EMAIL,
            PHONE,
            BIRTH_DATE,
            ADDRESS,
            POSTAL_CODE,
            CITY,
            VISION,
            PRIOR_PARTICIPATION,
            GDPR_CONSENT,
        ] {
            assert!(errors.has(spec.name), "no error for {}", spec.name);
        }
    }

    #[test]
    fn consent_is_required() {
        let form = RegistrationForm {
            gdpr_consent: None,
            ..filled()
        };
        let errors = form.clean(TripId(1)).unwrap_err();
        assert_eq!(errors.get("gdpr_consent"), ["To pole jest wymagane."]);
    }

    #[test]
    fn view_keeps_entered_values_and_marks_errors() {
        let form = RegistrationForm {
            phone: "123".to_string(),
            ..filled()
        };
        let errors = form.clean(TripId(1)).unwrap_err();
        let view = form.view(&errors);

        let phone = view.field("phone").unwrap();
        assert!(phone.invalid);
        assert_eq!(phone.value, "123");
        assert_eq!(phone.describedby.as_deref(), Some("id_phone-hint id_phone-error"));

        let city = view.field("city").unwrap();
        assert!(!city.invalid);
        assert_eq!(city.describedby, None);
        assert!(view.field("gdpr_consent").unwrap().checked);
    }
}
