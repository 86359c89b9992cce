//! Demo data with dates relative to today, for local development.
//!
//! Writes straight through the repositories, so no emails are sent.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

use crate::domain::{
    AnnouncementInput, NewRegistration, PaymentInput, PaymentKind, PriorParticipation,
    RegistrationStatus, TripInput, VisionStatus, WatchInput,
};
use crate::infra::sqlite::{Announcements, Payments, Registrations, Trips, Watches};
use crate::infra::{Database, Result};

struct SampleTrip {
    name: &'static str,
    months_offset: i64,
    duration_days: i64,
    from: &'static str,
    to: &'static str,
    price: i64,
    deposit: i64,
    description: &'static str,
}

const FUTURE_TRIPS: &[SampleTrip] = &[
    SampleTrip {
        name: "Rejs Bałtycki",
        months_offset: 1,
        duration_days: 14,
        from: "Gdynia",
        to: "Sztokholm",
        price: 3500,
        deposit: 500,
        description: "Dwutygodniowy rejs po Bałtyku. Odwiedzimy malownicze porty Szwecji i poznamy uroki żeglarstwa morskiego. Rejs przeznaczony dla osób niewidomych i słabowidzących oraz ich przewodników.",
    },
    SampleTrip {
        name: "Rejs Fiński",
        months_offset: 2,
        duration_days: 14,
        from: "Gdynia",
        to: "Helsinki",
        price: 4000,
        deposit: 600,
        description: "Rejs do stolicy Finlandii z postojami w portach Estonii. Niezapomniane widoki archipelagu fińskiego i białe noce północy.",
    },
    SampleTrip {
        name: "Rejs Norweski",
        months_offset: 3,
        duration_days: 14,
        from: "Gdańsk",
        to: "Bergen",
        price: 5500,
        deposit: 800,
        description: "Wyprawa do krainy fiordów. Dwutygodniowa przygoda wzdłuż norweskiego wybrzeża z wizytą w Bergen.",
    },
    SampleTrip {
        name: "Rejs Duński",
        months_offset: 4,
        duration_days: 10,
        from: "Świnoujście",
        to: "Kopenhaga",
        price: 2800,
        deposit: 400,
        description: "Krótszy rejs do duńskiej stolicy. Idealny dla osób, które chcą spróbować żeglarstwa morskiego bez długiego zobowiązania czasowego.",
    },
    SampleTrip {
        name: "Rejs Estoński",
        months_offset: 5,
        duration_days: 14,
        from: "Gdynia",
        to: "Tallinn",
        price: 3200,
        deposit: 500,
        description: "Rejs do Estonii. Złota polska jesień na morzu i wizyta w średniowiecznym Tallinnie.",
    },
];

const PAST_TRIPS: &[SampleTrip] = &[
    SampleTrip {
        name: "Rejs Litewski (archiwalny)",
        months_offset: -3,
        duration_days: 10,
        from: "Gdynia",
        to: "Kłajpeda",
        price: 2500,
        deposit: 400,
        description: "Rejs do Litwy zakończony. Uczestnicy odwiedzili Kłajpedę i poznali litewskie wybrzeże.",
    },
    SampleTrip {
        name: "Rejs Bornholmski (archiwalny)",
        months_offset: -1,
        duration_days: 7,
        from: "Gdańsk",
        to: "Bornholm",
        price: 1800,
        deposit: 300,
        description: "Krótki rejs na duńską wyspę Bornholm. Rejs zakończony sukcesem.",
    },
];

const WATCH_NAMES: [&str; 3] = ["Alfa", "Beta", "Gamma"];

/// (first name, last name, email, phone, birth date, address, postal code, city, vision)
type Participant = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    VisionStatus,
);

const PARTICIPANTS: &[Participant] = &[
    ("Jan", "Kowalski", "jan.kowalski@example.com", "+48501234567", "1985-03-15", "ul. Morska 12/5", "81-350", "Gdynia", VisionStatus::Blind),
    ("Anna", "Nowak", "anna.nowak@example.com", "+48502345678", "1990-07-22", "ul. Słoneczna 5", "80-001", "Gdańsk", VisionStatus::VisuallyImpaired),
    ("Piotr", "Wiśniewski", "piotr.wisniewski@example.com", "+48503456789", "1978-11-30", "ul. Leśna 8", "81-100", "Gdynia", VisionStatus::Blind),
    ("Maria", "Wójcik", "maria.wojcik@example.com", "+48504567890", "1995-02-14", "ul. Kwiatowa 3/10", "00-001", "Warszawa", VisionStatus::Sighted),
    ("Tomasz", "Kamiński", "tomasz.kaminski@example.com", "+48505678901", "1982-06-08", "ul. Parkowa 15", "30-001", "Kraków", VisionStatus::Blind),
    ("Katarzyna", "Lewandowska", "katarzyna.lewandowska@example.com", "+48506789012", "1988-09-25", "ul. Główna 22", "50-001", "Wrocław", VisionStatus::VisuallyImpaired),
    ("Michał", "Zieliński", "michal.zielinski@example.com", "+48507890123", "1992-12-03", "ul. Nadmorska 7", "76-200", "Słupsk", VisionStatus::Blind),
    ("Agnieszka", "Szymańska", "agnieszka.szymanska@example.com", "+48508901234", "1975-04-18", "ul. Portowa 1", "70-001", "Szczecin", VisionStatus::Sighted),
    ("Robert", "Dąbrowski", "robert.dabrowski@example.com", "+48509012345", "1980-08-12", "ul. Żeglarska 9", "81-300", "Gdynia", VisionStatus::Blind),
    ("Ewa", "Mazur", "ewa.mazur@example.com", "+48510123456", "1998-01-28", "ul. Bałtycka 14", "84-100", "Puck", VisionStatus::VisuallyImpaired),
    ("Krzysztof", "Jankowski", "krzysztof.jankowski@example.com", "+48511234567", "1970-05-05", "ul. Kapitańska 2", "81-400", "Gdynia", VisionStatus::Sighted),
    ("Magdalena", "Krawczyk", "magdalena.krawczyk@example.com", "+48512345678", "1993-10-17", "ul. Marynarska 6", "81-200", "Gdynia", VisionStatus::Blind),
];

const STATUSES: [RegistrationStatus; 12] = [
    RegistrationStatus::Qualified,
    RegistrationStatus::Qualified,
    RegistrationStatus::Unqualified,
    RegistrationStatus::Qualified,
    RegistrationStatus::Rejected,
    RegistrationStatus::Unqualified,
    RegistrationStatus::Qualified,
    RegistrationStatus::Qualified,
    RegistrationStatus::Unqualified,
    RegistrationStatus::Qualified,
    RegistrationStatus::Qualified,
    RegistrationStatus::Unqualified,
];

const ANNOUNCEMENTS: [(&str, &str); 2] = [
    (
        "Informacja o zaokrętowaniu",
        "Zaokrętowanie odbędzie się o godzinie 10:00 w porcie. Prosimy o punktualne przybycie z dokumentem tożsamości.",
    ),
    (
        "Lista rzeczy do zabrania",
        "Prosimy o zabranie: ciepłej kurtki, nieprzemakalnego ubrania, wygodnego obuwia z antypoślizgową podeszwą, leków (jeśli są potrzebne), okularów przeciwsłonecznych.",
    ),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleDataSummary {
    pub future_trips: usize,
    pub past_trips: usize,
    pub registrations: usize,
    pub payments: usize,
    pub announcements: usize,
}

/// Replace all trips (and everything hanging off them) with demo data.
pub async fn load_sample_data(db: &Database, today: NaiveDate) -> Result<SampleDataSummary> {
    let mut tx = db.begin().await?;
    sqlx::query("DELETE FROM trips").execute(&mut *tx).await?;

    let mut summary = SampleDataSummary {
        future_trips: FUTURE_TRIPS.len(),
        past_trips: PAST_TRIPS.len(),
        ..Default::default()
    };

    let trips = FUTURE_TRIPS
        .iter()
        .map(|t| (t, true))
        .chain(PAST_TRIPS.iter().map(|t| (t, false)));

    let mut participant_idx = 0usize;
    for (trip_idx, (sample, recruiting)) in trips.enumerate() {
        let start_date = today + Duration::days(sample.months_offset * 30);
        let input = TripInput {
            name: sample.name.to_string(),
            start_date,
            end_date: start_date + Duration::days(sample.duration_days),
            departure_port: sample.from.to_string(),
            arrival_port: sample.to.to_string(),
            price: Decimal::new(sample.price, 0),
            deposit: Decimal::new(sample.deposit, 0),
            description: sample.description.to_string(),
            recruitment_open: recruiting,
        };
        let trip = Trips::new(&mut tx).insert(&input).await?;

        let mut watches = Vec::with_capacity(WATCH_NAMES.len());
        for name in WATCH_NAMES {
            let input = WatchInput {
                name: name.to_string(),
            };
            watches.push(Watches::new(&mut tx).insert(trip.id, &input).await?);
        }

        let count = if trip_idx % 2 == 0 { 2 } else { 3 };
        for i in 0..count {
            let p = PARTICIPANTS[participant_idx % PARTICIPANTS.len()];
            let mut status = STATUSES[participant_idx % STATUSES.len()];
            participant_idx += 1;

            if !recruiting {
                status = RegistrationStatus::Qualified;
            }
            let watch = (status == RegistrationStatus::Qualified).then(|| watches[i % watches.len()].id);

            let new = NewRegistration {
                trip_id: trip.id,
                first_name: p.0.to_string(),
                last_name: p.1.to_string(),
                email: format!("{trip_idx}_{}", p.2),
                phone: p.3.to_string(),
                birth_date: NaiveDate::parse_from_str(p.4, "%Y-%m-%d")
                    .unwrap_or(NaiveDate::MIN),
                address: p.5.to_string(),
                postal_code: p.6.to_string(),
                city: p.7.to_string(),
                vision: p.8,
                prior_participation: if i % 2 == 0 {
                    PriorParticipation::Yes
                } else {
                    PriorParticipation::No
                },
                gdpr_consent: true,
            };
            let registration = Registrations::new(&mut tx).insert(&new).await?;
            Registrations::new(&mut tx)
                .set_status(registration.id, status)
                .await?;
            Registrations::new(&mut tx)
                .set_watch(registration.id, watch)
                .await?;
            summary.registrations += 1;

            let mut payments = Vec::new();
            match status {
                RegistrationStatus::Qualified => {
                    payments.push((trip.deposit, PaymentKind::Payment));
                    if registration.id.0 % 3 == 0 {
                        payments.push((trip.balance_after_deposit(), PaymentKind::Payment));
                    }
                }
                RegistrationStatus::Rejected => {
                    payments.push((Decimal::new(100, 0), PaymentKind::Refund));
                }
                RegistrationStatus::Unqualified => {}
            }
            for (amount, kind) in payments {
                Payments::new(&mut tx)
                    .insert(registration.id, &PaymentInput { amount, kind })
                    .await?;
                summary.payments += 1;
            }
        }

        for (i, (title, body)) in ANNOUNCEMENTS.iter().enumerate() {
            if i == 0 || trip.id.0 % 2 == 0 {
                let input = AnnouncementInput {
                    title: title.to_string(),
                    body: body.to_string(),
                };
                Announcements::new(&mut tx).insert(trip.id, &input).await?;
                summary.announcements += 1;
            }
        }
    }

    tx.commit().await?;
    tracing::info!(?summary, "sample data loaded");
    Ok(summary)
}
