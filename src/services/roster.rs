//! Watch (wachta) membership.

use std::collections::BTreeSet;

use serde::Serialize;

use super::notifications::{LifecycleEvent, Notifier};
use crate::domain::{Registration, RegistrationId, Trip, TripId, Watch, WatchId};
use crate::infra::sqlite::{Registrations, Trips, Watches};
use crate::infra::{Database, RejsError, Result};
use crate::validation::FieldErrors;

/// Field that roster validation errors are reported on.
pub const MEMBERS_FIELD: &str = "members";

/// Changes applied by [`Roster::reconcile`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RosterChange {
    pub added: Vec<RegistrationId>,
    pub removed: Vec<RegistrationId>,
}

fn not_on_trip(registration: impl std::fmt::Display, trip: &Trip) -> FieldErrors {
    FieldErrors::single(
        MEMBERS_FIELD,
        format!("Zgłoszenie {registration} nie należy do rejsu {trip}"),
    )
}

#[derive(Clone)]
pub struct Roster {
    db: Database,
    notifier: Notifier,
}

impl Roster {
    pub fn new(db: Database, notifier: Notifier) -> Self {
        Self { db, notifier }
    }

    pub async fn members(&self, watch_id: WatchId) -> Result<Vec<Registration>> {
        let mut conn = self.db.acquire().await?;
        Watches::new(&mut conn).get(watch_id).await?;
        Registrations::new(&mut conn).list_for_watch(watch_id).await
    }

    /// Registrations of the trip without a watch.
    pub async fn available(&self, trip_id: TripId) -> Result<Vec<Registration>> {
        let mut conn = self.db.acquire().await?;
        Trips::new(&mut conn).get(trip_id).await?;
        Registrations::new(&mut conn).list_unassigned(trip_id).await
    }

    /// Put one registration on the watch and tell the participant.
    pub async fn assign(&self, watch_id: WatchId, registration_id: RegistrationId) -> Result<Registration> {
        let mut tx = self.db.begin().await?;

        let watch = Watches::new(&mut tx).get(watch_id).await?;
        let trip = Trips::new(&mut tx).get(watch.trip_id).await?;
        let registration = Registrations::new(&mut tx).get(registration_id).await?;
        if registration.trip_id != watch.trip_id {
            return Err(not_on_trip(&registration, &trip).into());
        }
        if registration.watch_id == Some(watch_id) {
            return Ok(registration);
        }

        Registrations::new(&mut tx)
            .set_watch(registration_id, Some(watch_id))
            .await?;
        let registration = Registrations::new(&mut tx).get(registration_id).await?;

        self.notifier
            .notify(LifecycleEvent::WatchAssigned {
                trip: &trip,
                watch: &watch,
                registration: &registration,
            })
            .await?;

        tx.commit().await?;
        Ok(registration)
    }

    /// Take a registration off the watch.
    pub async fn remove(&self, watch_id: WatchId, registration_id: RegistrationId) -> Result<Registration> {
        let mut tx = self.db.begin().await?;

        Watches::new(&mut tx).get(watch_id).await?;
        let registration = Registrations::new(&mut tx).get(registration_id).await?;
        if registration.watch_id != Some(watch_id) {
            return Err(RejsError::not_found("watch member", registration_id));
        }

        Registrations::new(&mut tx).set_watch(registration_id, None).await?;
        let registration = Registrations::new(&mut tx).get(registration_id).await?;

        tx.commit().await?;
        Ok(registration)
    }

    /// Make `desired` the exact member set of the watch.
    ///
    /// Every addition must belong to the watch's trip; otherwise nothing is
    /// written. No notifications are sent.
    pub async fn reconcile(&self, watch_id: WatchId, desired: &[RegistrationId]) -> Result<RosterChange> {
        let mut tx = self.db.begin().await?;

        let watch: Watch = Watches::new(&mut tx).get(watch_id).await?;
        let current: BTreeSet<RegistrationId> = Registrations::new(&mut tx)
            .list_for_watch(watch_id)
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();
        let desired: BTreeSet<RegistrationId> = desired.iter().copied().collect();

        let removed: Vec<RegistrationId> = current.difference(&desired).copied().collect();
        let added: Vec<RegistrationId> = desired.difference(&current).copied().collect();

        let trips = Registrations::new(&mut tx).trip_ids_of(&added).await?;
        for id in &added {
            match trips.iter().find(|(rid, _)| rid == id) {
                Some((_, trip_id)) if *trip_id == watch.trip_id => {}
                Some(_) => {
                    let registration = Registrations::new(&mut tx).get(*id).await?;
                    let trip = Trips::new(&mut tx).get(watch.trip_id).await?;
                    return Err(not_on_trip(&registration, &trip).into());
                }
                None => return Err(RejsError::not_found("registration", id)),
            }
        }

        Registrations::new(&mut tx).set_watch_many(&removed, None).await?;
        Registrations::new(&mut tx)
            .set_watch_many(&added, Some(watch_id))
            .await?;

        tx.commit().await?;
        tracing::info!(
            watch_id = %watch_id,
            added = added.len(),
            removed = removed.len(),
            "watch roster updated"
        );
        Ok(RosterChange { added, removed })
    }
}
