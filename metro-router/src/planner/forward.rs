//! Depart-at evaluation.

use chrono::{Duration, NaiveDateTime};

use crate::domain::{StructuralPath, StructuralSegment, TemporalItinerary};
use crate::schedule::{ScheduleError, ScheduleProvider};

use super::evaluator::{Boarding, Evaluator, Failure, Rejection, around, place};

impl<P: ScheduleProvider> Evaluator<'_, P> {
    /// Place `path` on the clock leaving the origin no earlier than
    /// `depart_at`.
    ///
    /// Each segment takes the first departure at or after the traveller is
    /// ready: `depart_at` for the first, previous arrival plus transfer after
    /// a line change. Staying on one line keeps the same vehicle when its
    /// run continues within the tolerance. Returns `None` if some segment
    /// has no departure or waits longer than `max_wait`.
    pub async fn evaluate_forward(
        &self,
        path: &StructuralPath,
        depart_at: NaiveDateTime,
        max_wait: Duration,
    ) -> Result<Option<TemporalItinerary>, ScheduleError> {
        let outcome = self.forward(path, depart_at, max_wait).await;
        Self::settle(path, outcome)
    }

    async fn forward(
        &self,
        path: &StructuralPath,
        depart_at: NaiveDateTime,
        max_wait: Duration,
    ) -> Result<TemporalItinerary, Failure> {
        if path.revisits_destination() {
            return Err(Rejection::RevisitsDestination.into());
        }

        let mut placed = Vec::with_capacity(path.len());
        let mut previous: Option<(&StructuralSegment, Boarding)> = None;

        for seg in path.segments() {
            let representative = self
                .provider
                .representative_travel_time(&seg.from, &seg.to, &seg.line)
                .await?;

            let (boarding, ready, transfer) = match &previous {
                None => {
                    let boarding = self.next_boarding(seg, depart_at, representative).await?;
                    (boarding, depart_at, Duration::zero())
                }
                Some((prev_seg, prev)) if prev_seg.line == seg.line => {
                    match self.continuation(seg, prev, representative).await? {
                        // Dwelling on board is not waiting
                        Some(same_vehicle) => {
                            let ready = same_vehicle.departure;
                            (same_vehicle, ready, Duration::zero())
                        }
                        None => {
                            let arrived = prev.arrival();
                            let boarding = self.next_boarding(seg, arrived, representative).await?;
                            (boarding, arrived, Duration::zero())
                        }
                    }
                }
                Some((prev_seg, prev)) => {
                    let transfer = self
                        .provider
                        .transfer_time(&seg.from, &prev_seg.line, &seg.line)
                        .await?;
                    let ready = prev.arrival() + transfer;
                    let boarding = self.next_boarding(seg, ready, representative).await?;
                    (boarding, ready, transfer)
                }
            };

            let wait = boarding.departure - ready;
            if wait > max_wait {
                return Err(Rejection::WaitTooLong {
                    station: seg.from.clone(),
                    wait_secs: wait.num_seconds(),
                }
                .into());
            }

            placed.push(place(seg, &boarding, wait, transfer)?);
            previous = Some((seg, boarding));
        }

        Ok(TemporalItinerary::new(placed, depart_at)?)
    }

    /// Earliest boarding at or after `ready`, looking into the next service
    /// day when today's service has ended.
    async fn next_boarding(
        &self,
        seg: &StructuralSegment,
        ready: NaiveDateTime,
        representative: Option<Duration>,
    ) -> Result<Boarding, Failure> {
        self.boardings_on(seg, &around(ready.date(), true, true), representative)
            .await?
            .into_iter()
            .find(|b| b.departure >= ready)
            .ok_or_else(|| {
                Rejection::NoDeparture {
                    station: seg.from.clone(),
                    line: seg.line.clone(),
                }
                .into()
            })
    }

    /// The vehicle of `prev` carrying on to `seg.to`, if a run leaves within
    /// the continuation tolerance of the arrival. The same trip is preferred
    /// over any other close run. The boarding keeps the run's scheduled
    /// departure unless that would precede the arrival.
    async fn continuation(
        &self,
        seg: &StructuralSegment,
        prev: &Boarding,
        representative: Option<Duration>,
    ) -> Result<Option<Boarding>, ScheduleError> {
        let arrived = prev.arrival();
        let runs = self.runs_on(seg, &around(arrived.date(), true, false)).await?;
        let close: Vec<_> = runs
            .iter()
            .filter(|r| (r.departure - arrived).abs() <= self.continuation_tolerance)
            .collect();

        let run = prev
            .trip_id
            .as_deref()
            .and_then(|id| close.iter().find(|r| r.trip_id == id))
            .or_else(|| close.first());

        Ok(run.map(|r| Boarding {
            departure: arrived.max(r.departure),
            ..Boarding::from_run(r, representative)
        }))
    }
}
