//! Arrive-by evaluation.
//!
//! Segments are placed last to first, each on the latest trip whose
//! scheduled arrival still meets the running deadline, and keep that trip's
//! own times. That construction only guarantees the itinerary is feasible,
//! so wait times are recomputed in a second, forward pass once the segments
//! are back in travel order.

use chrono::{Duration, NaiveDateTime};

use crate::domain::{StructuralPath, StructuralSegment, TemporalItinerary};
use crate::schedule::{ScheduleError, ScheduleProvider};

use super::evaluator::{Boarding, Evaluator, Failure, Rejection, around, place};

impl<P: ScheduleProvider> Evaluator<'_, P> {
    /// Place `path` on the clock so it arrives no later than `arrive_by`,
    /// leaving the origin as late as possible.
    ///
    /// Returns `None` if some segment has no feasible trip or a recomputed
    /// wait exceeds `max_wait`.
    pub async fn evaluate_backward(
        &self,
        path: &StructuralPath,
        arrive_by: NaiveDateTime,
        max_wait: Duration,
    ) -> Result<Option<TemporalItinerary>, ScheduleError> {
        let outcome = self.backward(path, arrive_by, max_wait).await;
        Self::settle(path, outcome)
    }

    async fn backward(
        &self,
        path: &StructuralPath,
        arrive_by: NaiveDateTime,
        max_wait: Duration,
    ) -> Result<TemporalItinerary, Failure> {
        if path.revisits_destination() {
            return Err(Rejection::RevisitsDestination.into());
        }

        let segments = path.segments();
        let mut deadline = arrive_by;
        let mut reversed: Vec<(&StructuralSegment, Boarding, Duration)> =
            Vec::with_capacity(segments.len());

        for (i, seg) in segments.iter().enumerate().rev() {
            let boarding = self.latest_boarding(seg, deadline).await?;

            let transfer = match i.checked_sub(1).map(|j| &segments[j]) {
                Some(before) if before.line != seg.line => {
                    self.provider
                        .transfer_time(&seg.from, &before.line, &seg.line)
                        .await?
                }
                _ => Duration::zero(),
            };

            deadline = boarding.departure - transfer;
            reversed.push((seg, boarding, transfer));
        }
        reversed.reverse();

        let mut placed = Vec::with_capacity(reversed.len());
        let mut previous: Option<&Boarding> = None;
        for (seg, boarding, transfer) in &reversed {
            let wait = match previous {
                None => Duration::zero(),
                // Dwelling on board is not waiting
                Some(prev) if prev.trip_id.is_some() && prev.trip_id == boarding.trip_id => {
                    Duration::zero()
                }
                Some(prev) => {
                    (boarding.departure - (prev.arrival() + *transfer)).max(Duration::zero())
                }
            };
            if wait > max_wait {
                return Err(Rejection::WaitTooLong {
                    station: seg.from.clone(),
                    wait_secs: wait.num_seconds(),
                }
                .into());
            }
            placed.push(place(seg, boarding, wait, *transfer)?);
            previous = Some(boarding);
        }

        Ok(TemporalItinerary::from_segments(placed)?)
    }

    /// Latest trip whose scheduled arrival at `seg.to` is at or before
    /// `deadline`.
    async fn latest_boarding(
        &self,
        seg: &StructuralSegment,
        deadline: NaiveDateTime,
    ) -> Result<Boarding, Failure> {
        self.runs_on(seg, &around(deadline.date(), true, false))
            .await?
            .iter()
            .filter(|run| run.arrival <= deadline)
            .max_by_key(|run| run.departure)
            .map(Boarding::scheduled)
            .ok_or_else(|| {
                Rejection::NoDeparture {
                    station: seg.from.clone(),
                    line: seg.line.clone(),
                }
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LineId, ScheduleTime, StationId, at, segment};
    use crate::schedule::{CachedSchedule, ScheduleCacheConfig, StopCall, Timetable};
    use crate::testing;
    use proptest::prelude::*;

    fn provider() -> CachedSchedule<Timetable> {
        cached(testing::abd_timetable())
    }

    fn cached(timetable: Timetable) -> CachedSchedule<Timetable> {
        CachedSchedule::new(timetable, ScheduleCacheConfig::default())
    }

    fn abd_path() -> StructuralPath {
        StructuralPath::new(vec![segment("A", "B", "1", 600), segment("B", "D", "2", 600)])
            .unwrap()
    }

    fn through_e() -> StructuralPath {
        StructuralPath::new(vec![segment("A", "E", "3", 720), segment("E", "D", "3", 780)])
            .unwrap()
    }

    fn dwell_path() -> StructuralPath {
        StructuralPath::new(vec![
            segment("P", "Q", "4", 480),
            segment("Q", "R", "4", 540),
            segment("R", "S", "5", 300),
        ])
        .unwrap()
    }

    /// Timetables whose runs all take their representative time, with the
    /// path to evaluate on each.
    fn regular_case(case: usize) -> (Timetable, StructuralPath) {
        match case {
            0 => (testing::abd_timetable(), abd_path()),
            1 => (testing::multi_line_timetable(), abd_path()),
            2 => (testing::multi_line_timetable(), through_e()),
            _ => (testing::dwell_timetable(), dwell_path()),
        }
    }

    /// Line 1 from A to B every 10 minutes, except the 08:20 which takes 14.
    fn with_slow_trip() -> Timetable {
        let (a, b) = (StationId::parse("A").unwrap(), StationId::parse("B").unwrap());
        let time = |s: &str| ScheduleTime::parse(s).unwrap();
        let mut builder = Timetable::builder("slow");
        builder.stop(a.clone(), "A").stop(b.clone(), "B");
        for (trip, dep, arr) in [
            ("t0", "08:00:00", "08:10:00"),
            ("t1", "08:10:00", "08:20:00"),
            ("t2", "08:20:00", "08:34:00"),
            ("t3", "08:30:00", "08:40:00"),
        ] {
            builder
                .trip(
                    trip,
                    LineId::parse("1").unwrap(),
                    vec![
                        StopCall::new(a.clone(), time(dep), time(dep)),
                        StopCall::new(b.clone(), time(arr), time(arr)),
                    ],
                )
                .unwrap();
        }
        builder.build()
    }

    #[tokio::test]
    async fn arrive_by_nine_takes_latest_trips() {
        let provider = provider();
        let evaluator = Evaluator::new(&provider, Duration::minutes(2));

        let itinerary = evaluator
            .evaluate_backward(&abd_path(), at(9, 0), Duration::minutes(30))
            .await
            .unwrap()
            .expect("itinerary");

        let segs = itinerary.segments();
        // Line 2 at 08:50 is the last to reach D by 09:00; line 1 at 08:35
        // is the last to reach B with the 3 minute change to spare
        assert_eq!(segs[0].departure_time(), at(8, 35));
        assert_eq!(segs[0].arrival_time(), at(8, 45));
        assert_eq!(segs[1].departure_time(), at(8, 50));
        assert_eq!(segs[1].arrival_time(), at(9, 0));

        assert_eq!(segs[0].wait_time(), Duration::zero());
        assert_eq!(segs[1].wait_time(), Duration::seconds(120));
        assert_eq!(segs[1].transfer_time(), Duration::seconds(180));

        assert_eq!(itinerary.departure_time(), at(8, 35));
        assert_eq!(itinerary.total_duration(), Duration::minutes(25));
    }

    #[tokio::test]
    async fn slow_trip_that_misses_the_deadline_is_skipped() {
        let provider = cached(with_slow_trip());
        let evaluator = Evaluator::new(&provider, Duration::minutes(2));
        let path = StructuralPath::new(vec![segment("A", "B", "1", 600)]).unwrap();

        // The 08:20 would arrive at 08:30 at the usual pace but really
        // arrives at 08:34
        let itinerary = evaluator
            .evaluate_backward(&path, at(8, 31), Duration::minutes(30))
            .await
            .unwrap()
            .expect("itinerary");
        assert_eq!(itinerary.segments()[0].trip_id(), Some("t1"));
        assert_eq!(itinerary.first_boarding(), at(8, 10));
        assert_eq!(itinerary.arrival_time(), at(8, 20));

        // Once the deadline allows it, the slow trip keeps its own times
        let itinerary = evaluator
            .evaluate_backward(&path, at(8, 34), Duration::minutes(30))
            .await
            .unwrap()
            .expect("itinerary");
        assert_eq!(itinerary.segments()[0].trip_id(), Some("t2"));
        assert_eq!(itinerary.arrival_time(), at(8, 34));
        assert_eq!(itinerary.segments()[0].travel_time(), Duration::minutes(14));
    }

    #[tokio::test]
    async fn one_way_line_is_not_ridden_backwards() {
        let provider = provider();
        let evaluator = Evaluator::new(&provider, Duration::minutes(2));
        // Line 1 only runs from A to B
        let path = StructuralPath::new(vec![segment("B", "A", "1", 600)]).unwrap();

        assert!(
            evaluator
                .evaluate_backward(&path, at(9, 0), Duration::minutes(30))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn dwell_on_board_is_not_a_wait() {
        let provider = cached(testing::dwell_timetable());
        let evaluator = Evaluator::new(&provider, Duration::minutes(2));

        let itinerary = evaluator
            .evaluate_backward(&dwell_path(), at(9, 0), Duration::minutes(30))
            .await
            .unwrap()
            .expect("itinerary");

        let segs = itinerary.segments();
        // S by 09:00 means the 08:55 from R, reached by the 08:30 from P
        assert_eq!(segs[0].departure_time(), at(8, 30));
        assert_eq!(segs[0].arrival_time(), at(8, 38));
        assert_eq!(segs[1].departure_time(), at(8, 39));
        assert_eq!(segs[1].wait_time(), Duration::zero());
        assert_eq!(segs[0].trip_id(), segs[1].trip_id());
        assert_eq!(segs[2].departure_time(), at(8, 55));
        assert_eq!(segs[2].transfer_time(), Duration::seconds(300));
        assert_eq!(segs[2].wait_time(), Duration::minutes(2));
    }

    #[tokio::test]
    async fn deadline_before_service_is_infeasible() {
        let provider = provider();
        let evaluator = Evaluator::new(&provider, Duration::minutes(2));

        assert!(
            evaluator
                .evaluate_backward(&abd_path(), at(5, 40), Duration::minutes(30))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn recomputed_wait_over_limit_rejects() {
        let provider = provider();
        let evaluator = Evaluator::new(&provider, Duration::minutes(2));

        // The change at B always waits 2 minutes
        assert!(
            evaluator
                .evaluate_backward(&abd_path(), at(9, 0), Duration::minutes(1))
                .await
                .unwrap()
                .is_none()
        );
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn backward_then_forward_agree(case in 0usize..4, minutes in (7 * 60u32)..(22 * 60)) {
            let (timetable, path) = regular_case(case);
            let provider = cached(timetable);
            let evaluator = Evaluator::new(&provider, Duration::minutes(2));
            let arrive_by = at(0, 0) + Duration::minutes(i64::from(minutes));
            let max_wait = Duration::minutes(30);

            let (backward, forward) = runtime().block_on(async {
                let backward = evaluator
                    .evaluate_backward(&path, arrive_by, max_wait)
                    .await
                    .unwrap()
                    .expect("feasible during service hours");
                let forward = evaluator
                    .evaluate_forward(&path, backward.departure_time(), max_wait)
                    .await
                    .unwrap()
                    .expect("forward from backward departure");
                (backward, forward)
            });

            prop_assert!(backward.arrival_time() <= arrive_by);
            prop_assert_eq!(backward.segments(), forward.segments());
        }

        #[test]
        fn backward_itineraries_are_chained(case in 0usize..4, minutes in (7 * 60u32)..(22 * 60)) {
            let (timetable, path) = regular_case(case);
            let provider = cached(timetable);
            let evaluator = Evaluator::new(&provider, Duration::minutes(2));
            let arrive_by = at(0, 0) + Duration::minutes(i64::from(minutes));

            let itinerary = runtime()
                .block_on(evaluator.evaluate_backward(&path, arrive_by, Duration::minutes(30)))
                .unwrap()
                .expect("feasible during service hours");

            prop_assert!(itinerary.arrival_time() <= arrive_by);
            for pair in itinerary.segments().windows(2) {
                prop_assert_eq!(pair[0].to(), pair[1].from());
                prop_assert!(pair[1].departure_time() >= pair[0].arrival_time());
            }
            for seg in itinerary.segments() {
                prop_assert!(seg.wait_time() >= Duration::zero());
                prop_assert!(seg.travel_time() >= Duration::zero());
                prop_assert!(seg.transfer_time() >= Duration::zero());
            }
            prop_assert!(itinerary.total_duration() >= itinerary.total_wait_time());
        }
    }
}
