use heatmap_libs::heatmap::{best_times, build_histogram, HourHistogram};
use heatmap_libs::participant::{Participant, ReferenceFrame};
use heatmap_libs::time::{HourSpan, TimeOfDay, WorkInterval};
use proptest::prelude::*;

/// Zones whose offset on the default anchor date is a whole number of hours
const WHOLE_HOUR_ZONES: &[&str] = &[
    "UTC",
    "America/New_York",
    "America/Los_Angeles",
    "America/Sao_Paulo",
    "Europe/Berlin",
    "Europe/London",
    "Africa/Nairobi",
    "Asia/Tokyo",
    "Australia/Brisbane",
];

/// Includes fractional offsets, where a round trip loses part of an hour
const ANY_ZONES: &[&str] = &[
    "UTC",
    "America/New_York",
    "America/St_Johns",
    "Europe/Berlin",
    "Asia/Kolkata",
    "Asia/Kathmandu",
    "Australia/Adelaide",
    "Pacific/Chatham",
    "Pacific/Kiritimati",
];

fn time_of_day() -> impl Strategy<Value = TimeOfDay> {
    (0_u32..24, 0_u32..60, 0_u32..60)
        .prop_map(|(h, m, s)| TimeOfDay::from_hms(h, m, s).expect("in range"))
}

fn interval_in(zones: &'static [&'static str]) -> impl Strategy<Value = WorkInterval> {
    (time_of_day(), time_of_day(), prop::sample::select(zones))
        .prop_map(|(start, end, zone)| WorkInterval::new(start, end, zone))
}

fn quantized(interval: &WorkInterval) -> WorkInterval {
    WorkInterval::new(
        interval.start.truncate_to_hour(),
        interval.end.truncate_to_hour(),
        &interval.timezone,
    )
}

proptest! {
    #[test]
    fn round_trip_restores_quantized_interval(
        interval in interval_in(WHOLE_HOUR_ZONES),
        other in prop::sample::select(WHOLE_HOUR_ZONES),
    ) {
        let there = interval.convert_to_zone(other).unwrap();
        let back = there.convert_to_zone(&interval.timezone).unwrap();

        prop_assert_eq!(back, quantized(&interval));
    }

    #[test]
    fn round_trip_settles_after_one_pass(
        interval in interval_in(WHOLE_HOUR_ZONES),
        other in prop::sample::select(WHOLE_HOUR_ZONES),
    ) {
        let round_trip = |interval: &WorkInterval| {
            interval
                .convert_to_zone(other)
                .and_then(|there| there.convert_to_zone(&interval.timezone))
                .unwrap()
        };

        let once = round_trip(&interval);
        let twice = round_trip(&once);

        prop_assert!(once.start.to_string().ends_with(":00:00"));
        prop_assert!(once.end.to_string().ends_with(":00:00"));
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn slots_never_exceed_participant_count(
        intervals in prop::collection::vec(prop::option::of(interval_in(ANY_ZONES)), 0..12),
        zone in prop::sample::select(ANY_ZONES),
    ) {
        let participants: Vec<Participant> = intervals
            .into_iter()
            .enumerate()
            .map(|(i, interval)| Participant::new(&i.to_string(), interval))
            .collect();

        let histogram = build_histogram(&ReferenceFrame::new(zone, None), &participants).unwrap();

        prop_assert!(histogram.counts().iter().all(|&count| count as usize <= participants.len()));
    }

    #[test]
    fn same_zone_participant_covers_its_span(
        start in 0_u8..24,
        end in 0_u8..24,
        zone in prop::sample::select(ANY_ZONES),
    ) {
        let interval = WorkInterval::new(
            TimeOfDay::from_hms(start.into(), 0, 0).unwrap(),
            TimeOfDay::from_hms(end.into(), 0, 0).unwrap(),
            zone,
        );
        let span = HourSpan::new(start, end);

        let histogram = build_histogram(
            &ReferenceFrame::new(zone, None),
            &[Participant::new("p", Some(interval))],
        )
        .unwrap();

        for hour in 0..24 {
            prop_assert_eq!(histogram.get(hour), u32::from(span.covers(hour)));
        }
        prop_assert_eq!(histogram.counts().iter().sum::<u32>(), u32::from(span.len()));
    }

    #[test]
    fn best_hours_are_sorted_maxima_inside_window(
        counts in prop::array::uniform24(0_u32..6),
        window in prop::option::of(interval_in(&["UTC"])),
    ) {
        let histogram = HourHistogram(counts);
        let best = best_times(&histogram, window.as_ref());

        prop_assert!(best.hours.windows(2).all(|pair| pair[0] < pair[1]));
        prop_assert!(best.hours.iter().all(|&hour| histogram.get(hour) == best.max_count));

        match &window {
            Some(window) => {
                let span = window.hour_span();
                prop_assert!(best.hours.iter().all(|&hour| span.covers(hour)));
                prop_assert!(span.hours().all(|hour| histogram.get(hour) <= best.max_count));
                prop_assert_eq!(best.hours.is_empty(), span.is_empty());
            }
            None => {
                prop_assert_eq!(best.max_count, histogram.max());
                prop_assert!(!best.hours.is_empty());
            }
        }
    }
}
