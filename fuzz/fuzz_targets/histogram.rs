#![no_main]
use heatmap_libs::{
    heatmap::{best_times, build_histogram},
    participant::{Participant, ReferenceFrame},
    time::WorkInterval,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (WorkInterval, Vec<Option<WorkInterval>>)| {
    #[cfg(feature = "log")]
    let _ = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                record.target(),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stdout())
        .apply();

    let (window, intervals) = data;
    let participants: Vec<Participant> = intervals
        .into_iter()
        .enumerate()
        .map(|(i, interval)| Participant::new(&i.to_string(), interval))
        .collect();

    let reference = ReferenceFrame::new(&window.timezone, Some(window.clone()));
    let histogram = build_histogram(&reference, &participants)
        .expect("reference zone comes from the IANA database");

    if let Some(count) = histogram
        .counts()
        .iter()
        .find(|&&count| count as usize > participants.len())
    {
        panic!(
            "Slot count {} exceeds {} participants",
            count,
            participants.len()
        );
    }

    let best = best_times(&histogram, Some(&window));
    let span = window.hour_span();
    assert!(
        best.hours.iter().all(|&hour| span.covers(hour)),
        "Best hour outside of window {}: {:?}",
        span,
        best.hours
    );
    assert!(
        best.hours.windows(2).all(|pair| pair[0] < pair[1]),
        "Best hours should be ascending"
    );
});
