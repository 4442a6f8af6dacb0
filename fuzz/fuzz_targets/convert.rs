#![no_main]
use heatmap_libs::time::WorkInterval;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (WorkInterval, WorkInterval)| {
    let (interval, target) = data;

    let converted = interval
        .convert_to_zone(&target.timezone)
        .expect("zones drawn from the IANA database always convert");

    assert_eq!(converted.timezone, target.timezone);
    assert!(
        converted.start == converted.start.truncate_to_hour()
            && converted.end == converted.end.truncate_to_hour(),
        "Converted bounds should sit on whole hours: {:?}",
        converted
    );

    let again = converted
        .convert_to_zone(&target.timezone)
        .expect("already converted once");
    assert_eq!(again, converted, "Converting into the same zone should not move it");
});
