#![no_main]

use ambient::lyrics;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    let lines = lyrics::parse_lrc(&raw);
    assert!(lines.windows(2).all(|pair| pair[0].time <= pair[1].time));

    let mut previous = None;
    for line in &lines {
        let found = lyrics::locate(&lines, line.time);
        assert!(found >= previous);
        previous = found;
    }
});
