#![no_main]

use ambient::core::PlayerCore;
use ambient::model::TrackDraft;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut core = PlayerCore::new();

    for (step, byte) in data.iter().enumerate() {
        match byte % 8 {
            0 => {
                core.add_track(TrackDraft::new(format!("track_{step}"), "track.mp3"));
            }
            1 => {
                if let Some(id) = core.queue().get(usize::from(*byte) % 7).copied() {
                    core.remove_track(id);
                }
            }
            2 => core.toggle_shuffle(),
            3 => core.cycle_loop_mode(),
            4 => {
                let _ = core.next();
            }
            5 => {
                let _ = core.track_ended();
            }
            6 => {
                core.update_time(f64::from(*byte));
            }
            _ => {
                let _ = core.play(usize::from(*byte) % 5);
            }
        }

        if let Some(idx) = core.cursor().track_index {
            assert!(idx < core.queue().len());
        }
        assert_eq!(core.queue().len(), core.playlist().len());
    }
});
