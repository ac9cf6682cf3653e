//! Built-in track catalog. Ids are paths relative to the music directory.

pub const FOCUS_TRACKS: &[&str] = &[
    "focus/deep-space.mp3",
    "focus/rainfall.mp3",
    "focus/lofi-study.mp3",
    "focus/forest-stream.mp3",
    "focus/piano-drift.mp3",
    "focus/night-train.mp3",
];

pub const BREAK_TRACKS: &[&str] = &[
    "break/morning-coffee.mp3",
    "break/acoustic-stroll.mp3",
    "break/sunny-porch.mp3",
];
