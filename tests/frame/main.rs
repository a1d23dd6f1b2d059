mod common;

mod diagnose;
mod inspect;
mod navigation;

const FIVE_FRAMES: &str = "./tests/fixtures/five_frames.toml";
