pub mod frame_source;
pub mod landmark_extractor;
