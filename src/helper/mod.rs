pub mod closed_mouth;
pub mod procrustes;
pub mod resample;
