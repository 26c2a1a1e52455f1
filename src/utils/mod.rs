pub mod coordinate;
pub mod npy;
pub mod utils;
