pub mod ssim;

pub use ssim::*;
