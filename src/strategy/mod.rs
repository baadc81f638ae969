// Scanning, writing and post-processing strategies

pub mod encode;
pub mod parallel;
pub mod scanner;

pub use encode::*;
pub use parallel::*;
pub use scanner::*;
