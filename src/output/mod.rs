pub mod stats;
pub mod writer_txt;

pub use stats::{domain_statistics, log_statistics};
pub use writer_txt::{sorted_names, write_names};
