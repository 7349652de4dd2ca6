pub mod optimize;
pub mod rank;
pub mod report;
pub mod survey;
pub mod sweep;
pub mod util;
