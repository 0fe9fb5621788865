pub mod matches;
pub mod highlight;
pub mod executor;
pub mod results;
