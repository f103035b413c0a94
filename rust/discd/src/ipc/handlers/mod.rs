pub mod assessment;
pub mod classes;
pub mod core;
pub mod results;
pub mod students;
