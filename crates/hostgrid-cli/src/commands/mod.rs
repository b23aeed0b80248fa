pub mod fleet;
pub mod run;
